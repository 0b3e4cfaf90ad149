pub mod client;
pub mod models;

pub use client::{CollectorClient, SESSION_COOKIE};
pub use models::{EPOCH_BASE, SignalRequest, Time90k};
