// alertrelay-api: Async clients for Hikvision ISAPI alert streams and the signal collector

pub mod auth;
pub mod collector;
pub mod error;
pub mod isapi;
pub mod transport;

pub use auth::{AuthScheme, Credentials};
pub use collector::{CollectorClient, SignalRequest, Time90k};
pub use error::Error;
pub use isapi::{AlertStream, EventNotificationAlert, IsapiClient, RawEventFrame};
pub use transport::TransportConfig;
