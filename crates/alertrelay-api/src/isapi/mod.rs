pub mod client;
pub mod models;
pub mod stream;

pub use client::IsapiClient;
pub use models::EventNotificationAlert;
pub use stream::{AlertStream, RawEventFrame, extract_boundary};

/// Path of the long-lived event notification stream.
pub const ALERT_STREAM_PATH: &str = "/ISAPI/Event/notification/alertStream";
