pub mod device;
pub mod event;
pub mod signal;

pub use device::Device;
pub use event::{ACTIVE_STATE, MOTION_EVENT_TYPE, MotionEvent, TIMESTAMP_FORMAT};
pub use signal::{Signal, Time90k, TimeBase};
