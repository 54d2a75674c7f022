//! Usage-event logging for StartLink

pub mod usage;

pub use usage::{EventType, UsageEvent, UsageLogger};
