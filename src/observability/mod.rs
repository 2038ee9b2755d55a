//! Observability for volume discovery
//!
//! - Structured JSON log lines
//! - Typed lifecycle events
//! - Begin/complete scopes with elapsed time
//!
//! Logging is synchronous and never fails the caller.

mod events;
mod logger;
mod scope;

pub use events::Event;
pub use logger::{format_line, Logger, Severity};
pub use scope::{ObservationScope, Phase};

/// Log a lifecycle event at INFO
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::info(event.as_str(), fields);
}

/// Log a lifecycle event at an explicit severity
pub fn log_event_at(severity: Severity, event: Event, fields: &[(&str, &str)]) {
    Logger::log(severity, event.as_str(), fields);
}
