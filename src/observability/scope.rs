//! Begin/complete logging around a unit of work
//!
//! - Logs the phase's BEGIN event on creation
//! - Logs COMPLETE or FAILED when finished explicitly
//! - Logs FAILED with reason "abandoned" if dropped unfinished

use std::time::Instant;

use super::events::Event;
use super::logger::Logger;

/// A unit of work with BEGIN / COMPLETE / FAILED events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Loading every location of a store
    StoreLoad,
    /// Loading one location directory
    LocationLoad,
}

impl Phase {
    fn begin(self) -> Event {
        match self {
            Phase::StoreLoad => Event::StoreLoadBegin,
            Phase::LocationLoad => Event::LocationLoadBegin,
        }
    }

    fn complete(self) -> Event {
        match self {
            Phase::StoreLoad => Event::StoreLoadComplete,
            Phase::LocationLoad => Event::LocationLoadComplete,
        }
    }

    fn failed(self) -> Event {
        match self {
            Phase::StoreLoad => Event::StoreLoadFailed,
            Phase::LocationLoad => Event::LocationLoadFailed,
        }
    }
}

/// Logs BEGIN on creation and exactly one closing event.
///
/// ```ignore
/// let scope = ObservationScope::begin(Phase::LocationLoad, &[("directory", "/data")]);
/// // ... scan ...
/// scope.complete(&[("volumes", "12")]);
/// ```
pub struct ObservationScope {
    phase: Phase,
    fields: Vec<(&'static str, String)>,
    started: Instant,
    finished: bool,
}

impl ObservationScope {
    /// Logs the BEGIN event and starts the clock
    pub fn begin(phase: Phase, fields: &[(&'static str, &str)]) -> Self {
        Logger::info(phase.begin().as_str(), fields);
        Self {
            phase,
            fields: fields.iter().map(|(k, v)| (*k, v.to_string())).collect(),
            started: Instant::now(),
            finished: false,
        }
    }

    /// Milliseconds since the scope began
    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Logs COMPLETE with the begin fields, `elapsed_ms`, and `extra`
    pub fn complete(mut self, extra: &[(&str, &str)]) {
        self.finished = true;
        let elapsed = self.elapsed_ms().to_string();
        let mut fields = self.field_refs();
        fields.push(("elapsed_ms", elapsed.as_str()));
        fields.extend_from_slice(extra);
        Logger::info(self.phase.complete().as_str(), &fields);
    }

    /// Logs FAILED at ERROR with the begin fields and `reason`
    pub fn fail(mut self, reason: &str) {
        self.finished = true;
        let mut fields = self.field_refs();
        fields.push(("reason", reason));
        Logger::error(self.phase.failed().as_str(), &fields);
    }

    fn field_refs(&self) -> Vec<(&str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect()
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.finished {
            let mut fields = self.field_refs();
            fields.push(("reason", "abandoned"));
            Logger::warn(self.phase.failed().as_str(), &fields);
        }
    }
}
