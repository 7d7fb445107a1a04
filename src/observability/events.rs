//! Observable events
//!
//! Events are explicit and typed; the string form is the `event` key of
//! the log line.

use std::fmt;

use super::logger::Severity;

/// Observable events in the result pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Configuration loaded
    ConfigLoaded,
    /// Interactive console ready for commands
    ConsoleStart,
    /// Console input exhausted
    ConsoleStop,

    // Query execution
    /// Transport answered with a buffered body
    QueryBuffered,
    /// Transport answered with a stream index
    QueryStreamed,
    /// Query cancelled before completion
    QueryCancelled,
    /// Response arrived after a newer query or reset; dropped
    QueryStale,
    /// Buffered result exceeded the size limit
    ResultTooLarge,
    /// Parser fell back to a single whole-text record
    ParseDegraded,

    // Spooling
    /// Response crossed the threshold and is going to disk
    SpoolSwitch,
    /// All parts written
    SpoolComplete,

    // Result state
    /// Static records loaded
    StaticLoaded,
    /// Stream index installed
    StreamInitialized,
    /// Result state reset
    ResultsReset,
    /// Page applied to state
    PageLoaded,
    /// Page result discarded because a newer load superseded it
    PageStale,
    /// Page read failed
    PageFailed,
    /// Transition rejected by the state machine
    TransitionRejected,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ConsoleStart => "CONSOLE_START",
            Event::ConsoleStop => "CONSOLE_STOP",

            Event::QueryBuffered => "QUERY_BUFFERED",
            Event::QueryStreamed => "QUERY_STREAMED",
            Event::QueryCancelled => "QUERY_CANCELLED",
            Event::QueryStale => "QUERY_STALE",
            Event::ResultTooLarge => "RESULT_TOO_LARGE",
            Event::ParseDegraded => "PARSE_DEGRADED",

            Event::SpoolSwitch => "SPOOL_SWITCH",
            Event::SpoolComplete => "SPOOL_COMPLETE",

            Event::StaticLoaded => "STATIC_LOADED",
            Event::StreamInitialized => "STREAM_INITIALIZED",
            Event::ResultsReset => "RESULTS_RESET",
            Event::PageLoaded => "PAGE_LOADED",
            Event::PageStale => "PAGE_STALE",
            Event::PageFailed => "PAGE_FAILED",
            Event::TransitionRejected => "TRANSITION_REJECTED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::PageFailed => Severity::Error,
            Event::ResultTooLarge
            | Event::ParseDegraded
            | Event::QueryStale
            | Event::PageStale
            | Event::TransitionRejected => Severity::Warn,
            Event::PageLoaded => Severity::Trace,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
