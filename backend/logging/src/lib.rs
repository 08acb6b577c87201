//! Structured logging for AOI Guard.
//!
//! Console output plus an optional daily-rolling JSON file, and scan event
//! records emitted under the `scan_events` target.

pub mod event_logger;
pub mod logger;

pub use event_logger::{truncate_for_log, ScanEvent, ScanEventEntry, ScanEventLogger};
pub use logger::init_logger;
