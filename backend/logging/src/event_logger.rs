//! Scan event records, one per pipeline stage, under the `scan_events` target.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

/// Longest OCR excerpt written to the log.
const MAX_LOGGED_TEXT: usize = 120;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanEvent {
    Verified {
        part_number: Option<String>,
        discrepancies: usize,
        confidence: u8,
        ocr_text: String,
    },
    Fused {
        verdict: String,
        score: f64,
        with_classifier: bool,
    },
    ClassifierFallback {
        classifier: String,
        error: String,
    },
    Stored {
        stored: bool,
    },
}

#[derive(Debug, Serialize)]
pub struct ScanEventEntry {
    pub batch_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: ScanEvent,
}

pub struct ScanEventLogger;

impl ScanEventLogger {
    pub fn log_event(batch_id: &str, mut event: ScanEvent) {
        if let ScanEvent::Verified { ocr_text, .. } = &mut event {
            *ocr_text = truncate_for_log(ocr_text);
        }

        let entry = ScanEventEntry {
            batch_id: batch_id.into(),
            timestamp: Utc::now(),
            event,
        };

        match serde_json::to_string(&entry) {
            Ok(json) => info!(target: "scan_events", event = %json, "Scan event"),
            Err(_) => info!(target: "scan_events", event = ?entry, "Scan event"),
        }
    }
}

/// Flatten newlines and cut to [`MAX_LOGGED_TEXT`] characters.
pub fn truncate_for_log(text: &str) -> String {
    let flat = text.replace(['\r', '\n'], " | ");
    if flat.chars().count() <= MAX_LOGGED_TEXT {
        return flat;
    }
    let mut cut: String = flat.chars().take(MAX_LOGGED_TEXT).collect();
    cut.push('…');
    cut
}
