//! Scan history for AOI Guard: bounded stores behind the
//! [`aoiguard_core::ScanHistoryStore`] trait plus dashboard statistics.

pub mod memory;
pub mod sqlite;
pub mod stats;

pub use memory::{InMemoryHistory, DEFAULT_MAX_REPORTS, DEFAULT_MAX_SCANS};
pub use sqlite::SqliteHistory;
pub use stats::{
    audit_log, dashboard_rows, score_trend, time_ago, AuditEntry, AuditFilter, AuditStatus,
    DashboardRow, ScanStatistics, TrendPoint,
};

#[cfg(test)]
pub(crate) mod test_support {
    use aoiguard_core::{DetailedScanReport, ScanRecord, Verdict};
    use chrono::{TimeZone, Utc};

    pub fn record(batch_id: &str, minute: u32) -> ScanRecord {
        ScanRecord {
            batch_id: batch_id.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 10, 5, 9, minute, 0).unwrap(),
            verdict: Verdict::Genuine,
            score: 100.0,
            operator: "line-3".to_string(),
            part_number: Some("ATMEGA328P".to_string()),
        }
    }

    pub fn report(batch_id: &str, reasoning: &str) -> DetailedScanReport {
        DetailedScanReport {
            batch_id: batch_id.to_string(),
            verdict: Verdict::Suspicious,
            authenticity_score: 70.0,
            operator: "line-3".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 10, 5, 9, 0, 0).unwrap(),
            ocr_markings: "TI\nLM358N\n2347\nCHINA".to_string(),
            oem_data: "TI\nLM358N\nYYWW\nMALAYSIA".to_string(),
            reasoning: reasoning.to_string(),
            flagged_markings: vec!["TI".to_string()],
            flagged_oem_data: vec!["TI".to_string(), "LM358N".to_string()],
            part_number: Some("LM358N".to_string()),
            datasheet_url: None,
            image_ref: None,
        }
    }
}
