//! Dashboard aggregates over stored scans.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use aoiguard_core::{ScanRecord, Verdict};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStatistics {
    pub total: usize,
    pub genuine: usize,
    pub fake: usize,
    pub suspicious: usize,
    /// Mean authenticity score; 0 when there are no scans.
    pub average_score: f64,
}

impl ScanStatistics {
    pub fn from_records(records: &[ScanRecord]) -> Self {
        let count = |v: Verdict| records.iter().filter(|r| r.verdict == v).count();
        let average_score = if records.is_empty() {
            0.0
        } else {
            records.iter().map(|r| r.score).sum::<f64>() / records.len() as f64
        };
        Self {
            total: records.len(),
            genuine: count(Verdict::Genuine),
            fake: count(Verdict::Fake),
            suspicious: count(Verdict::Suspicious),
            average_score,
        }
    }
}

/// One row of the recent-scans table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRow {
    pub batch_id: String,
    pub time: String,
    pub status: Verdict,
    pub score: f64,
    pub operator: String,
}

pub fn dashboard_rows(records: &[ScanRecord], now: DateTime<Utc>) -> Vec<DashboardRow> {
    records
        .iter()
        .map(|r| DashboardRow {
            batch_id: r.batch_id.clone(),
            time: time_ago(now - r.timestamp),
            status: r.verdict,
            score: r.score,
            operator: r.operator.clone(),
        })
        .collect()
}

/// Average score of the scans taken on one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: NaiveDate,
    /// Short chart label, e.g. "Oct 5".
    pub label: String,
    pub scans: usize,
    pub average_score: f64,
}

/// Per-day average scores, oldest day first.
pub fn score_trend(records: &[ScanRecord]) -> Vec<TrendPoint> {
    let mut days: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for record in records {
        let day = days.entry(record.timestamp.date_naive()).or_default();
        day.0 += record.score;
        day.1 += 1;
    }
    days.into_iter()
        .map(|(date, (sum, scans))| TrendPoint {
            date,
            label: date.format("%b %-d").to_string(),
            scans,
            average_score: sum / scans as f64,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Audit log
// ---------------------------------------------------------------------------

/// Action text of every scan entry in the audit log.
pub const SCAN_COMPLETED_ACTION: &str = "IC Scan Completed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Success,
    Warning,
    Failed,
}

impl AuditStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditStatus::Success => "success",
            AuditStatus::Warning => "warning",
            AuditStatus::Failed => "failed",
        }
    }
}

impl From<Verdict> for AuditStatus {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Genuine => AuditStatus::Success,
            Verdict::Suspicious => AuditStatus::Warning,
            Verdict::Fake => AuditStatus::Failed,
        }
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" => Ok(AuditStatus::Success),
            "warning" => Ok(AuditStatus::Warning),
            "failed" => Ok(AuditStatus::Failed),
            other => anyhow::bail!("unknown audit status '{other}' (expected success, warning or failed)"),
        }
    }
}

/// One audit-log line derived from a stored scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub user: String,
    pub action: String,
    pub details: String,
    pub status: AuditStatus,
}

impl AuditEntry {
    pub fn from_record(record: &ScanRecord) -> Self {
        let part = record.part_number.as_deref().unwrap_or("Unknown part");
        let details = match record.verdict {
            Verdict::Fake => format!(
                "COUNTERFEIT DETECTED in {} - {part}. Score: {}%",
                record.batch_id, record.score
            ),
            Verdict::Suspicious => format!(
                "Suspicious markings detected in {} - {part}. Score: {}%",
                record.batch_id, record.score
            ),
            Verdict::Genuine => format!(
                "Genuine IC verified in {} - {part}. Score: {}%",
                record.batch_id, record.score
            ),
        };
        Self {
            id: record.batch_id.clone(),
            timestamp: record.timestamp,
            user: record.operator.clone(),
            action: SCAN_COMPLETED_ACTION.to_string(),
            details,
            status: record.verdict.into(),
        }
    }
}

/// Case-insensitive text search plus an optional status.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub search: Option<String>,
    pub status: Option<AuditStatus>,
}

impl AuditFilter {
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        let status_ok = self.status.map_or(true, |s| s == entry.status);
        let search_ok = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(query) => {
                let query = query.to_lowercase();
                [&entry.action, &entry.user, &entry.details, &entry.id]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&query))
            }
        };
        status_ok && search_ok
    }
}

/// Audit entries for the given records (same order) that pass the filter.
pub fn audit_log(records: &[ScanRecord], filter: &AuditFilter) -> Vec<AuditEntry> {
    records
        .iter()
        .map(AuditEntry::from_record)
        .filter(|entry| filter.matches(entry))
        .collect()
}

/// "Just now", "5 minutes ago", "1 hour ago", "3 days ago".
pub fn time_ago(elapsed: Duration) -> String {
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        plural(minutes, "minute")
    } else if hours < 24 {
        plural(hours, "hour")
    } else {
        plural(days, "day")
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;

    #[test]
    fn counts_by_verdict() {
        let mut records = vec![record("A", 0), record("B", 1), record("C", 2)];
        records[1].verdict = Verdict::Fake;
        records[1].score = 40.0;
        records[2].verdict = Verdict::Suspicious;
        records[2].score = 70.0;

        let stats = ScanStatistics::from_records(&records);
        assert_eq!(stats.total, 3);
        assert_eq!((stats.genuine, stats.fake, stats.suspicious), (1, 1, 1));
        assert_eq!(stats.average_score, 70.0);
        assert_eq!(ScanStatistics::from_records(&[]), ScanStatistics::default());
    }

    #[test]
    fn trend_averages_each_day() {
        let mut records = vec![record("A", 0), record("B", 1), record("C", 2)];
        records[1].score = 40.0;
        records[2].timestamp = records[2].timestamp - Duration::days(2);
        records[2].score = 70.0;

        let trend = score_trend(&records);
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].label, "Oct 3");
        assert_eq!((trend[0].scans, trend[0].average_score), (1, 70.0));
        assert_eq!(trend[1].label, "Oct 5");
        assert_eq!((trend[1].scans, trend[1].average_score), (2, 70.0));
        assert!(score_trend(&[]).is_empty());
    }

    #[test]
    fn audit_entries_follow_the_verdict() {
        let mut fake = record("SCAN-2", 1);
        fake.verdict = Verdict::Fake;
        fake.score = 40.0;
        fake.part_number = None;
        let fake = AuditEntry::from_record(&fake);
        assert_eq!(fake.status, AuditStatus::Failed);
        assert_eq!(fake.action, "IC Scan Completed");
        assert_eq!(fake.details, "COUNTERFEIT DETECTED in SCAN-2 - Unknown part. Score: 40%");

        let genuine = AuditEntry::from_record(&record("SCAN-1", 0));
        assert_eq!(genuine.status, AuditStatus::Success);
        assert_eq!(genuine.user, "line-3");
        assert_eq!(genuine.details, "Genuine IC verified in SCAN-1 - ATMEGA328P. Score: 100%");
    }

    #[test]
    fn audit_filter_combines_search_and_status() {
        let mut records = vec![record("SCAN-1", 0), record("SCAN-2", 1), record("SCAN-3", 2)];
        records[1].verdict = Verdict::Suspicious;
        records[1].score = 70.0;
        records[2].operator = "night-shift".to_string();

        let all = audit_log(&records, &AuditFilter::default());
        assert_eq!(all.len(), 3);

        let warnings = AuditFilter { search: None, status: Some(AuditStatus::Warning) };
        let ids: Vec<String> = audit_log(&records, &warnings).into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["SCAN-2"]);

        let by_user = AuditFilter { search: Some("NIGHT".into()), status: None };
        assert_eq!(audit_log(&records, &by_user)[0].id, "SCAN-3");

        let no_match = AuditFilter {
            search: Some("night".into()),
            status: Some(AuditStatus::Failed),
        };
        assert!(audit_log(&records, &no_match).is_empty());

        assert_eq!("Warning".parse::<AuditStatus>().unwrap(), AuditStatus::Warning);
        assert!("ok".parse::<AuditStatus>().is_err());
    }

    #[test]
    fn relative_times() {
        assert_eq!(time_ago(Duration::seconds(30)), "Just now");
        assert_eq!(time_ago(Duration::minutes(1)), "1 minute ago");
        assert_eq!(time_ago(Duration::minutes(59)), "59 minutes ago");
        assert_eq!(time_ago(Duration::hours(1)), "1 hour ago");
        assert_eq!(time_ago(Duration::hours(23)), "23 hours ago");
        assert_eq!(time_ago(Duration::days(1)), "1 day ago");
        assert_eq!(time_ago(Duration::days(9)), "9 days ago");
    }

    #[test]
    fn rows_use_relative_time() {
        let r = record("SCAN-1", 0);
        let rows = dashboard_rows(&[r.clone()], r.timestamp + Duration::minutes(5));
        assert_eq!(rows[0].time, "5 minutes ago");
        assert_eq!(rows[0].status, Verdict::Genuine);
    }
}
