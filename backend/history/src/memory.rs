use std::collections::VecDeque;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use aoiguard_core::{DetailedScanReport, ScanHistoryStore, ScanRecord};

/// Default number of recent scans kept for the dashboard.
pub const DEFAULT_MAX_SCANS: usize = 20;

/// Default number of detailed reports kept.
pub const DEFAULT_MAX_REPORTS: usize = 50;

/// Bounded in-process history. Newest entries sit at the front; the oldest
/// fall off once a cap is reached.
pub struct InMemoryHistory {
    max_scans: usize,
    max_reports: usize,
    scans: Mutex<VecDeque<ScanRecord>>,
    reports: Mutex<VecDeque<DetailedScanReport>>,
}

/// Caps below one would drop every write while the caller sees success.
pub(crate) fn effective_cap(name: &str, cap: usize) -> usize {
    if cap == 0 {
        warn!(cap = name, "History cap of 0 raised to 1");
        1
    } else {
        cap
    }
}

impl InMemoryHistory {
    /// Caps of 0 are raised to 1.
    pub fn new(max_scans: usize, max_reports: usize) -> Self {
        Self {
            max_scans: effective_cap("maxScans", max_scans),
            max_reports: effective_cap("maxReports", max_reports),
            scans: Mutex::new(VecDeque::new()),
            reports: Mutex::new(VecDeque::new()),
        }
    }
}

impl Default for InMemoryHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SCANS, DEFAULT_MAX_REPORTS)
    }
}

#[async_trait]
impl ScanHistoryStore for InMemoryHistory {
    async fn append(&self, record: ScanRecord) -> Result<()> {
        let mut scans = self.scans.lock().await;
        scans.push_front(record);
        scans.truncate(self.max_scans);
        Ok(())
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<ScanRecord>> {
        let scans = self.scans.lock().await;
        Ok(scans.iter().take(limit).cloned().collect())
    }

    async fn save_report(&self, report: DetailedScanReport) -> Result<()> {
        let mut reports = self.reports.lock().await;
        match reports.iter_mut().find(|r| r.batch_id == report.batch_id) {
            Some(existing) => {
                debug!(batch_id = %report.batch_id, "Replacing stored report");
                *existing = report;
            }
            None => {
                reports.push_front(report);
                reports.truncate(self.max_reports);
            }
        }
        Ok(())
    }

    async fn report(&self, batch_id: &str) -> Result<Option<DetailedScanReport>> {
        let reports = self.reports.lock().await;
        Ok(reports.iter().find(|r| r.batch_id == batch_id).cloned())
    }

    async fn reports(&self) -> Result<Vec<DetailedScanReport>> {
        Ok(self.reports.lock().await.iter().cloned().collect())
    }

    async fn clear(&self) -> Result<()> {
        self.scans.lock().await.clear();
        self.reports.lock().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{record, report};

    #[tokio::test]
    async fn newest_first_and_bounded() {
        let store = InMemoryHistory::new(3, 5);
        for i in 0..5 {
            store.append(record(&format!("SCAN-{i}"), i)).await.unwrap();
        }
        let recent = store.list_recent(10).await.unwrap();
        let ids: Vec<&str> = recent.iter().map(|r| r.batch_id.as_str()).collect();
        assert_eq!(ids, vec!["SCAN-4", "SCAN-3", "SCAN-2"]);
        assert_eq!(store.list_recent(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn zero_caps_still_keep_the_latest_entry() {
        let store = InMemoryHistory::new(0, 0);
        store.append(record("SCAN-1", 1)).await.unwrap();
        store.append(record("SCAN-2", 2)).await.unwrap();
        store.save_report(report("SCAN-2", "kept")).await.unwrap();

        let recent = store.list_recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].batch_id, "SCAN-2");
        assert_eq!(store.reports().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn report_upsert_by_batch_id() {
        let store = InMemoryHistory::default();
        store.save_report(report("SCAN-1", "first")).await.unwrap();
        store.save_report(report("SCAN-2", "second")).await.unwrap();
        store.save_report(report("SCAN-1", "revised")).await.unwrap();

        let all = store.reports().await.unwrap();
        assert_eq!(all.len(), 2);
        // Replacement keeps the original position.
        assert_eq!(all[1].batch_id, "SCAN-1");
        assert_eq!(store.report("SCAN-1").await.unwrap().unwrap().reasoning, "revised");
        assert!(store.report("SCAN-9").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_empties_both_lists() {
        let store = InMemoryHistory::default();
        store.append(record("SCAN-1", 0)).await.unwrap();
        store.save_report(report("SCAN-1", "x")).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.list_recent(10).await.unwrap().is_empty());
        assert!(store.reports().await.unwrap().is_empty());
    }
}
