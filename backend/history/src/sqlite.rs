//! SQLite-backed scan history.
//!
//! Recent scans live in `scans` (one row per scan, newest = highest `seq`);
//! detailed reports are stored as JSON in `reports`, keyed by batch id.
//! Both tables are pruned to the configured caps after every write.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use aoiguard_core::{AoiGuardError, DetailedScanReport, ScanHistoryStore, ScanRecord, Verdict};

use crate::memory::effective_cap;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS scans (
                          seq         INTEGER PRIMARY KEY AUTOINCREMENT,
                          batch_id    TEXT NOT NULL,
                          timestamp   TEXT NOT NULL,
                          verdict     TEXT NOT NULL,
                          score       REAL NOT NULL,
                          operator    TEXT NOT NULL,
                          part_number TEXT
                      );
                      CREATE TABLE IF NOT EXISTS reports (
                          seq      INTEGER PRIMARY KEY AUTOINCREMENT,
                          batch_id TEXT NOT NULL UNIQUE,
                          payload  TEXT NOT NULL
                      );";

pub struct SqliteHistory {
    conn: Mutex<Connection>,
    max_scans: usize,
    max_reports: usize,
}

impl SqliteHistory {
    /// Create or open a history database at the given path. Caps of 0 are
    /// raised to 1.
    pub fn open(path: impl AsRef<Path>, max_scans: usize, max_reports: usize) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .context("Failed to open SQLite history database")?;
        conn.execute_batch(&format!("PRAGMA journal_mode=WAL;\n{SCHEMA}"))
            .context("Failed to initialize history schema")?;
        info!(path = %path.as_ref().display(), "Scan history opened");
        Ok(Self::with_connection(conn, max_scans, max_reports))
    }

    /// Open an in-memory database (for tests).
    pub fn in_memory(max_scans: usize, max_reports: usize) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self::with_connection(conn, max_scans, max_reports))
    }

    fn with_connection(conn: Connection, max_scans: usize, max_reports: usize) -> Self {
        Self {
            conn: Mutex::new(conn),
            max_scans: effective_cap("maxScans", max_scans),
            max_reports: effective_cap("maxReports", max_reports),
        }
    }
}

#[async_trait]
impl ScanHistoryStore for SqliteHistory {
    async fn append(&self, record: ScanRecord) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO scans (batch_id, timestamp, verdict, score, operator, part_number)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.batch_id,
                record.timestamp.to_rfc3339(),
                record.verdict.as_str(),
                record.score,
                record.operator,
                record.part_number,
            ],
        )?;
        conn.execute(
            "DELETE FROM scans WHERE seq NOT IN
               (SELECT seq FROM scans ORDER BY seq DESC LIMIT ?1)",
            params![self.max_scans as i64],
        )?;
        debug!(batch_id = %record.batch_id, "Scan appended to history");
        Ok(())
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<ScanRecord>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT batch_id, timestamp, verdict, score, operator, part_number
             FROM scans ORDER BY seq DESC LIMIT ?1",
        )?;

        let records = stmt
            .query_map(params![limit as i64], |row| {
                let batch_id: String = row.get(0)?;
                let timestamp: String = row.get(1)?;
                let verdict: String = row.get(2)?;
                let score: f64 = row.get(3)?;
                let operator: String = row.get(4)?;
                let part_number: Option<String> = row.get(5)?;
                Ok((batch_id, timestamp, verdict, score, operator, part_number))
            })?
            .filter_map(|row| match row {
                Ok(row) => Some(row),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable scan row");
                    None
                }
            })
            .filter_map(|(batch_id, timestamp, verdict, score, operator, part_number)| {
                let parsed = DateTime::parse_from_rfc3339(&timestamp)
                    .ok()
                    .zip(verdict.parse::<Verdict>().ok());
                let Some((timestamp, verdict)) = parsed else {
                    warn!(batch_id = %batch_id, "Skipping unreadable scan row");
                    return None;
                };
                Some(ScanRecord {
                    batch_id,
                    timestamp: timestamp.with_timezone(&Utc),
                    verdict,
                    score,
                    operator,
                    part_number,
                })
            })
            .collect();

        Ok(records)
    }

    async fn save_report(&self, report: DetailedScanReport) -> Result<()> {
        let payload = serde_json::to_string(&report)?;
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO reports (batch_id, payload) VALUES (?1, ?2)
             ON CONFLICT(batch_id) DO UPDATE SET payload = excluded.payload",
            params![report.batch_id, payload],
        )?;
        conn.execute(
            "DELETE FROM reports WHERE seq NOT IN
               (SELECT seq FROM reports ORDER BY seq DESC LIMIT ?1)",
            params![self.max_reports as i64],
        )?;
        Ok(())
    }

    async fn report(&self, batch_id: &str) -> Result<Option<DetailedScanReport>> {
        let conn = self.conn.lock().await;
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM reports WHERE batch_id = ?1",
                params![batch_id],
                |row| row.get(0),
            )
            .optional()?;
        payload
            .map(|p| {
                serde_json::from_str(&p).map_err(|e| {
                    anyhow::Error::from(AoiGuardError::Storage(format!(
                        "corrupt report payload for {batch_id}: {e}"
                    )))
                })
            })
            .transpose()
    }

    async fn reports(&self) -> Result<Vec<DetailedScanReport>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT batch_id, payload FROM reports ORDER BY seq DESC")?;
        let reports = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .filter_map(|row| match row {
                Ok(row) => Some(row),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable report row");
                    None
                }
            })
            .filter_map(|(batch_id, payload)| match serde_json::from_str(&payload) {
                Ok(report) => Some(report),
                Err(e) => {
                    warn!(batch_id = %batch_id, error = %e, "Skipping corrupt report payload");
                    None
                }
            })
            .collect();
        Ok(reports)
    }

    async fn clear(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch("DELETE FROM scans; DELETE FROM reports;")?;
        info!("Scan history cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{record, report};

    #[tokio::test]
    async fn round_trips_and_prunes_scans() {
        let store = SqliteHistory::in_memory(2, 10).unwrap();
        store.append(record("SCAN-1", 1)).await.unwrap();
        store.append(record("SCAN-2", 2)).await.unwrap();
        store.append(record("SCAN-3", 3)).await.unwrap();

        let recent = store.list_recent(10).await.unwrap();
        let ids: Vec<&str> = recent.iter().map(|r| r.batch_id.as_str()).collect();
        assert_eq!(ids, vec!["SCAN-3", "SCAN-2"]);
        assert_eq!(recent[0], record("SCAN-3", 3));
    }

    #[tokio::test]
    async fn reports_upsert_and_prune() {
        let store = SqliteHistory::in_memory(10, 2).unwrap();
        store.save_report(report("SCAN-1", "a")).await.unwrap();
        store.save_report(report("SCAN-2", "b")).await.unwrap();
        store.save_report(report("SCAN-1", "a2")).await.unwrap();
        assert_eq!(store.report("SCAN-1").await.unwrap().unwrap().reasoning, "a2");

        store.save_report(report("SCAN-3", "c")).await.unwrap();
        let ids: Vec<String> = store
            .reports()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.batch_id)
            .collect();
        assert_eq!(ids, vec!["SCAN-3", "SCAN-2"]);
        assert!(store.report("SCAN-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn zero_caps_still_keep_the_latest_entry() {
        let store = SqliteHistory::in_memory(0, 0).unwrap();
        store.append(record("SCAN-1", 1)).await.unwrap();
        store.append(record("SCAN-2", 2)).await.unwrap();
        store.save_report(report("SCAN-2", "kept")).await.unwrap();

        let recent = store.list_recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].batch_id, "SCAN-2");
        assert!(store.report("SCAN-2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn corrupt_rows_are_skipped_in_listings() {
        let store = SqliteHistory::in_memory(10, 10).unwrap();
        store.append(record("SCAN-1", 1)).await.unwrap();
        store.save_report(report("SCAN-1", "ok")).await.unwrap();
        {
            let conn = store.conn.lock().await;
            conn.execute(
                "INSERT INTO reports (batch_id, payload) VALUES ('SCAN-BAD', '{')",
                [],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO scans (batch_id, timestamp, verdict, score, operator, part_number)
                 VALUES ('SCAN-BAD', 'yesterday', 'Genuine', 100.0, 'line-3', NULL)",
                [],
            )
            .unwrap();
        }

        let ids: Vec<String> = store
            .reports()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.batch_id)
            .collect();
        assert_eq!(ids, vec!["SCAN-1"]);
        assert_eq!(store.list_recent(10).await.unwrap().len(), 1);

        let err = store.report("SCAN-BAD").await.unwrap_err();
        assert!(err.to_string().contains("corrupt report payload"));
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");
        {
            let store = SqliteHistory::open(&path, 20, 50).unwrap();
            store.append(record("SCAN-7", 7)).await.unwrap();
        }
        let store = SqliteHistory::open(&path, 20, 50).unwrap();
        assert_eq!(store.list_recent(5).await.unwrap().len(), 1);
        store.clear().await.unwrap();
        assert!(store.list_recent(5).await.unwrap().is_empty());
    }
}
