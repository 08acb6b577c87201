//! `aoiguard history`: recent scans, dashboard statistics and the audit log.

use anyhow::Result;
use chrono::Utc;
use clap::Subcommand;

use aoiguard_config::HistoryBackend;
use aoiguard_history::{
    audit_log, dashboard_rows, score_trend, AuditFilter, AuditStatus, ScanStatistics,
};

use crate::runtime::Runtime;
use crate::terminal_output::{note_info, note_success, render_table, verdict_badge, Column};

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// Show the most recent scans
    Recent {
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
    /// Totals per verdict, the average score and the per-day score trend
    Stats,
    /// Audit log of completed scans
    Audit {
        /// Case-insensitive text matched against action, operator, details and batch id
        #[arg(short, long)]
        search: Option<String>,
        /// Only entries with this status (success, warning, failed)
        #[arg(long)]
        status: Option<AuditStatus>,
        #[arg(short = 'n', long, default_value_t = 50)]
        limit: usize,
    },
    /// Delete all stored scans and reports
    Clear,
}

pub async fn run(cmd: HistoryCommands, runtime: &Runtime) -> Result<()> {
    if runtime.config.history_backend() == HistoryBackend::Memory {
        note_info("history.backend is 'memory'; nothing persists between runs");
    }

    match cmd {
        HistoryCommands::Recent { limit } => {
            let records = runtime.history.list_recent(limit).await?;
            if records.is_empty() {
                note_info("No scans recorded yet");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = dashboard_rows(&records, Utc::now())
                .into_iter()
                .map(|row| {
                    vec![
                        row.batch_id,
                        row.time,
                        verdict_badge(row.status),
                        format!("{:.0}", row.score),
                        row.operator,
                    ]
                })
                .collect();
            let columns = [
                Column::left("Batch"),
                Column::left("Time"),
                Column::left("Status"),
                Column::right("Score"),
                Column::left("Operator"),
            ];
            print!("{}", render_table(&columns, &rows));
        }
        HistoryCommands::Stats => {
            let records = runtime.history.list_recent(runtime.config.max_scans()).await?;
            let stats = ScanStatistics::from_records(&records);
            println!("Total scans:   {}", stats.total);
            println!("Genuine:       {}", stats.genuine);
            println!("Suspicious:    {}", stats.suspicious);
            println!("Fake:          {}", stats.fake);
            println!("Average score: {:.1}", stats.average_score);

            let trend = score_trend(&records);
            if !trend.is_empty() {
                println!();
                let rows: Vec<Vec<String>> = trend
                    .into_iter()
                    .map(|point| {
                        vec![
                            point.label,
                            point.scans.to_string(),
                            format!("{:.1}", point.average_score),
                        ]
                    })
                    .collect();
                let columns = [
                    Column::left("Day"),
                    Column::right("Scans"),
                    Column::right("Avg score"),
                ];
                print!("{}", render_table(&columns, &rows));
            }
        }
        HistoryCommands::Audit { search, status, limit } => {
            let records = runtime.history.list_recent(limit).await?;
            let entries = audit_log(&records, &AuditFilter { search, status });
            if entries.is_empty() {
                note_info("No matching audit entries");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = entries
                .into_iter()
                .map(|entry| {
                    vec![
                        entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                        entry.user,
                        entry.action,
                        entry.status.to_string(),
                        entry.details,
                    ]
                })
                .collect();
            let columns = [
                Column::left("Time"),
                Column::left("User"),
                Column::left("Action"),
                Column::left("Status"),
                Column::left("Details"),
            ];
            print!("{}", render_table(&columns, &rows));
        }
        HistoryCommands::Clear => {
            runtime.history.clear().await?;
            note_success("Scan history cleared");
        }
    }
    Ok(())
}
