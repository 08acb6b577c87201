use anyhow::Result;
use async_trait::async_trait;

use crate::types::{ClassificationRequest, DetailedScanReport, ExternalAssessment, ScanRecord};

/// External vision/classification model that reads an IC image and returns
/// its own authenticity opinion.
///
/// Implementations usually wrap a hosted model call; the engine only ever
/// sees the resolved assessment.
#[async_trait]
pub trait AuthenticityClassifier: Send + Sync {
    /// Provider name (e.g., "gemini-vision", "fixed").
    fn name(&self) -> &str;

    /// Classify one image. An error means the classifier is unavailable for
    /// this scan and the caller falls back to the verifier alone.
    async fn classify(&self, request: &ClassificationRequest) -> Result<ExternalAssessment>;
}

/// Persistence for scan history, injected into the scan pipeline.
///
/// Lists are most-recent-first. Stores may cap how many entries they keep.
#[async_trait]
pub trait ScanHistoryStore: Send + Sync {
    async fn append(&self, record: ScanRecord) -> Result<()>;

    async fn list_recent(&self, limit: usize) -> Result<Vec<ScanRecord>>;

    /// Insert a report, replacing any existing report with the same batch id.
    async fn save_report(&self, report: DetailedScanReport) -> Result<()>;

    async fn report(&self, batch_id: &str) -> Result<Option<DetailedScanReport>>;

    async fn reports(&self) -> Result<Vec<DetailedScanReport>>;

    async fn clear(&self) -> Result<()>;
}
