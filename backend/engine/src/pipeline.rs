//! Scan pipeline: one image in, one stored report out.
//!
//! Steps per scan: verify the OCR text, ask the external classifier (if any),
//! re-verify against the classifier's own reading when it returns one, fuse,
//! then record the result in the injected history store. Classifier and
//! storage failures are logged and never abort the scan.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use aoiguard_core::{
    AuthenticityClassifier, ClassificationRequest, DetailedScanReport, ExternalAssessment,
    FusedVerdict, ScanHistoryStore, VerificationResult,
};

use crate::compare::{compare_markings, MarkingComparison};
use crate::fusion::FusionPolicy;
use crate::verifier::OemVerifier;

pub const DEFAULT_OPERATOR: &str = "operator";

#[derive(Debug, Clone, Default)]
pub struct ScanInput {
    pub ocr_text: String,
    pub image_ref: Option<String>,
}

impl ScanInput {
    pub fn from_text(ocr_text: impl Into<String>) -> Self {
        Self { ocr_text: ocr_text.into(), image_ref: None }
    }
}

/// Why the external classifier gave no assessment for one scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierFailure {
    pub classifier: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOutcome {
    pub report: DetailedScanReport,
    pub verification: VerificationResult,
    pub fused: FusedVerdict,
    pub comparison: Option<MarkingComparison>,
    pub external: Option<ExternalAssessment>,
    /// Set when a classifier was configured but failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifier_failure: Option<ClassifierFailure>,
    /// False when the history store rejected the record.
    pub stored: bool,
}

pub struct ScanPipeline {
    verifier: Arc<OemVerifier>,
    fusion: FusionPolicy,
    store: Arc<dyn ScanHistoryStore>,
    classifier: Option<Arc<dyn AuthenticityClassifier>>,
    operator: String,
}

impl ScanPipeline {
    pub fn new(verifier: Arc<OemVerifier>, store: Arc<dyn ScanHistoryStore>) -> Self {
        Self {
            verifier,
            fusion: FusionPolicy::default(),
            store,
            classifier: None,
            operator: DEFAULT_OPERATOR.to_string(),
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn AuthenticityClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_fusion_policy(mut self, fusion: FusionPolicy) -> Self {
        self.fusion = fusion;
        self
    }

    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = operator.into();
        self
    }

    /// Scan a batch one image at a time, in input order.
    pub async fn scan_batch(&self, inputs: Vec<ScanInput>) -> Vec<ScanOutcome> {
        let mut outcomes = Vec::with_capacity(inputs.len());
        for (index, input) in inputs.into_iter().enumerate() {
            outcomes.push(self.scan(index, input).await);
        }
        outcomes
    }

    pub async fn scan(&self, index: usize, input: ScanInput) -> ScanOutcome {
        let initial = self.verifier.verify(&input.ocr_text);
        let (external, classifier_failure) = match self.classify(&input, &initial).await {
            Ok(external) => (external, None),
            Err(failure) => (None, Some(failure)),
        };

        // The classifier's own reading supersedes the supplied text.
        let verification = match external.as_ref().and_then(|a| a.ocr_text.as_deref()) {
            Some(text) if !text.trim().is_empty() => self.verifier.verify(text),
            _ => initial,
        };

        let fused = self.fusion.resolve(&verification, external.as_ref());

        let ocr_markings = if input.ocr_text.trim().is_empty() {
            external
                .as_ref()
                .and_then(|a| a.ocr_text.clone())
                .unwrap_or_default()
        } else {
            input.ocr_text.clone()
        };

        let comparison = verification
            .reference
            .as_ref()
            .map(|r| compare_markings(&ocr_markings, r));

        let report = self.build_report(index, &input, &ocr_markings, &verification, &fused, external.as_ref());

        info!(
            batch_id = %report.batch_id,
            verdict = %fused.verdict,
            score = fused.score,
            part_number = verification.part_number.as_deref().unwrap_or("-"),
            discrepancies = verification.discrepancies.len(),
            "Scan complete"
        );

        let stored = self.record(&report).await;

        ScanOutcome {
            report,
            verification,
            fused,
            comparison,
            external,
            classifier_failure,
            stored,
        }
    }

    async fn classify(
        &self,
        input: &ScanInput,
        verification: &VerificationResult,
    ) -> Result<Option<ExternalAssessment>, ClassifierFailure> {
        let Some(classifier) = self.classifier.as_ref() else {
            return Ok(None);
        };
        let request = ClassificationRequest {
            image_ref: input.image_ref.clone(),
            ocr_text: input.ocr_text.clone(),
            part_number_hint: verification.part_number.clone(),
        };
        match classifier.classify(&request).await {
            Ok(assessment) => Ok(Some(assessment)),
            Err(e) => {
                warn!(
                    classifier = classifier.name(),
                    error = %e,
                    "Classifier unavailable; using verifier result alone"
                );
                Err(ClassifierFailure {
                    classifier: classifier.name().to_string(),
                    error: e.to_string(),
                })
            }
        }
    }

    fn build_report(
        &self,
        index: usize,
        input: &ScanInput,
        ocr_markings: &str,
        verification: &VerificationResult,
        fused: &FusedVerdict,
        external: Option<&ExternalAssessment>,
    ) -> DetailedScanReport {
        let now = Utc::now();
        let reference = verification.reference.as_ref();
        let expected: Vec<String> = reference
            .map(|r| r.expected_marking_lines().into_iter().map(str::to_string).collect())
            .unwrap_or_default();

        let oem_data = if expected.is_empty() {
            let part = ocr_markings.lines().nth(1).map(str::trim).unwrap_or("Unknown");
            format!("Part Number: {part}")
        } else {
            expected.join("\n")
        };

        let flagged_markings = match external {
            Some(a) => a.flagged_markings.clone(),
            None => ocr_markings.lines().take(2).map(str::to_string).collect(),
        };

        DetailedScanReport {
            batch_id: format!("SCAN-{}-{}", now.timestamp_millis(), index),
            verdict: fused.verdict,
            authenticity_score: fused.score,
            operator: self.operator.clone(),
            timestamp: now,
            ocr_markings: ocr_markings.to_string(),
            oem_data,
            reasoning: fused.reasoning.clone(),
            flagged_markings,
            flagged_oem_data: expected.into_iter().take(2).collect(),
            part_number: verification.part_number.clone(),
            datasheet_url: reference
                .map(|r| r.datasheet_url.clone())
                .filter(|u| !u.is_empty()),
            image_ref: input.image_ref.clone(),
        }
    }

    async fn record(&self, report: &DetailedScanReport) -> bool {
        if let Err(e) = self.store.append(report.to_record()).await {
            warn!(batch_id = %report.batch_id, error = %e, "Failed to save scan to history");
            return false;
        }
        if let Err(e) = self.store.save_report(report.clone()).await {
            warn!(batch_id = %report.batch_id, error = %e, "Failed to save detailed report");
            return false;
        }
        true
    }
}
