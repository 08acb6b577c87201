//! Ready-made classifier adapters.
//!
//! Hosted vision models are wired in by the embedding application; the CLI
//! and tests hand the engine an already-known assessment through
//! [`FixedClassifier`].

use anyhow::Result;
use async_trait::async_trait;

use aoiguard_core::{
    AoiGuardError, AuthenticityClassifier, ClassificationRequest, ExternalAssessment,
};

/// Returns the same assessment for every image.
#[derive(Debug, Clone)]
pub struct FixedClassifier {
    assessment: ExternalAssessment,
}

impl FixedClassifier {
    pub fn new(assessment: ExternalAssessment) -> Self {
        Self { assessment }
    }

    /// Load an assessment from JSON using the model's field names
    /// (`verdict`, `authenticityScore`, `reasoning`, `ocrMarkings`, ...).
    pub fn from_json(raw: &str) -> Result<Self> {
        let assessment: ExternalAssessment = serde_json::from_str(raw)?;
        if !(0.0..=100.0).contains(&assessment.score) {
            return Err(AoiGuardError::InvalidScore(assessment.score).into());
        }
        Ok(Self::new(assessment))
    }
}

#[async_trait]
impl AuthenticityClassifier for FixedClassifier {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn classify(&self, _request: &ClassificationRequest) -> Result<ExternalAssessment> {
        Ok(self.assessment.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aoiguard_core::Verdict;

    #[tokio::test]
    async fn returns_loaded_assessment() {
        let raw = r#"{"verdict":"Fake","authenticityScore":22,"reasoning":"Sanded top",
                      "ocrMarkings":"Tl LM358N","flaggedMarkings":["Tl"]}"#;
        let classifier = FixedClassifier::from_json(raw).unwrap();
        let a = classifier.classify(&ClassificationRequest::default()).await.unwrap();
        assert_eq!(a.verdict, Verdict::Fake);
        assert_eq!(a.flagged_markings, vec!["Tl"]);
    }

    #[test]
    fn rejects_out_of_range_score() {
        let err = FixedClassifier::from_json(r#"{"verdict":"Genuine","score":140}"#).unwrap_err();
        assert!(err.to_string().contains("140"));
    }
}
