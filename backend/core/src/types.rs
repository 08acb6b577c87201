use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AoiGuardError;

/// Discrepancy reported when no catalog part number appears in the OCR text.
pub const PART_NOT_FOUND: &str = "Part number not found in OEM database";

/// Confidence points removed per discrepancy.
pub const DISCREPANCY_PENALTY: usize = 30;

// ---------------------------------------------------------------------------
// Verdicts
// ---------------------------------------------------------------------------

/// Authenticity classification shown to the operator.
///
/// Variants are declared in increasing severity, so `Ord` gives
/// `Genuine < Suspicious < Fake`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Genuine,
    Suspicious,
    Fake,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Genuine => "Genuine",
            Verdict::Suspicious => "Suspicious",
            Verdict::Fake => "Fake",
        }
    }

    /// Verdict derived purely from a discrepancy count on a matched part.
    pub fn from_discrepancy_count(count: usize) -> Self {
        match count {
            0 => Verdict::Genuine,
            1 => Verdict::Suspicious,
            _ => Verdict::Fake,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = AoiGuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "genuine" => Ok(Verdict::Genuine),
            "suspicious" => Ok(Verdict::Suspicious),
            "fake" | "counterfeit" => Ok(Verdict::Fake),
            _ => Err(AoiGuardError::InvalidVerdict(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Reference catalog records
// ---------------------------------------------------------------------------

/// What a single expected marking field represents on the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkingRole {
    Logo,
    PartNumber,
    DateCode,
    Package,
    Country,
    Other,
}

/// One named line of the marking an authentic part carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkingField {
    pub role: MarkingRole,
    pub value: String,
}

/// Authoritative marking specification for one part number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceRecord {
    pub part_number: String,
    pub manufacturer: String,
    /// Ordered as printed on the package. The first field is the primary
    /// marking token checked against every OCR reading.
    pub expected_markings: Vec<MarkingField>,
    pub valid_countries: Vec<String>,
    #[serde(default)]
    pub datasheet_url: String,
    #[serde(default)]
    pub notes: String,
}

impl ReferenceRecord {
    /// The token the manufacturer/logo check looks for.
    pub fn primary_marking(&self) -> Option<&str> {
        self.expected_markings.first().map(|f| f.value.as_str())
    }

    pub fn expected_marking_lines(&self) -> Vec<&str> {
        self.expected_markings.iter().map(|f| f.value.as_str()).collect()
    }

    pub fn marking(&self, role: MarkingRole) -> Option<&str> {
        self.expected_markings
            .iter()
            .find(|f| f.role == role)
            .map(|f| f.value.as_str())
    }
}

/// How the verifier chooses between several part numbers found in one reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CandidatePolicy {
    /// First catalog entry (in catalog order) whose part number matches.
    FirstMatch,
    /// Longest matching part number; ties go to catalog order.
    ///
    /// The more specific record wins, so its part rules apply instead of the
    /// shorter sibling's. A variant needs its own rules registered to be
    /// held to the same checks.
    #[default]
    LongestMatch,
}

// ---------------------------------------------------------------------------
// Verification and fusion outputs
// ---------------------------------------------------------------------------

/// Outcome of checking one OCR reading against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub matched: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<ReferenceRecord>,
    pub discrepancies: Vec<String>,
    pub confidence: u8,
}

impl VerificationResult {
    pub fn not_found() -> Self {
        Self {
            matched: false,
            part_number: None,
            reference: None,
            discrepancies: vec![PART_NOT_FOUND.to_string()],
            confidence: 0,
        }
    }

    pub fn matched(reference: ReferenceRecord, discrepancies: Vec<String>) -> Self {
        let confidence = confidence_for(discrepancies.len());
        Self {
            matched: true,
            part_number: Some(reference.part_number.clone()),
            reference: Some(reference),
            discrepancies,
            confidence,
        }
    }

    pub fn manufacturer(&self) -> Option<&str> {
        self.reference.as_ref().map(|r| r.manufacturer.as_str())
    }

    pub fn is_clean(&self) -> bool {
        self.matched && self.discrepancies.is_empty()
    }
}

/// `max(0, 100 - 30 * discrepancies)`.
pub fn confidence_for(discrepancies: usize) -> u8 {
    100usize.saturating_sub(discrepancies.saturating_mul(DISCREPANCY_PENALTY)) as u8
}

/// Verdict reported by the external vision/classification model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalAssessment {
    pub verdict: Verdict,
    #[serde(alias = "authenticityScore")]
    pub score: f64,
    #[serde(default)]
    pub reasoning: String,
    /// The model's own reading of the markings, when it returns one.
    #[serde(default, alias = "ocrMarkings", skip_serializing_if = "Option::is_none")]
    pub ocr_text: Option<String>,
    #[serde(default)]
    pub flagged_markings: Vec<String>,
}

impl ExternalAssessment {
    pub fn new(verdict: Verdict, score: f64, reasoning: impl Into<String>) -> Self {
        Self {
            verdict,
            score,
            reasoning: reasoning.into(),
            ocr_text: None,
            flagged_markings: Vec::new(),
        }
    }
}

/// Final answer shown to the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FusedVerdict {
    pub verdict: Verdict,
    pub score: f64,
    pub reasoning: String,
}

/// Input handed to the external classifier for one image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    pub ocr_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_number_hint: Option<String>,
}

// ---------------------------------------------------------------------------
// Scan history
// ---------------------------------------------------------------------------

/// Compact entry shown in the recent-scans table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub batch_id: String,
    pub timestamp: DateTime<Utc>,
    pub verdict: Verdict,
    pub score: f64,
    pub operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_number: Option<String>,
}

/// Full report for one scan, as rendered on the report page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedScanReport {
    pub batch_id: String,
    pub verdict: Verdict,
    pub authenticity_score: f64,
    pub operator: String,
    pub timestamp: DateTime<Utc>,
    pub ocr_markings: String,
    pub oem_data: String,
    pub reasoning: String,
    #[serde(default)]
    pub flagged_markings: Vec<String>,
    #[serde(default)]
    pub flagged_oem_data: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasheet_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

impl DetailedScanReport {
    pub fn to_record(&self) -> ScanRecord {
        ScanRecord {
            batch_id: self.batch_id.clone(),
            timestamp: self.timestamp,
            verdict: self.verdict,
            score: self.authenticity_score,
            operator: self.operator.clone(),
            part_number: self.part_number.clone(),
        }
    }
}
