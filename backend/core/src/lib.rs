pub mod error;
pub mod traits;
pub mod types;

pub use error::AoiGuardError;
pub use traits::{AuthenticityClassifier, ScanHistoryStore};
pub use types::{
    confidence_for, CandidatePolicy, ClassificationRequest, DetailedScanReport,
    ExternalAssessment, FusedVerdict, MarkingField, MarkingRole, ReferenceRecord, ScanRecord,
    Verdict, VerificationResult, DISCREPANCY_PENALTY, PART_NOT_FOUND,
};
