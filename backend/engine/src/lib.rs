//! `aoiguard-engine`: OEM marking verification for IC counterfeit screening.
//!
//! Provides:
//! - Reference catalog (embedded table or YAML/JSON/TOML file)
//! - Part-specific rule table for known counterfeit patterns
//! - The OEM verifier and its confidence scoring
//! - Verdict fusion with an external classifier's opinion
//! - Extracted-vs-expected marking comparison
//! - The per-image scan pipeline that records results to history

pub mod catalog;
pub mod classifier;
pub mod compare;
pub mod country;
pub mod fusion;
pub mod pipeline;
pub mod rules;
pub mod verifier;

pub use catalog::Catalog;
pub use classifier::FixedClassifier;
pub use compare::{compare_markings, ComparisonRow, MarkingComparison};
pub use country::{CountryRecognizer, DEFAULT_COUNTRY_CODES};
pub use fusion::{fuse, fuse_verifier_only, FusionPolicy, DEFAULT_UNMATCHED_SCORE};
pub use pipeline::{ClassifierFailure, ScanInput, ScanOutcome, ScanPipeline, DEFAULT_OPERATOR};
pub use rules::{ForeignPackageRule, MarkingText, PackageDateCodeRule, PartRule, RuleTable};
pub use verifier::{verify, OemVerifier};
