use thiserror::Error;

/// Top-level error type for AOI Guard.
///
/// The verifier and fusion policy never fail; these variants cover the
/// edges around them (catalog files, config, storage, the external model).
#[derive(Debug, Error)]
pub enum AoiGuardError {
    #[error("failed to load OEM catalog from {path}: {message}")]
    CatalogLoad { path: String, message: String },

    #[error("duplicate part number in OEM catalog: {0}")]
    DuplicatePartNumber(String),

    #[error("invalid reference record for {part_number}: {message}")]
    InvalidReference { part_number: String, message: String },

    #[error("unknown verdict '{0}' (expected Genuine, Fake, or Suspicious)")]
    InvalidVerdict(String),

    #[error("authenticity score {0} is outside 0..=100")]
    InvalidScore(f64),

    #[error("external classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    #[error("scan history storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
