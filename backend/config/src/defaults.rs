//! Config defaults applied after parsing.

use crate::schema::{AoiGuardConfig, FusionConfig, HistoryConfig, LoggingConfig, VerifierConfig};

pub const DEFAULT_UNMATCHED_FALLBACK_SCORE: f64 = 50.0;

/// Recent scans kept for the dashboard.
pub const DEFAULT_MAX_SCANS: usize = 20;

/// Detailed reports kept.
pub const DEFAULT_MAX_REPORTS: usize = 50;

pub const DEFAULT_HISTORY_OPERATOR: &str = "operator";

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Fill every unset value so a written-out config documents the effective
/// settings.
pub fn apply_all_defaults(config: AoiGuardConfig) -> AoiGuardConfig {
    let config = apply_verifier_defaults(config);
    let config = apply_fusion_defaults(config);
    let config = apply_history_defaults(config);
    apply_logging_defaults(config)
}

fn apply_verifier_defaults(mut config: AoiGuardConfig) -> AoiGuardConfig {
    let verifier = config.verifier.get_or_insert_with(VerifierConfig::default);
    verifier.candidate_policy.get_or_insert_with(Default::default);
    for code in &mut verifier.extra_country_codes {
        *code = code.trim().to_uppercase();
    }
    config
}

fn apply_fusion_defaults(mut config: AoiGuardConfig) -> AoiGuardConfig {
    let fusion = config.fusion.get_or_insert_with(FusionConfig::default);
    fusion
        .unmatched_fallback_score
        .get_or_insert(DEFAULT_UNMATCHED_FALLBACK_SCORE);
    config
}

fn apply_history_defaults(mut config: AoiGuardConfig) -> AoiGuardConfig {
    let history = config.history.get_or_insert_with(HistoryConfig::default);
    history.backend.get_or_insert_with(Default::default);
    history.max_scans.get_or_insert(DEFAULT_MAX_SCANS);
    history.max_reports.get_or_insert(DEFAULT_MAX_REPORTS);
    if history.operator.is_none() {
        history.operator = Some(DEFAULT_HISTORY_OPERATOR.to_string());
    }
    config
}

fn apply_logging_defaults(mut config: AoiGuardConfig) -> AoiGuardConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    logging.json.get_or_insert(true);
    config
}
