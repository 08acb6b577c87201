//! Verdict fusion: reconciles the rule-based verifier with the external
//! classifier's opinion.
//!
//! Once the verifier has matched a part, its discrepancy count decides the
//! verdict and its confidence is a hard ceiling on the score. When the part
//! is unknown the external classifier's answer passes through unchanged.

use tracing::warn;

use aoiguard_core::{ExternalAssessment, FusedVerdict, Verdict, VerificationResult};

/// Score used when neither source can vouch for the part.
pub const DEFAULT_UNMATCHED_SCORE: f64 = 50.0;

/// Fuse a verification result with an external verdict, score, and reasoning.
pub fn fuse(
    result: &VerificationResult,
    external_verdict: Verdict,
    external_score: f64,
    external_reasoning: &str,
) -> FusedVerdict {
    let external_score = clamp_score(external_score);

    if !result.matched {
        return FusedVerdict {
            verdict: external_verdict,
            score: external_score,
            reasoning: external_reasoning.to_string(),
        };
    }

    let ceiling = f64::from(result.confidence);
    let score = ceiling.max(external_score.min(ceiling));

    let reasoning = if result.discrepancies.is_empty() {
        format!(
            "Verified against {} official specifications. All markings match OEM datasheet.",
            manufacturer(result)
        )
    } else {
        let check = format!("OEM Database Check: {}.", result.discrepancies.join(". "));
        if external_reasoning.trim().is_empty() {
            check
        } else {
            format!("{check} {external_reasoning}")
        }
    };

    FusedVerdict {
        verdict: Verdict::from_discrepancy_count(result.discrepancies.len()),
        score,
        reasoning,
    }
}

/// Final verdict when no external classifier result is available.
///
/// An unknown part is never reported as genuine: it comes back
/// `Suspicious` with `unmatched_score`.
pub fn fuse_verifier_only(result: &VerificationResult, unmatched_score: f64) -> FusedVerdict {
    if !result.matched {
        return FusedVerdict {
            verdict: Verdict::Suspicious,
            score: clamp_score(unmatched_score),
            reasoning: "Part number not found in OEM database. Unable to verify authenticity. \
                        Recommend manual inspection."
                .to_string(),
        };
    }

    let verdict = Verdict::from_discrepancy_count(result.discrepancies.len());
    let reasoning = match verdict {
        Verdict::Genuine => format!(
            "Verified against {} official specifications. All markings match OEM datasheet. \
             Logo, date code, and country of origin validated.",
            manufacturer(result)
        ),
        Verdict::Suspicious => format!(
            "Minor discrepancy found: {}. Part may be remarked, refurbished, or old stock. \
             Further investigation recommended.",
            result.discrepancies[0]
        ),
        Verdict::Fake => format!(
            "COUNTERFEIT DETECTED: {}. Critical mismatches with official {} specifications.",
            result.discrepancies.join(". "),
            manufacturer(result)
        ),
    };

    FusedVerdict {
        verdict,
        score: f64::from(result.confidence),
        reasoning,
    }
}

/// Fusion settings that outlive a single call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionPolicy {
    pub unmatched_score: f64,
}

impl Default for FusionPolicy {
    fn default() -> Self {
        Self { unmatched_score: DEFAULT_UNMATCHED_SCORE }
    }
}

impl FusionPolicy {
    pub fn new(unmatched_score: f64) -> Self {
        Self { unmatched_score }
    }

    /// Fuse with the external assessment when there is one, otherwise fall
    /// back to the verifier alone.
    pub fn resolve(
        &self,
        result: &VerificationResult,
        external: Option<&ExternalAssessment>,
    ) -> FusedVerdict {
        match external {
            Some(a) => fuse(result, a.verdict, a.score, &a.reasoning),
            None => fuse_verifier_only(result, self.unmatched_score),
        }
    }
}

fn manufacturer(result: &VerificationResult) -> &str {
    result.manufacturer().unwrap_or("OEM")
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        warn!("External score is NaN; treating as 0");
        return 0.0;
    }
    if !(0.0..=100.0).contains(&score) {
        warn!(score, "External score outside 0..=100; clamping");
    }
    score.clamp(0.0, 100.0)
}
