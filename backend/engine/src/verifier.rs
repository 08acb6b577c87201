//! OEM verifier: matches an OCR reading to a catalog record and lists every
//! deviation from that record's expected markings.
//!
//! `verify` is total and pure: any string (including empty or garbage text)
//! yields a well-formed [`VerificationResult`].

use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::debug;

use aoiguard_core::{CandidatePolicy, ReferenceRecord, VerificationResult};

use crate::catalog::Catalog;
use crate::country::CountryRecognizer;
use crate::rules::{MarkingText, RuleTable};

static DEFAULT_VERIFIER: Lazy<OemVerifier> =
    Lazy::new(|| OemVerifier::new(Arc::new(Catalog::embedded().clone())));

/// Verify against the embedded catalog with default settings.
pub fn verify(ocr_text: &str) -> VerificationResult {
    DEFAULT_VERIFIER.verify(ocr_text)
}

#[derive(Clone)]
pub struct OemVerifier {
    catalog: Arc<Catalog>,
    rules: RuleTable,
    countries: CountryRecognizer,
    policy: CandidatePolicy,
}

impl OemVerifier {
    /// Built-in part rules, default country tokens, longest-match candidates.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            rules: RuleTable::builtin(),
            countries: CountryRecognizer::default(),
            policy: CandidatePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: CandidatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_rules(mut self, rules: RuleTable) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_extra_country_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.countries = CountryRecognizer::new(codes);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn policy(&self) -> CandidatePolicy {
        self.policy
    }

    pub fn verify(&self, ocr_text: &str) -> VerificationResult {
        let text = MarkingText::new(ocr_text);

        let Some(reference) = self.find_candidate(&text) else {
            debug!(chars = ocr_text.len(), "No catalog part number in OCR text");
            return VerificationResult::not_found();
        };

        let mut discrepancies = Vec::new();

        for rule in self.rules.rules_for(&reference.part_number) {
            let before = discrepancies.len();
            rule.check(&text, &mut discrepancies);
            debug!(
                part_number = %reference.part_number,
                rule = rule.name(),
                found = discrepancies.len() - before,
                "Part rule checked"
            );
        }

        check_primary_marking(reference, &text, &mut discrepancies);
        self.check_country(reference, &text, &mut discrepancies);

        debug!(
            part_number = %reference.part_number,
            discrepancies = discrepancies.len(),
            "Verified OCR text against OEM reference"
        );
        VerificationResult::matched(reference.clone(), discrepancies)
    }

    /// Every catalog record whose part number occurs in the text, in
    /// catalog order.
    pub fn candidates<'c>(&'c self, text: &MarkingText<'_>) -> Vec<&'c ReferenceRecord> {
        self.catalog
            .iter()
            .filter(|record| part_number_occurs(&record.part_number, text))
            .collect()
    }

    fn find_candidate(&self, text: &MarkingText<'_>) -> Option<&ReferenceRecord> {
        match self.policy {
            CandidatePolicy::FirstMatch => self
                .catalog
                .iter()
                .find(|record| part_number_occurs(&record.part_number, text)),
            CandidatePolicy::LongestMatch => {
                let mut best: Option<&ReferenceRecord> = None;
                for record in self.candidates(text) {
                    let longer = best
                        .map(|b| compact_len(&record.part_number) > compact_len(&b.part_number))
                        .unwrap_or(true);
                    if longer {
                        best = Some(record);
                    }
                }
                best
            }
        }
    }

    fn check_country(
        &self,
        reference: &ReferenceRecord,
        text: &MarkingText<'_>,
        discrepancies: &mut Vec<String>,
    ) {
        if reference
            .valid_countries
            .iter()
            .any(|country| text.upper.contains(country.as_str()))
        {
            return;
        }

        // No country line at all is not evidence either way.
        if let Some(line) = self.countries.find_line(&text.lines) {
            discrepancies.push(format!(
                "Invalid country of origin: {line}. Expected: {}",
                reference.valid_countries.join(", ")
            ));
        }
    }
}

/// Whitespace- and case-insensitive containment, with a verbatim
/// (case-insensitive) fallback for part numbers whose spacing varies.
fn part_number_occurs(part_number: &str, text: &MarkingText<'_>) -> bool {
    let upper = part_number.to_uppercase();
    let compact: String = upper.chars().filter(|c| !c.is_whitespace()).collect();
    (!compact.is_empty() && text.compact.contains(&compact)) || text.upper.contains(&upper)
}

fn compact_len(part_number: &str) -> usize {
    part_number.chars().filter(|c| !c.is_whitespace()).count()
}

fn check_primary_marking(
    reference: &ReferenceRecord,
    text: &MarkingText<'_>,
    discrepancies: &mut Vec<String>,
) {
    let Some(expected) = reference.primary_marking() else {
        return;
    };
    if !text.upper.contains(&expected.to_uppercase()) {
        discrepancies.push(format!("Manufacturer marking mismatch. Expected: {expected}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aoiguard_core::PART_NOT_FOUND;

    #[test]
    fn empty_text_is_not_found() {
        let r = verify("");
        assert!(!r.matched);
        assert_eq!(r.discrepancies, vec![PART_NOT_FOUND]);
    }

    #[test]
    fn matching_ignores_case_and_spacing() {
        let r = verify("atmel\natmega 328p\nau 1004");
        assert_eq!(r.part_number.as_deref(), Some("ATMEGA328P"));
        assert!(r.discrepancies.is_empty(), "{:?}", r.discrepancies);
    }

    #[test]
    fn longest_match_prefers_specific_variant() {
        let r = verify("ATMEGA328P-PU\n1834\ne3\nTHA");
        assert_eq!(r.part_number.as_deref(), Some("ATMEGA328P-PU"));
        assert_eq!(r.confidence, 100);
    }

    #[test]
    fn first_match_keeps_catalog_order() {
        let verifier = OemVerifier::new(Arc::new(Catalog::embedded().clone()))
            .with_policy(CandidatePolicy::FirstMatch);
        let r = verifier.verify("ATMEGA328P-PU\n1834\ne3\nTHA");
        assert_eq!(r.part_number.as_deref(), Some("ATMEGA328P"));
    }

    #[test]
    fn candidates_lists_all_matches() {
        let verifier = OemVerifier::new(Arc::new(Catalog::embedded().clone()));
        let text = MarkingText::new("ATMEGA328P-PU");
        let parts: Vec<&str> = verifier
            .candidates(&text)
            .iter()
            .map(|r| r.part_number.as_str())
            .collect();
        assert_eq!(parts, vec!["ATMEGA328P", "ATMEGA328P-PU"]);
    }

    #[test]
    fn missing_country_line_raises_nothing() {
        let r = verify("TI\nLM358N\n2347");
        assert!(r.discrepancies.is_empty());
    }

    #[test]
    fn extra_country_code_is_recognized() {
        let verifier = OemVerifier::new(Arc::new(Catalog::embedded().clone()))
            .with_extra_country_codes(["VNM"]);
        let r = verifier.verify("TI\nLM358N\n2347\nVNM");
        assert_eq!(r.discrepancies.len(), 1);
        assert!(r.discrepancies[0].starts_with("Invalid country of origin: VNM"));
    }

    #[test]
    fn custom_rule_table_is_used() {
        let verifier = OemVerifier::new(Arc::new(Catalog::embedded().clone()))
            .with_rules(RuleTable::empty());
        let r = verifier.verify("ATMEL\nATMEGA328P\n20AU 0729");
        assert!(r.discrepancies.is_empty());
    }
}
