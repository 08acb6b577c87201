//! Part-specific marking rules.
//!
//! Generic checks (logo, country) run for every part. Some parts have known
//! counterfeit patterns that only make sense for that part number; those live
//! here as rule objects registered in a [`RuleTable`] keyed by part number.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

/// Standalone four-digit group (YYWW date code candidate). ASCII digits and
/// ASCII word boundaries only.
static DATE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u:\b)[0-9]{4}(?-u:\b)").unwrap());

/// Pre-normalized views of one OCR reading, shared by every check.
#[derive(Debug, Clone)]
pub struct MarkingText<'a> {
    pub raw: &'a str,
    /// Uppercased, whitespace preserved.
    pub upper: String,
    /// Uppercased with all whitespace removed.
    pub compact: String,
    /// Non-empty trimmed lines, in order.
    pub lines: Vec<&'a str>,
}

impl<'a> MarkingText<'a> {
    pub fn new(raw: &'a str) -> Self {
        let upper = raw.to_uppercase();
        let compact = upper.chars().filter(|c| !c.is_whitespace()).collect();
        let lines = raw
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        Self { raw, upper, compact, lines }
    }

    /// First standalone four-digit group in the raw text.
    pub fn date_code(&self) -> Option<&'a str> {
        DATE_CODE.find(self.raw).map(|m| m.as_str())
    }

    /// Uppercased alphanumeric tokens ("20AU 0729" → ["20AU", "0729"]).
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.upper
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
    }
}

/// Extra checks for one part number, appended before the generic checks.
pub trait PartRule: Send + Sync {
    /// Short identifier for logs (e.g., "package-date-code").
    fn name(&self) -> &str;

    /// Push a human-readable discrepancy for every deviation found.
    fn check(&self, text: &MarkingText<'_>, discrepancies: &mut Vec<String>);
}

/// Part number → extra rules. Parts without an entry get no extra checks.
#[derive(Clone, Default)]
pub struct RuleTable {
    rules: HashMap<String, Vec<Arc<dyn PartRule>>>,
}

impl RuleTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Rules seeded from known counterfeit patterns.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        table.register(
            "ATMEGA328P",
            PackageDateCodeRule {
                package: "AU".into(),
                confusable_package: "20AU".into(),
                known_bad_date_codes: vec!["0729".into()],
                reference_date_code: "1004".into(),
            },
        );
        table.register(
            "ATMEGA328P-PU",
            ForeignPackageRule {
                package: "PU".into(),
                foreign_packages: vec!["20AU".into(), "AU".into()],
                known_bad_date_codes: vec!["0729".into()],
            },
        );
        table
    }

    pub fn register(&mut self, part_number: impl Into<String>, rule: impl PartRule + 'static) {
        self.rules
            .entry(part_number.into())
            .or_default()
            .push(Arc::new(rule));
    }

    pub fn rules_for(&self, part_number: &str) -> &[Arc<dyn PartRule>] {
        self.rules.get(part_number).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Package/speed-grade token plus YYWW date-code sanity.
///
/// Flags the confusable package token, known-bad date codes, date codes
/// below 1000 (other than the reference code), a missing date code, and a
/// missing package token.
#[derive(Debug, Clone)]
pub struct PackageDateCodeRule {
    pub package: String,
    pub confusable_package: String,
    pub known_bad_date_codes: Vec<String>,
    pub reference_date_code: String,
}

impl PartRule for PackageDateCodeRule {
    fn name(&self) -> &str {
        "package-date-code"
    }

    fn check(&self, text: &MarkingText<'_>, discrepancies: &mut Vec<String>) {
        let package = self.package.to_uppercase();
        let confusable = self.confusable_package.to_uppercase();

        if text.upper.contains(&confusable) {
            discrepancies.push(format!(
                "Package marking shows \"{}\" instead of \"{}\" (speed grade mismatch)",
                self.confusable_package, self.package
            ));
        }

        match text.date_code() {
            Some(code) => {
                let below_range = code.parse::<u32>().map(|v| v < 1000).unwrap_or(false);
                let known_bad = self.known_bad_date_codes.iter().any(|bad| bad == code);
                if known_bad || (below_range && code != self.reference_date_code) {
                    discrepancies.push(format!(
                        "Date code \"{code}\" format suspicious (expected YYWW like \"{}\")",
                        self.reference_date_code
                    ));
                }
            }
            None => discrepancies.push("Date code not found or invalid format".to_string()),
        }

        // The confusable token contains the package token, so it alone
        // counts as "present" here; it was already flagged above.
        if !text.upper.contains(&package) && !text.upper.contains(&confusable) {
            discrepancies.push(format!(
                "Package type marking missing (expected \"{}\")",
                self.package
            ));
        }
    }
}

/// Package token that belongs to a sibling variant, plus known-bad lots.
///
/// Used for parts whose package suffix is already part of the primary
/// marking (ATMEGA328P-PU), where a TQFP token such as "20AU" on the same
/// reading means the marking was copied from another variant.
#[derive(Debug, Clone)]
pub struct ForeignPackageRule {
    pub package: String,
    /// Checked in order; the first one present is reported.
    pub foreign_packages: Vec<String>,
    pub known_bad_date_codes: Vec<String>,
}

impl PartRule for ForeignPackageRule {
    fn name(&self) -> &str {
        "foreign-package"
    }

    fn check(&self, text: &MarkingText<'_>, discrepancies: &mut Vec<String>) {
        let foreign = self.foreign_packages.iter().find(|candidate| {
            let candidate = candidate.to_uppercase();
            text.tokens().any(|token| token == candidate)
        });
        if let Some(foreign) = foreign {
            discrepancies.push(format!(
                "Package marking shows \"{foreign}\" but this part is the \"{}\" package",
                self.package
            ));
        }

        if let Some(code) = text.date_code() {
            if self.known_bad_date_codes.iter().any(|bad| bad == code) {
                discrepancies.push(format!(
                    "Date code \"{code}\" matches a known counterfeit lot"
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_for(part_number: &str, text: &str) -> Vec<String> {
        let table = RuleTable::builtin();
        let mut out = Vec::new();
        let marking = MarkingText::new(text);
        for rule in table.rules_for(part_number) {
            rule.check(&marking, &mut out);
        }
        out
    }

    fn run(text: &str) -> Vec<String> {
        run_for("ATMEGA328P", text)
    }

    #[test]
    fn marking_text_views() {
        let t = MarkingText::new("  Tl LM358N \n\n 2BF H58K\nCHINA ");
        assert_eq!(t.lines, vec!["Tl LM358N", "2BF H58K", "CHINA"]);
        assert_eq!(t.compact, "TLLM358N2BFH58KCHINA");
        assert!(t.upper.contains("TL LM358N"));
    }

    #[test]
    fn date_code_needs_a_standalone_group() {
        assert_eq!(MarkingText::new("ATMEGA328P\nAU 1004").date_code(), Some("1004"));
        assert_eq!(MarkingText::new("20AU 0729").date_code(), Some("0729"));
        assert_eq!(MarkingText::new("X12345").date_code(), None);
    }

    #[test]
    fn non_ascii_digits_are_not_a_date_code() {
        // Arabic-Indic "1004"
        assert_eq!(MarkingText::new("AU \u{661}\u{660}\u{660}\u{664}").date_code(), None);
        assert_eq!(MarkingText::new("\u{e9}1004").date_code(), Some("1004"));
        assert_eq!(
            run("ATMEL\nATMEGA328P\nAU \u{661}\u{660}\u{660}\u{664}"),
            vec!["Date code not found or invalid format"]
        );
    }

    #[test]
    fn genuine_atmega_passes() {
        assert!(run("ATMEL\nATMEGA328P\nAU 1004").is_empty());
    }

    #[test]
    fn speed_grade_and_bad_date_code() {
        let found = run("ATMEL\nATMEGA328P\n20AU 0729");
        assert_eq!(found.len(), 2);
        assert!(found[0].contains("20AU"));
        assert!(found[1].contains("0729"));
    }

    #[test]
    fn low_date_code_flagged() {
        let found = run("ATMEL\nATMEGA328P\nAU 0412");
        assert_eq!(found, vec!["Date code \"0412\" format suspicious (expected YYWW like \"1004\")"]);
    }

    #[test]
    fn missing_date_code_and_package() {
        let found = run("ATMEL\nATMEGA328P");
        assert_eq!(
            found,
            vec![
                "Date code not found or invalid format".to_string(),
                "Package type marking missing (expected \"AU\")".to_string(),
            ]
        );
    }

    #[test]
    fn pdip_variant_rejects_tqfp_package_and_bad_lot() {
        let found = run_for("ATMEGA328P-PU", "ATMEL\nATMEGA328P-PU\n20AU 0729");
        assert_eq!(
            found,
            vec![
                "Package marking shows \"20AU\" but this part is the \"PU\" package",
                "Date code \"0729\" matches a known counterfeit lot",
            ]
        );
        assert_eq!(
            run_for("ATMEGA328P-PU", "ATMEGA328P-PU\nAU 1834"),
            vec!["Package marking shows \"AU\" but this part is the \"PU\" package"]
        );
        assert!(run_for("ATMEGA328P-PU", "ATMEGA328P-PU\n1834\ne3\nTHA").is_empty());
    }

    #[test]
    fn parts_without_rules_get_none() {
        let table = RuleTable::builtin();
        assert!(table.rules_for("LM358N").is_empty());
        assert_eq!(table.len(), 2);
    }
}
