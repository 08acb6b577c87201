//! Country-of-origin token recognition for OCR lines.

use regex::{Regex, RegexBuilder};

/// Origin tokens recognized out of the box. Extra tokens can be supplied
/// through config (`verifier.extraCountryCodes`).
pub const DEFAULT_COUNTRY_CODES: &[&str] = &[
    "CHINA", "MALAYSIA", "USA", "CHN", "MYS", "THA", "PHL", "MLT",
    "PHILIPPINES", "THAILAND", "TAIWAN", "TWN", "KOREA", "JAPAN", "JPN",
    "MEXICO", "MALTA",
];

/// Finds the first OCR line that carries a recognized country token.
#[derive(Debug, Clone)]
pub struct CountryRecognizer {
    codes: Vec<String>,
    pattern: Regex,
}

impl CountryRecognizer {
    pub fn new<I, S>(extra_codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut codes: Vec<String> = DEFAULT_COUNTRY_CODES.iter().map(|c| c.to_string()).collect();
        for code in extra_codes {
            let code = code.as_ref().trim().to_uppercase();
            if !code.is_empty() && !codes.contains(&code) {
                codes.push(code);
            }
        }

        // Longest first so CHINA wins over CHN-style prefixes in the alternation.
        let mut alternation: Vec<String> = codes.iter().map(|c| regex::escape(c)).collect();
        alternation.sort_by(|a, b| b.len().cmp(&a.len()));

        let pattern = RegexBuilder::new(&alternation.join("|"))
            .case_insensitive(true)
            .build()
            .expect("escaped country alternation is a valid regex");

        Self { codes, pattern }
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    /// The first line containing any recognized token, trimmed.
    pub fn find_line<'a>(&self, lines: &[&'a str]) -> Option<&'a str> {
        lines.iter().copied().find(|line| self.pattern.is_match(line))
    }

    /// The recognized token itself, uppercased, if the line has one.
    pub fn token_in(&self, line: &str) -> Option<String> {
        self.pattern.find(line).map(|m| m.as_str().to_uppercase())
    }
}

impl Default for CountryRecognizer {
    fn default() -> Self {
        Self::new(std::iter::empty::<&str>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_first_country_line() {
        let r = CountryRecognizer::default();
        let lines = ["Tl LM358N", "2BF H58K", "China"];
        assert_eq!(r.find_line(&lines), Some("China"));
        assert_eq!(r.token_in("Made in China").as_deref(), Some("CHINA"));
    }

    #[test]
    fn no_country_line() {
        let r = CountryRecognizer::default();
        assert_eq!(r.find_line(&["ATMEL", "ATMEGA328P", "AU 1004"]), None);
    }

    #[test]
    fn extra_codes_extend_the_pattern() {
        let lines = ["ABC123", "VNM"];
        assert_eq!(CountryRecognizer::default().find_line(&lines), None);

        let r = CountryRecognizer::new(["vnm", "CHN"]);
        assert_eq!(r.find_line(&lines), Some("VNM"));
        assert_eq!(r.codes().iter().filter(|c| *c == "CHN").count(), 1);
    }
}
