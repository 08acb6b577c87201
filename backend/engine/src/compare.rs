//! Side-by-side comparison of extracted vs expected marking lines.

use serde::Serialize;

use aoiguard_core::ReferenceRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub observed: Option<String>,
    pub expected: Option<String>,
    /// The observed line appears somewhere in the expected marking text.
    pub matches: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkingComparison {
    pub rows: Vec<ComparisonRow>,
    /// Observed and expected text are identical once joined and uppercased.
    pub identical: bool,
}

impl MarkingComparison {
    pub fn mismatched_lines(&self) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .filter(|r| !r.matches)
            .filter_map(|r| r.observed.as_deref())
    }
}

pub fn compare_markings(ocr_text: &str, reference: &ReferenceRecord) -> MarkingComparison {
    let observed: Vec<&str> = ocr_text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let expected = reference.expected_marking_lines();

    let expected_joined = expected.join(" ").to_uppercase();
    let observed_joined = observed.join(" ").to_uppercase();

    let rows = (0..observed.len().max(expected.len()))
        .map(|i| {
            let obs = observed.get(i).copied();
            ComparisonRow {
                observed: obs.map(str::to_string),
                expected: expected.get(i).map(|s| s.to_string()),
                matches: obs
                    .map(|o| expected_joined.contains(&o.to_uppercase()))
                    .unwrap_or(false),
            }
        })
        .collect();

    MarkingComparison {
        rows,
        identical: observed_joined == expected_joined,
    }
}
