//! OEM reference catalog: authoritative marking specs keyed by part number.
//!
//! The catalog is loaded once (embedded table or a YAML/JSON/TOML file) and
//! is read-only afterwards. Iteration follows file order, which the verifier
//! relies on for tie-breaking.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use aoiguard_core::{AoiGuardError, ReferenceRecord};

const EMBEDDED_CATALOG: &str = include_str!("../data/oem_catalog.yaml");

static EMBEDDED: Lazy<Catalog> = Lazy::new(|| {
    Catalog::from_yaml_str(EMBEDDED_CATALOG).expect("embedded OEM catalog is valid")
});

/// Accepted marking field counts per record.
const MIN_MARKINGS: usize = 3;
const MAX_MARKINGS: usize = 4;

/// On-disk shape shared by every supported format.
#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    parts: Vec<ReferenceRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<ReferenceRecord>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog, validating every record and rejecting duplicate keys.
    pub fn new(records: Vec<ReferenceRecord>) -> Result<Self, AoiGuardError> {
        let mut catalog = Catalog::default();
        for record in records {
            let record = normalize(record)?;
            if catalog.index.contains_key(&record.part_number) {
                return Err(AoiGuardError::DuplicatePartNumber(record.part_number));
            }
            catalog
                .index
                .insert(record.part_number.clone(), catalog.records.len());
            catalog.records.push(record);
        }
        Ok(catalog)
    }

    /// The catalog compiled into the binary.
    pub fn embedded() -> &'static Catalog {
        &EMBEDDED
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let file: CatalogFile = serde_yaml::from_str(raw).context("Failed to parse catalog YAML")?;
        Ok(Self::new(file.parts)?)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(raw).context("Failed to parse catalog JSON")?;
        Ok(Self::new(file.parts)?)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(raw).context("Failed to parse catalog TOML")?;
        Ok(Self::new(file.parts)?)
    }

    /// Load a catalog file; the format is chosen by extension
    /// (`.yaml`/`.yml`, `.json`, `.toml`).
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let catalog = match ext.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&raw),
            "json" => Self::from_json_str(&raw),
            "toml" => Self::from_toml_str(&raw),
            other => Err(AoiGuardError::CatalogLoad {
                path: path.display().to_string(),
                message: format!("unsupported catalog format '{other}'"),
            }
            .into()),
        }
        .with_context(|| format!("Failed to load catalog: {}", path.display()))?;

        info!(path = %path.display(), parts = catalog.len(), "Loaded OEM catalog");
        Ok(catalog)
    }

    /// Overlay `other` on top of this catalog. Records with an existing part
    /// number replace it in place; new part numbers are appended.
    pub fn merged_with(&self, other: &Catalog) -> Catalog {
        let mut merged = self.clone();
        for record in &other.records {
            match merged.index.get(&record.part_number) {
                Some(&i) => {
                    debug!(part_number = %record.part_number, "Catalog overlay replaces record");
                    merged.records[i] = record.clone();
                }
                None => {
                    merged
                        .index
                        .insert(record.part_number.clone(), merged.records.len());
                    merged.records.push(record.clone());
                }
            }
        }
        merged
    }

    /// Exact-key lookup. Unknown part numbers are simply absent.
    pub fn lookup(&self, part_number: &str) -> Option<&ReferenceRecord> {
        self.index.get(part_number).map(|&i| &self.records[i])
    }

    /// Expected marking lines for a part, newline-joined for display.
    pub fn expected_markings(&self, part_number: &str) -> Option<String> {
        self.lookup(part_number)
            .map(|r| r.expected_marking_lines().join("\n"))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceRecord> {
        self.records.iter()
    }

    pub fn part_numbers(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.part_number.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn normalize(mut record: ReferenceRecord) -> Result<ReferenceRecord, AoiGuardError> {
    record.part_number = record.part_number.trim().to_string();
    let invalid = |message: &str| AoiGuardError::InvalidReference {
        part_number: record.part_number.clone(),
        message: message.to_string(),
    };

    if record.part_number.is_empty() {
        return Err(invalid("part number cannot be empty"));
    }
    if !(MIN_MARKINGS..=MAX_MARKINGS).contains(&record.expected_markings.len()) {
        return Err(invalid("expected markings must list 3 or 4 fields"));
    }
    if record.expected_markings.iter().any(|f| f.value.trim().is_empty()) {
        return Err(invalid("expected marking values cannot be empty"));
    }

    // Country checks compare against uppercased OCR text.
    record.valid_countries = record
        .valid_countries
        .iter()
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .collect();
    if record.valid_countries.is_empty() {
        return Err(invalid("at least one valid country is required"));
    }

    Ok(record)
}
