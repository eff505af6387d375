//! Records of the auxiliary tables shipped with the eWAVE export.
//!
//! Headerless tables (`variety.csv`, `feature.csv`, `cc.csv`, the `.psv`
//! vocabularies) are read by position, the others by column name.

use serde_json::Value as JsonValue;

use super::cldf::{Contributor, FeatureCategory, Region, VarietyType};
use super::NumericId;
use crate::parser::{AuxRecord, Fields};
use crate::error::CsvResult;

/// `variety.csv`: `id, region, type, abbr`.
#[derive(Debug, Clone, PartialEq)]
pub struct VarietyRecord {
    pub id: String,
    pub region_id: String,
    pub type_id: String,
    pub abbr: String,
}

impl AuxRecord for VarietyRecord {
    const HAS_HEADER: bool = false;
    const MIN_FIELDS: usize = 4;

    fn key(&self) -> &str {
        &self.id
    }

    fn from_fields(f: &Fields<'_>) -> CsvResult<Self> {
        Ok(Self {
            id: f.key_at(0)?,
            region_id: f.at(1)?.to_string(),
            type_id: f.at(2)?.to_string(),
            abbr: f.at(3)?.to_string(),
        })
    }
}

/// `feature.csv`: `id, example source, category, attestation, pervasiveness`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    pub id: String,
    pub example_source: String,
    pub category_id: String,
    pub attestation: f64,
    pub pervasiveness: f64,
}

impl AuxRecord for FeatureRecord {
    const HAS_HEADER: bool = false;
    const MIN_FIELDS: usize = 5;

    fn key(&self) -> &str {
        &self.id
    }

    fn from_fields(f: &Fields<'_>) -> CsvResult<Self> {
        Ok(Self {
            id: f.key_at(0)?,
            example_source: f.at(1)?.to_string(),
            category_id: f.at(2)?.to_string(),
            attestation: f.float_at(3)?,
            pervasiveness: f.float_at(4)?,
        })
    }
}

/// `cc.csv`: `language, contributor, ordinal`.
#[derive(Debug, Clone, PartialEq)]
pub struct ContributorAssignment {
    pub language: NumericId,
    pub contributor: NumericId,
    pub ordinal: NumericId,
}

impl ContributorAssignment {
    /// Contributors of a language are listed by rank, ties broken by ID.
    pub fn sort_key(&self) -> (NumericId, NumericId, NumericId) {
        (
            self.language.clone(),
            self.ordinal.clone(),
            self.contributor.clone(),
        )
    }
}

impl AuxRecord for ContributorAssignment {
    const HAS_HEADER: bool = false;
    const MIN_FIELDS: usize = 3;

    fn key(&self) -> &str {
        self.language.as_str()
    }

    fn from_fields(f: &Fields<'_>) -> CsvResult<Self> {
        Ok(Self {
            language: f.numeric_at(0)?,
            contributor: f.numeric_at(1)?,
            ordinal: f.numeric_at(2)?,
        })
    }
}

/// `examplesource.csv`: which bibliography entry an example is cited from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExampleSourceRecord {
    pub example: NumericId,
    pub source: String,
    pub description: String,
}

impl ExampleSourceRecord {
    pub fn sort_key(&self) -> (NumericId, String) {
        (self.example.clone(), self.source.clone())
    }
}

impl AuxRecord for ExampleSourceRecord {
    const HAS_HEADER: bool = true;
    const MIN_FIELDS: usize = 3;

    fn key(&self) -> &str {
        self.example.as_str()
    }

    fn from_fields(f: &Fields<'_>) -> CsvResult<Self> {
        Ok(Self {
            example: f.numeric_named("example")?,
            source: f.key_named("source")?,
            description: f.named("description")?.to_string(),
        })
    }
}

/// `valueexample.csv`: example sentences attached to a value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueExampleRecord {
    pub value: NumericId,
    pub sentence: NumericId,
}

impl ValueExampleRecord {
    pub fn sort_key(&self) -> (NumericId, NumericId) {
        (self.value.clone(), self.sentence.clone())
    }
}

impl AuxRecord for ValueExampleRecord {
    const HAS_HEADER: bool = true;
    const MIN_FIELDS: usize = 2;

    fn key(&self) -> &str {
        self.value.as_str()
    }

    fn from_fields(f: &Fields<'_>) -> CsvResult<Self> {
        Ok(Self {
            value: f.numeric_named("value")?,
            sentence: f.numeric_named("sentence")?,
        })
    }
}

/// `contributions.csv`: one contribution per variety, carrying its description.
#[derive(Debug, Clone, PartialEq)]
pub struct ContributionRecord {
    pub id: String,
    pub description: String,
}

impl AuxRecord for ContributionRecord {
    const HAS_HEADER: bool = true;
    const MIN_FIELDS: usize = 1;

    fn key(&self) -> &str {
        &self.id
    }

    fn from_fields(f: &Fields<'_>) -> CsvResult<Self> {
        Ok(Self {
            id: f.key_named("ID")?,
            description: f.named("Description")?.to_string(),
        })
    }
}

impl AuxRecord for Region {
    const HAS_HEADER: bool = false;
    const MIN_FIELDS: usize = 2;

    fn key(&self) -> &str {
        &self.id
    }

    fn from_fields(f: &Fields<'_>) -> CsvResult<Self> {
        Ok(Self {
            id: f.key_at(0)?,
            name: f.at(1)?.to_string(),
        })
    }
}

impl AuxRecord for VarietyType {
    const HAS_HEADER: bool = false;
    const MIN_FIELDS: usize = 3;

    fn key(&self) -> &str {
        &self.id
    }

    fn from_fields(f: &Fields<'_>) -> CsvResult<Self> {
        Ok(Self {
            id: f.key_at(0)?,
            name: f.at(1)?.to_string(),
            description: f.at(2)?.to_string(),
        })
    }
}

impl AuxRecord for FeatureCategory {
    const HAS_HEADER: bool = false;
    const MIN_FIELDS: usize = 3;

    fn key(&self) -> &str {
        &self.id
    }

    fn from_fields(f: &Fields<'_>) -> CsvResult<Self> {
        Ok(Self {
            id: f.key_at(0)?,
            name: f.at(1)?.to_string(),
            description: f.at(2)?.to_string(),
        })
    }
}

impl AuxRecord for Contributor {
    const HAS_HEADER: bool = true;
    const MIN_FIELDS: usize = 5;

    fn key(&self) -> &str {
        &self.id
    }

    fn from_fields(f: &Fields<'_>) -> CsvResult<Self> {
        Ok(Self {
            id: f.key_named("id")?,
            name: f.named("name")?.to_string(),
            url: f.named("url")?.to_string(),
            email: f.named("email")?.to_string(),
            address: f.named("address")?.to_string(),
        })
    }
}

// =============================================================================
// Rating changes
// =============================================================================

/// One entry of a release in `changes.json`: `[language, feature, code, ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    pub language_id: String,
    pub parameter_id: String,
    pub code: String,
}

impl ChangeRecord {
    /// Build from a JSON array; `None` if it has fewer than three items.
    pub fn from_json(items: &[JsonValue]) -> Option<Self> {
        match items {
            [language, parameter, code, ..] => Some(Self {
                language_id: json_text(language),
                parameter_id: json_text(parameter),
                code: json_text(code),
            }),
            _ => None,
        }
    }
}

fn json_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}
