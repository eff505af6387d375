//! Records of the CLDF StructureDataset written by the pipeline.
//!
//! Base tables are addressed by CLDF component, vocabulary tables by URL.

use super::{extra_cell, Cell, ExtraColumns, Row, TableRecord};

pub const LANGUAGE_TABLE: &str = "LanguageTable";
pub const PARAMETER_TABLE: &str = "ParameterTable";
pub const CODE_TABLE: &str = "CodeTable";
pub const VALUE_TABLE: &str = "ValueTable";
pub const EXAMPLE_TABLE: &str = "ExampleTable";
pub const REGIONS: &str = "regions.csv";
pub const VARIETY_TYPES: &str = "varietytypes.csv";
pub const FEATURE_CATEGORIES: &str = "featurecategories.csv";
pub const CONTRIBUTORS: &str = "contributors.csv";
pub const CONTRIBUTIONS: &str = "contributions.csv";
pub const HISTORY: &str = "history.csv";

// =============================================================================
// Reading base rows
// =============================================================================

/// A column that could not be turned into a record field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub column: String,
    pub message: String,
}

impl FieldError {
    fn new(column: &str, message: impl Into<String>) -> Self {
        Self {
            column: column.to_string(),
            message: message.into(),
        }
    }
}

/// Hands out the cells of a raw row one column at a time.
///
/// Whatever is not taken ends up in the record's extra columns.
pub struct RowFields {
    cells: Row,
}

impl RowFields {
    pub fn new(cells: Row) -> Self {
        Self { cells }
    }

    /// A required, non-empty text column.
    pub fn required(&mut self, column: &str) -> Result<String, FieldError> {
        self.optional(column)?
            .ok_or_else(|| FieldError::new(column, "required value is empty"))
    }

    pub fn optional(&mut self, column: &str) -> Result<Option<String>, FieldError> {
        match self.cells.remove(column) {
            None | Some(Cell::Null) => Ok(None),
            Some(Cell::Text(s)) if s.is_empty() => Ok(None),
            Some(Cell::Text(s)) => Ok(Some(s)),
            Some(Cell::Float(f)) => Ok(Some(super::format_float(f))),
            Some(Cell::List(_)) => Err(FieldError::new(column, "expected a single value")),
        }
    }

    pub fn list(&mut self, column: &str) -> Vec<String> {
        match self.cells.remove(column) {
            Some(Cell::List(items)) => items,
            Some(Cell::Text(s)) if !s.is_empty() => vec![s],
            _ => Vec::new(),
        }
    }

    pub fn float(&mut self, column: &str) -> Result<Option<f64>, FieldError> {
        match self.cells.remove(column) {
            Some(Cell::Float(f)) => Ok(Some(f)),
            Some(Cell::Text(s)) if !s.trim().is_empty() => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|e| FieldError::new(column, e.to_string())),
            Some(Cell::List(_)) => Err(FieldError::new(column, "expected a number")),
            _ => Ok(None),
        }
    }

    pub fn into_extra(self) -> ExtraColumns {
        self.cells
    }
}

/// Construction from a row of a base dataset table.
pub trait FromRow: Sized {
    fn from_row(fields: RowFields) -> Result<Self, FieldError>;
}

// =============================================================================
// Languages
// =============================================================================

/// A surveyed variety of English.
#[derive(Debug, Clone, PartialEq)]
pub struct Language {
    pub id: String,
    pub name: String,
    pub glottocode: Option<String>,
    pub iso639p3code: Option<String>,
    pub macroarea: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub description: String,
    pub region_id: String,
    pub type_id: String,
    pub abbr: String,
    /// Ordered by contributor rank.
    pub contributor_ids: Vec<String>,
    pub extra: ExtraColumns,
}

impl FromRow for Language {
    fn from_row(mut f: RowFields) -> Result<Self, FieldError> {
        Ok(Self {
            id: f.required("ID")?,
            name: f.optional("Name")?.unwrap_or_default(),
            glottocode: f.optional("Glottocode")?,
            iso639p3code: f.optional("ISO639P3code")?,
            macroarea: f.optional("Macroarea")?,
            latitude: f.float("Latitude")?,
            longitude: f.float("Longitude")?,
            description: String::new(),
            region_id: String::new(),
            type_id: String::new(),
            abbr: String::new(),
            contributor_ids: Vec::new(),
            extra: f.into_extra(),
        })
    }
}

impl TableRecord for Language {
    fn table(&self) -> &'static str {
        LANGUAGE_TABLE
    }

    fn cell(&self, column: &str) -> Cell {
        match column {
            "ID" => Cell::text(self.id.as_str()),
            "Name" => Cell::text(self.name.as_str()),
            "Glottocode" => Cell::opt_text(self.glottocode.as_ref()),
            "ISO639P3code" => Cell::opt_text(self.iso639p3code.as_ref()),
            "Macroarea" => Cell::opt_text(self.macroarea.as_ref()),
            "Latitude" => Cell::opt_float(self.latitude),
            "Longitude" => Cell::opt_float(self.longitude),
            "Description" => Cell::text(self.description.as_str()),
            "Region_ID" => Cell::text(self.region_id.as_str()),
            "Type_ID" => Cell::text(self.type_id.as_str()),
            "abbr" => Cell::text(self.abbr.as_str()),
            "Contributor_ID" => Cell::list(&self.contributor_ids),
            other => extra_cell(&self.extra, other),
        }
    }
}

// =============================================================================
// Vocabularies
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub id: String,
    pub name: String,
}

impl TableRecord for Region {
    fn table(&self) -> &'static str {
        REGIONS
    }

    fn cell(&self, column: &str) -> Cell {
        match column {
            "ID" => Cell::text(self.id.as_str()),
            "Name" => Cell::text(self.name.as_str()),
            _ => Cell::Null,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarietyType {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl TableRecord for VarietyType {
    fn table(&self) -> &'static str {
        VARIETY_TYPES
    }

    fn cell(&self, column: &str) -> Cell {
        match column {
            "ID" => Cell::text(self.id.as_str()),
            "Name" => Cell::text(self.name.as_str()),
            "Description" => Cell::text(self.description.as_str()),
            _ => Cell::Null,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCategory {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl TableRecord for FeatureCategory {
    fn table(&self) -> &'static str {
        FEATURE_CATEGORIES
    }

    fn cell(&self, column: &str) -> Cell {
        match column {
            "ID" => Cell::text(self.id.as_str()),
            "Name" => Cell::text(self.name.as_str()),
            "Description" => Cell::text(self.description.as_str()),
            _ => Cell::Null,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Contributor {
    pub id: String,
    pub name: String,
    pub url: String,
    pub address: String,
    pub email: String,
}

impl TableRecord for Contributor {
    fn table(&self) -> &'static str {
        CONTRIBUTORS
    }

    fn cell(&self, column: &str) -> Cell {
        match column {
            "ID" => Cell::text(self.id.as_str()),
            "Name" => Cell::text(self.name.as_str()),
            "URL" => Cell::text(self.url.as_str()),
            "Address" => Cell::text(self.address.as_str()),
            "Email" => Cell::text(self.email.as_str()),
            _ => Cell::Null,
        }
    }
}

// =============================================================================
// Features
// =============================================================================

/// A morphosyntactic feature surveyed across varieties.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: String,
    pub example_source: String,
    /// Percentage of varieties with an A, B or C rating.
    pub attestation: f64,
    /// Weighted rating average over attesting varieties, as a percentage.
    pub pervasiveness: f64,
    pub extra: ExtraColumns,
}

impl FromRow for Parameter {
    fn from_row(mut f: RowFields) -> Result<Self, FieldError> {
        Ok(Self {
            id: f.required("ID")?,
            name: f.optional("Name")?.unwrap_or_default(),
            description: f.optional("Description")?,
            category_id: String::new(),
            example_source: String::new(),
            attestation: 0.0,
            pervasiveness: 0.0,
            extra: f.into_extra(),
        })
    }
}

impl TableRecord for Parameter {
    fn table(&self) -> &'static str {
        PARAMETER_TABLE
    }

    fn cell(&self, column: &str) -> Cell {
        match column {
            "ID" => Cell::text(self.id.as_str()),
            "Name" => Cell::text(self.name.as_str()),
            "Description" => Cell::opt_text(self.description.as_ref()),
            "Category_ID" => Cell::text(self.category_id.as_str()),
            "Example_Source" => Cell::text(self.example_source.as_str()),
            "Attestation" => Cell::Float(self.attestation),
            "Pervasiveness" => Cell::Float(self.pervasiveness),
            other => extra_cell(&self.extra, other),
        }
    }
}

// =============================================================================
// Codes and values
// =============================================================================

/// A rating level of one feature (A, B, C, D, X, NA, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Code {
    pub id: String,
    pub parameter_id: String,
    pub name: String,
    pub description: Option<String>,
    pub extra: ExtraColumns,
}

impl FromRow for Code {
    fn from_row(mut f: RowFields) -> Result<Self, FieldError> {
        Ok(Self {
            id: f.required("ID")?,
            parameter_id: f.required("Parameter_ID")?,
            name: f.optional("Name")?.unwrap_or_default(),
            description: f.optional("Description")?,
            extra: f.into_extra(),
        })
    }
}

impl TableRecord for Code {
    fn table(&self) -> &'static str {
        CODE_TABLE
    }

    fn cell(&self, column: &str) -> Cell {
        match column {
            "ID" => Cell::text(self.id.as_str()),
            "Parameter_ID" => Cell::text(self.parameter_id.as_str()),
            "Name" => Cell::text(self.name.as_str()),
            "Description" => Cell::opt_text(self.description.as_ref()),
            other => extra_cell(&self.extra, other),
        }
    }
}

/// The rating of one feature in one variety.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub id: String,
    pub language_id: String,
    pub parameter_id: String,
    /// Raw rating; `None` when the export left it empty.
    pub value: Option<String>,
    pub code_id: Option<String>,
    pub comment: Option<String>,
    pub source: Vec<String>,
    pub example_ids: Vec<String>,
    pub extra: ExtraColumns,
}

impl FromRow for Value {
    fn from_row(mut f: RowFields) -> Result<Self, FieldError> {
        Ok(Self {
            id: f.required("ID")?,
            language_id: f.required("Language_ID")?,
            parameter_id: f.required("Parameter_ID")?,
            value: f.optional("Value")?,
            code_id: f.optional("Code_ID")?,
            comment: f.optional("Comment")?,
            source: f.list("Source"),
            example_ids: f.list("Example_ID"),
            extra: f.into_extra(),
        })
    }
}

impl TableRecord for Value {
    fn table(&self) -> &'static str {
        VALUE_TABLE
    }

    fn cell(&self, column: &str) -> Cell {
        match column {
            "ID" => Cell::text(self.id.as_str()),
            "Language_ID" => Cell::text(self.language_id.as_str()),
            "Parameter_ID" => Cell::text(self.parameter_id.as_str()),
            "Value" => Cell::opt_text(self.value.as_ref()),
            "Code_ID" => Cell::opt_text(self.code_id.as_ref()),
            "Comment" => Cell::opt_text(self.comment.as_ref()),
            "Source" => Cell::list(&self.source),
            "Example_ID" => Cell::list(&self.example_ids),
            other => extra_cell(&self.extra, other),
        }
    }
}

// =============================================================================
// Examples
// =============================================================================

/// An example sentence illustrating a feature.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub id: String,
    pub language_id: String,
    pub primary_text: String,
    pub analyzed_word: Vec<String>,
    pub gloss: Vec<String>,
    pub translated_text: Option<String>,
    pub comment: Option<String>,
    /// Formatted references, `key[pages]`.
    pub source: Vec<String>,
    pub extra: ExtraColumns,
}

impl FromRow for Example {
    fn from_row(mut f: RowFields) -> Result<Self, FieldError> {
        Ok(Self {
            id: f.required("ID")?,
            language_id: f.optional("Language_ID")?.unwrap_or_default(),
            primary_text: f.optional("Primary_Text")?.unwrap_or_default(),
            analyzed_word: f.list("Analyzed_Word"),
            gloss: f.list("Gloss"),
            translated_text: f.optional("Translated_Text")?,
            comment: f.optional("Comment")?,
            source: f.list("Source"),
            extra: f.into_extra(),
        })
    }
}

impl TableRecord for Example {
    fn table(&self) -> &'static str {
        EXAMPLE_TABLE
    }

    fn cell(&self, column: &str) -> Cell {
        match column {
            "ID" => Cell::text(self.id.as_str()),
            "Language_ID" => Cell::text(self.language_id.as_str()),
            "Primary_Text" => Cell::text(self.primary_text.as_str()),
            "Analyzed_Word" => Cell::list(&self.analyzed_word),
            "Gloss" => Cell::list(&self.gloss),
            "Translated_Text" => Cell::opt_text(self.translated_text.as_ref()),
            "Comment" => Cell::opt_text(self.comment.as_ref()),
            "Source" => Cell::list(&self.source),
            other => extra_cell(&self.extra, other),
        }
    }
}

// =============================================================================
// History
// =============================================================================

/// A rating changed in a given release.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub version: String,
    pub language_id: String,
    pub parameter_id: String,
    pub code_id: String,
}

impl TableRecord for HistoryEntry {
    fn table(&self) -> &'static str {
        HISTORY
    }

    fn cell(&self, column: &str) -> Cell {
        match column {
            "Version" => Cell::text(self.version.as_str()),
            "Language_ID" => Cell::text(self.language_id.as_str()),
            "Parameter_ID" => Cell::text(self.parameter_id.as_str()),
            "Code_ID" => Cell::text(self.code_id.as_str()),
            _ => Cell::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Cell)]) -> RowFields {
        RowFields::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_language_keeps_unknown_columns() {
        let fields = row(&[
            ("ID", Cell::text("1")),
            ("Name", Cell::text("Orkney and Shetland English")),
            ("Latitude", Cell::Float(59.0)),
            ("Population", Cell::text("20000")),
        ]);
        let lang = Language::from_row(fields).unwrap();
        assert_eq!(lang.id, "1");
        assert_eq!(lang.latitude, Some(59.0));
        assert_eq!(lang.cell("Population"), Cell::text("20000"));
        assert_eq!(lang.cell("Unknown"), Cell::Null);
    }

    #[test]
    fn test_missing_id_is_error() {
        let err = Code::from_row(row(&[("Parameter_ID", Cell::text("1"))])).unwrap_err();
        assert_eq!(err.column, "ID");
    }

    #[test]
    fn test_value_empty_rating_is_none() {
        let value = Value::from_row(row(&[
            ("ID", Cell::text("11")),
            ("Language_ID", Cell::text("1")),
            ("Parameter_ID", Cell::text("2")),
            ("Value", Cell::text("")),
            ("Contribution_ID", Cell::text("1")),
        ]))
        .unwrap();
        assert_eq!(value.value, None);
        assert!(value.example_ids.is_empty());
        assert_eq!(value.extra.len(), 1);
    }

    #[test]
    fn test_float_from_text() {
        let mut fields = row(&[("Latitude", Cell::text("12.5")), ("Longitude", Cell::text("x"))]);
        assert_eq!(fields.float("Latitude").unwrap(), Some(12.5));
        assert!(fields.float("Longitude").is_err());
    }
}
