//! Error types for the eWAVE conversion pipeline.
//!
//! One enum per concern, wrapped by [`PipelineError`]:
//!
//! - [`CsvError`] - malformed input tables
//! - [`SchemaError`] - invalid schema declarations (configuration errors)
//! - [`IntegrityError`] - failed required joins and identifier collisions
//! - [`ValidationError`] - problems found in a written CLDF dataset
//! - [`WriteError`] - output serialization failures
//! - [`DownloadError`] - fetching or unpacking the raw export
//! - [`MetadataError`] - dataset metadata and metadata descriptors
//!
//! Conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::path::PathBuf;

use thiserror::Error;

// =============================================================================
// Input Parsing Errors
// =============================================================================

/// Errors while reading a delimited input table.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The csv reader rejected the file (bad quoting, unequal row lengths).
    #[error("Invalid delimited data in {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A row has fewer fields than required.
    #[error("{path}, line {line}: expected at least {expected} fields, found {found}")]
    MissingField {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },

    /// A header column required by the reader is absent.
    #[error("{path}: missing column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    /// A field could not be converted to the expected type.
    #[error("{path}, line {line}, column '{column}' (value '{value}'): {message}")]
    InvalidValue {
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
        message: String,
    },

    /// Two rows share the same key.
    #[error("{path}, line {line}: duplicate key '{key}'")]
    DuplicateKey { path: PathBuf, line: u64, key: String },

    /// JSON input (e.g. `changes.json`) could not be parsed.
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// =============================================================================
// Schema Errors
// =============================================================================

/// Errors raised while declaring or resolving the dataset schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Referenced table does not exist.
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// Referenced column does not exist in its table.
    #[error("Unknown column '{column}' in table {table}")]
    UnknownColumn { table: String, column: String },

    /// A table with this URL is already declared.
    #[error("Table already declared: {0}")]
    DuplicateTable(String),

    /// A column with this name is already declared in the table.
    #[error("Column '{column}' already declared in table {table}")]
    DuplicateColumn { table: String, column: String },

    /// The metadata descriptor could not be parsed.
    #[error("Invalid metadata descriptor {path}: {source}")]
    InvalidDescriptor {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The metadata descriptor could not be read.
    #[error("Failed to read metadata descriptor {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// Integrity Errors
// =============================================================================

/// Data-integrity errors found while joining tables.
#[derive(Debug, Error)]
pub enum IntegrityError {
    /// A required auxiliary record is absent for a row's ID.
    #[error("No {source_name} record for {table} row '{key}'")]
    MissingKey {
        table: String,
        source_name: String,
        key: String,
    },

    /// Two rows map to the same identifier after renumbering.
    #[error("Duplicate {table} ID '{id}' after renumbering")]
    DuplicateId { table: String, id: String },

    /// The history file lacks an expected release.
    #[error("changes.json has no release '{0}'")]
    MissingRelease(String),
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Problems found while validating a CLDF dataset.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The dataset violates schema or referential constraints.
    #[error("Dataset is invalid ({} problems): {}", .errors.len(), .errors.join("; "))]
    Invalid { errors: Vec<String> },

    /// A table does not have the expected number of rows.
    #[error("Table {table} has {found} rows, expected {expected}")]
    Extent {
        table: String,
        expected: usize,
        found: usize,
    },
}

// =============================================================================
// Output Errors
// =============================================================================

/// Errors while writing the CLDF dataset.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Filesystem error.
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV serialization error.
    #[error("Failed to write CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Metadata serialization error.
    #[error("Failed to serialize metadata: {0}")]
    Json(#[from] serde_json::Error),

    /// Rows were collected for a table the schema does not declare.
    #[error("No table {0} declared in the schema")]
    UndeclaredTable(String),
}

// =============================================================================
// Download Errors
// =============================================================================

/// Errors while fetching and unpacking the raw export.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The archive could not be read.
    #[error("Invalid archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Filesystem error.
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// Metadata Errors
// =============================================================================

/// Errors reading the dataset's `metadata.json`.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// File could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid metadata JSON.
    #[error("Invalid dataset metadata {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// This is the error type returned by [`crate::transform::pipeline::make_cldf`].
/// Every variant aborts the run; there is no partial output.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input parsing error.
    #[error("Input error: {0}")]
    Csv(#[from] CsvError),

    /// Schema declaration error.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Join or identifier error.
    #[error("Integrity error: {0}")]
    Integrity(#[from] IntegrityError),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Output error.
    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    /// Download error.
    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    /// Metadata error.
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for input parsing.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for joins and renumbering.
pub type IntegrityResult<T> = Result<T, IntegrityError>;

/// Result type for writing output.
pub type WriteResult<T> = Result<T, WriteError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let schema_err = SchemaError::UnknownTable("regions.csv".into());
        let pipeline_err: PipelineError = schema_err.into();
        assert!(pipeline_err.to_string().contains("regions.csv"));

        let integrity_err = IntegrityError::MissingKey {
            table: "LanguageTable".into(),
            source_name: "variety.csv".into(),
            key: "42".into(),
        };
        let pipeline_err: PipelineError = integrity_err.into();
        let msg = pipeline_err.to_string();
        assert!(msg.contains("variety.csv"));
        assert!(msg.contains("'42'"));
    }

    #[test]
    fn test_invalid_value_format() {
        let err = CsvError::InvalidValue {
            path: PathBuf::from("feature.csv"),
            line: 5,
            column: "attestation".into(),
            value: "abc".into(),
            message: "not a number".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("line 5"));
        assert!(msg.contains("column 'attestation'"));
        assert!(msg.contains("value 'abc'"));
    }

    #[test]
    fn test_validation_error_lists_problems() {
        let err = ValidationError::Invalid {
            errors: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "Dataset is invalid (2 problems): a; b");
    }
}
