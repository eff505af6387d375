//! # ewave - eWAVE to CLDF conversion
//!
//! Converts the raw export of the electronic World Atlas of Varieties of
//! English into a validated CLDF StructureDataset.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  raw export │────▶│   Parser    │────▶│  Transform  │────▶│    CLDF     │
//! │ (csv / psv) │     │  (auto-enc) │     │ (join+ids)  │     │ (validated) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ewave::{run, Config};
//!
//! let summary = run(&Config::from_env())?;
//! println!("Converted {} varieties", summary.languages);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Table records and cells
//! - [`schema`] - Metadata descriptor and schema edits
//! - [`parser`] - Delimited file reading with auto-detection
//! - [`transform`] - Joins, grouping, renumbering and the pipeline
//! - [`writer`] - CLDF output
//! - [`validation`] - Dataset validation
//! - [`metadata`] - Dataset metadata and README
//! - [`download`] - Raw data download

// Core modules
pub mod config;
pub mod error;
pub mod logging;
pub mod models;

// Input
pub mod bibtex;
pub mod download;
pub mod parser;
pub mod schema;

// Transformation
pub mod transform;

// Output
pub mod metadata;
pub mod writer;

// Validation
pub mod validation;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CsvError, DownloadError, IntegrityError, MetadataError, PipelineError, PipelineResult,
    SchemaError, ValidationError, WriteError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Cell, NumericId, Row, TableRecord};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use config::Config;
pub use transform::pipeline::{make_cldf, run, CldfData, RunSummary};

// =============================================================================
// Re-exports - Output and validation
// =============================================================================

pub use metadata::DatasetMetadata;
pub use validation::{check_extent, validate_dataset, Dataset, Extent};
pub use writer::CldfWriter;
