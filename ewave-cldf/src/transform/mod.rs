//! Transformation module.
//!
//! - Augment: schema additions and removals
//! - Grouper: association rows to per-owner lists
//! - Identifiers: code and value renumbering
//! - Reference: `key[pages]` source references
//! - Pipeline: the conversion as a whole

pub mod augment;
pub mod grouper;
pub mod identifiers;
pub mod pipeline;
pub mod reference;

pub use augment::augment_schema;
pub use identifiers::{code_id, normalize_code_name, value_code_id, value_id};
pub use pipeline::{make_cldf, run, CldfData, RunSummary};
pub use reference::Reference;
