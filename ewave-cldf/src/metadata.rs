//! Dataset-level metadata (`metadata.json`) and the README rendered from it.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::MetadataError;
use crate::schema::Schema;

/// Build-status badge placed under the README title.
pub const BUILD_BADGE: &str = "[![Build Status](https://travis-ci.org/cldf-datasets/ewave.svg?branch=master)](https://travis-ci.org/cldf-datasets/ewave)";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub citation: String,
}

impl DatasetMetadata {
    pub fn load(path: &Path) -> Result<Self, MetadataError> {
        let content = std::fs::read_to_string(path).map_err(|source| MetadataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| MetadataError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `None` if the file does not exist.
    pub fn load_optional(path: &Path) -> Result<Option<Self>, MetadataError> {
        if path.exists() {
            Self::load(path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Copy the dataset-level fields into the metadata descriptor.
    pub fn annotate(&self, schema: &mut Schema) {
        let fields = [
            ("dc:identifier", &self.url),
            ("dc:title", &self.title),
            ("dc:description", &self.description),
            ("dc:license", &self.license),
            ("dc:bibliographicCitation", &self.citation),
        ];
        for (key, value) in fields {
            if !value.is_empty() {
                schema.set_property(key, JsonValue::from(value.as_str()));
            }
        }
        if !self.id.is_empty() {
            schema.set_property("rdf:ID", JsonValue::from(self.id.as_str()));
        }
    }

    /// Markdown description of the dataset.
    ///
    /// `counts` lists table names with their number of rows.
    pub fn markdown(&self, counts: &[(String, usize)]) -> String {
        let mut lines = vec![format!("# {}", self.title_or_id()), String::new()];

        if !self.url.is_empty() {
            lines.push(format!("Published at {}", self.url));
            lines.push(String::new());
        }
        if !self.citation.is_empty() {
            lines.extend(["## How to cite".to_string(), String::new()]);
            lines.push(self.citation.clone());
            lines.push(String::new());
        }
        if !self.description.is_empty() {
            lines.extend(["## Description".to_string(), String::new()]);
            lines.push(self.description.clone());
            lines.push(String::new());
        }
        if !self.license.is_empty() {
            lines.push(format!("License: {}", self.license));
            lines.push(String::new());
        }
        if !counts.is_empty() {
            lines.extend([
                "## Statistics".to_string(),
                String::new(),
                "| Table | Rows |".to_string(),
                "|:--|--:|".to_string(),
            ]);
            for (table, rows) in counts {
                lines.push(format!("| {} | {} |", table, rows));
            }
            lines.push(String::new());
        }

        with_badge(&lines.join("\n"), BUILD_BADGE)
    }

    fn title_or_id(&self) -> &str {
        if self.title.is_empty() {
            &self.id
        } else {
            &self.title
        }
    }
}

/// Insert `badge` after the first level-1 heading.
pub fn with_badge(markdown: &str, badge: &str) -> String {
    let mut lines = Vec::new();
    let mut title_found = false;
    for line in markdown.split('\n') {
        lines.push(line.to_string());
        if line.starts_with("# ") && !title_found {
            title_found = true;
            lines.push(String::new());
            lines.push(badge.to_string());
        }
    }
    lines.join("\n")
}
