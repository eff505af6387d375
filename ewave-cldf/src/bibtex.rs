//! BibTeX sources of the dataset.
//!
//! The bibliography is carried over verbatim; only entry keys are extracted,
//! so that `Source` references can be checked.

use std::collections::BTreeSet;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::CsvResult;
use crate::parser::read_text;

static ENTRY_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@\s*([A-Za-z]+)\s*[{(]\s*([^,\s]+)\s*,").expect("valid entry key regex")
});

/// Entry types that don't define citable entries.
const NON_ENTRIES: &[&str] = &["comment", "preamble", "string"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bibliography {
    content: String,
    keys: BTreeSet<String>,
}

impl Bibliography {
    pub fn parse(content: &str) -> Self {
        let keys = ENTRY_KEY
            .captures_iter(content)
            .filter(|caps| !NON_ENTRIES.contains(&caps[1].to_lowercase().as_str()))
            .map(|caps| caps[2].to_string())
            .collect();
        Self {
            content: content.to_string(),
            keys,
        }
    }

    pub fn load(path: &Path) -> CsvResult<Self> {
        Ok(Self::parse(&read_text(path)?))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}
