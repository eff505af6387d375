//! Runtime configuration.
//!
//! Paths and the download location come from the environment (a `.env` file
//! is loaded if present) and can be overridden on the command line.

use std::env;
use std::path::PathBuf;

/// Published archive of the raw eWAVE CLDF export.
pub const DEFAULT_DOWNLOAD_URL: &str =
    "https://cdstar.shh.mpg.de/bitstreams/EAEA0-B49C-97B6-CA70-0/ewave_dataset.cldf.zip";

pub const DEFAULT_RAW_DIR: &str = "raw";
pub const DEFAULT_CLDF_DIR: &str = "cldf";
pub const DEFAULT_METADATA: &str = "metadata.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory of the raw export.
    pub raw_dir: PathBuf,
    /// Output directory of the CLDF dataset.
    pub cldf_dir: PathBuf,
    /// Dataset-level metadata (`metadata.json`).
    pub metadata_path: PathBuf,
    pub download_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from(DEFAULT_RAW_DIR),
            cldf_dir: PathBuf::from(DEFAULT_CLDF_DIR),
            metadata_path: PathBuf::from(DEFAULT_METADATA),
            download_url: DEFAULT_DOWNLOAD_URL.to_string(),
        }
    }
}

impl Config {
    /// Defaults overridden by `EWAVE_RAW_DIR`, `EWAVE_CLDF_DIR`,
    /// `EWAVE_METADATA` and `EWAVE_DOWNLOAD_URL`.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            raw_dir: var("EWAVE_RAW_DIR").map_or(defaults.raw_dir, PathBuf::from),
            cldf_dir: var("EWAVE_CLDF_DIR").map_or(defaults.cldf_dir, PathBuf::from),
            metadata_path: var("EWAVE_METADATA").map_or(defaults.metadata_path, PathBuf::from),
            download_url: var("EWAVE_DOWNLOAD_URL").unwrap_or(defaults.download_url),
        }
    }

    pub fn with_raw_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.raw_dir = dir;
        }
        self
    }

    pub fn with_cldf_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.cldf_dir = dir;
        }
        self
    }

    pub fn with_metadata_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.metadata_path = path;
        }
        self
    }

    /// Descriptor of the written dataset.
    pub fn cldf_metadata(&self) -> PathBuf {
        self.cldf_dir.join(crate::writer::METADATA_FILE)
    }
}
