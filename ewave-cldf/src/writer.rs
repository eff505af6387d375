//! Serialization of a converted dataset to a CLDF directory.
//!
//! One CSV file per table in schema order, the metadata descriptor and the
//! bibliography. Column order follows the schema; list cells are joined with
//! the column's separator.
//!
//! A run writes into a staging directory next to the output directory and
//! only [`CldfWriter::publish`]es it once the dataset is known to be valid.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use tracing::debug;

use crate::error::{WriteError, WriteResult};
use crate::models::TableRecord;
use crate::schema::{Schema, Table};
use crate::transform::pipeline::{CldfData, SOURCES_FILE};

/// File name of the metadata descriptor in the output directory.
pub const METADATA_FILE: &str = "StructureDataset-metadata.json";

pub struct CldfWriter {
    dir: PathBuf,
}

impl CldfWriter {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// A writer for the staging directory of `target`, `.<name>.staging`
    /// in the same parent.
    pub fn staging_for(target: &Path) -> Self {
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "cldf".to_string());
        let parent = target.parent().unwrap_or_else(|| Path::new(""));
        Self::new(parent.join(format!(".{}.staging", name)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Remove the directory and everything in it, if it exists.
    pub fn clear(&self) -> WriteResult<()> {
        match fs::remove_dir_all(&self.dir) {
            Err(source) if source.kind() != io::ErrorKind::NotFound => Err(WriteError::Io {
                path: self.dir.clone(),
                source,
            }),
            _ => Ok(()),
        }
    }

    /// Move the written dataset into `target`.
    ///
    /// Dataset files already in `target` are removed first, so tables a
    /// previous run wrote do not outlive their descriptor. Other files are kept.
    pub fn publish(&self, target: &Path) -> WriteResult<()> {
        let io_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source: io::Error| WriteError::Io { path, source }
        };

        fs::create_dir_all(target).map_err(io_error(target))?;
        for entry in fs::read_dir(target).map_err(io_error(target))? {
            let path = entry.map_err(io_error(target))?.path();
            if path.is_file() && is_dataset_file(&path) {
                fs::remove_file(&path).map_err(io_error(&path))?;
                debug!(path = %path.display(), "removed stale file");
            }
        }

        for entry in fs::read_dir(&self.dir).map_err(io_error(&self.dir))? {
            let entry = entry.map_err(io_error(&self.dir))?;
            let to = target.join(entry.file_name());
            fs::rename(entry.path(), &to).map_err(io_error(&to))?;
        }
        fs::remove_dir(&self.dir).map_err(io_error(&self.dir))
    }

    /// Write all tables, the descriptor and `sources.bib`.
    ///
    /// Returns the path of the descriptor.
    pub fn write(&self, data: &CldfData) -> WriteResult<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|source| WriteError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let tables = data.tables();
        for (key, _) in &tables {
            if data.schema.table(key).is_none() {
                return Err(WriteError::UndeclaredTable(key.to_string()));
            }
        }

        for table in &data.schema.tables {
            let records: &[&dyn TableRecord] = tables
                .iter()
                .find(|(key, _)| {
                    data.schema.table(key).map(|t| t.url.as_str()) == Some(table.url.as_str())
                })
                .map(|(_, records)| records.as_slice())
                .unwrap_or_default();
            self.write_table(table, records)?;
        }

        let metadata_path = self.write_metadata(&data.schema)?;
        self.write_file(SOURCES_FILE, data.bibliography.content())?;
        Ok(metadata_path)
    }

    /// Write one table. Tables without records get a header line only.
    pub fn write_table(&self, table: &Table, records: &[&dyn TableRecord]) -> WriteResult<PathBuf> {
        let path = self.dir.join(&table.url);
        let csv_error = |source| WriteError::Csv {
            path: path.clone(),
            source,
        };

        let mut writer = WriterBuilder::new()
            .from_path(&path)
            .map_err(csv_error)?;
        writer
            .write_record(table.column_names())
            .map_err(csv_error)?;

        for record in records {
            let row: Vec<String> = table
                .table_schema
                .columns
                .iter()
                .map(|c| record.cell(&c.name).render(c.separator.as_deref()))
                .collect();
            writer.write_record(&row).map_err(csv_error)?;
        }
        writer.flush().map_err(|source| WriteError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(table = table.label(), rows = records.len(), "wrote table");
        Ok(path)
    }

    pub fn write_metadata(&self, schema: &Schema) -> WriteResult<PathBuf> {
        let json = schema.to_json_pretty()?;
        self.write_file(METADATA_FILE, &json)
    }

    fn write_file(&self, name: &str, content: &str) -> WriteResult<PathBuf> {
        let path = self.dir.join(name);
        fs::write(&path, content).map_err(|source| WriteError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

/// Files a dataset directory is made of: tables, descriptor and bibliography.
fn is_dataset_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    name == METADATA_FILE
        || name == SOURCES_FILE
        || path.extension().and_then(|e| e.to_str()) == Some("csv")
}
