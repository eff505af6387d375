//! Delimited-table loader with encoding and delimiter detection.
//!
//! Two kinds of input are read here:
//!
//! - auxiliary tables of the eWAVE export, turned into [`AuxRecord`]s by
//!   position (headerless) or by column name;
//! - tables of a CLDF dataset, read through their [`Table`] schema so that
//!   list-valued and numeric columns come back typed.
//!
//! Every malformed row aborts the load; nothing is skipped except blank lines.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{CsvError, CsvResult};
use crate::models::cldf::{FromRow, RowFields};
use crate::models::{Cell, NumericId, Row};
use crate::schema::Table;

// =============================================================================
// Encoding and delimiter detection
// =============================================================================

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
///
/// Valid UTF-8 always wins over a guessed legacy encoding.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> u8 {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [b',', b';', b'\t', b'|'];
    let mut best_sep = b',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep as char).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Delimiter implied by the file extension, detected from content otherwise.
pub fn delimiter_for(path: &Path, content: &str) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => b',',
        Some("psv") => b'|',
        Some("tsv") | Some("tab") => b'\t',
        _ => detect_delimiter(content),
    }
}

/// Read a text file, decoding it and stripping a leading BOM.
pub fn read_text(path: &Path) -> CsvResult<String> {
    let bytes = fs::read(path).map_err(|source| CsvError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let encoding = detect_encoding(&bytes);
    let content = decode_content(&bytes, &encoding);
    Ok(content.trim_start_matches('\u{feff}').to_string())
}

// =============================================================================
// Raw delimited tables
// =============================================================================

/// A delimited file read into memory.
#[derive(Debug, Clone)]
pub struct DelimitedTable {
    pub path: PathBuf,
    pub headers: Option<StringRecord>,
    /// Records with the line they start on.
    pub records: Vec<(u64, StringRecord)>,
}

/// Read a delimited file. Unequal row lengths are an error.
pub fn read_delimited(path: &Path, has_headers: bool) -> CsvResult<DelimitedTable> {
    let content = read_text(path)?;
    let delimiter = delimiter_for(path, &content);
    let malformed = |source| CsvError::Malformed {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(has_headers)
        .from_reader(content.as_bytes());

    let headers = if has_headers {
        Some(reader.headers().map_err(malformed)?.clone())
    } else {
        None
    };

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(malformed)?;
        let line = record.position().map_or(0, |p| p.line());
        records.push((line, record));
    }

    debug!(
        path = %path.display(),
        rows = records.len(),
        delimiter = %(delimiter as char),
        "read delimited table"
    );

    Ok(DelimitedTable {
        path: path.to_path_buf(),
        headers,
        records,
    })
}

// =============================================================================
// Auxiliary records
// =============================================================================

/// A record of an auxiliary table.
pub trait AuxRecord: Sized {
    /// Whether the first line names the columns.
    const HAS_HEADER: bool;
    /// Minimum number of fields per row.
    const MIN_FIELDS: usize;

    /// The ID this record is joined on.
    fn key(&self) -> &str;

    fn from_fields(fields: &Fields<'_>) -> CsvResult<Self>;
}

/// Field access for one row, with error context.
pub struct Fields<'a> {
    path: &'a Path,
    line: u64,
    record: &'a StringRecord,
    headers: Option<&'a StringRecord>,
}

impl<'a> Fields<'a> {
    pub fn new(
        path: &'a Path,
        line: u64,
        record: &'a StringRecord,
        headers: Option<&'a StringRecord>,
    ) -> Self {
        Self {
            path,
            line,
            record,
            headers,
        }
    }

    pub fn at(&self, index: usize) -> CsvResult<&'a str> {
        self.record.get(index).ok_or_else(|| CsvError::MissingField {
            path: self.path.to_path_buf(),
            line: self.line,
            expected: index + 1,
            found: self.record.len(),
        })
    }

    pub fn named(&self, column: &str) -> CsvResult<&'a str> {
        let index = self
            .headers
            .and_then(|h| h.iter().position(|name| name.trim() == column))
            .ok_or_else(|| CsvError::MissingColumn {
                path: self.path.to_path_buf(),
                column: column.to_string(),
            })?;
        self.at(index)
    }

    /// A non-empty identifier at `index`.
    pub fn key_at(&self, index: usize) -> CsvResult<String> {
        let value = self.at(index)?;
        self.non_empty(&format!("#{}", index + 1), value)
    }

    pub fn key_named(&self, column: &str) -> CsvResult<String> {
        let value = self.named(column)?;
        self.non_empty(column, value)
    }

    pub fn numeric_at(&self, index: usize) -> CsvResult<NumericId> {
        let value = self.at(index)?;
        self.numeric(&format!("#{}", index + 1), value)
    }

    pub fn numeric_named(&self, column: &str) -> CsvResult<NumericId> {
        let value = self.named(column)?;
        self.numeric(column, value)
    }

    pub fn float_at(&self, index: usize) -> CsvResult<f64> {
        let value = self.at(index)?;
        value
            .trim()
            .parse::<f64>()
            .map_err(|e| self.invalid(&format!("#{}", index + 1), value, e.to_string()))
    }

    fn non_empty(&self, column: &str, value: &str) -> CsvResult<String> {
        if value.trim().is_empty() {
            return Err(self.invalid(column, value, "empty identifier"));
        }
        Ok(value.to_string())
    }

    fn numeric(&self, column: &str, value: &str) -> CsvResult<NumericId> {
        NumericId::parse(value).map_err(|e| self.invalid(column, value, e.to_string()))
    }

    fn invalid(&self, column: &str, value: &str, message: impl Into<String>) -> CsvError {
        CsvError::InvalidValue {
            path: self.path.to_path_buf(),
            line: self.line,
            column: column.to_string(),
            value: value.to_string(),
            message: message.into(),
        }
    }
}

/// Load every row of an auxiliary table, in file order.
pub fn load_records<R: AuxRecord>(path: &Path) -> CsvResult<Vec<R>> {
    let table = read_delimited(path, R::HAS_HEADER)?;
    let mut records = Vec::with_capacity(table.records.len());

    for (line, record) in &table.records {
        if record.len() < R::MIN_FIELDS {
            return Err(CsvError::MissingField {
                path: path.to_path_buf(),
                line: *line,
                expected: R::MIN_FIELDS,
                found: record.len(),
            });
        }
        let fields = Fields::new(path, *line, record, table.headers.as_ref());
        records.push(R::from_fields(&fields)?);
    }

    Ok(records)
}

/// Load an auxiliary table into a map keyed by [`AuxRecord::key`].
///
/// Keys must be unique.
pub fn load_keyed<R: AuxRecord>(path: &Path) -> CsvResult<HashMap<String, R>> {
    let table = read_delimited(path, R::HAS_HEADER)?;
    let mut map = HashMap::with_capacity(table.records.len());

    for (line, record) in &table.records {
        if record.len() < R::MIN_FIELDS {
            return Err(CsvError::MissingField {
                path: path.to_path_buf(),
                line: *line,
                expected: R::MIN_FIELDS,
                found: record.len(),
            });
        }
        let fields = Fields::new(path, *line, record, table.headers.as_ref());
        let parsed = R::from_fields(&fields)?;
        let key = parsed.key().to_string();
        if map.insert(key.clone(), parsed).is_some() {
            return Err(CsvError::DuplicateKey {
                path: path.to_path_buf(),
                line: *line,
                key,
            });
        }
    }

    Ok(map)
}

/// Parse a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> CsvResult<T> {
    let content = read_text(path)?;
    serde_json::from_str(&content).map_err(|source| CsvError::Json {
        path: path.to_path_buf(),
        source,
    })
}

// =============================================================================
// CLDF tables
// =============================================================================

/// Convert one field according to its column declaration.
pub fn parse_cell(raw: &str, table: &Table, column: &str) -> Cell {
    let Some(declared) = table.column(column) else {
        return Cell::text(raw);
    };
    if let Some(separator) = &declared.separator {
        if raw.is_empty() {
            return Cell::List(Vec::new());
        }
        return Cell::List(raw.split(separator.as_str()).map(str::to_string).collect());
    }
    if declared.is_numeric() && !raw.trim().is_empty() {
        // Unparsable numbers stay text and are reported by validation.
        if let Ok(f) = raw.trim().parse::<f64>() {
            return Cell::Float(f);
        }
    }
    Cell::text(raw)
}

/// Read the rows of a CLDF table file as typed cells keyed by column name.
pub fn read_rows(path: &Path, table: &Table) -> CsvResult<Vec<(u64, Row)>> {
    let delimited = read_delimited(path, true)?;
    let headers = delimited.headers.unwrap_or_default();

    Ok(delimited
        .records
        .iter()
        .map(|(line, record)| {
            let row = headers
                .iter()
                .zip(record.iter())
                .map(|(name, raw)| (name.to_string(), parse_cell(raw, table, name)))
                .collect();
            (*line, row)
        })
        .collect())
}

/// Read a CLDF table file into typed records, in file order.
pub fn read_cldf_table<R: FromRow>(path: &Path, table: &Table) -> CsvResult<Vec<R>> {
    read_rows(path, table)?
        .into_iter()
        .map(|(line, row)| {
            R::from_row(RowFields::new(row)).map_err(|e| CsvError::InvalidValue {
                path: path.to_path_buf(),
                line,
                column: e.column,
                value: String::new(),
                message: e.message,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Contributor, Region, VarietyRecord};
    use crate::schema::Column;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_detect_delimiter_comma() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), b',');
    }

    #[test]
    fn test_detect_delimiter_pipe() {
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), b'|');
    }

    #[test]
    fn test_delimiter_from_extension() {
        assert_eq!(delimiter_for(Path::new("region.psv"), "1,x"), b'|');
        assert_eq!(delimiter_for(Path::new("cc.csv"), "1|2|3"), b',');
        assert_eq!(delimiter_for(Path::new("data.txt"), "1\t2\t3"), b'\t');
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_load_pipe_delimited_headerless() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "region.psv", "1|British Isles\n2|America\n");
        let regions: Vec<Region> = load_records(&path).unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[1].name, "America");
    }

    #[test]
    fn test_load_keyed_by_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "contributors.csv",
            "id,name,url,email,address\n7,Jane Doe,,jd@example.org,\"Freiburg, Germany\"\n",
        );
        let map: HashMap<String, Contributor> = load_keyed(&path).unwrap();
        let c = &map["7"];
        assert_eq!(c.email, "jd@example.org");
        assert_eq!(c.address, "Freiburg, Germany");
    }

    #[test]
    fn test_short_row_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "variety.csv", "1,2,3\n");
        let err = load_records::<VarietyRecord>(&path).unwrap_err();
        assert!(matches!(err, CsvError::MissingField { expected: 4, found: 3, .. }));
    }

    #[test]
    fn test_unequal_rows_are_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "variety.csv", "1,2,3,a\n2,2,3\n");
        let err = load_records::<VarietyRecord>(&path).unwrap_err();
        assert!(matches!(err, CsvError::Malformed { .. }));
    }

    #[test]
    fn test_duplicate_key_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "region.psv", "1|A\n1|B\n");
        let err = load_keyed::<Region>(&path).unwrap_err();
        assert!(matches!(err, CsvError::DuplicateKey { key, .. } if key == "1"));
    }

    #[test]
    fn test_missing_header_column_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "contributors.csv", "id,name,url\n7,Jane,\n");
        let err = load_records::<Contributor>(&path).unwrap_err();
        assert!(matches!(err, CsvError::MissingField { .. } | CsvError::MissingColumn { .. }));
    }

    #[test]
    fn test_bom_is_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "region.psv", "\u{feff}1|A\n");
        let regions: Vec<Region> = load_records(&path).unwrap();
        assert_eq!(regions[0].id, "1");
    }

    #[test]
    fn test_parse_cell_uses_schema() {
        let mut table = Table::new("examples.csv");
        table.table_schema.columns = vec![
            Column::new("Source").with_separator(";"),
            Column::new("Attestation").with_float_range(0.0, 100.0),
        ];
        assert_eq!(
            parse_cell("a[1];b", &table, "Source"),
            Cell::List(vec!["a[1]".into(), "b".into()])
        );
        assert_eq!(parse_cell("", &table, "Source"), Cell::List(vec![]));
        assert_eq!(parse_cell("12.5", &table, "Attestation"), Cell::Float(12.5));
        assert_eq!(parse_cell("n/a", &table, "Attestation"), Cell::text("n/a"));
        assert_eq!(parse_cell("x", &table, "Other"), Cell::text("x"));
    }
}
