//! Validation of a written CLDF dataset.
//!
//! The dataset is read back from disk through its metadata descriptor and
//! checked in four passes:
//!
//! - every row against a JSON Schema (Draft 7) derived from its table's columns
//! - primary keys are unique
//! - foreign keys resolve, list-valued columns item by item
//! - `Source` references name entries of the bibliography
//!
//! # Example
//!
//! ```rust,ignore
//! use ewave::validation::{validate_dataset, Dataset};
//! use std::path::Path;
//!
//! let dataset = Dataset::read(Path::new("cldf/StructureDataset-metadata.json"))?;
//! validate_dataset(&dataset)?;
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde_json::{json, Map, Value as JsonValue};
use tracing::{debug, warn};

use crate::bibtex::Bibliography;
use crate::error::{PipelineResult, ValidationError};
use crate::models::cldf::{LANGUAGE_TABLE, PARAMETER_TABLE};
use crate::models::{Cell, Row};
use crate::parser::read_rows;
use crate::schema::{Column, Schema, Table};
use crate::transform::reference::Reference;

/// Joins the parts of a composite key.
const KEY_SEPARATOR: &str = "\u{1f}";

// =============================================================================
// Dataset
// =============================================================================

/// Rows of one table with their line numbers.
pub type TableRows = Vec<(u64, Row)>;

/// A CLDF dataset as found on disk.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub schema: Schema,
    /// Rows per table, in schema order.
    pub tables: Vec<TableRows>,
    pub bibliography: Bibliography,
}

impl Dataset {
    /// Read the descriptor and every table it declares.
    pub fn read(metadata_path: &Path) -> PipelineResult<Self> {
        let schema = Schema::load(metadata_path)?;
        let dir = metadata_path.parent().unwrap_or_else(|| Path::new("."));

        let mut tables = Vec::with_capacity(schema.tables.len());
        for table in &schema.tables {
            let rows = read_rows(&dir.join(&table.url), table)?;
            debug!(table = table.label(), rows = rows.len(), "read table");
            tables.push(rows);
        }

        let bibliography = match schema.properties.get("dc:source").and_then(JsonValue::as_str) {
            Some(name) => Bibliography::load(&dir.join(name))?,
            None => Bibliography::default(),
        };

        Ok(Self {
            schema,
            tables,
            bibliography,
        })
    }

    /// Rows of the table with the given URL or component.
    pub fn rows(&self, key: &str) -> Option<&[(u64, Row)]> {
        self.schema
            .table_index(key)
            .map(|i| self.tables[i].as_slice())
    }

    /// Table labels with their number of rows.
    pub fn counts(&self) -> Vec<(String, usize)> {
        self.schema
            .tables
            .iter()
            .zip(&self.tables)
            .map(|(table, rows)| (table.label().to_string(), rows.len()))
            .collect()
    }

    fn tables(&self) -> impl Iterator<Item = (&Table, &TableRows)> {
        self.schema.tables.iter().zip(&self.tables)
    }
}

// =============================================================================
// Row schemas
// =============================================================================

fn json_type(column: &Column) -> &'static str {
    if column.is_numeric() {
        "number"
    } else {
        "string"
    }
}

fn column_schema(column: &Column) -> JsonValue {
    if column.is_list() {
        let mut schema = json!({
            "type": "array",
            "items": { "type": "string", "minLength": 1 }
        });
        if column.required {
            schema["minItems"] = json!(1);
        }
        return schema;
    }

    let mut schema = Map::new();
    if column.required {
        schema.insert("type".into(), json!(json_type(column)));
    } else {
        schema.insert("type".into(), json!([json_type(column), "null"]));
    }
    if let Some(minimum) = column.minimum() {
        schema.insert("minimum".into(), json!(minimum));
    }
    if let Some(maximum) = column.maximum() {
        schema.insert("maximum".into(), json!(maximum));
    }
    JsonValue::Object(schema)
}

/// JSON Schema for a single row of `table`.
pub fn row_schema(table: &Table) -> JsonValue {
    let properties: Map<String, JsonValue> = table
        .table_schema
        .columns
        .iter()
        .map(|c| (c.name.clone(), column_schema(c)))
        .collect();
    let required: Vec<&str> = table
        .table_schema
        .columns
        .iter()
        .filter(|c| c.required)
        .map(|c| c.name.as_str())
        .collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Row as a JSON object, for schema validation.
pub fn row_to_json(row: &Row) -> JsonValue {
    JsonValue::Object(
        row.iter()
            .map(|(name, cell)| (name.clone(), cell.to_json()))
            .collect(),
    )
}

// =============================================================================
// Checks
// =============================================================================

fn check_rows(table: &Table, rows: &TableRows, problems: &mut Vec<String>) {
    let schema = row_schema(table);
    let validator = match jsonschema::draft7::new(&schema) {
        Ok(v) => v,
        Err(e) => {
            problems.push(format!("{}: invalid row schema: {}", table.url, e));
            return;
        }
    };

    for (line, row) in rows {
        let instance = row_to_json(row);
        for error in validator.iter_errors(&instance) {
            problems.push(format!("{}, line {}: {}", table.url, line, error));
        }
    }
}

fn key_of(row: &Row, columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| row.get(c).map(|cell| cell.render(None)).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(KEY_SEPARATOR)
}

fn check_primary_key(table: &Table, rows: &TableRows, problems: &mut Vec<String>) {
    let columns = &table.table_schema.primary_key;
    if columns.is_empty() {
        return;
    }

    let mut seen = HashSet::with_capacity(rows.len());
    for (line, row) in rows {
        let key = key_of(row, columns);
        if !seen.insert(key.clone()) {
            problems.push(format!(
                "{}, line {}: duplicate primary key '{}'",
                table.url,
                line,
                key.replace(KEY_SEPARATOR, ", ")
            ));
        }
    }
}

/// Values of the referenced columns, per table URL and column list.
type KeyIndex = HashMap<(String, Vec<String>), HashSet<String>>;

fn referenced_keys(dataset: &Dataset) -> KeyIndex {
    let mut index = KeyIndex::new();
    for (table, _) in dataset.tables() {
        for fk in &table.table_schema.foreign_keys {
            let Some(target) = dataset.schema.table_index(&fk.reference.resource) else {
                continue;
            };
            let entry = (
                dataset.schema.tables[target].url.clone(),
                fk.reference.column_reference.clone(),
            );
            if index.contains_key(&entry) {
                continue;
            }
            let keys = dataset.tables[target]
                .iter()
                .map(|(_, row)| key_of(row, &fk.reference.column_reference))
                .collect();
            index.insert(entry, keys);
        }
    }
    index
}

/// Foreign key values of a row; list cells contribute one value per item.
fn reference_values(row: &Row, columns: &[String]) -> Vec<String> {
    if let [column] = columns {
        return row.get(column).map(Cell::values).unwrap_or_default();
    }
    if columns
        .iter()
        .all(|c| matches!(row.get(c), None | Some(Cell::Null)))
    {
        return Vec::new();
    }
    vec![key_of(row, columns)]
}

fn check_foreign_keys(dataset: &Dataset, index: &KeyIndex, problems: &mut Vec<String>) {
    for (table, rows) in dataset.tables() {
        for fk in &table.table_schema.foreign_keys {
            let Some(target) = dataset.schema.table(&fk.reference.resource) else {
                problems.push(format!(
                    "{}: foreign key references unknown table {}",
                    table.url, fk.reference.resource
                ));
                continue;
            };
            let entry = (target.url.clone(), fk.reference.column_reference.clone());
            let Some(keys) = index.get(&entry) else {
                continue;
            };

            for (line, row) in rows {
                for value in reference_values(row, &fk.column_reference) {
                    if !keys.contains(&value) {
                        problems.push(format!(
                            "{}, line {}: {} '{}' not found in {}",
                            table.url,
                            line,
                            fk.column_reference.join(", "),
                            value.replace(KEY_SEPARATOR, ", "),
                            target.url
                        ));
                    }
                }
            }
        }
    }
}

fn is_source_column(column: &Column) -> bool {
    column
        .property_url
        .as_deref()
        .is_some_and(|url| url.ends_with("#source"))
}

fn check_sources(dataset: &Dataset, problems: &mut Vec<String>) {
    for (table, rows) in dataset.tables() {
        for column in table.table_schema.columns.iter().filter(|c| is_source_column(c)) {
            for (line, row) in rows {
                let Some(cell) = row.get(&column.name) else {
                    continue;
                };
                for formatted in cell.values() {
                    let reference = Reference::parse(&formatted);
                    if !dataset.bibliography.contains(&reference.source) {
                        problems.push(format!(
                            "{}, line {}: source '{}' not in bibliography",
                            table.url, line, reference.source
                        ));
                    }
                }
            }
        }
    }
}

/// Run all checks. Every problem found is reported, not only the first.
pub fn validate_dataset(dataset: &Dataset) -> Result<(), ValidationError> {
    let mut problems = Vec::new();

    for (table, rows) in dataset.tables() {
        check_rows(table, rows, &mut problems);
        check_primary_key(table, rows, &mut problems);
    }
    let index = referenced_keys(dataset);
    check_foreign_keys(dataset, &index, &mut problems);
    check_sources(dataset, &mut problems);

    if problems.is_empty() {
        Ok(())
    } else {
        for problem in &problems {
            warn!("{}", problem);
        }
        Err(ValidationError::Invalid { errors: problems })
    }
}

// =============================================================================
// Extent
// =============================================================================

/// Expected size of the full eWAVE dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub languages: usize,
    pub parameters: usize,
}

impl Default for Extent {
    fn default() -> Self {
        Self {
            languages: 77,
            parameters: 235,
        }
    }
}

/// Check the number of varieties and features.
pub fn check_extent(dataset: &Dataset, extent: &Extent) -> Result<(), ValidationError> {
    for (table, expected) in [
        (LANGUAGE_TABLE, extent.languages),
        (PARAMETER_TABLE, extent.parameters),
    ] {
        let found = dataset.rows(table).map_or(0, <[_]>::len);
        if found != expected {
            return Err(ValidationError::Extent {
                table: table.to_string(),
                expected,
                found,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::terms::conforms_to;
    use crate::schema::{ForeignKey, ForeignKeyReference};

    fn row(cells: &[(&str, Cell)]) -> Row {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn table(url: &str, columns: Vec<Column>) -> Table {
        let mut table = Table::new(url);
        table.table_schema.columns = columns;
        table.table_schema.primary_key = vec!["ID".to_string()];
        table
    }

    fn dataset() -> Dataset {
        let mut values = table(
            "values.csv",
            vec![
                Column::new("ID"),
                Column::new("Language_ID"),
                Column::new("Example_ID").with_separator(" "),
            ],
        );
        values.table_schema.foreign_keys = vec![
            ForeignKey {
                column_reference: vec!["Language_ID".into()],
                reference: ForeignKeyReference {
                    resource: "languages.csv".into(),
                    column_reference: vec!["ID".into()],
                },
            },
            ForeignKey {
                column_reference: vec!["Example_ID".into()],
                reference: ForeignKeyReference {
                    resource: "examples.csv".into(),
                    column_reference: vec!["ID".into()],
                },
            },
        ];
        let mut languages = table("languages.csv", vec![Column::new("ID")]);
        languages.conforms_to = Some(conforms_to(LANGUAGE_TABLE));
        let examples = table(
            "examples.csv",
            vec![Column::new("ID"), Column::new("Source").with_property("source").with_separator(";")],
        );

        Dataset {
            schema: Schema {
                tables: vec![languages, examples, values],
                properties: Default::default(),
            },
            tables: vec![
                vec![(2, row(&[("ID", Cell::text("1"))]))],
                vec![(
                    2,
                    row(&[
                        ("ID", Cell::text("7")),
                        ("Source", Cell::List(vec!["smith2000[p. 3]".into()])),
                    ]),
                )],
                vec![(
                    2,
                    row(&[
                        ("ID", Cell::text("1-1")),
                        ("Language_ID", Cell::text("1")),
                        ("Example_ID", Cell::List(vec!["7".into()])),
                    ]),
                )],
            ],
            bibliography: Bibliography::parse("@book{smith2000, title={T}}"),
        }
    }

    #[test]
    fn test_valid_dataset() {
        assert!(validate_dataset(&dataset()).is_ok());
    }

    #[test]
    fn test_dangling_list_item() {
        let mut ds = dataset();
        ds.tables[2][0].1.insert(
            "Example_ID".into(),
            Cell::List(vec!["7".into(), "8".into()]),
        );
        let err = validate_dataset(&ds).unwrap_err().to_string();
        assert!(err.contains("'8' not found in examples.csv"), "{}", err);
    }

    #[test]
    fn test_duplicate_primary_key() {
        let mut ds = dataset();
        ds.tables[0].push((3, row(&[("ID", Cell::text("1"))])));
        let err = validate_dataset(&ds).unwrap_err().to_string();
        assert!(err.contains("duplicate primary key '1'"), "{}", err);
    }

    #[test]
    fn test_unknown_source() {
        let mut ds = dataset();
        ds.bibliography = Bibliography::parse("@book{jones1990, title={T}}");
        let err = validate_dataset(&ds).unwrap_err().to_string();
        assert!(err.contains("source 'smith2000'"), "{}", err);
    }

    #[test]
    fn test_missing_required_id() {
        let mut ds = dataset();
        ds.tables[0][0].1.insert("ID".into(), Cell::Null);
        assert!(matches!(
            validate_dataset(&ds),
            Err(ValidationError::Invalid { .. })
        ));
    }

    #[test]
    fn test_row_schema_range() {
        let t = table(
            "parameters.csv",
            vec![Column::new("ID"), Column::new("Attestation").with_float_range(0.0, 100.0)],
        );
        let validator = jsonschema::draft7::new(&row_schema(&t)).unwrap();
        assert!(validator.is_valid(&json!({"ID": "1", "Attestation": 55.5})));
        assert!(validator.is_valid(&json!({"ID": "1", "Attestation": null})));
        assert!(!validator.is_valid(&json!({"ID": "1", "Attestation": 101.0})));
        assert!(!validator.is_valid(&json!({"Attestation": 1.0})));
    }

    #[test]
    fn test_extent() {
        let ds = dataset();
        assert!(check_extent(&ds, &Extent::default()).is_err());
        let small = Extent {
            languages: 1,
            parameters: 0,
        };
        assert!(check_extent(&ds, &small).is_ok());
    }
}
