//! CSVW metadata descriptor of a CLDF dataset.
//!
//! Only the parts the pipeline works with are typed (tables, columns,
//! primary and foreign keys); every other property is carried through
//! untouched so a descriptor survives a load/save cycle.
//!
//! Tables are addressed either by URL (`regions.csv`) or by CLDF component
//! (`LanguageTable`), see [`Schema::table`].

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{SchemaError, SchemaResult};

pub mod builder;
pub mod terms;

pub use builder::SchemaBuilder;

/// Top-level metadata descriptor (`StructureDataset-metadata.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(flatten)]
    pub properties: Map<String, JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub url: String,
    #[serde(rename = "dc:conformsTo", default, skip_serializing_if = "Option::is_none")]
    pub conforms_to: Option<String>,
    #[serde(rename = "tableSchema", default)]
    pub table_schema: TableSchema,
    #[serde(flatten)]
    pub properties: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(
        rename = "primaryKey",
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub primary_key: Vec<String>,
    #[serde(rename = "foreignKeys", default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKey>,
    #[serde(flatten)]
    pub properties: Map<String, JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<Datatype>,
    #[serde(rename = "propertyUrl", default, skip_serializing_if = "Option::is_none")]
    pub property_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(rename = "dc:description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub properties: Map<String, JsonValue>,
}

/// A column datatype: either a plain name or an object with a base and constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Datatype {
    Name(String),
    Description(DatatypeDescription),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatatypeDescription {
    #[serde(default = "default_base")]
    pub base: String,
    /// Numbers or numeric strings, as CSVW allows both.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<JsonValue>,
    #[serde(flatten)]
    pub properties: Map<String, JsonValue>,
}

fn default_base() -> String {
    "string".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    #[serde(rename = "columnReference", deserialize_with = "one_or_many")]
    pub column_reference: Vec<String>,
    pub reference: ForeignKeyReference,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyReference {
    /// URL of the referenced table.
    pub resource: String,
    #[serde(rename = "columnReference", deserialize_with = "one_or_many")]
    pub column_reference: Vec<String>,
}

/// CSVW allows a single column name wherever a list of names is expected.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

const NUMERIC_BASES: &[&str] = &["float", "double", "decimal", "number", "integer"];

impl Schema {
    /// Load a metadata descriptor from disk.
    pub fn load(path: &Path) -> SchemaResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| SchemaError::InvalidDescriptor {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Position of a table given its URL or CLDF component name.
    pub fn table_index(&self, key: &str) -> Option<usize> {
        self.tables
            .iter()
            .position(|t| t.url == key)
            .or_else(|| self.tables.iter().position(|t| t.component() == Some(key)))
    }

    pub fn table(&self, key: &str) -> Option<&Table> {
        self.table_index(key).map(|i| &self.tables[i])
    }

    pub fn table_mut(&mut self, key: &str) -> Option<&mut Table> {
        self.table_index(key).map(move |i| &mut self.tables[i])
    }

    pub fn require_table(&self, key: &str) -> SchemaResult<&Table> {
        self.table(key)
            .ok_or_else(|| SchemaError::UnknownTable(key.to_string()))
    }

    pub fn set_property(&mut self, key: &str, value: JsonValue) {
        self.properties.insert(key.to_string(), value);
    }
}

impl Table {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            conforms_to: None,
            table_schema: TableSchema::default(),
            properties: Map::new(),
        }
    }

    /// CLDF component name, e.g. `LanguageTable`.
    pub fn component(&self) -> Option<&str> {
        self.conforms_to
            .as_deref()
            .and_then(|uri| uri.rsplit_once('#'))
            .map(|(_, term)| term)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.table_schema.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.table_schema
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Component name if present, URL otherwise.
    pub fn label(&self) -> &str {
        self.component().unwrap_or(&self.url)
    }
}

impl Column {
    /// A string column; well-known CLDF names get their ontology property.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let property_url = terms::property_url(&name);
        Self {
            required: name == "ID",
            name,
            datatype: None,
            property_url,
            separator: None,
            description: None,
            properties: Map::new(),
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    pub fn with_property(mut self, term: &str) -> Self {
        self.property_url = Some(terms::term_url(term));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// A float column bounded to `[minimum, maximum]`.
    pub fn with_float_range(mut self, minimum: f64, maximum: f64) -> Self {
        self.datatype = Some(Datatype::Description(DatatypeDescription {
            base: "float".to_string(),
            minimum: Some(JsonValue::from(minimum)),
            maximum: Some(JsonValue::from(maximum)),
            properties: Map::new(),
        }));
        self
    }

    pub fn base_datatype(&self) -> &str {
        match &self.datatype {
            None => "string",
            Some(Datatype::Name(name)) => name,
            Some(Datatype::Description(desc)) => &desc.base,
        }
    }

    pub fn is_numeric(&self) -> bool {
        NUMERIC_BASES.contains(&self.base_datatype())
    }

    pub fn is_list(&self) -> bool {
        self.separator.is_some()
    }

    pub fn minimum(&self) -> Option<f64> {
        match &self.datatype {
            Some(Datatype::Description(desc)) => desc.minimum.as_ref().and_then(json_number),
            _ => None,
        }
    }

    pub fn maximum(&self) -> Option<f64> {
        match &self.datatype {
            Some(Datatype::Description(desc)) => desc.maximum.as_ref().and_then(json_number),
            _ => None,
        }
    }
}

fn json_number(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor() -> JsonValue {
        json!({
            "@context": ["http://www.w3.org/ns/csvw", {"@language": "en"}],
            "dc:conformsTo": "http://cldf.clld.org/v1.0/terms.rdf#StructureDataset",
            "tables": [{
                "url": "languages.csv",
                "dc:conformsTo": "http://cldf.clld.org/v1.0/terms.rdf#LanguageTable",
                "tableSchema": {
                    "columns": [
                        {"name": "ID", "required": true},
                        {"name": "Latitude", "datatype": {"base": "decimal", "minimum": "-90", "maximum": "90"}}
                    ],
                    "primaryKey": "ID"
                }
            }]
        })
    }

    #[test]
    fn test_parse_descriptor() {
        let schema: Schema = serde_json::from_value(descriptor()).unwrap();
        let table = schema.table("LanguageTable").unwrap();
        assert_eq!(table.url, "languages.csv");
        assert_eq!(table.table_schema.primary_key, vec!["ID"]);
        let lat = table.column("Latitude").unwrap();
        assert!(lat.is_numeric());
        assert_eq!(lat.minimum(), Some(-90.0));
        assert!(schema.properties.contains_key("@context"));
    }

    #[test]
    fn test_lookup_by_url_and_component() {
        let schema: Schema = serde_json::from_value(descriptor()).unwrap();
        assert_eq!(schema.table_index("languages.csv"), Some(0));
        assert_eq!(schema.table_index("LanguageTable"), Some(0));
        assert!(schema.table("ParameterTable").is_none());
        assert!(schema.require_table("ParameterTable").is_err());
    }

    #[test]
    fn test_round_trip_keeps_unknown_properties() {
        let mut raw = descriptor();
        raw["tables"][0]["dc:extent"] = json!(77);
        let schema: Schema = serde_json::from_value(raw).unwrap();
        let back = serde_json::to_value(&schema).unwrap();
        assert_eq!(back["tables"][0]["dc:extent"], 77);
        assert_eq!(back["tables"][0]["tableSchema"]["primaryKey"], json!(["ID"]));
    }

    #[test]
    fn test_new_column_gets_cldf_property() {
        let col = Column::new("Language_ID");
        assert_eq!(
            col.property_url.as_deref(),
            Some("http://cldf.clld.org/v1.0/terms.rdf#languageReference")
        );
        assert!(Column::new("abbr").property_url.is_none());
        assert!(Column::new("ID").required);
    }
}
