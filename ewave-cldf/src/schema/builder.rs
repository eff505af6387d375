//! Explicit, owned schema augmentation.
//!
//! A [`SchemaBuilder`] wraps the base descriptor and applies additions and
//! removals before any row is written. Declarations that reference tables or
//! columns that don't exist fail immediately.

use super::{Column, ForeignKey, ForeignKeyReference, Schema, Table};
use crate::error::{SchemaError, SchemaResult};

#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new(base: Schema) -> Self {
        Self { schema: base }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn finish(self) -> Schema {
        self.schema
    }

    /// Declare a new table. An `ID` column becomes the primary key.
    pub fn add_table(&mut self, url: &str, columns: Vec<Column>) -> SchemaResult<()> {
        if self.schema.table_index(url).is_some() {
            return Err(SchemaError::DuplicateTable(url.to_string()));
        }

        let mut table = Table::new(url);
        for column in columns {
            push_column(&mut table, column)?;
        }
        if table.has_column("ID") {
            table.table_schema.primary_key = vec!["ID".to_string()];
        }
        self.schema.tables.push(table);
        Ok(())
    }

    /// Append columns to an existing table.
    pub fn add_columns(&mut self, table: &str, columns: Vec<Column>) -> SchemaResult<()> {
        let target = self
            .schema
            .table_mut(table)
            .ok_or_else(|| SchemaError::UnknownTable(table.to_string()))?;
        for column in columns {
            push_column(target, column)?;
        }
        Ok(())
    }

    /// Declare `table.column` as referencing `target.target_column`.
    pub fn add_foreign_key(
        &mut self,
        table: &str,
        column: &str,
        target: &str,
        target_column: &str,
    ) -> SchemaResult<()> {
        let target_table = self.schema.require_table(target)?;
        if !target_table.has_column(target_column) {
            return Err(SchemaError::UnknownColumn {
                table: target.to_string(),
                column: target_column.to_string(),
            });
        }
        let resource = target_table.url.clone();

        let source = self
            .schema
            .table_mut(table)
            .ok_or_else(|| SchemaError::UnknownTable(table.to_string()))?;
        if !source.has_column(column) {
            return Err(SchemaError::UnknownColumn {
                table: table.to_string(),
                column: column.to_string(),
            });
        }

        let fk = ForeignKey {
            column_reference: vec![column.to_string()],
            reference: ForeignKeyReference {
                resource,
                column_reference: vec![target_column.to_string()],
            },
        };
        if !source.table_schema.foreign_keys.contains(&fk) {
            source.table_schema.foreign_keys.push(fk);
        }
        Ok(())
    }

    /// Drop a table together with every foreign key pointing at it.
    pub fn remove_table(&mut self, table: &str) -> SchemaResult<()> {
        let index = self
            .schema
            .table_index(table)
            .ok_or_else(|| SchemaError::UnknownTable(table.to_string()))?;
        let removed = self.schema.tables.remove(index);

        for other in &mut self.schema.tables {
            other
                .table_schema
                .foreign_keys
                .retain(|fk| fk.reference.resource != removed.url);
        }
        Ok(())
    }

    /// Drop columns, their primary key membership and any foreign key using them.
    pub fn remove_columns(&mut self, table: &str, columns: &[&str]) -> SchemaResult<()> {
        let target = self
            .schema
            .table_mut(table)
            .ok_or_else(|| SchemaError::UnknownTable(table.to_string()))?;
        for name in columns {
            if !target.has_column(name) {
                return Err(SchemaError::UnknownColumn {
                    table: table.to_string(),
                    column: name.to_string(),
                });
            }
        }

        let uses = |refs: &[String]| refs.iter().any(|c| columns.contains(&c.as_str()));
        let url = target.url.clone();
        target
            .table_schema
            .columns
            .retain(|c| !columns.contains(&c.name.as_str()));
        target
            .table_schema
            .primary_key
            .retain(|c| !columns.contains(&c.as_str()));
        target
            .table_schema
            .foreign_keys
            .retain(|fk| !uses(&fk.column_reference));

        for other in &mut self.schema.tables {
            other.table_schema.foreign_keys.retain(|fk| {
                !(fk.reference.resource == url && uses(&fk.reference.column_reference))
            });
        }
        Ok(())
    }
}

fn push_column(table: &mut Table, column: Column) -> SchemaResult<()> {
    if table.has_column(&column.name) {
        return Err(SchemaError::DuplicateColumn {
            table: table.url.clone(),
            column: column.name,
        });
    }
    table.table_schema.columns.push(column);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> Schema {
        serde_json::from_value(json!({
            "tables": [
                {
                    "url": "languages.csv",
                    "dc:conformsTo": "http://cldf.clld.org/v1.0/terms.rdf#LanguageTable",
                    "tableSchema": {"columns": [{"name": "ID"}, {"name": "Name"}], "primaryKey": ["ID"]}
                },
                {
                    "url": "contributions.csv",
                    "tableSchema": {"columns": [{"name": "ID"}], "primaryKey": ["ID"]}
                },
                {
                    "url": "values.csv",
                    "dc:conformsTo": "http://cldf.clld.org/v1.0/terms.rdf#ValueTable",
                    "tableSchema": {
                        "columns": [{"name": "ID"}, {"name": "Language_ID"}, {"name": "Contribution_ID"}],
                        "foreignKeys": [
                            {"columnReference": ["Language_ID"], "reference": {"resource": "languages.csv", "columnReference": ["ID"]}},
                            {"columnReference": ["Contribution_ID"], "reference": {"resource": "contributions.csv", "columnReference": ["ID"]}}
                        ]
                    }
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_add_table_sets_primary_key() {
        let mut builder = SchemaBuilder::new(base());
        builder
            .add_table("regions.csv", vec![Column::new("ID"), Column::new("Name")])
            .unwrap();
        let schema = builder.finish();
        let regions = schema.table("regions.csv").unwrap();
        assert_eq!(regions.table_schema.primary_key, vec!["ID"]);
        assert_eq!(regions.column_names(), vec!["ID", "Name"]);
    }

    #[test]
    fn test_add_foreign_key_to_missing_table_fails() {
        let mut builder = SchemaBuilder::new(base());
        builder
            .add_columns("LanguageTable", vec![Column::new("Region_ID")])
            .unwrap();
        let err = builder
            .add_foreign_key("LanguageTable", "Region_ID", "regions.csv", "ID")
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownTable(t) if t == "regions.csv"));
    }

    #[test]
    fn test_add_foreign_key_from_missing_column_fails() {
        let mut builder = SchemaBuilder::new(base());
        builder
            .add_table("regions.csv", vec![Column::new("ID")])
            .unwrap();
        let err = builder
            .add_foreign_key("LanguageTable", "Region_ID", "regions.csv", "ID")
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownColumn { .. }));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let mut builder = SchemaBuilder::new(base());
        let err = builder
            .add_columns("LanguageTable", vec![Column::new("Name")])
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateColumn { .. }));
    }

    #[test]
    fn test_remove_table_drops_dangling_foreign_keys() {
        let mut builder = SchemaBuilder::new(base());
        builder.remove_table("contributions.csv").unwrap();
        let schema = builder.finish();
        assert!(schema.table("contributions.csv").is_none());
        let fks = &schema.table("ValueTable").unwrap().table_schema.foreign_keys;
        assert_eq!(fks.len(), 1);
        assert_eq!(fks[0].reference.resource, "languages.csv");
        for table in &schema.tables {
            for fk in &table.table_schema.foreign_keys {
                assert!(schema.table(&fk.reference.resource).is_some());
            }
        }
    }

    #[test]
    fn test_remove_columns() {
        let mut builder = SchemaBuilder::new(base());
        builder
            .remove_columns("ValueTable", &["Contribution_ID"])
            .unwrap();
        let schema = builder.finish();
        let values = schema.table("ValueTable").unwrap();
        assert!(!values.has_column("Contribution_ID"));
        assert_eq!(values.table_schema.foreign_keys.len(), 1);
        assert!(builder_remove_unknown_fails());
    }

    fn builder_remove_unknown_fails() -> bool {
        let mut builder = SchemaBuilder::new(base());
        builder.remove_columns("ValueTable", &["Nope"]).is_err()
    }
}
