//! Extends the schema of the raw CLDF export with the eWAVE-specific tables
//! and columns.

use crate::error::SchemaResult;
use crate::models::cldf::{
    CODE_TABLE, CONTRIBUTIONS, CONTRIBUTORS, EXAMPLE_TABLE, FEATURE_CATEGORIES, HISTORY, LANGUAGE_TABLE,
    PARAMETER_TABLE, REGIONS, VALUE_TABLE, VARIETY_TYPES,
};
use crate::schema::{Column, SchemaBuilder};

pub const ATTESTATION_DESCRIPTION: &str = "Attestation is a relative measure of how widespread a \
feature is in the set of eWAVE varieties. It is expressed as a percentage and is calculated as the \
sum of all A-, B- and C-ratings for a feature, divided by the number of varieties in the eWAVE \
dataset. The closer the value to 100%, the more widespread the feature is.";

pub const PERVASIVENESS_DESCRIPTION: &str = "\
Pervasiveness provides a measure of how pervasive a feature is on average in the varieties in
which it is attested. Pervasiveness is calculated as all A-ratings for a feature plus 0.6 times
the B-ratings for the same feature plus 0.3 times the C-ratings, divided by the sum of all
A-, B- and C-ratings for the feature. This value is then multiplied by 100 and expressed as a
percentage. A Pervasiveness value of 100% or close to 100% thus indicates that the feature is
highly pervasive (rated A) in all or most of the varieties for which it is attested, while a
value close to 30% (the lowest possible value) indicates that the feature is extremely rare
(rated C) in most or all of the varieties for which it is attested. Intermediate values are less
easy to interpret – here one has to look more closely at the ratio of A- to B- to C-values.
Two more things should also be noted here:

- The Pervasiveness value does not provide information on how widespread a feature is in the entire
  eWAVE dataset, i.e. for how many varieties the feature is actually attested.
- Since the eWAVE contributors did not all use exactly the same strategies in deciding when to
  give a feature an A- vs. a B- or a C- vs. a B- rating, it is very difficult to translate the
  ratings into numerical values that adequately reflect the differences between A-, B- and
  C-ratings. The choice made here (1 for A, 0.6 for B and 0.3 for C) is certainly only one of
  many, and further testing is required to see how adequate this model is.
";

fn columns(names: &[&str]) -> Vec<Column> {
    names.iter().map(|n| Column::new(*n)).collect()
}

/// Apply the eWAVE additions and removals to the base schema.
pub fn augment_schema(builder: &mut SchemaBuilder) -> SchemaResult<()> {
    // Controlled vocabularies.
    builder.add_table(REGIONS, columns(&["ID", "Name"]))?;
    builder.add_table(VARIETY_TYPES, columns(&["ID", "Name", "Description"]))?;
    builder.add_table(FEATURE_CATEGORIES, columns(&["ID", "Name", "Description"]))?;
    builder.add_table(
        CONTRIBUTORS,
        columns(&["ID", "Name", "URL", "Address", "Email"]),
    )?;

    // Contribution data is merged into the language table.
    builder.remove_table(CONTRIBUTIONS)?;

    let mut language_columns = columns(&["Description", "Region_ID", "Type_ID", "abbr"]);
    language_columns.push(Column::new("Contributor_ID").with_separator(" "));
    builder.add_columns(LANGUAGE_TABLE, language_columns)?;
    builder.add_foreign_key(LANGUAGE_TABLE, "Region_ID", REGIONS, "ID")?;
    builder.add_foreign_key(LANGUAGE_TABLE, "Type_ID", VARIETY_TYPES, "ID")?;
    builder.add_foreign_key(LANGUAGE_TABLE, "Contributor_ID", CONTRIBUTORS, "ID")?;

    let mut parameter_columns = columns(&["Category_ID", "Example_Source"]);
    parameter_columns.push(
        Column::new("Attestation")
            .with_float_range(0.0, 100.0)
            .with_description(ATTESTATION_DESCRIPTION),
    );
    parameter_columns.push(
        Column::new("Pervasiveness")
            .with_float_range(0.0, 100.0)
            .with_description(PERVASIVENESS_DESCRIPTION),
    );
    builder.add_columns(PARAMETER_TABLE, parameter_columns)?;
    builder.add_foreign_key(PARAMETER_TABLE, "Category_ID", FEATURE_CATEGORIES, "ID")?;

    builder.add_columns(
        VALUE_TABLE,
        vec![Column::new("Example_ID")
            .with_property("exampleReference")
            .with_separator(" ")],
    )?;
    builder.add_foreign_key(VALUE_TABLE, "Example_ID", EXAMPLE_TABLE, "ID")?;
    if builder
        .schema()
        .table(VALUE_TABLE)
        .is_some_and(|t| t.has_column("Contribution_ID"))
    {
        builder.remove_columns(VALUE_TABLE, &["Contribution_ID"])?;
    }

    builder.add_columns(
        EXAMPLE_TABLE,
        vec![Column::new("Source")
            .with_property("source")
            .with_separator(";")],
    )?;

    builder.add_table(
        HISTORY,
        columns(&["Version", "Language_ID", "Parameter_ID", "Code_ID"]),
    )?;
    builder.add_foreign_key(HISTORY, "Language_ID", LANGUAGE_TABLE, "ID")?;
    builder.add_foreign_key(HISTORY, "Parameter_ID", PARAMETER_TABLE, "ID")?;
    builder.add_foreign_key(HISTORY, "Code_ID", CODE_TABLE, "ID")?;

    Ok(())
}
