//! Stable identifiers for codes and values.
//!
//! The export numbers codes and values sequentially; the CLDF dataset derives
//! them from the feature and variety they belong to instead. These rules only
//! apply to output rows, joins always use the raw IDs.

/// Rating name as used in code IDs: `?` and empty ratings become `NA`.
pub fn normalize_code_name(name: &str) -> String {
    if name.is_empty() {
        "NA".to_string()
    } else {
        name.replace('?', "NA")
    }
}

/// `{Parameter_ID}-{Name}`.
pub fn code_id(parameter_id: &str, name: &str) -> String {
    format!("{}-{}", parameter_id, normalize_code_name(name))
}

/// `{Language_ID}-{Parameter_ID}`.
pub fn value_id(language_id: &str, parameter_id: &str) -> String {
    format!("{}-{}", language_id, parameter_id)
}

/// Code a value points to, `NA` when the rating is missing.
pub fn value_code_id(parameter_id: &str, value: Option<&str>) -> String {
    code_id(parameter_id, value.unwrap_or(""))
}
