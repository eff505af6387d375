//! The eWAVE → CLDF conversion.
//!
//! [`make_cldf`] builds the whole dataset in memory:
//!
//! 1. load the raw metadata descriptor and augment its schema
//! 2. load vocabularies, contributors, history and the bibliography
//! 3. read the base tables and join the auxiliary records onto them
//! 4. renumber codes and values
//!
//! [`run`] additionally writes the result to a staging directory, validates
//! what was written there and only then moves it into the output directory.
//! Any error aborts before the output directory is touched.
//!
//! # Example
//!
//! ```rust,ignore
//! use ewave::transform::pipeline::make_cldf;
//! use std::path::Path;
//!
//! let data = make_cldf(Path::new("raw"), None)?;
//! println!("{} varieties", data.languages.len());
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde_json::Value as JsonValue;
use tracing::{debug, info, info_span, warn};

use super::augment::augment_schema;
use super::grouper::{contributors_by_language, examples_by_value, sources_by_example};
use super::identifiers::{code_id, value_code_id, value_id};
use crate::bibtex::Bibliography;
use crate::config::Config;
use crate::error::{CsvError, IntegrityError, IntegrityResult, PipelineResult};
use crate::metadata::DatasetMetadata;
use crate::models::cldf::{
    CODE_TABLE, EXAMPLE_TABLE, LANGUAGE_TABLE, PARAMETER_TABLE, VALUE_TABLE,
};
use crate::models::{
    ChangeRecord, Code, ContributionRecord, Contributor, Example, FeatureCategory, FeatureRecord,
    HistoryEntry, Language, Parameter, Region, TableRecord, Value, VarietyRecord, VarietyType,
};
use crate::parser::{load_keyed, load_records, read_cldf_table, read_json};
use crate::schema::{Schema, SchemaBuilder};
use crate::validation::{self, Dataset};
use crate::writer::CldfWriter;

// =============================================================================
// Input files
// =============================================================================

pub const RAW_METADATA: &str = "StructureDataset-metadata.json";
pub const VARIETY_FILE: &str = "variety.csv";
pub const FEATURE_FILE: &str = "feature.csv";
pub const REGION_FILE: &str = "region.psv";
pub const VARIETY_TYPE_FILE: &str = "varietytype.psv";
pub const FEATURE_CATEGORY_FILE: &str = "featurecategory.psv";
pub const CONTRIBUTOR_FILE: &str = "contributors.csv";
pub const CONTRIBUTION_FILE: &str = "contributions.csv";
pub const CONTRIBUTOR_ASSIGNMENT_FILE: &str = "cc.csv";
pub const EXAMPLE_SOURCE_FILE: &str = "examplesource.csv";
pub const VALUE_EXAMPLE_FILE: &str = "valueexample.csv";
pub const CHANGES_FILE: &str = "changes.json";
pub const SOURCES_FILE: &str = "sources.bib";

/// Releases recorded in the history table: key in `changes.json` → dataset version.
pub const HISTORY_RELEASES: &[(&str, &str)] = &[("2013", "1.0")];

// =============================================================================
// Result
// =============================================================================

/// The converted dataset, ready to be written.
#[derive(Debug, Clone)]
pub struct CldfData {
    pub schema: Schema,
    pub languages: Vec<Language>,
    pub regions: Vec<Region>,
    pub variety_types: Vec<VarietyType>,
    pub feature_categories: Vec<FeatureCategory>,
    pub contributors: Vec<Contributor>,
    pub parameters: Vec<Parameter>,
    pub codes: Vec<Code>,
    pub values: Vec<Value>,
    pub examples: Vec<Example>,
    pub history: Vec<HistoryEntry>,
    pub bibliography: Bibliography,
}

impl CldfData {
    /// Records per table, keyed by component or URL.
    pub fn tables(&self) -> Vec<(&'static str, Vec<&dyn TableRecord>)> {
        use crate::models::cldf::{CONTRIBUTORS, FEATURE_CATEGORIES, HISTORY, REGIONS, VARIETY_TYPES};

        vec![
            (LANGUAGE_TABLE, dyn_records(&self.languages)),
            (PARAMETER_TABLE, dyn_records(&self.parameters)),
            (CODE_TABLE, dyn_records(&self.codes)),
            (VALUE_TABLE, dyn_records(&self.values)),
            (EXAMPLE_TABLE, dyn_records(&self.examples)),
            (REGIONS, dyn_records(&self.regions)),
            (VARIETY_TYPES, dyn_records(&self.variety_types)),
            (FEATURE_CATEGORIES, dyn_records(&self.feature_categories)),
            (CONTRIBUTORS, dyn_records(&self.contributors)),
            (HISTORY, dyn_records(&self.history)),
        ]
    }
}

fn dyn_records<R: TableRecord>(records: &[R]) -> Vec<&dyn TableRecord> {
    records.iter().map(|r| r as &dyn TableRecord).collect()
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub languages: usize,
    pub parameters: usize,
    pub values: usize,
    pub examples: usize,
}

// =============================================================================
// Pipeline
// =============================================================================

/// Convert the raw export in `raw_dir`, then write and validate the dataset.
pub fn run(config: &Config) -> PipelineResult<RunSummary> {
    let metadata = DatasetMetadata::load_optional(&config.metadata_path)?;
    let data = make_cldf(&config.raw_dir, metadata.as_ref())?;

    let staging = CldfWriter::staging_for(&config.cldf_dir);
    staging.clear()?;
    if let Err(e) = write_validated(&staging, &data) {
        if let Err(cleanup) = staging.clear() {
            warn!(error = %cleanup, "could not remove staging directory");
        }
        return Err(e);
    }
    staging.publish(&config.cldf_dir)?;
    info!(dir = %config.cldf_dir.display(), "wrote CLDF dataset");

    Ok(RunSummary {
        languages: data.languages.len(),
        parameters: data.parameters.len(),
        values: data.values.len(),
        examples: data.examples.len(),
    })
}

/// Write `data` with `writer` and validate what ended up on disk.
fn write_validated(writer: &CldfWriter, data: &CldfData) -> PipelineResult<()> {
    let metadata_path = writer.write(data)?;
    debug!(dir = %writer.dir().display(), "staged CLDF dataset");

    let written = Dataset::read(&metadata_path)?;
    validation::validate_dataset(&written)?;
    info!("dataset is valid");
    Ok(())
}

/// Build the CLDF dataset from the raw export.
pub fn make_cldf(raw_dir: &Path, metadata: Option<&DatasetMetadata>) -> PipelineResult<CldfData> {
    let _span = info_span!("makecldf", raw = %raw_dir.display()).entered();

    let base = Schema::load(&raw_dir.join(RAW_METADATA))?;
    let mut builder = SchemaBuilder::new(base.clone());
    augment_schema(&mut builder)?;
    let mut schema = builder.finish();
    schema.set_property("dc:source", JsonValue::from(SOURCES_FILE));
    if let Some(metadata) = metadata {
        metadata.annotate(&mut schema);
    }
    info!(tables = schema.tables.len(), "schema augmented");

    let bibliography = Bibliography::load(&raw_dir.join(SOURCES_FILE))?;
    debug!(entries = bibliography.len(), "loaded bibliography");

    let variety_types: Vec<VarietyType> = load_records(&raw_dir.join(VARIETY_TYPE_FILE))?;
    let feature_categories: Vec<FeatureCategory> =
        load_records(&raw_dir.join(FEATURE_CATEGORY_FILE))?;
    let regions: Vec<Region> = load_records(&raw_dir.join(REGION_FILE))?;
    info!(
        regions = regions.len(),
        variety_types = variety_types.len(),
        feature_categories = feature_categories.len(),
        "loaded vocabularies"
    );

    let history = load_history(&raw_dir.join(CHANGES_FILE))?;
    let contributors: Vec<Contributor> = load_records(&raw_dir.join(CONTRIBUTOR_FILE))?;

    let languages = build_languages(raw_dir, &base)?;
    let parameters = build_parameters(raw_dir, &base)?;
    let examples = build_examples(raw_dir, &base)?;
    let codes = build_codes(raw_dir, &base)?;
    let values = build_values(raw_dir, &base)?;

    info!(
        languages = languages.len(),
        parameters = parameters.len(),
        codes = codes.len(),
        values = values.len(),
        examples = examples.len(),
        history = history.len(),
        "joined tables"
    );

    Ok(CldfData {
        schema,
        languages,
        regions,
        variety_types,
        feature_categories,
        contributors,
        parameters,
        codes,
        values,
        examples,
        history,
        bibliography,
    })
}

/// Rating changes of each recorded release.
fn load_history(path: &Path) -> PipelineResult<Vec<HistoryEntry>> {
    let releases: HashMap<String, Vec<Vec<JsonValue>>> = read_json(path)?;
    let mut history = Vec::new();

    for (key, version) in HISTORY_RELEASES {
        let changes = releases
            .get(*key)
            .ok_or_else(|| IntegrityError::MissingRelease(key.to_string()))?;
        for (i, items) in changes.iter().enumerate() {
            let change = ChangeRecord::from_json(items).ok_or_else(|| CsvError::InvalidValue {
                path: path.to_path_buf(),
                line: 0,
                column: format!("{}[{}]", key, i),
                value: JsonValue::from(items.clone()).to_string(),
                message: "expected [language, feature, code, ...]".to_string(),
            })?;
            history.push(HistoryEntry {
                version: version.to_string(),
                code_id: code_id(&change.parameter_id, &change.code),
                language_id: change.language_id,
                parameter_id: change.parameter_id,
            });
        }
    }

    Ok(history)
}

fn build_languages(raw_dir: &Path, base: &Schema) -> PipelineResult<Vec<Language>> {
    let table = base.require_table(LANGUAGE_TABLE)?;
    let mut languages: Vec<Language> = read_cldf_table(&raw_dir.join(&table.url), table)?;

    let varieties: HashMap<String, VarietyRecord> = load_keyed(&raw_dir.join(VARIETY_FILE))?;
    let contributions: HashMap<String, ContributionRecord> =
        load_keyed(&raw_dir.join(CONTRIBUTION_FILE))?;
    let mut contributors =
        contributors_by_language(load_records(&raw_dir.join(CONTRIBUTOR_ASSIGNMENT_FILE))?);

    for language in &mut languages {
        let variety = require(&varieties, &language.id, LANGUAGE_TABLE, VARIETY_FILE)?;
        language.region_id = variety.region_id.clone();
        language.type_id = variety.type_id.clone();
        language.abbr = variety.abbr.clone();
        language.description =
            require(&contributions, &language.id, LANGUAGE_TABLE, CONTRIBUTION_FILE)?
                .description
                .clone();
        language.contributor_ids = contributors.remove(&language.id).ok_or_else(|| {
            missing(LANGUAGE_TABLE, CONTRIBUTOR_ASSIGNMENT_FILE, &language.id)
        })?;
    }

    Ok(languages)
}

fn build_parameters(raw_dir: &Path, base: &Schema) -> PipelineResult<Vec<Parameter>> {
    let table = base.require_table(PARAMETER_TABLE)?;
    let mut parameters: Vec<Parameter> = read_cldf_table(&raw_dir.join(&table.url), table)?;
    let features: HashMap<String, FeatureRecord> = load_keyed(&raw_dir.join(FEATURE_FILE))?;

    for parameter in &mut parameters {
        let feature = require(&features, &parameter.id, PARAMETER_TABLE, FEATURE_FILE)?;
        parameter.example_source = feature.example_source.clone();
        parameter.category_id = feature.category_id.clone();
        parameter.attestation = feature.attestation;
        parameter.pervasiveness = feature.pervasiveness;
    }

    Ok(parameters)
}

fn build_examples(raw_dir: &Path, base: &Schema) -> PipelineResult<Vec<Example>> {
    let table = base.require_table(EXAMPLE_TABLE)?;
    let mut examples: Vec<Example> = read_cldf_table(&raw_dir.join(&table.url), table)?;
    let mut sources = sources_by_example(load_records(&raw_dir.join(EXAMPLE_SOURCE_FILE))?);

    let mut unsourced = 0;
    for example in &mut examples {
        example.source = sources.remove(&example.id).unwrap_or_default();
        if example.source.is_empty() {
            unsourced += 1;
        }
    }
    if !sources.is_empty() {
        warn!(
            count = sources.len(),
            "example sources reference unknown examples"
        );
    }
    debug!(unsourced, "examples without sources");

    Ok(examples)
}

fn build_codes(raw_dir: &Path, base: &Schema) -> PipelineResult<Vec<Code>> {
    let table = base.require_table(CODE_TABLE)?;
    let mut codes: Vec<Code> = read_cldf_table(&raw_dir.join(&table.url), table)?;

    let mut seen = HashSet::with_capacity(codes.len());
    for code in &mut codes {
        code.id = code_id(&code.parameter_id, &code.name);
        unique(&mut seen, &code.id, CODE_TABLE)?;
    }

    Ok(codes)
}

fn build_values(raw_dir: &Path, base: &Schema) -> PipelineResult<Vec<Value>> {
    let table = base.require_table(VALUE_TABLE)?;
    let mut values: Vec<Value> = read_cldf_table(&raw_dir.join(&table.url), table)?;
    let mut sentences = examples_by_value(load_records(&raw_dir.join(VALUE_EXAMPLE_FILE))?);

    let mut seen = HashSet::with_capacity(values.len());
    for value in &mut values {
        // Joined on the raw ID, before renumbering.
        value.example_ids = sentences.remove(&value.id).unwrap_or_default();
        value.id = value_id(&value.language_id, &value.parameter_id);
        value.code_id = Some(value_code_id(&value.parameter_id, value.value.as_deref()));
        unique(&mut seen, &value.id, VALUE_TABLE)?;
    }

    Ok(values)
}

// =============================================================================
// Join helpers
// =============================================================================

fn missing(table: &str, source_name: &str, key: &str) -> IntegrityError {
    IntegrityError::MissingKey {
        table: table.to_string(),
        source_name: source_name.to_string(),
        key: key.to_string(),
    }
}

/// A required join: the key must be present.
fn require<'a, T>(
    map: &'a HashMap<String, T>,
    key: &str,
    table: &str,
    source_name: &str,
) -> IntegrityResult<&'a T> {
    map.get(key).ok_or_else(|| missing(table, source_name, key))
}

fn unique(seen: &mut HashSet<String>, id: &str, table: &str) -> IntegrityResult<()> {
    if seen.insert(id.to_string()) {
        Ok(())
    } else {
        Err(IntegrityError::DuplicateId {
            table: table.to_string(),
            id: id.to_string(),
        })
    }
}
