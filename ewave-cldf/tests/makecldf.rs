//! End-to-end conversion of a miniature eWAVE export.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use ewave::models::cldf::{EXAMPLE_TABLE, LANGUAGE_TABLE, VALUE_TABLE};
use ewave::{
    check_extent, make_cldf, run, Cell, CldfWriter, Config, Dataset, Extent, IntegrityError,
    PipelineError,
};

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

fn config(raw_dir: &Path, cldf_dir: &Path) -> Config {
    Config {
        raw_dir: raw_dir.to_path_buf(),
        cldf_dir: cldf_dir.to_path_buf(),
        metadata_path: fixtures().join("metadata.json"),
        ..Config::default()
    }
}

fn convert(cldf_dir: &Path) -> Dataset {
    let config = config(&fixtures().join("raw"), cldf_dir);
    run(&config).unwrap();
    Dataset::read(&config.cldf_metadata()).unwrap()
}

fn cell<'a>(dataset: &'a Dataset, table: &str, id: &str, column: &str) -> &'a Cell {
    let rows = dataset.rows(table).unwrap();
    let (_, row) = rows
        .iter()
        .find(|(_, row)| row.get("ID") == Some(&Cell::Text(id.to_string())))
        .unwrap_or_else(|| panic!("no row {} in {}", id, table));
    &row[column]
}

fn copy_dir(from: &Path, to: &Path) {
    for entry in fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        fs::copy(entry.path(), to.join(entry.file_name())).unwrap();
    }
}

#[test]
fn test_run_produces_valid_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&fixtures().join("raw"), dir.path());
    let summary = run(&config).unwrap();

    assert_eq!(summary.languages, 2);
    assert_eq!(summary.parameters, 2);
    assert_eq!(summary.values, 4);
    assert_eq!(summary.examples, 2);
    assert!(dir.path().join("sources.bib").exists());
}

#[test]
fn test_contributions_merged_into_languages() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = convert(dir.path());

    assert!(dataset.schema.table("contributions.csv").is_none());
    assert!(!dir.path().join("contributions.csv").exists());
    assert!(!dataset.schema.table(VALUE_TABLE).unwrap().has_column("Contribution_ID"));

    assert_eq!(
        cell(&dataset, LANGUAGE_TABLE, "2", "Description"),
        &Cell::Text("English as spoken in Ireland, north and south.".into())
    );
    assert_eq!(
        cell(&dataset, LANGUAGE_TABLE, "1", "abbr"),
        &Cell::Text("OrkSh".into())
    );
    assert_eq!(
        cell(&dataset, LANGUAGE_TABLE, "1", "Contributor_ID"),
        &Cell::List(vec!["40".into(), "5".into()])
    );
}

#[test]
fn test_codes_and_values_renumbered() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = convert(dir.path());

    let codes: Vec<&Cell> = dataset
        .rows("CodeTable")
        .unwrap()
        .iter()
        .map(|(_, row)| &row["ID"])
        .collect();
    assert!(codes.contains(&&Cell::Text("1-NA".into())));
    assert!(codes.contains(&&Cell::Text("2-D".into())));

    assert_eq!(
        cell(&dataset, VALUE_TABLE, "2-1", "Code_ID"),
        &Cell::Text("1-NA".into())
    );
    assert_eq!(
        cell(&dataset, VALUE_TABLE, "1-1", "Example_ID"),
        &Cell::List(vec!["100".into()])
    );
    assert_eq!(
        cell(&dataset, VALUE_TABLE, "1-2", "Example_ID"),
        &Cell::List(Vec::new())
    );
}

#[test]
fn test_example_sources_sorted_and_escaped() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = convert(dir.path());

    assert_eq!(
        cell(&dataset, EXAMPLE_TABLE, "100", "Source"),
        &Cell::List(vec!["filppula1999".into(), "kortmann2004[p. (4)]".into()])
    );
    assert_eq!(
        cell(&dataset, EXAMPLE_TABLE, "101", "Source"),
        &Cell::List(vec!["filppula1999[12]".into()])
    );
}

#[test]
fn test_history_and_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = convert(dir.path());

    let history = dataset.rows("history.csv").unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].1["Version"], Cell::Text("1.0".into()));
    assert_eq!(history[1].1["Code_ID"], Cell::Text("1-NA".into()));

    assert_eq!(dataset.schema.properties["dc:title"], "eWAVE fixture");
    assert_eq!(dataset.schema.properties["dc:source"], "sources.bib");
}

#[test]
fn test_output_is_deterministic() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    convert(first.path());
    convert(second.path());

    let mut names: Vec<_> = fs::read_dir(first.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    names.sort();
    assert!(!names.is_empty());
    for name in names {
        assert_eq!(
            fs::read(first.path().join(&name)).unwrap(),
            fs::read(second.path().join(&name)).unwrap(),
            "{:?} differs between runs",
            name
        );
    }
}

#[test]
fn test_missing_variety_is_fatal() {
    let raw = tempfile::tempdir().unwrap();
    copy_dir(&fixtures().join("raw"), raw.path());
    fs::write(raw.path().join("variety.csv"), "1,1,L1t,OrkSh\n").unwrap();

    let err = make_cldf(raw.path(), None).unwrap_err();
    match err {
        PipelineError::Integrity(IntegrityError::MissingKey { key, .. }) => assert_eq!(key, "2"),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_failed_run_leaves_output_untouched() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    copy_dir(&fixtures().join("raw"), raw.path());
    fs::remove_file(raw.path().join("changes.json")).unwrap();

    assert!(run(&config(raw.path(), out.path())).is_err());
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn test_invalid_dataset_is_not_published() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    copy_dir(&fixtures().join("raw"), raw.path());
    fs::write(
        raw.path().join("feature.csv"),
        "1,Kortmann 2004,1,145.5,72.3\n2,,1,12,30\n",
    )
    .unwrap();

    let err = run(&config(raw.path(), out.path())).unwrap_err();
    assert!(err.to_string().contains("145.5"), "{}", err);
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    assert!(!CldfWriter::staging_for(out.path()).dir().exists());
}

#[test]
fn test_rerun_removes_stale_tables() {
    let out = tempfile::tempdir().unwrap();
    fs::write(out.path().join("contributions.csv"), "ID,Name\n1,old\n").unwrap();
    fs::write(out.path().join("README.md"), "# eWAVE\n").unwrap();

    run(&config(&fixtures().join("raw"), out.path())).unwrap();

    assert!(!out.path().join("contributions.csv").exists());
    assert!(out.path().join("README.md").exists());
    assert!(out.path().join("values.csv").exists());
    assert!(!CldfWriter::staging_for(out.path()).dir().exists());
}

#[test]
fn test_colliding_values_are_fatal() {
    let raw = tempfile::tempdir().unwrap();
    copy_dir(&fixtures().join("raw"), raw.path());
    let mut values = fs::OpenOptions::new()
        .append(true)
        .open(raw.path().join("values.csv"))
        .unwrap();
    writeln!(values, "14,1,1,B,2,,,1").unwrap();

    match make_cldf(raw.path(), None).unwrap_err() {
        PipelineError::Integrity(IntegrityError::DuplicateId { table, id }) => {
            assert_eq!(table, VALUE_TABLE);
            assert_eq!(id, "1-1");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_empty_rating_maps_to_na_code() {
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    copy_dir(&fixtures().join("raw"), raw.path());
    let values = fs::read_to_string(raw.path().join("values.csv")).unwrap();
    fs::write(
        raw.path().join("values.csv"),
        values.replace("12,2,1,?,3,,,2", "12,2,1,,3,,,2"),
    )
    .unwrap();

    let config = config(raw.path(), out.path());
    run(&config).unwrap();
    let dataset = Dataset::read(&config.cldf_metadata()).unwrap();
    assert_eq!(
        cell(&dataset, VALUE_TABLE, "2-1", "Code_ID"),
        &Cell::Text("1-NA".into())
    );
    assert_eq!(cell(&dataset, VALUE_TABLE, "2-1", "Value"), &Cell::Null);
}

#[test]
fn test_fixture_extent() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = convert(dir.path());
    let extent = Extent {
        languages: 2,
        parameters: 2,
    };
    assert!(check_extent(&dataset, &extent).is_ok());
    assert!(check_extent(&dataset, &Extent::default()).is_err());
}

/// Needs the real export, e.g. after `ewave download`.
#[test]
#[ignore]
fn test_full_dataset_extent() {
    let raw = std::env::var("EWAVE_RAW_DIR").unwrap_or_else(|_| "raw".to_string());
    let out = tempfile::tempdir().unwrap();
    let config = Config {
        raw_dir: PathBuf::from(raw),
        cldf_dir: out.path().to_path_buf(),
        ..Config::default()
    };
    run(&config).unwrap();
    let dataset = Dataset::read(&config.cldf_metadata()).unwrap();
    check_extent(&dataset, &Extent::default()).unwrap();
}
