use std::fs;
use std::path::{Path, PathBuf};

use lemmata_dataset::{Dataset, SortKey};
use lemmata_tools::pipeline::default_sorted_path;
use lemmata_tools::style::LemmaStyle;
use lemmata_tools::{MatchOptions, ToolError, run_match, run_sort};

fn dataset() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("dataset.xml")
}

fn write_target(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn plain_list_keeps_order_and_reports_ambiguity() {
    let tempdir = tempfile::tempdir().unwrap();
    let target = write_target(tempdir.path(), "words.txt", "arma\nduces\nxyzzy\narma\n");
    let mut options = MatchOptions::new(&target, dataset());
    options.resolve.include_ambiguous = true;

    let report = run_match(&options).unwrap();
    assert_eq!(report.output, tempdir.path().join("words_lemmata.csv"));
    assert_eq!(
        lines(&report.output),
        [
            "TEXT,LEMMA,STATUS",
            "arma,arma,unique",
            "duces,,ambiguous",
            "xyzzy,,unmatched",
            "arma,arma,unique",
        ]
    );

    let ambiguous = report.ambiguous_output.expect("ambiguity report written");
    assert_eq!(ambiguous, tempdir.path().join("words_lemmata_ambiguous.csv"));
    assert_eq!(
        lines(&ambiguous),
        [
            "POSITION,LOCATION,TEXT,LEMMA,SYNOPSES",
            "2,2,duces,duco,V 2 Sg Fut",
            "2,2,duces,dux,N Pl Nom",
        ]
    );

    assert_eq!(report.summary.unique, 2);
    assert_eq!(report.summary.ambiguous, 1);
    assert_eq!(report.summary.unmatched, 1);
    assert_eq!(report.stats.skipped, 1);
}

#[test]
fn no_report_without_include_ambiguous() {
    let tempdir = tempfile::tempdir().unwrap();
    let target = write_target(tempdir.path(), "words.txt", "duces\n");
    let stale = tempdir.path().join("words_lemmata_ambiguous.csv");

    let mut options = MatchOptions::new(&target, dataset());
    options.resolve.include_ambiguous = true;
    let earlier = run_match(&options).unwrap();
    assert_eq!(earlier.ambiguous_output.as_ref(), Some(&stale));
    assert!(stale.exists());

    let report = run_match(&MatchOptions::new(&target, dataset())).unwrap();
    assert!(report.ambiguous_output.is_none());
    assert!(!stale.exists());
}

#[test]
fn table_target_gains_columns_after_word_column() {
    let tempdir = tempfile::tempdir().unwrap();
    let target = write_target(
        tempdir.path(),
        "list.csv",
        "ID,WORD,NOTE\n1,Arma,first\n2,cano,\n3,,blank\n",
    );
    let mut options = MatchOptions::new(&target, dataset());
    options.read.word_column = Some("word".into());
    options.output_options.synopsis = true;

    let report = run_match(&options).unwrap();
    assert_eq!(report.output, tempdir.path().join("list_lemmata.csv"));
    assert_eq!(
        lines(&report.output),
        [
            "ID,WORD,LEMMA,STATUS,SYNOPSIS,NOTE",
            "1,Arma,arma,unique,N Pl Acc; N Pl Nom,first",
            "2,cano,cano,unique,V 1 Sg Pres,",
            "3,,,unmatched,,blank",
        ]
    );
}

#[test]
fn passage_gets_locations() {
    let tempdir = tempfile::tempdir().unwrap();
    let target = write_target(
        tempdir.path(),
        "aeneid.txt",
        "[1] Arma virumque cano,\n[2] duces\n",
    );
    let mut options = MatchOptions::new(&target, dataset());
    options.output_options.use_locations = true;
    options.output = Some(tempdir.path().join("out.tsv"));

    let report = run_match(&options).unwrap();
    assert_eq!(
        lines(&report.output),
        [
            "TEXT\tLEMMA\tSTATUS\tLOCATION",
            "Arma\tarma\tunique\t1",
            "virumque\tvir\tunique\t1",
            "cano\tcano\tunique\t1",
            "duces\t\tambiguous\t2",
        ]
    );
}

#[test]
fn uniques_only_guesses_and_skips_report() {
    let tempdir = tempfile::tempdir().unwrap();
    let target = write_target(tempdir.path(), "words.txt", "duces\ncano\n");
    let mut options = MatchOptions::new(&target, dataset());
    options.resolve.include_ambiguous = true;
    options.resolve.dataset_is_unique = true;

    let report = run_match(&options).unwrap();
    assert_eq!(report.integrity_warnings, 1);
    assert!(report.ambiguous_output.is_none());
    assert_eq!(
        lines(&report.output),
        [
            "TEXT,LEMMA,STATUS",
            "duces,duco,ambiguous",
            "cano,cano,unique"
        ]
    );
}

#[test]
fn styling_applies_to_output_only() {
    let tempdir = tempfile::tempdir().unwrap();
    let target = write_target(tempdir.path(), "words.txt", "edo\nvirumque\n");
    let mut options = MatchOptions::new(&target, dataset());
    options.output_options.style = LemmaStyle {
        no_trailing_digits: true,
        uppercase: true,
        ..LemmaStyle::default()
    };

    let report = run_match(&options).unwrap();
    assert_eq!(
        lines(&report.output),
        ["TEXT,LEMMA,STATUS", "edo,EDO,unique", "virumque,VIR,unique"]
    );
}

#[test]
fn repeated_runs_are_byte_identical() {
    let tempdir = tempfile::tempdir().unwrap();
    let target = write_target(
        tempdir.path(),
        "words.txt",
        "duces arma cano duces virumque\n",
    );
    let mut options = MatchOptions::new(&target, dataset());
    options.resolve.include_ambiguous = true;
    options.output_options.synopsis = true;

    let first = run_match(&options).unwrap();
    let primary = fs::read(&first.output).unwrap();
    let report = fs::read(first.ambiguous_output.as_ref().unwrap()).unwrap();

    let second = run_match(&options).unwrap();
    assert_eq!(fs::read(&second.output).unwrap(), primary);
    assert_eq!(
        fs::read(second.ambiguous_output.as_ref().unwrap()).unwrap(),
        report
    );
}

#[test]
fn unsupported_target_format_fails() {
    let tempdir = tempfile::tempdir().unwrap();
    let target = write_target(tempdir.path(), "words.xlsx", "PK");
    let err = run_match(&MatchOptions::new(&target, dataset())).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ToolError>(),
        Some(ToolError::UnsupportedFormat { .. })
    ));
}

#[test]
fn non_utf8_plain_text_is_unsupported() {
    let tempdir = tempfile::tempdir().unwrap();
    let target = tempdir.path().join("words.txt");
    fs::write(&target, [0x61, 0xff, 0xfe, 0x0a]).unwrap();
    let err = run_match(&MatchOptions::new(&target, dataset())).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ToolError>(),
        Some(ToolError::UnsupportedFormat { .. })
    ));
}

#[test]
fn missing_inputs_are_reported() {
    let tempdir = tempfile::tempdir().unwrap();
    let target = tempdir.path().join("missing.txt");
    let err = run_match(&MatchOptions::new(&target, dataset())).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ToolError>(),
        Some(ToolError::InputNotFound(path)) if path == &target
    ));

    let target = write_target(tempdir.path(), "words.txt", "arma\n");
    let missing_dataset = tempdir.path().join("nope.xml");
    let err = run_match(&MatchOptions::new(&target, &missing_dataset)).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ToolError>(),
        Some(ToolError::InputNotFound(path)) if path == &missing_dataset
    ));
}

#[test]
fn unknown_word_column_is_unsupported() {
    let tempdir = tempfile::tempdir().unwrap();
    let target = write_target(tempdir.path(), "list.csv", "ID,TEXT\n1,arma\n");
    let mut options = MatchOptions::new(&target, dataset());
    options.read.word_column = Some("FORM".into());
    let err = run_match(&options).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ToolError>(),
        Some(ToolError::UnsupportedFormat { .. })
    ));
}

#[test]
fn sort_writes_sibling_file_by_lemma() {
    let tempdir = tempfile::tempdir().unwrap();
    let document = tempdir.path().join("dataset.xml");
    fs::copy(dataset(), &document).unwrap();

    let output = run_sort(&document, &SortKey::Lemma, None).unwrap();
    assert_eq!(output, default_sorted_path(&document));
    assert_eq!(output, tempdir.path().join("dataset_sorted.xml"));

    let sorted = Dataset::load(&output).unwrap();
    let lemmata: Vec<&str> = sorted
        .entries()
        .filter_map(|entry| entry.field("lemma"))
        .collect();
    assert_eq!(
        lemmata,
        ["arma", "arma", "cano", "duco", "dux", "edo2", "orphan", "vir"]
    );
}

#[test]
fn sort_in_place_replaces_document() {
    let tempdir = tempfile::tempdir().unwrap();
    let document = tempdir.path().join("dataset.xml");
    fs::copy(dataset(), &document).unwrap();

    let output = run_sort(&document, &SortKey::Lemma, Some(&document)).unwrap();
    assert_eq!(output, document);

    let sorted = Dataset::load(&document).unwrap();
    assert_eq!(sorted.entry_count(), 8);
    let lemmata: Vec<&str> = sorted
        .entries()
        .filter_map(|entry| entry.field("lemma"))
        .collect();
    assert_eq!(
        lemmata,
        ["arma", "arma", "cano", "duco", "dux", "edo2", "orphan", "vir"]
    );
    let leftovers = fs::read_dir(tempdir.path()).unwrap().count();
    assert_eq!(leftovers, 1);
}

#[test]
fn sort_missing_document_fails() {
    let tempdir = tempfile::tempdir().unwrap();
    let err = run_sort(&tempdir.path().join("none.xml"), &SortKey::Form, None).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ToolError>(),
        Some(ToolError::InputNotFound(_))
    ));
}
