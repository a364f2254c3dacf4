//! Routing resolved words into output sheets.
//!
//! The primary sheet carries one row per target word in input order. The
//! ambiguity report is a separate sheet with one row per candidate lemma and
//! is only produced when it has rows.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use lemmata_index::{AmbiguityEntry, Annotation};
use lemmata_types::{MatchStatus, Synopsis};
use serde::Serialize;

use crate::error::ToolError;
use crate::style::LemmaStyle;
use crate::target::{Table, Target, TargetFormat};

/// Separator between synopses sharing one cell.
pub const SYNOPSIS_SEPARATOR: &str = "; ";

/// Which optional columns to emit and how to display lemmata.
#[derive(Clone, Copy, Debug, Default)]
pub struct OutputOptions {
    pub synopsis: bool,
    pub use_locations: bool,
    pub style: LemmaStyle,
}

/// A header row plus data rows, ready to be written as one table.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write as a delimited table, replacing any existing file.
    pub fn write(&self, path: &Path, delimiter: u8) -> Result<(), ToolError> {
        let file = File::create(path).map_err(|err| ToolError::write(path, err))?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_writer(BufWriter::new(file));
        writer
            .write_record(&self.headers)
            .map_err(|err| ToolError::write(path, err))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|err| ToolError::write(path, err))?;
        }
        writer.flush().map_err(|err| ToolError::write(path, err))?;
        Ok(())
    }
}

/// Build the primary sheet for `target`. `annotations` must come from
/// resolving `target.words()`, so they line up by position.
pub fn primary_sheet(
    target: &Target,
    annotations: &[Annotation<'_>],
    options: &OutputOptions,
) -> Sheet {
    match target {
        Target::Table(table) => table_sheet(table, annotations, options),
        Target::Plain(_) => plain_sheet(annotations, options),
    }
}

fn table_sheet(table: &Table, annotations: &[Annotation<'_>], options: &OutputOptions) -> Sheet {
    let insert_at = table.word_column + 1;
    let mut added = vec!["LEMMA", "STATUS"];
    if options.synopsis {
        added.push("SYNOPSIS");
    }

    let mut headers = table.headers.clone();
    let mut taken = table.headers.clone();
    for (offset, name) in added.iter().enumerate() {
        let name = unique_header(name, &taken);
        taken.push(name.clone());
        headers.insert(insert_at + offset, name);
    }

    let rows = table
        .rows
        .iter()
        .zip(annotations)
        .map(|(row, annotation)| {
            let mut out = row.clone();
            let cells = annotation_cells(annotation, options);
            for (offset, cell) in cells.into_iter().enumerate() {
                out.insert(insert_at + offset, cell);
            }
            out
        })
        .collect();

    Sheet { headers, rows }
}

fn plain_sheet(annotations: &[Annotation<'_>], options: &OutputOptions) -> Sheet {
    let mut headers = vec!["TEXT".to_string(), "LEMMA".to_string(), "STATUS".to_string()];
    if options.use_locations {
        headers.push("LOCATION".to_string());
    }
    if options.synopsis {
        headers.push("SYNOPSIS".to_string());
    }

    let rows = annotations
        .iter()
        .map(|annotation| {
            let mut row = vec![
                annotation.word.clone(),
                styled_lemma(annotation.lemma, &options.style),
                annotation.status.to_string(),
            ];
            if options.use_locations {
                row.push(annotation.location.clone().unwrap_or_default());
            }
            if options.synopsis {
                row.push(join_synopses(annotation.synopses));
            }
            row
        })
        .collect();

    Sheet { headers, rows }
}

/// `LEMMA`, `STATUS` and optionally `SYNOPSIS` cells for one word.
fn annotation_cells(annotation: &Annotation<'_>, options: &OutputOptions) -> Vec<String> {
    let mut cells = vec![
        styled_lemma(annotation.lemma, &options.style),
        annotation.status.to_string(),
    ];
    if options.synopsis {
        cells.push(join_synopses(annotation.synopses));
    }
    cells
}

/// One row per candidate lemma of every ambiguous word.
pub fn ambiguity_sheet(entries: &[AmbiguityEntry<'_>], style: &LemmaStyle) -> Sheet {
    let headers = ["POSITION", "LOCATION", "TEXT", "LEMMA", "SYNOPSES"]
        .into_iter()
        .map(String::from)
        .collect();
    let rows = entries
        .iter()
        .flat_map(|entry| {
            entry.candidates.iter().map(move |candidate| {
                vec![
                    (entry.position + 1).to_string(),
                    entry.location.clone().unwrap_or_default(),
                    entry.word.clone(),
                    style.apply(candidate.lemma),
                    join_synopses(Some(candidate.synopses)),
                ]
            })
        })
        .collect();
    Sheet { headers, rows }
}

fn styled_lemma(lemma: Option<&str>, style: &LemmaStyle) -> String {
    lemma.map(|lemma| style.apply(lemma)).unwrap_or_default()
}

fn join_synopses(synopses: Option<&BTreeSet<Synopsis>>) -> String {
    synopses
        .into_iter()
        .flatten()
        .map(Synopsis::to_string)
        .collect::<Vec<_>>()
        .join(SYNOPSIS_SEPARATOR)
}

/// `name`, or `name_2`, `name_3`, ... when taken (case-insensitive).
fn unique_header(name: &str, taken: &[String]) -> String {
    let is_taken = |candidate: &str| {
        taken
            .iter()
            .any(|header| header.trim().eq_ignore_ascii_case(candidate))
    };
    if !is_taken(name) {
        return name.to_string();
    }
    (2..)
        .map(|n| format!("{name}_{n}"))
        .find(|candidate| !is_taken(candidate.as_str()))
        .unwrap_or_else(|| name.to_string())
}

/// `<stem>_lemmata.<ext>` next to the target; plain targets become `csv`.
pub fn default_output_path(target: &Path, format: TargetFormat) -> PathBuf {
    let extension = match format {
        TargetFormat::Table { .. } => target
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_else(|| "csv".to_string()),
        TargetFormat::PlainText => "csv".to_string(),
    };
    sibling_with_suffix(target, "_lemmata", &extension)
}

/// `<output stem>_ambiguous.<output ext>`.
pub fn ambiguity_path(output: &Path) -> PathBuf {
    let extension = output
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_else(|| "csv".to_string());
    sibling_with_suffix(output, "_ambiguous", &extension)
}

pub(crate) fn sibling_with_suffix(path: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}{suffix}.{extension}"))
}

/// Delimiter for an output path: tab for `tsv`/`tab`, comma otherwise.
pub fn delimiter_for(path: &Path) -> u8 {
    match TargetFormat::detect(path) {
        Ok(TargetFormat::Table { delimiter }) => delimiter,
        _ => b',',
    }
}

#[derive(Serialize)]
struct EchoLine<'a> {
    position: usize,
    word: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
    status: MatchStatus,
    lemma: Option<String>,
}

/// One JSON object per annotation, one per line.
pub fn write_echo<W: Write>(
    annotations: &[Annotation<'_>],
    style: &LemmaStyle,
    mut out: W,
) -> io::Result<()> {
    for annotation in annotations {
        let line = EchoLine {
            position: annotation.position,
            word: &annotation.word,
            location: annotation.location.as_deref(),
            status: annotation.status,
            lemma: annotation.lemma.map(|lemma| style.apply(lemma)),
        };
        serde_json::to_writer(&mut out, &line)?;
        out.write_all(b"\n")?;
    }
    out.flush()
}
