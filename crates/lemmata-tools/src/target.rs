//! Reading target word lists.
//!
//! A target is either a delimited table with a header row, where one column
//! holds the words, or plain text. Plain text may be running prose: it is
//! split on anything that is not a letter, and `[1]`, `[2.3]` style section
//! markers plus trailing inline line numbers give each word a location.

use std::fs;
use std::path::Path;

use lemmata_index::TargetWord;
use tracing::{debug, info};
use unicode_normalization::char::is_combining_mark;

use crate::error::ToolError;

/// Column used for words when none is named and it exists.
pub const DEFAULT_WORD_COLUMN: &str = "TEXT";

/// Shape of a target file, decided from its extension.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TargetFormat {
    Table { delimiter: u8 },
    PlainText,
}

impl TargetFormat {
    pub fn detect(path: &Path) -> Result<Self, ToolError> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
        match extension.as_deref() {
            Some("csv") => Ok(TargetFormat::Table { delimiter: b',' }),
            Some("tsv" | "tab") => Ok(TargetFormat::Table { delimiter: b'\t' }),
            None | Some("txt" | "text" | "lst") => Ok(TargetFormat::PlainText),
            Some(other) => Err(ToolError::unsupported(
                path,
                format!("unrecognized extension .{other} (expected csv, tsv, tab, txt, text or lst)"),
            )),
        }
    }
}

/// Options that affect how a target is read.
#[derive(Clone, Debug, Default)]
pub struct ReadOptions {
    /// Header of the word column in a table (case-insensitive).
    pub word_column: Option<String>,
    /// Append the running line number to section labels.
    pub use_line_numbers: bool,
}

/// A table target, kept verbatim so its cells can be copied to the output.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    /// Data rows, each padded to at least the header width.
    pub rows: Vec<Vec<String>>,
    pub word_column: usize,
    pub delimiter: u8,
}

impl Table {
    /// One target word per data row. Location is the row's line in the file,
    /// counting the header as line 1.
    pub fn words(&self) -> Vec<TargetWord> {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                TargetWord::new(i, row[self.word_column].trim()).with_location((i + 2).to_string())
            })
            .collect()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Target {
    Table(Table),
    Plain(Vec<TargetWord>),
}

impl Target {
    pub fn words(&self) -> Vec<TargetWord> {
        match self {
            Target::Table(table) => table.words(),
            Target::Plain(words) => words.clone(),
        }
    }
}

pub fn read_target(path: &Path, options: &ReadOptions) -> Result<Target, ToolError> {
    let format = TargetFormat::detect(path)?;
    if !path.exists() {
        return Err(ToolError::InputNotFound(path.to_path_buf()));
    }
    let bytes = fs::read(path).map_err(|err| ToolError::read(path, err))?;

    let target = match format {
        TargetFormat::Table { delimiter } => {
            Target::Table(parse_table(path, &bytes, delimiter, options.word_column.as_deref())?)
        }
        TargetFormat::PlainText => {
            let text = std::str::from_utf8(&bytes)
                .map_err(|err| ToolError::unsupported(path, format!("not UTF-8 text: {err}")))?;
            Target::Plain(parse_plain(text, options.use_line_numbers))
        }
    };
    match &target {
        Target::Table(table) => info!(
            "read {} rows from {} (word column {:?})",
            table.rows.len(),
            path.display(),
            table.headers[table.word_column]
        ),
        Target::Plain(words) => info!("read {} words from {}", words.len(), path.display()),
    }
    Ok(target)
}

fn parse_table(
    path: &Path,
    bytes: &[u8],
    delimiter: u8,
    word_column: Option<&str>,
) -> Result<Table, ToolError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut records = reader.records();
    let headers: Vec<String> = match records.next() {
        Some(header) => header
            .map_err(|err| ToolError::read(path, err))?
            .iter()
            .map(|cell| cell.trim_start_matches('\u{feff}').to_string())
            .collect(),
        None => return Err(ToolError::unsupported(path, "table has no header row")),
    };

    let word_column = match word_column {
        Some(name) => find_column(&headers, name).ok_or_else(|| {
            ToolError::unsupported(path, format!("no column named {name:?} in header"))
        })?,
        None => find_column(&headers, DEFAULT_WORD_COLUMN).unwrap_or(0),
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record.map_err(|err| ToolError::read(path, err))?;
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        if row.len() < headers.len() {
            row.resize(headers.len(), String::new());
        }
        rows.push(row);
    }

    Ok(Table {
        headers,
        rows,
        word_column,
        delimiter,
    })
}

fn find_column(headers: &[String], name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case(name.trim()))
}

/// Split plain text into located words.
///
/// Labels are `<section>.<line>` with `use_line_numbers`, `<section>`
/// otherwise, and the bare line number before any section marker. The line
/// counter restarts at 1 on every marker, only advances past lines with
/// content, and is overridden by a number at the end of a line.
pub fn parse_plain(text: &str, use_line_numbers: bool) -> Vec<TargetWord> {
    let mut words = Vec::new();
    let mut section: Option<&str> = None;
    let mut line_number: u64 = 1;

    for line in text.trim_start_matches('\u{feff}').lines() {
        if let Some(number) = trailing_number(line) {
            line_number = number;
        }
        let mut has_content = false;
        for piece in split_sections(line) {
            match piece {
                Piece::Marker(label) => {
                    section = Some(label);
                    line_number = 1;
                }
                Piece::Text(text) => {
                    has_content |= !text.trim().is_empty();
                    for word in split_words(text) {
                        let location = location_label(section, line_number, use_line_numbers);
                        words.push(TargetWord::new(words.len(), word).with_location(location));
                    }
                }
            }
        }
        if has_content {
            line_number = line_number.saturating_add(1);
        }
    }

    debug!("split {} words from plain text", words.len());
    words
}

fn location_label(section: Option<&str>, line_number: u64, use_line_numbers: bool) -> String {
    match section {
        Some(section) if use_line_numbers => format!("{section}.{line_number}"),
        Some(section) => section.to_string(),
        None => line_number.to_string(),
    }
}

/// Words are maximal runs of letters; combining marks stay with their base.
fn split_words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphabetic() || is_combining_mark(c)))
        .filter(|word| !word.is_empty())
}

fn trailing_number(line: &str) -> Option<u64> {
    let trimmed = line.trim_end();
    let digits = trimmed.len() - trimmed.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    trimmed[trimmed.len() - digits..].parse().ok()
}

#[derive(Debug, Eq, PartialEq)]
enum Piece<'a> {
    Text(&'a str),
    Marker(&'a str),
}

/// Split a line around `[<digits and dots>]` section markers.
fn split_sections(line: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut rest = line;
    while let Some(open) = rest.find('[') {
        let after = &rest[open + 1..];
        let label_len = after
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(after.len());
        if label_len > 0 && after[label_len..].starts_with(']') {
            if open > 0 {
                pieces.push(Piece::Text(&rest[..open]));
            }
            pieces.push(Piece::Marker(&after[..label_len]));
            rest = &after[label_len + 1..];
        } else {
            pieces.push(Piece::Text(&rest[..=open]));
            rest = after;
        }
    }
    if !rest.is_empty() {
        pieces.push(Piece::Text(rest));
    }
    pieces
}
