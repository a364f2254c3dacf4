//! Load XML word-analysis datasets and re-emit them in a stable sort order.
//!
//! A dataset document has a root element whose direct children are analysis
//! entries. Each entry's child elements are fields: `form` and `lemma` are
//! required, everything else becomes a morphological tag, in document order.
//!
//! ```xml
//! <analyses>
//!   <analysis>
//!     <form>amat</form>
//!     <lemma>amo</lemma>
//!     <pos>V</pos>
//!     <person>3</person>
//!     <number>Sg</number>
//!     <tense>Pres</tense>
//!   </analysis>
//! </analyses>
//! ```
//!
//! Element names of the root and of entries are not constrained, so datasets
//! exported by different tools load without configuration. Callers choose
//! between memory-mapped files and owned buffers at runtime via [`LoadMode`].
//!
//! # Features
//! - Typed extraction: [`Dataset::records`] validates every entry into a
//!   [`Record`] and reports the ones that cannot be (missing form or lemma)
//!   instead of failing the whole load.
//! - Byte-faithful rewriting: [`Dataset::write_sorted`] reorders entries by a
//!   [`SortKey`] and keeps the prolog, root tag, and whitespace in place.
//! - Zero-copy entry text: [`Entry::raw`] borrows from the loaded buffer.
//!
//! # Example
//! ```no_run
//! use lemmata_dataset::{Dataset, LoadMode, SortKey};
//!
//! # fn main() -> anyhow::Result<()> {
//! let dataset = Dataset::load_with_mode("/path/to/analyses.xml", LoadMode::Mmap)?;
//! let batch = dataset.records();
//! println!("{} records, {} malformed", batch.records.len(), batch.malformed.len());
//!
//! let mut out = Vec::new();
//! dataset.write_sorted(&SortKey::Lemma, &mut out)?;
//! # Ok(()) }
//! ```
//!
//! For a runnable demo, see `cargo run -p lemmata-dataset --example stats -- <file>`.

use std::cmp::Ordering;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use lemmata_types::{Normalization, Record, RecordError, Synopsis, Tag, normalize_form};
use memmap2::Mmap;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{info, warn};

/// Field holding the inflected surface form.
pub const FORM_FIELD: &str = "form";
/// Field holding the dictionary headword.
pub const LEMMA_FIELD: &str = "lemma";

/// Strategy for loading the dataset file.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadMode {
    /// Memory-map the file (fast, zero-copy).
    Mmap,
    /// Read the file into an owned buffer (portable fallback).
    Owned,
}

impl FromStr for LoadMode {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "mmap" => Ok(LoadMode::Mmap),
            "owned" => Ok(LoadMode::Owned),
            other => anyhow::bail!("unknown load mode {other:?} (expected mmap or owned)"),
        }
    }
}

enum Buffer {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl Buffer {
    fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Mmap(m) => m.as_ref(),
            Buffer::Owned(v) => v.as_slice(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Span {
    start: usize,
    end: usize,
}

#[derive(Debug)]
struct FieldData {
    name: String,
    value: String,
}

#[derive(Debug)]
struct EntryData {
    span: Span,
    fields: Vec<FieldData>,
}

/// A field of an entry, borrowed from the dataset.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Field<'a> {
    pub name: &'a str,
    pub value: &'a str,
}

/// Borrowed view of one analysis entry.
#[derive(Clone, Copy, Debug)]
pub struct Entry<'a> {
    /// Zero-based position of the entry in the document.
    pub ordinal: usize,
    /// The entry's markup, exactly as it appears in the source.
    pub raw: &'a str,
    fields: &'a [FieldData],
}

impl<'a> Entry<'a> {
    /// Trimmed text of the first field called `name`.
    pub fn field(&self, name: &str) -> Option<&'a str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    pub fn fields(self) -> impl Iterator<Item = Field<'a>> {
        self.fields.iter().map(|f| Field {
            name: f.name.as_str(),
            value: f.value.as_str(),
        })
    }

    /// Validate the entry into a [`Record`]. Fields other than form and lemma
    /// make up the synopsis.
    pub fn to_record(&self) -> Result<Record, RecordError> {
        let form = self.field(FORM_FIELD).ok_or(RecordError::MissingForm)?;
        let lemma = self.field(LEMMA_FIELD).ok_or(RecordError::MissingLemma)?;
        let tags = self
            .fields
            .iter()
            .filter(|f| f.name != FORM_FIELD && f.name != LEMMA_FIELD)
            .map(|f| Tag::new(f.name.as_str(), f.value.as_str()))
            .collect();
        Record::new(form, lemma, Synopsis::new(tags))
    }
}

/// An entry that could not be turned into a record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MalformedEntry {
    pub ordinal: usize,
    pub error: RecordError,
}

/// Records extracted from a dataset, plus the entries that were skipped.
#[derive(Debug, Default)]
pub struct RecordBatch {
    pub records: Vec<Record>,
    pub malformed: Vec<MalformedEntry>,
}

/// Field used to order entries when sorting a dataset.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum SortKey {
    #[default]
    Lemma,
    Form,
    /// Any other field, by element name.
    Tag(String),
}

impl SortKey {
    fn field_name(&self) -> &str {
        match self {
            SortKey::Lemma => LEMMA_FIELD,
            SortKey::Form => FORM_FIELD,
            SortKey::Tag(name) => name,
        }
    }
}

impl FromStr for SortKey {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        match trimmed {
            "" => anyhow::bail!("sort key must not be empty"),
            LEMMA_FIELD => Ok(SortKey::Lemma),
            FORM_FIELD => Ok(SortKey::Form),
            other => Ok(SortKey::Tag(other.to_string())),
        }
    }
}

/// In-memory view of a dataset document backed by mmap or an owned buffer.
pub struct Dataset {
    buffer: Buffer,
    entries: Vec<EntryData>,
}

impl Dataset {
    /// Load a dataset, memory-mapping the file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_mode(path, LoadMode::Mmap)
    }

    /// Load a dataset choosing between mmap and an owned buffer at runtime.
    pub fn load_with_mode(path: impl AsRef<Path>, mode: LoadMode) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("dataset not found: {}", path.display());
        }
        let buffer = load_file(path, mode)?;
        let entries = parse_entries(buffer.as_slice())
            .with_context(|| format!("parse dataset {}", path.display()))?;
        info!("loaded {} entries from {}", entries.len(), path.display());
        Ok(Self { buffer, entries })
    }

    /// Parse a dataset already held in memory.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let buffer = Buffer::Owned(bytes.into());
        let entries = parse_entries(buffer.as_slice())?;
        Ok(Self { buffer, entries })
    }

    /// Number of entries directly under the root element.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn entry(&self, ordinal: usize) -> Option<Entry<'_>> {
        self.entries
            .get(ordinal)
            .map(|data| self.make_entry_view(ordinal, data))
    }

    /// Iterate over all entries in document order.
    pub fn entries(&self) -> impl Iterator<Item = Entry<'_>> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(ordinal, data)| self.make_entry_view(ordinal, data))
    }

    /// Validate every entry into a [`Record`], collecting the failures.
    pub fn records(&self) -> RecordBatch {
        let mut batch = RecordBatch::default();
        for entry in self.entries() {
            match entry.to_record() {
                Ok(record) => batch.records.push(record),
                Err(error) => {
                    warn!("entry {} skipped: {}", entry.ordinal + 1, error);
                    batch.malformed.push(MalformedEntry {
                        ordinal: entry.ordinal,
                        error,
                    });
                }
            }
        }
        if !batch.malformed.is_empty() {
            warn!(
                "{} of {} entries skipped as malformed",
                batch.malformed.len(),
                self.entries.len()
            );
        }
        batch
    }

    /// Stable permutation of entry ordinals ordered by `key`.
    ///
    /// Keys compare case- and diacritic-insensitively; entries without the
    /// key field go last. Ties keep document order.
    pub fn sorted_order(&self, key: &SortKey) -> Vec<usize> {
        let normalization = Normalization { fold_jv: false };
        let keys: Vec<Option<(String, &str)>> = self
            .entries()
            .map(|entry| {
                entry
                    .field(key.field_name())
                    .filter(|value| !value.is_empty())
                    .map(|value| (normalize_form(value, &normalization), value))
            })
            .collect();

        let mut order: Vec<usize> = (0..self.entries.len()).collect();
        order.sort_by(|a, b| compare_keys(&keys[*a], &keys[*b]));
        order
    }

    /// Write the whole document with its entries reordered by `key`.
    ///
    /// Everything outside the entries (declaration, root tag, comments, and
    /// the whitespace between entries) stays at its original byte position.
    pub fn write_sorted<W: Write>(&self, key: &SortKey, mut out: W) -> Result<()> {
        let bytes = self.buffer.as_slice();
        let Some(first) = self.entries.first() else {
            out.write_all(bytes).context("write document")?;
            return Ok(());
        };

        out.write_all(&bytes[..first.span.start])
            .context("write document prolog")?;
        let order = self.sorted_order(key);
        for (slot, ordinal) in order.iter().enumerate() {
            let span = self.entries[*ordinal].span;
            out.write_all(&bytes[span.start..span.end])
                .with_context(|| format!("write entry {}", ordinal + 1))?;
            let gap_end = self
                .entries
                .get(slot + 1)
                .map(|next| next.span.start)
                .unwrap_or(bytes.len());
            out.write_all(&bytes[self.entries[slot].span.end..gap_end])
                .context("write document layout")?;
        }
        out.flush().context("flush sorted document")?;
        Ok(())
    }

    fn make_entry_view<'a>(&'a self, ordinal: usize, data: &'a EntryData) -> Entry<'a> {
        let slice = &self.buffer.as_slice()[data.span.start..data.span.end];
        Entry {
            ordinal,
            raw: std::str::from_utf8(slice).expect("dataset text is valid utf8"),
            fields: data.fields.as_slice(),
        }
    }
}

fn compare_keys(a: &Option<(String, &str)>, b: &Option<(String, &str)>) -> Ordering {
    match (a, b) {
        (Some((fa, ra)), Some((fb, rb))) => fa.cmp(fb).then_with(|| ra.cmp(rb)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn load_file(path: &Path, mode: LoadMode) -> Result<Buffer> {
    match mode {
        LoadMode::Mmap => {
            let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
            unsafe { Mmap::map(&file) }
                .map(Buffer::Mmap)
                .with_context(|| format!("mmap {}", path.display()))
        }
        LoadMode::Owned => {
            let mut file = File::open(path).with_context(|| format!("open {}", path.display()))?;
            let mut buf = Vec::new();
            file.read_to_end(&mut buf)
                .with_context(|| format!("read {}", path.display()))?;
            Ok(Buffer::Owned(buf))
        }
    }
}

struct PendingEntry {
    start: usize,
    fields: Vec<FieldData>,
}

fn parse_entries(bytes: &[u8]) -> Result<Vec<EntryData>> {
    std::str::from_utf8(bytes).context("document is not valid UTF-8")?;

    let mut reader = Reader::from_reader(bytes);
    let mut entries = Vec::new();
    let mut depth = 0usize;
    let mut saw_root = false;
    let mut current: Option<PendingEntry> = None;
    let mut field: Option<FieldData> = None;

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .with_context(|| format!("malformed markup near byte {before}"))?;
        let after = reader.buffer_position() as usize;

        match event {
            Event::Start(start) => {
                match depth {
                    0 if saw_root => anyhow::bail!("second root element at byte {before}"),
                    0 => saw_root = true,
                    1 => {
                        current = Some(PendingEntry {
                            start: before,
                            fields: Vec::new(),
                        })
                    }
                    2 => {
                        field = Some(FieldData {
                            name: element_name(&start, before)?,
                            value: String::new(),
                        })
                    }
                    _ => {}
                }
                depth += 1;
            }
            Event::Empty(start) => match depth {
                0 if saw_root => anyhow::bail!("second root element at byte {before}"),
                0 => saw_root = true,
                1 => entries.push(EntryData {
                    span: Span {
                        start: before,
                        end: after,
                    },
                    fields: Vec::new(),
                }),
                2 => {
                    if let Some(entry) = current.as_mut() {
                        entry.fields.push(FieldData {
                            name: element_name(&start, before)?,
                            value: String::new(),
                        });
                    }
                }
                _ => {}
            },
            Event::End(_) => {
                depth = depth
                    .checked_sub(1)
                    .with_context(|| format!("unexpected closing tag at byte {before}"))?;
                match depth {
                    1 => {
                        if let Some(entry) = current.take() {
                            entries.push(EntryData {
                                span: Span {
                                    start: entry.start,
                                    end: after,
                                },
                                fields: entry.fields,
                            });
                        }
                    }
                    2 => {
                        if let (Some(mut done), Some(entry)) = (field.take(), current.as_mut()) {
                            done.value = done.value.trim().to_string();
                            entry.fields.push(done);
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(text) if depth >= 3 => {
                if let Some(open) = field.as_mut() {
                    let unescaped = text
                        .unescape()
                        .with_context(|| format!("bad escape near byte {before}"))?;
                    open.value.push_str(&unescaped);
                }
            }
            Event::CData(data) if depth >= 3 => {
                if let Some(open) = field.as_mut() {
                    let text = std::str::from_utf8(&data)
                        .with_context(|| format!("CDATA is not UTF-8 near byte {before}"))?;
                    open.value.push_str(text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        anyhow::bail!("document has no root element");
    }
    if depth != 0 {
        anyhow::bail!("document ends inside an open element");
    }
    Ok(entries)
}

fn element_name(start: &BytesStart<'_>, at: usize) -> Result<String> {
    let name = start.local_name();
    std::str::from_utf8(name.as_ref())
        .map(str::to_string)
        .with_context(|| format!("element name is not UTF-8 at byte {at}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<analyses>
  <analysis><form>duces</form><lemma>dux</lemma><pos>N</pos></analysis>
  <analysis><form>amat</form><lemma>amo</lemma><pos>V</pos></analysis>
  <analysis><form>duces</form><lemma>duco</lemma><pos>V</pos></analysis>
</analyses>
"#;

    #[test]
    fn parses_entries_and_fields() {
        let dataset = Dataset::from_bytes(SMALL).unwrap();
        assert_eq!(dataset.entry_count(), 3);
        let first = dataset.entry(0).unwrap();
        assert_eq!(first.field("form"), Some("duces"));
        assert_eq!(first.field("pos"), Some("N"));
        assert!(first.raw.starts_with("<analysis>"));
        assert!(first.raw.ends_with("</analysis>"));
    }

    #[test]
    fn unescapes_text_and_cdata() {
        let doc = "<r><e><form>a&amp;b</form><lemma><![CDATA[x<y]]></lemma></e></r>";
        let dataset = Dataset::from_bytes(doc).unwrap();
        let entry = dataset.entry(0).unwrap();
        assert_eq!(entry.field("form"), Some("a&b"));
        assert_eq!(entry.field("lemma"), Some("x<y"));
    }

    #[test]
    fn nested_markup_contributes_text() {
        let doc = "<r><e><form>ama<i>t</i></form><lemma>amo</lemma></e></r>";
        let dataset = Dataset::from_bytes(doc).unwrap();
        assert_eq!(dataset.entry(0).unwrap().field("form"), Some("amat"));
    }

    #[test]
    fn synopsis_keeps_field_order() {
        let doc = "<r><e><pos>V</pos><form>amat</form><tense>Pres</tense><lemma>amo</lemma></e></r>";
        let dataset = Dataset::from_bytes(doc).unwrap();
        let record = dataset.entry(0).unwrap().to_record().unwrap();
        assert_eq!(record.synopsis().to_string(), "V Pres");
    }

    #[test]
    fn rejects_broken_documents() {
        assert!(Dataset::from_bytes("").is_err());
        assert!(Dataset::from_bytes("<r><e><form>x</form></e>").is_err());
        assert!(Dataset::from_bytes("<r></r><r></r>").is_err());
        assert!(Dataset::from_bytes(vec![b'<', b'r', b'>', 0xff, b'<', b'/', b'r', b'>']).is_err());
    }

    #[test]
    fn missing_fields_become_malformed_entries() {
        let doc = "<r><e><form>amat</form></e><e><lemma>amo</lemma></e><e/><e><form>x</form><lemma>y</lemma></e></r>";
        let dataset = Dataset::from_bytes(doc).unwrap();
        let batch = dataset.records();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(
            batch.malformed,
            vec![
                MalformedEntry {
                    ordinal: 0,
                    error: RecordError::MissingLemma
                },
                MalformedEntry {
                    ordinal: 1,
                    error: RecordError::MissingForm
                },
                MalformedEntry {
                    ordinal: 2,
                    error: RecordError::MissingForm
                },
            ]
        );
    }

    #[test]
    fn sort_is_stable_and_puts_missing_keys_last() {
        let doc = "<r><e><form>b</form></e><e><lemma>dux</lemma><n>1</n></e><e><lemma>Amo</lemma></e><e><lemma>dux</lemma><n>2</n></e></r>";
        let dataset = Dataset::from_bytes(doc).unwrap();
        assert_eq!(dataset.sorted_order(&SortKey::Lemma), vec![2, 1, 3, 0]);
        assert_eq!(dataset.sorted_order(&SortKey::Form), vec![0, 1, 2, 3]);
    }

    #[test]
    fn write_sorted_preserves_layout() {
        let dataset = Dataset::from_bytes(SMALL).unwrap();
        let mut out = Vec::new();
        dataset.write_sorted(&SortKey::Lemma, &mut out).unwrap();
        let expected = r#"<?xml version="1.0" encoding="UTF-8"?>
<analyses>
  <analysis><form>amat</form><lemma>amo</lemma><pos>V</pos></analysis>
  <analysis><form>duces</form><lemma>duco</lemma><pos>V</pos></analysis>
  <analysis><form>duces</form><lemma>dux</lemma><pos>N</pos></analysis>
</analyses>
"#;
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn parses_sort_keys() {
        assert_eq!("lemma".parse::<SortKey>().unwrap(), SortKey::Lemma);
        assert_eq!("form".parse::<SortKey>().unwrap(), SortKey::Form);
        assert_eq!(
            "pos".parse::<SortKey>().unwrap(),
            SortKey::Tag("pos".into())
        );
        assert!("  ".parse::<SortKey>().is_err());
        assert_eq!("OWNED".parse::<LoadMode>().unwrap(), LoadMode::Owned);
        assert!("disk".parse::<LoadMode>().is_err());
    }
}
