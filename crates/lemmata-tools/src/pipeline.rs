use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use lemmata_dataset::{Dataset, LoadMode, SortKey};
use lemmata_index::{
    DatasetIndex, IndexBuilder, IndexStats, Normalization, ResolveOptions, Summary, resolve,
};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::error::ToolError;
use crate::output::{
    OutputOptions, ambiguity_path, ambiguity_sheet, default_output_path, delimiter_for,
    primary_sheet, sibling_with_suffix, write_echo,
};
use crate::target::{ReadOptions, TargetFormat, read_target};

/// Everything one matcher run needs.
#[derive(Clone, Debug)]
pub struct MatchOptions {
    pub target: PathBuf,
    pub dataset: PathBuf,
    pub output: Option<PathBuf>,
    pub resolve: ResolveOptions,
    pub read: ReadOptions,
    pub output_options: OutputOptions,
    pub normalization: Normalization,
    pub load_mode: LoadMode,
    /// Print every annotation as a JSON line on stdout.
    pub echo: bool,
}

impl MatchOptions {
    pub fn new(target: impl Into<PathBuf>, dataset: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            dataset: dataset.into(),
            output: None,
            resolve: ResolveOptions::default(),
            read: ReadOptions::default(),
            output_options: OutputOptions::default(),
            normalization: Normalization::default(),
            load_mode: LoadMode::Mmap,
            echo: false,
        }
    }
}

/// What a matcher run produced.
#[derive(Clone, Debug)]
pub struct MatchReport {
    pub output: PathBuf,
    /// Set when the ambiguity report had rows and was written.
    pub ambiguous_output: Option<PathBuf>,
    pub stats: IndexStats,
    pub summary: Summary,
    pub integrity_warnings: usize,
}

/// Load the dataset, resolve every target word and write the sheets.
///
/// Malformed dataset entries and integrity warnings are logged and counted;
/// only file-level problems fail the run.
pub fn run_match(options: &MatchOptions) -> Result<MatchReport> {
    let format = TargetFormat::detect(&options.target)?;
    for path in [&options.target, &options.dataset] {
        if !path.exists() {
            return Err(ToolError::InputNotFound(path.clone()).into());
        }
    }

    let index = load_index(&options.dataset, options.load_mode, options.normalization)?;

    let target = read_target(&options.target, &options.read)?;
    let resolved = resolve(&index, target.words(), &options.resolve);
    let summary = resolved.summary();
    info!(
        "{} words: {} unique, {} ambiguous, {} unmatched",
        summary.total(),
        summary.unique,
        summary.ambiguous,
        summary.unmatched
    );
    if !resolved.warnings.is_empty() {
        warn!(
            "{} words were ambiguous although the dataset was declared unique",
            resolved.warnings.len()
        );
    }

    let output = options
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&options.target, format));
    let delimiter = delimiter_for(&output);
    let style = options.output_options.style;

    primary_sheet(&target, &resolved.annotations, &options.output_options)
        .write(&output, delimiter)?;
    info!("wrote {}", output.display());

    let ambiguous = ambiguity_sheet(&resolved.ambiguous, &style);
    let path = ambiguity_path(&output);
    let ambiguous_output = if ambiguous.is_empty() {
        remove_stale(&path)?;
        None
    } else {
        ambiguous.write(&path, delimiter)?;
        info!(
            "wrote {} ambiguous words to {}",
            resolved.ambiguous.len(),
            path.display()
        );
        Some(path)
    };

    if options.echo {
        write_echo(&resolved.annotations, &style, io::stdout().lock())
            .context("writing annotations to stdout")?;
    }

    Ok(MatchReport {
        output,
        ambiguous_output,
        stats: index.stats(),
        summary,
        integrity_warnings: resolved.warnings.len(),
    })
}

/// Drop a report left by an earlier run so it cannot contradict this one.
fn remove_stale(path: &Path) -> Result<(), ToolError> {
    if path.exists() {
        fs::remove_file(path).map_err(|err| ToolError::write(path, err))?;
        info!("removed stale {}", path.display());
    }
    Ok(())
}

fn load_index(path: &Path, mode: LoadMode, normalization: Normalization) -> Result<DatasetIndex> {
    let start = Instant::now();
    let dataset = Dataset::load_with_mode(path, mode)
        .with_context(|| format!("loading dataset from {}", path.display()))?;
    let batch = dataset.records();
    info!(
        "dataset loaded in {} ms ({} entries, mode: {:?})",
        start.elapsed().as_millis(),
        dataset.entry_count(),
        mode
    );

    let build_start = Instant::now();
    let mut builder = IndexBuilder::new(normalization);
    builder.note_skipped(batch.malformed.len());
    for record in batch.records {
        builder.insert(record);
    }
    let index = builder.finish();
    info!(
        "index built in {} ms (fold j/v: {})",
        build_start.elapsed().as_millis(),
        index.normalization().fold_jv
    );
    Ok(index)
}

/// `<stem>_sorted.<ext>` next to the document.
pub fn default_sorted_path(document: &Path) -> PathBuf {
    let extension = document
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_else(|| "xml".to_string());
    sibling_with_suffix(document, "_sorted", &extension)
}

/// Rewrite `document` with its entries stably ordered by `key`.
pub fn run_sort(document: &Path, key: &SortKey, output: Option<&Path>) -> Result<PathBuf> {
    if !document.exists() {
        return Err(ToolError::InputNotFound(document.to_path_buf()).into());
    }
    let dataset = Dataset::load(document)
        .with_context(|| format!("loading dataset from {}", document.display()))?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_sorted_path(document));
    // The document stays mapped while it is rewritten, so never truncate it
    // in place: write beside it and rename over the target.
    let dir = output
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut staged = NamedTempFile::new_in(dir).map_err(|err| ToolError::write(&output, err))?;
    let mut writer = BufWriter::new(staged.as_file_mut());
    dataset
        .write_sorted(key, &mut writer)
        .map_err(|err| ToolError::write(&output, io::Error::other(err)))?;
    writer
        .flush()
        .map_err(|err| ToolError::write(&output, err))?;
    drop(writer);
    staged
        .persist(&output)
        .map_err(|err| ToolError::write(&output, err.error))?;

    info!(
        "sorted {} entries by {:?} into {}",
        dataset.entry_count(),
        key,
        output.display()
    );
    Ok(output)
}
