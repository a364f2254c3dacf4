//! Command-line surfaces for both binaries.
//!
//! Flags win over environment variables, which win over defaults.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use lemmata_dataset::{LoadMode, SortKey};
use lemmata_index::{Normalization, ResolveOptions};

use crate::output::OutputOptions;
use crate::pipeline::MatchOptions;
use crate::style::{Consonants, LemmaStyle};
use crate::target::ReadOptions;

/// Match the words of a target list against a lemmatized reference dataset.
#[derive(Debug, Parser)]
#[command(name = "match-lemmata", version)]
pub struct MatchArgs {
    /// Target word list: csv, tsv or plain text.
    pub target: PathBuf,
    /// Reference dataset (XML analyses).
    pub dataset: PathBuf,

    /// Write every candidate of ambiguous words to a separate report.
    #[arg(short = 'a', long = "include-ambiguous")]
    pub include_ambiguous: bool,
    /// Declare the dataset free of ambiguous forms; ambiguous words are
    /// then warned about and guessed instead of reported.
    #[arg(
        long = "uniquesOnly",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true",
        require_equals = true
    )]
    pub uniques_only: bool,

    /// Output file; defaults to `<target stem>_lemmata.<ext>`.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Column holding the words in a table target.
    #[arg(long, env = "LEMMATA_WORD_COLUMN")]
    pub word_column: Option<String>,
    /// Add a SYNOPSIS column.
    #[arg(long)]
    pub synopsis: bool,
    /// Add a LOCATION column for plain text targets.
    #[arg(long)]
    pub use_locations: bool,
    /// Append line numbers to section locations.
    #[arg(long)]
    pub use_line_numbers: bool,
    /// Keep `j`/`v` distinct from `i`/`u` when matching.
    #[arg(long)]
    pub no_fold_jv: bool,
    #[arg(long, env = "LEMMATA_LOAD_MODE", default_value = "mmap")]
    pub load_mode: LoadMode,
    /// Print each annotation as a JSON line on stdout.
    #[arg(long)]
    pub echo: bool,

    #[arg(long, conflicts_with = "force_uppercase_lemmata")]
    pub force_lowercase_lemmata: bool,
    #[arg(long)]
    pub force_uppercase_lemmata: bool,
    /// Drop homograph digits (`edo2` -> `edo`).
    #[arg(long)]
    pub force_no_trailing_digits: bool,
    /// Keep only letters in lemmata.
    #[arg(long)]
    pub force_no_punctuation: bool,
    /// Spell lemmata with `v` and `i` (no `u` for consonants, no `j`).
    #[arg(long, conflicts_with = "force_ui")]
    pub force_vi: bool,
    /// Spell lemmata with `u` and `i` only.
    #[arg(long)]
    pub force_ui: bool,
}

impl MatchArgs {
    pub fn style(&self) -> LemmaStyle {
        let consonants = if self.force_vi {
            Some(Consonants::Vi)
        } else if self.force_ui {
            Some(Consonants::Ui)
        } else {
            None
        };
        LemmaStyle {
            lowercase: self.force_lowercase_lemmata,
            uppercase: self.force_uppercase_lemmata,
            no_trailing_digits: self.force_no_trailing_digits,
            no_punctuation: self.force_no_punctuation,
            consonants,
        }
    }

    pub fn into_options(self) -> MatchOptions {
        let style = self.style();
        MatchOptions {
            resolve: ResolveOptions {
                include_ambiguous: self.include_ambiguous,
                dataset_is_unique: self.uniques_only,
            },
            read: ReadOptions {
                word_column: self.word_column,
                use_line_numbers: self.use_line_numbers,
            },
            output_options: OutputOptions {
                synopsis: self.synopsis,
                use_locations: self.use_locations,
                style,
            },
            normalization: Normalization {
                fold_jv: !self.no_fold_jv,
            },
            load_mode: self.load_mode,
            echo: self.echo,
            output: self.output,
            ..MatchOptions::new(self.target, self.dataset)
        }
    }
}

/// Rewrite a dataset document with its entries sorted.
#[derive(Debug, Parser)]
#[command(name = "sort-forms", version)]
pub struct SortArgs {
    /// Dataset document to sort.
    pub document: PathBuf,
    /// Field to sort by: `lemma`, `form` or any tag name.
    #[arg(short, long, default_value = "lemma")]
    pub key: SortKey,
    /// Output file; defaults to `<stem>_sorted.<ext>`.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
