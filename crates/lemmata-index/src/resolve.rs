use std::collections::BTreeSet;
use std::fmt;

use lemmata_types::{MatchStatus, Synopsis};
use serde::Serialize;
use tracing::{debug, warn};

use crate::classify::{Resolution, classify};
use crate::index::{Candidate, DatasetIndex};

/// How [`resolve`] treats ambiguous words.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ResolveOptions {
    /// Emit an [`AmbiguityEntry`] for every ambiguous word.
    pub include_ambiguous: bool,
    /// The caller declares the dataset free of lemma-level ambiguity. Any
    /// ambiguous word then yields an [`IntegrityWarning`] and a best-effort
    /// primary lemma instead of a report entry.
    pub dataset_is_unique: bool,
}

/// A word to resolve and where it sits in the source text.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TargetWord {
    /// Zero-based position in the target list.
    pub position: usize,
    pub text: String,
    /// Location label in the source text (`1.2`, a line number, ...).
    pub location: Option<String>,
}

impl TargetWord {
    pub fn new(position: usize, text: impl Into<String>) -> Self {
        Self {
            position,
            text: text.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Per-word result destined for the primary output.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Annotation<'a> {
    pub position: usize,
    pub word: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub status: MatchStatus,
    /// Primary guess; unset for unmatched and (normally) ambiguous words.
    pub lemma: Option<&'a str>,
    /// Synopses backing `lemma`, when one is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synopses: Option<&'a BTreeSet<Synopsis>>,
}

/// Full candidate list for an ambiguous word, for human review.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct AmbiguityEntry<'a> {
    pub position: usize,
    pub word: String,
    pub location: Option<String>,
    pub candidates: Vec<Candidate<'a>>,
}

/// An ambiguous word found although the dataset was declared unique.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IntegrityWarning<'a> {
    pub position: usize,
    pub word: String,
    pub lemmata: Vec<&'a str>,
}

impl fmt::Display for IntegrityWarning<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "word {} ({:?}) has {} lemmata in a dataset declared unique: {}",
            self.position + 1,
            self.word,
            self.lemmata.len(),
            self.lemmata.join(", ")
        )
    }
}

/// Counts per match status.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Summary {
    pub unmatched: usize,
    pub unique: usize,
    pub ambiguous: usize,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.unmatched + self.unique + self.ambiguous
    }
}

/// Everything [`resolve`] produced for one target list.
#[derive(Clone, Debug, Default)]
pub struct Resolved<'a> {
    /// One entry per target word, in input order.
    pub annotations: Vec<Annotation<'a>>,
    /// Ambiguous words, in input order; empty unless requested.
    pub ambiguous: Vec<AmbiguityEntry<'a>>,
    pub warnings: Vec<IntegrityWarning<'a>>,
}

impl Resolved<'_> {
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for annotation in &self.annotations {
            match annotation.status {
                MatchStatus::Unmatched => summary.unmatched += 1,
                MatchStatus::Unique => summary.unique += 1,
                MatchStatus::Ambiguous => summary.ambiguous += 1,
            }
        }
        summary
    }
}

/// Classify every target word in order and split the results into the
/// primary annotation list and the ambiguity report.
///
/// Repeated words are classified independently. Integrity problems are
/// collected and logged; they never stop the run.
pub fn resolve<'a>(
    index: &'a DatasetIndex,
    targets: impl IntoIterator<Item = TargetWord>,
    options: &ResolveOptions,
) -> Resolved<'a> {
    let mut resolved = Resolved::default();

    for target in targets {
        let resolution = classify(index, &target.text);
        let status = resolution.status();
        debug!("{} {:?}: {}", target.position + 1, target.text, status);

        let (lemma, synopses) = match &resolution {
            Resolution::Unmatched => (None, None),
            Resolution::Unique(candidate) => (Some(candidate.lemma), Some(candidate.synopses)),
            Resolution::Ambiguous(candidates) if options.dataset_is_unique => {
                let warning = IntegrityWarning {
                    position: target.position,
                    word: target.text.clone(),
                    lemmata: candidates.iter().map(|c| c.lemma).collect(),
                };
                warn!("{warning}");
                resolved.warnings.push(warning);
                let first = candidates.first();
                (first.map(|c| c.lemma), first.map(|c| c.synopses))
            }
            Resolution::Ambiguous(_) => (None, None),
        };

        if let Resolution::Ambiguous(candidates) = resolution
            && options.include_ambiguous
            && !options.dataset_is_unique
        {
            resolved.ambiguous.push(AmbiguityEntry {
                position: target.position,
                word: target.text.clone(),
                location: target.location.clone(),
                candidates,
            });
        }

        resolved.annotations.push(Annotation {
            position: target.position,
            word: target.text,
            location: target.location,
            status,
            lemma,
            synopses,
        });
    }

    resolved
}
