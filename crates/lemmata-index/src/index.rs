use std::collections::{BTreeMap, BTreeSet, HashMap};

use lemmata_types::{MatchStatus, Normalization, Record, Synopsis, normalize_form};
use serde::Serialize;
use tracing::{debug, info};

/// Lemma -> distinct synopses observed for one form. Ordered so every
/// enumeration is deterministic.
type LemmaMap = BTreeMap<String, BTreeSet<Synopsis>>;

/// Counters describing a built index.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct IndexStats {
    /// Records inserted.
    pub records: usize,
    /// Records or source entries skipped as unusable.
    pub skipped: usize,
    /// Distinct normalized forms.
    pub forms: usize,
    /// Distinct `(form, lemma, synopsis)` analyses.
    pub analyses: usize,
    /// Forms with more than one candidate lemma.
    pub ambiguous_forms: usize,
}

/// Read-only mapping from normalized surface form to its candidate lemmata.
#[derive(Debug)]
pub struct DatasetIndex {
    normalization: Normalization,
    forms: HashMap<String, LemmaMap>,
    stats: IndexStats,
}

/// Incremental constructor for [`DatasetIndex`].
#[derive(Debug)]
pub struct IndexBuilder {
    normalization: Normalization,
    forms: HashMap<String, LemmaMap>,
    records: usize,
    skipped: usize,
}

impl IndexBuilder {
    pub fn new(normalization: Normalization) -> Self {
        Self {
            normalization,
            forms: HashMap::new(),
            records: 0,
            skipped: 0,
        }
    }

    /// File a record under its normalized form.
    ///
    /// Returns `false` (and counts the record as skipped) when the form
    /// normalizes to nothing, e.g. a form made only of combining marks.
    pub fn insert(&mut self, record: Record) -> bool {
        let key = normalize_form(record.form(), &self.normalization);
        if key.is_empty() {
            debug!("skipping record with empty normalized form {:?}", record.form());
            self.skipped += 1;
            return false;
        }
        let (_, lemma, synopsis) = record.into_parts();
        self.forms
            .entry(key)
            .or_default()
            .entry(lemma)
            .or_default()
            .insert(synopsis);
        self.records += 1;
        true
    }

    /// Account for source entries rejected before they became records.
    pub fn note_skipped(&mut self, count: usize) {
        self.skipped += count;
    }

    pub fn finish(self) -> DatasetIndex {
        let analyses = self
            .forms
            .values()
            .flat_map(|lemmata| lemmata.values())
            .map(BTreeSet::len)
            .sum();
        let ambiguous_forms = self.forms.values().filter(|l| l.len() > 1).count();
        let stats = IndexStats {
            records: self.records,
            skipped: self.skipped,
            forms: self.forms.len(),
            analyses,
            ambiguous_forms,
        };
        info!(
            "indexed {} forms ({} analyses, {} ambiguous) from {} records, {} skipped",
            stats.forms, stats.analyses, stats.ambiguous_forms, stats.records, stats.skipped
        );
        DatasetIndex {
            normalization: self.normalization,
            forms: self.forms,
            stats,
        }
    }
}

impl DatasetIndex {
    /// Build with the default normalization.
    pub fn build(records: impl IntoIterator<Item = Record>) -> Self {
        Self::build_with(records, Normalization::default())
    }

    pub fn build_with(
        records: impl IntoIterator<Item = Record>,
        normalization: Normalization,
    ) -> Self {
        let mut builder = IndexBuilder::new(normalization);
        for record in records {
            builder.insert(record);
        }
        builder.finish()
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Fold `word` exactly as forms were folded at build time.
    pub fn normalize(&self, word: &str) -> String {
        normalize_form(word, &self.normalization)
    }

    /// Candidate set for `word`; empty when the form is unknown.
    pub fn lookup(&self, word: &str) -> Candidates<'_> {
        Candidates {
            lemmata: self.forms.get(&self.normalize(word)),
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        !self.lookup(word).is_empty()
    }

    /// Candidate lemmata for `word`, in lexical order.
    pub fn lemmata(&self, word: &str) -> impl Iterator<Item = &str> + '_ {
        self.lookup(word).lemmata()
    }

    /// Distinct `(lemma, synopsis)` pairs filed under `word`, in order.
    pub fn analyses(&self, word: &str) -> impl Iterator<Item = (&str, &Synopsis)> + '_ {
        self.lookup(word)
            .iter()
            .flat_map(|Candidate { lemma, synopses }| {
                synopses.iter().map(move |synopsis| (lemma, synopsis))
            })
    }

    pub fn stats(&self) -> IndexStats {
        self.stats
    }
}

/// The distinct lemmata (with their synopses) known for one form.
#[derive(Clone, Copy, Debug)]
pub struct Candidates<'a> {
    lemmata: Option<&'a LemmaMap>,
}

impl<'a> Candidates<'a> {
    /// Number of distinct lemmata.
    pub fn len(&self) -> usize {
        self.lemmata.map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn status(&self) -> MatchStatus {
        MatchStatus::from_lemma_count(self.len())
    }

    /// Lemmata in lexical order.
    pub fn lemmata(self) -> impl Iterator<Item = &'a str> {
        self.lemmata
            .into_iter()
            .flat_map(|map| map.keys().map(String::as_str))
    }

    /// Candidates in lemma order.
    pub fn iter(self) -> impl Iterator<Item = Candidate<'a>> {
        self.lemmata.into_iter().flat_map(|map| {
            map.iter().map(|(lemma, synopses)| Candidate {
                lemma: lemma.as_str(),
                synopses,
            })
        })
    }
}

/// One candidate lemma for a form and every synopsis observed with it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Candidate<'a> {
    pub lemma: &'a str,
    pub synopses: &'a BTreeSet<Synopsis>,
}
