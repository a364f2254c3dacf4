//! Shared value types for Latin word-analysis datasets.
//!
//! A reference dataset is a long list of analyzed word-forms: each one ties a
//! surface `form` to its dictionary `lemma` and a morphological [`Synopsis`]
//! (part of speech, case, number, tense, ...). The field set of a synopsis is
//! defined by the dataset, so it is kept as an ordered list of named [`Tag`]s
//! rather than a fixed struct.
//!
//! [`Record`] can only be built through [`Record::new`], which rejects entries
//! missing a form or a lemma. Downstream crates can therefore rely on every
//! `Record` being usable without re-checking fields at the point of use.
//!
//! ```rust
//! use lemmata_types::{Record, Synopsis, Tag};
//!
//! let synopsis = Synopsis::new(vec![Tag::new("pos", "V"), Tag::new("number", "Sg")]);
//! let record = Record::new("amat", "amo", synopsis).unwrap();
//! assert_eq!(record.lemma(), "amo");
//! assert_eq!(record.synopsis().to_string(), "V Sg");
//! ```

use std::fmt;

use serde::Serialize;
use thiserror::Error;

mod normalize;

pub use normalize::{Normalization, normalize_form};

/// One named morphological tag, e.g. `pos = V`.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Ordered tuple of tags describing one analysis of a form under a lemma.
///
/// Two synopses are equal only if every tag, in order, is equal.
#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(transparent)]
pub struct Synopsis(Vec<Tag>);

impl Synopsis {
    pub fn new(tags: Vec<Tag>) -> Self {
        Self(tags)
    }

    pub fn tags(&self) -> &[Tag] {
        &self.0
    }

    /// Value of the first tag called `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|tag| tag.name == name)
            .map(|tag| tag.value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Synopsis {
    /// Non-empty tag values joined by a single space (`V 3 Sg Pres`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for tag in self.0.iter().filter(|tag| !tag.value.is_empty()) {
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(&tag.value)?;
            first = false;
        }
        Ok(())
    }
}

/// Why an entry could not become a [`Record`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum RecordError {
    #[error("entry has no form")]
    MissingForm,
    #[error("entry has no lemma")]
    MissingLemma,
}

/// One analyzed word-form occurrence from the reference dataset.
///
/// Equality covers `form`, `lemma` and the full synopsis: two records are the
/// same analysis only if all three match.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Record {
    form: String,
    lemma: String,
    synopsis: Synopsis,
}

impl Record {
    /// Validate and build a record. Form and lemma are trimmed; either one
    /// being empty afterwards is an error.
    pub fn new(
        form: impl AsRef<str>,
        lemma: impl AsRef<str>,
        synopsis: Synopsis,
    ) -> Result<Self, RecordError> {
        let form = form.as_ref().trim();
        if form.is_empty() {
            return Err(RecordError::MissingForm);
        }
        let lemma = lemma.as_ref().trim();
        if lemma.is_empty() {
            return Err(RecordError::MissingLemma);
        }
        Ok(Self {
            form: form.to_string(),
            lemma: lemma.to_string(),
            synopsis,
        })
    }

    pub fn form(&self) -> &str {
        &self.form
    }

    pub fn lemma(&self) -> &str {
        &self.lemma
    }

    pub fn synopsis(&self) -> &Synopsis {
        &self.synopsis
    }

    /// Split into owned parts, consuming the record.
    pub fn into_parts(self) -> (String, String, Synopsis) {
        (self.form, self.lemma, self.synopsis)
    }
}

/// Lemma-level match outcome for a target word.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    /// No entry for the form.
    Unmatched,
    /// Exactly one candidate lemma (possibly with several synopses).
    Unique,
    /// Two or more candidate lemmata.
    Ambiguous,
}

impl MatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Unmatched => "unmatched",
            MatchStatus::Unique => "unique",
            MatchStatus::Ambiguous => "ambiguous",
        }
    }

    /// Status implied by a number of distinct candidate lemmata.
    pub fn from_lemma_count(count: usize) -> Self {
        match count {
            0 => MatchStatus::Unmatched,
            1 => MatchStatus::Unique,
            _ => MatchStatus::Ambiguous,
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
