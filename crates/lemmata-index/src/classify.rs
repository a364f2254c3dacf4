use lemmata_types::MatchStatus;

use crate::index::{Candidate, DatasetIndex};

/// Lemma-level outcome of looking up one target word.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Resolution<'a> {
    /// The form is not in the dataset.
    Unmatched,
    /// Exactly one lemma; all of its synopses are kept.
    Unique(Candidate<'a>),
    /// Two or more lemmata, in lemma order. No candidate is preferred.
    Ambiguous(Vec<Candidate<'a>>),
}

impl<'a> Resolution<'a> {
    pub fn status(&self) -> MatchStatus {
        match self {
            Resolution::Unmatched => MatchStatus::Unmatched,
            Resolution::Unique(_) => MatchStatus::Unique,
            Resolution::Ambiguous(_) => MatchStatus::Ambiguous,
        }
    }

    /// The lemma to write as the primary guess: only set when unique.
    pub fn primary_lemma(&self) -> Option<&'a str> {
        match self {
            Resolution::Unique(candidate) => Some(candidate.lemma),
            _ => None,
        }
    }

    /// Every candidate, whatever the status.
    pub fn candidates(&self) -> &[Candidate<'a>] {
        match self {
            Resolution::Unmatched => &[],
            Resolution::Unique(candidate) => std::slice::from_ref(candidate),
            Resolution::Ambiguous(candidates) => candidates,
        }
    }
}

/// Classify `word` against `index`. Pure: the same index and word always
/// give the same result.
pub fn classify<'a>(index: &'a DatasetIndex, word: &str) -> Resolution<'a> {
    let found = index.lookup(word);
    match found.len() {
        0 => Resolution::Unmatched,
        1 => match found.iter().next() {
            Some(candidate) => Resolution::Unique(candidate),
            None => Resolution::Unmatched,
        },
        _ => Resolution::Ambiguous(found.iter().collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lemmata_types::{Record, Synopsis, Tag};

    fn syn(tags: &[(&str, &str)]) -> Synopsis {
        Synopsis::new(tags.iter().map(|(n, v)| Tag::new(*n, *v)).collect())
    }

    fn sample() -> DatasetIndex {
        DatasetIndex::build([
            Record::new(
                "amat",
                "amo",
                syn(&[("pos", "V"), ("person", "3"), ("number", "Sg"), ("tense", "Pres")]),
            )
            .unwrap(),
            Record::new("duces", "dux", syn(&[("pos", "N"), ("case", "Nom")])).unwrap(),
            Record::new("duces", "duco", syn(&[("pos", "V"), ("tense", "Fut")])).unwrap(),
            Record::new("rosa", "rosa", syn(&[("pos", "N"), ("case", "Nom")])).unwrap(),
            Record::new("rosa", "rosa", syn(&[("pos", "N"), ("case", "Abl")])).unwrap(),
        ])
    }

    #[test]
    fn single_lemma_is_unique() {
        let index = sample();
        let resolution = classify(&index, "amat");
        assert_eq!(resolution.status(), MatchStatus::Unique);
        assert_eq!(resolution.primary_lemma(), Some("amo"));
    }

    #[test]
    fn many_synopses_one_lemma_stays_unique() {
        let index = sample();
        let Resolution::Unique(candidate) = classify(&index, "Rosa") else {
            panic!("rosa should be unique");
        };
        assert_eq!(candidate.lemma, "rosa");
        assert_eq!(candidate.synopses.len(), 2);
    }

    #[test]
    fn several_lemmata_are_ambiguous() {
        let index = sample();
        let resolution = classify(&index, "duces");
        assert_eq!(resolution.status(), MatchStatus::Ambiguous);
        assert_eq!(resolution.primary_lemma(), None);
        let lemmata: Vec<&str> = resolution.candidates().iter().map(|c| c.lemma).collect();
        assert_eq!(lemmata, ["duco", "dux"]);
    }

    #[test]
    fn unknown_and_blank_words_are_unmatched() {
        let index = sample();
        assert_eq!(classify(&index, "xyzzy"), Resolution::Unmatched);
        assert_eq!(classify(&index, ""), Resolution::Unmatched);
        assert!(classify(&index, "xyzzy").candidates().is_empty());
    }
}
