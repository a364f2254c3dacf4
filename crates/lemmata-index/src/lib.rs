//! Lemma lookup and ambiguity flagging for target word lists.
//!
//! The crate never analyzes morphology itself. It indexes pre-computed
//! analyses (form, lemma, synopsis) and tells a caller, per target word,
//! whether the reference data knows no lemma, exactly one lemma, or several.
//! Picking between several lemmata is left to a human reviewer.
//!
//! # How it works
//! 1. [`DatasetIndex::build`] folds each record's form with [`normalize_form`]
//!    and files `(lemma, synopsis)` under it, deduplicating by value.
//! 2. [`classify`] folds the target word the same way, looks it up, and
//!    counts distinct lemmata: 0 is [`Resolution::Unmatched`], 1 is
//!    [`Resolution::Unique`], more is [`Resolution::Ambiguous`]. Several
//!    synopses under one lemma stay `Unique`.
//! 3. [`resolve`] walks the targets in input order and produces one
//!    [`Annotation`] per word plus a separate ambiguity report.
//!
//! The index owns its [`Normalization`], so build-time and lookup-time
//! folding cannot drift apart.
//!
//! # Example
//! ```
//! use lemmata_index::{DatasetIndex, Resolution, classify};
//! use lemmata_types::{Record, Synopsis, Tag};
//!
//! let noun = Synopsis::new(vec![Tag::new("pos", "N")]);
//! let verb = Synopsis::new(vec![Tag::new("pos", "V")]);
//! let index = DatasetIndex::build([
//!     Record::new("duces", "dux", noun).unwrap(),
//!     Record::new("duces", "duco", verb.clone()).unwrap(),
//!     Record::new("amat", "amo", verb).unwrap(),
//! ]);
//!
//! assert!(matches!(classify(&index, "Amat"), Resolution::Unique(c) if c.lemma == "amo"));
//! assert!(matches!(classify(&index, "duces"), Resolution::Ambiguous(ref c) if c.len() == 2));
//! assert!(matches!(classify(&index, "xyzzy"), Resolution::Unmatched));
//! ```
//!
//! For a runnable demo, see `cargo run -p lemmata-index --example lookup -- <dataset> <word>...`.

mod classify;
mod index;
mod resolve;

pub use classify::{Resolution, classify};
pub use index::{Candidate, Candidates, DatasetIndex, IndexBuilder, IndexStats};
pub use lemmata_types::{MatchStatus, Normalization, normalize_form};
pub use resolve::{
    AmbiguityEntry, Annotation, IntegrityWarning, ResolveOptions, Resolved, Summary, TargetWord,
    resolve,
};
