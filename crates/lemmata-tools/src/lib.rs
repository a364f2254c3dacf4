//! Command-line plumbing around `lemmata-index`: reading target word lists,
//! routing resolved words into output sheets, and the two binaries'
//! argument surfaces.

pub mod cli;
pub mod error;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod style;
pub mod target;

pub use error::ToolError;
pub use pipeline::{MatchOptions, MatchReport, run_match, run_sort};
