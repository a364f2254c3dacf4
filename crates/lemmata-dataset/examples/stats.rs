use std::collections::{BTreeMap, HashSet};
use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use lemmata_dataset::{Dataset, LoadMode};

fn main() -> Result<()> {
    let path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: cargo run -p lemmata-dataset --example stats -- <path-to-dataset.xml>")?;

    let dataset = Dataset::load_with_mode(&path, LoadMode::Mmap)
        .with_context(|| format!("loading dataset from {}", path.display()))?;
    let batch = dataset.records();

    let mut forms = HashSet::new();
    let mut lemmas = HashSet::new();
    let mut tag_usage: BTreeMap<String, usize> = BTreeMap::new();
    for record in &batch.records {
        forms.insert(record.form());
        lemmas.insert(record.lemma());
        for tag in record.synopsis().tags() {
            *tag_usage.entry(tag.name.clone()).or_default() += 1;
        }
    }

    println!("Dataset: {}", path.display());
    println!("Entries      : {}", dataset.entry_count());
    println!("Records      : {}", batch.records.len());
    println!("Malformed    : {}", batch.malformed.len());
    println!("Distinct forms : {}", forms.len());
    println!("Distinct lemmas: {}", lemmas.len());
    println!("Tag usage:");
    for (name, count) in &tag_usage {
        println!("  {:<12} {}", name, count);
    }

    Ok(())
}
