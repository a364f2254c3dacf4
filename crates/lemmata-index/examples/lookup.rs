use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use lemmata_dataset::{Dataset, LoadMode};
use lemmata_index::{DatasetIndex, IndexBuilder, Normalization, Resolution, classify};

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let path = args.next().map(PathBuf::from).context(
        "usage: cargo run -p lemmata-index --example lookup -- <dataset.xml> [--demo | <word>...]",
    )?;

    let words: Vec<String> = match args.next() {
        Some(arg) if arg == "--demo" => ["amat", "duces", "rosa", "Iuvenis", "xyzzy"]
            .into_iter()
            .map(String::from)
            .collect(),
        Some(arg) => std::iter::once(arg).chain(args).collect(),
        None => bail!("no words given; pass words or --demo"),
    };

    let dataset = Dataset::load_with_mode(&path, LoadMode::Mmap)
        .with_context(|| format!("loading dataset from {}", path.display()))?;
    let batch = dataset.records();
    let mut builder = IndexBuilder::new(Normalization::default());
    builder.note_skipped(batch.malformed.len());
    for record in batch.records {
        builder.insert(record);
    }
    let index: DatasetIndex = builder.finish();

    println!("Dataset: {}", path.display());

    for word in words {
        let resolution = classify(&index, &word);
        println!("\n{} [{}]", word, resolution.status());
        if let Resolution::Unmatched = resolution {
            continue;
        }
        for candidate in resolution.candidates() {
            println!("  {}", candidate.lemma);
            for synopsis in candidate.synopses {
                println!("    {}", synopsis);
            }
        }
    }

    Ok(())
}
