use clap::Parser;

use lemmata_tools::cli::SortArgs;
use lemmata_tools::logging::init_tracing;
use lemmata_tools::run_sort;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = SortArgs::parse();
    run_sort(&args.document, &args.key, args.output.as_deref())?;
    Ok(())
}
