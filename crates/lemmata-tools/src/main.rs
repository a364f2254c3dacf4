use clap::Parser;
use tracing::info;

use lemmata_tools::cli::MatchArgs;
use lemmata_tools::logging::init_tracing;
use lemmata_tools::run_match;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let options = MatchArgs::parse().into_options();
    info!("matching {} against {}", options.target.display(), options.dataset.display());

    let report = run_match(&options)?;
    let stats = report.stats;
    info!(
        "index: {} forms, {} analyses, {} ambiguous forms, {} records skipped",
        stats.forms, stats.analyses, stats.ambiguous_forms, stats.skipped
    );
    if report.integrity_warnings > 0 {
        info!(
            "{} integrity warnings; see the log above",
            report.integrity_warnings
        );
    }
    Ok(())
}
