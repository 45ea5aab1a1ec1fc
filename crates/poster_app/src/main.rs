mod cli;
mod logging;
mod output;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use engine_logging::{engine_error, engine_info, engine_warn};
use poster_engine::{RunSummary, Runner};

use crate::cli::Cli;

fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    logging::initialize(cli.log_destination(), cli.log_level());
    if let Ok(path) = dotenv {
        engine_info!("loaded environment from {}", path.display());
    }

    match run(cli) {
        Ok(summary) if summary.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(err) => {
            engine_error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<RunSummary> {
    let config = cli.into_config()?;
    if config.dry_run {
        engine_info!("dry run: nothing will be posted or recorded");
    }
    engine_info!(
        "content {}, tracking file {}",
        config.content_dir.display(),
        config.tracking_file.display()
    );

    let runner = Runner::from_config(&config).context("invalid configuration")?;
    let runtime = tokio::runtime::Runtime::new().context("failed to start the async runtime")?;
    let summary = runtime
        .block_on(runner.run())
        .context("publishing run aborted")?;

    for failure in &summary.failures {
        engine_warn!("{} was not published: {}", failure.post_id, failure.reason);
    }
    println!("Published {} new post(s)", summary.published);
    output::set_github_output("posts_published", summary.published)
        .context("failed to write GITHUB_OUTPUT")?;
    Ok(summary)
}
