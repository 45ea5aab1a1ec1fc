use std::path::PathBuf;
use std::time::Duration;

use anyhow::ensure;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use log::LevelFilter;
use poster_core::{Visibility, DEFAULT_BUDGET};
use poster_engine::{resolve_tracking_file, RunConfig, DEFAULT_TRACKING_FILE};
use url::Url;

use crate::logging::LogDestination;

/// Publish Hugo posts marked `mastodon: true` to Mastodon.
///
/// Every option can also be given through the environment variable shown in
/// its help text; a `.env` file in the working directory is read first.
#[derive(Debug, Parser)]
#[command(name = "mastodon-poster", version, about)]
pub struct Cli {
    /// Mastodon instance, e.g. https://mastodon.social
    #[arg(long, env = "MASTODON_INSTANCE")]
    pub instance: Option<Url>,

    /// Access token with the write:statuses and write:media scopes.
    #[arg(long, env = "MASTODON_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Public base url of the blog.
    #[arg(long, env = "BLOG_BASE_URL")]
    pub blog_base_url: Url,

    /// Hugo content directory.
    #[arg(long, env = "BLOG_CONTENT_DIR", default_value = "content")]
    pub content_dir: PathBuf,

    /// Tracking file; relative paths start at the content directory's parent.
    #[arg(long, env = "TRACKING_FILE", default_value = DEFAULT_TRACKING_FILE)]
    pub tracking_file: PathBuf,

    /// Site static directory [default: `static` next to the content directory]
    #[arg(long, env = "STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    #[arg(long, env = "MASTODON_VISIBILITY", default_value_t = Visibility::Public)]
    pub visibility: Visibility,

    /// Maximum characters per status.
    #[arg(long, env = "CHUNK_BUDGET", default_value_t = DEFAULT_BUDGET)]
    pub chunk_budget: usize,

    /// Pause between statuses, in milliseconds.
    #[arg(long, env = "POST_DELAY_MS", default_value_t = 1000)]
    pub post_delay_ms: u64,

    /// Log what would be posted without posting or recording anything.
    ///
    /// Accepts `true`, `1`, `yes` or `on` in any case.
    #[arg(
        long,
        env = "DRY_RUN",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub dry_run: bool,

    /// Debug-level logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Also write the log to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }

    pub fn log_destination(&self) -> LogDestination {
        match &self.log_file {
            Some(path) => LogDestination::Both(path.clone()),
            None => LogDestination::Terminal,
        }
    }

    pub fn into_config(self) -> anyhow::Result<RunConfig> {
        ensure!(self.chunk_budget > 0, "CHUNK_BUDGET must be at least 1");

        let mut config = RunConfig::new(self.blog_base_url, self.content_dir);
        config.tracking_file = resolve_tracking_file(&config.content_dir, &self.tracking_file);
        if let Some(static_dir) = self.static_dir {
            config.static_dir = static_dir;
        }
        config.instance = self.instance;
        config.access_token = self.access_token.filter(|t| !t.trim().is_empty());
        config.visibility = self.visibility;
        config.budget = self.chunk_budget;
        config.post_delay = Duration::from_millis(self.post_delay_ms);
        config.dry_run = self.dry_run;
        Ok(config)
    }
}
