use std::path::{Path, PathBuf};
use std::time::Duration;

use poster_core::{ThreadSettings, Visibility, DEFAULT_BUDGET};
use url::Url;

/// Tracking file location used when none is configured, relative to the
/// parent of the content directory.
pub const DEFAULT_TRACKING_FILE: &str = ".github/mastodon-published.json";
pub const DEFAULT_POST_DELAY: Duration = Duration::from_secs(1);

/// Everything a run needs, already parsed.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Required unless `dry_run`.
    pub instance: Option<Url>,
    /// Required unless `dry_run`.
    pub access_token: Option<String>,
    pub site_base: Url,
    pub content_dir: PathBuf,
    pub static_dir: PathBuf,
    pub tracking_file: PathBuf,
    pub visibility: Visibility,
    pub budget: usize,
    pub post_delay: Duration,
    pub dry_run: bool,
}

impl RunConfig {
    /// Defaults for everything but the blog location.
    pub fn new(site_base: Url, content_dir: impl Into<PathBuf>) -> Self {
        let content_dir = content_dir.into();
        Self {
            instance: None,
            access_token: None,
            static_dir: default_static_dir(&content_dir),
            tracking_file: resolve_tracking_file(&content_dir, Path::new(DEFAULT_TRACKING_FILE)),
            site_base,
            content_dir,
            visibility: Visibility::default(),
            budget: DEFAULT_BUDGET,
            post_delay: DEFAULT_POST_DELAY,
            dry_run: false,
        }
    }

    pub fn thread_settings(&self) -> ThreadSettings {
        ThreadSettings {
            site_base: self.site_base.clone(),
            budget: self.budget,
            visibility: self.visibility,
        }
    }
}

/// Relative tracking paths are anchored at the content directory's parent.
pub fn resolve_tracking_file(content_dir: &Path, tracking_file: &Path) -> PathBuf {
    if tracking_file.is_absolute() {
        tracking_file.to_path_buf()
    } else {
        site_root(content_dir).join(tracking_file)
    }
}

/// `static` next to the content directory.
pub fn default_static_dir(content_dir: &Path) -> PathBuf {
    site_root(content_dir).join("static")
}

fn site_root(content_dir: &Path) -> PathBuf {
    content_dir
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}
