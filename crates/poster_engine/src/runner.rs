use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use engine_logging::{engine_debug, engine_error, engine_info, engine_trace, engine_warn, PostScope};
use poster_core::{
    parse_post, plan_post, PipelineError, PublicationTracker, ThreadSettings, TrackerError,
    TrackingStore,
};

use crate::fetch::{FetchSettings, ImageFetcher};
use crate::{
    publish_thread, ContentError, ContentSource, DryRunPublisher, FileTrackingStore,
    FsContentSource, MastodonClient, MastodonSettings, MediaLoader, MediaResolver, Publisher,
    RunConfig, SubmissionFailure, ThreadError,
};

/// Errors that stop the whole run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("cannot load tracking state: {0}")]
    LoadTracking(#[source] TrackerError),
    #[error("cannot persist tracking state: {0}")]
    PersistTracking(#[source] TrackerError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error("{0} is required unless running dry")]
    MissingSetting(&'static str),
    #[error("cannot create Mastodon client: {0}")]
    Client(#[source] SubmissionFailure),
}

#[derive(Debug)]
pub enum FailureReason {
    Plan(PipelineError),
    Publish(ThreadError),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Plan(err) => write!(f, "{err}"),
            FailureReason::Publish(err) => write!(f, "{err}"),
        }
    }
}

/// An eligible post that did not go out; it stays unmarked.
#[derive(Debug)]
pub struct PostFailure {
    pub post_id: String,
    pub reason: FailureReason,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    /// Posts published and recorded in this run.
    pub published: usize,
    pub already_published: usize,
    /// Posts that would have been published in a dry run.
    pub planned: usize,
    /// Markdown files whose frontmatter could not be read.
    pub unparseable: usize,
    pub failures: Vec<PostFailure>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct RunnerSettings {
    pub thread: ThreadSettings,
    pub post_delay: Duration,
    pub dry_run: bool,
}

/// Drives one publishing run over injected collaborators.
pub struct Runner {
    settings: RunnerSettings,
    content: Arc<dyn ContentSource>,
    store: Arc<dyn TrackingStore>,
    publisher: Arc<dyn Publisher>,
    media: Arc<dyn MediaLoader>,
}

impl Runner {
    pub fn new(
        settings: RunnerSettings,
        content: Arc<dyn ContentSource>,
        store: Arc<dyn TrackingStore>,
        publisher: Arc<dyn Publisher>,
        media: Arc<dyn MediaLoader>,
    ) -> Self {
        Self {
            settings,
            content,
            store,
            publisher,
            media,
        }
    }

    /// Wires the filesystem, HTTP and dry-run collaborators from `config`.
    pub fn from_config(config: &RunConfig) -> Result<Self, RunError> {
        let publisher: Arc<dyn Publisher> = if config.dry_run {
            Arc::new(DryRunPublisher::new())
        } else {
            let instance = config
                .instance
                .as_ref()
                .ok_or(RunError::MissingSetting("MASTODON_INSTANCE"))?;
            let token = config
                .access_token
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .ok_or(RunError::MissingSetting("MASTODON_ACCESS_TOKEN"))?;
            Arc::new(
                MastodonClient::new(instance, token, MastodonSettings::default())
                    .map_err(RunError::Client)?,
            )
        };
        let media = MediaResolver::new(
            config.static_dir.clone(),
            ImageFetcher::new(FetchSettings::default()),
        );

        Ok(Self::new(
            RunnerSettings {
                thread: config.thread_settings(),
                post_delay: config.post_delay,
                dry_run: config.dry_run,
            },
            Arc::new(FsContentSource::new(config.content_dir.clone())),
            Arc::new(FileTrackingStore::new(config.tracking_file.clone())),
            publisher,
            Arc::new(media),
        ))
    }

    pub async fn run(&self) -> Result<RunSummary, RunError> {
        let mut tracker =
            PublicationTracker::load_from(self.store.as_ref()).map_err(RunError::LoadTracking)?;
        engine_info!("{} post(s) previously published", tracker.len());

        let files = self.content.list().await?;
        let mut summary = RunSummary::default();
        let mut first = true;

        for file in files {
            let _scope = PostScope::enter(&file.location.id);
            let post = match parse_post(file.location, &file.raw) {
                Ok(post) => post,
                Err(err) => {
                    engine_warn!("could not parse: {err}");
                    summary.unparseable += 1;
                    continue;
                }
            };
            if !post.share {
                engine_trace!("{} is not marked for Mastodon", post.id);
                continue;
            }
            if tracker.is_published(&post.id) {
                engine_debug!("{} already published", post.id);
                summary.already_published += 1;
                continue;
            }

            let plan = match plan_post(&post, &self.settings.thread) {
                Ok(plan) => plan,
                Err(err) => {
                    engine_error!("cannot build thread: {err}");
                    summary.failures.push(PostFailure {
                        post_id: post.id,
                        reason: FailureReason::Plan(err),
                    });
                    continue;
                }
            };
            engine_info!(
                "publishing \"{}\" as {} status(es) -> {}",
                plan.title,
                plan.len(),
                plan.url
            );

            if !first && !self.settings.post_delay.is_zero() {
                tokio::time::sleep(self.settings.post_delay).await;
            }
            first = false;

            let result = publish_thread(
                &plan,
                &file.asset_dir,
                self.publisher.as_ref(),
                self.media.as_ref(),
                self.settings.post_delay,
            )
            .await;

            match result {
                Ok(_) if self.settings.dry_run => summary.planned += 1,
                Ok(thread) => {
                    tracker.mark_published(thread.post_id);
                    tracker
                        .serialize_to(self.store.as_ref())
                        .map_err(RunError::PersistTracking)?;
                    summary.published += 1;
                }
                Err(err) => {
                    engine_error!("publishing failed: {err}");
                    summary.failures.push(PostFailure {
                        post_id: post.id,
                        reason: FailureReason::Publish(err),
                    });
                }
            }
        }

        engine_info!(
            "run finished: {} published, {} already published, {} planned, {} failed",
            summary.published,
            summary.already_published,
            summary.planned,
            summary.failures.len()
        );
        Ok(summary)
    }
}
