//! Poster engine: content scanning, media loading, Mastodon IO and the run loop.
mod config;
mod content;
mod fetch;
mod mastodon;
mod media;
mod persist;
mod publish;
mod publisher;
mod runner;
mod types;

pub use config::{
    default_static_dir, resolve_tracking_file, RunConfig, DEFAULT_POST_DELAY,
    DEFAULT_TRACKING_FILE,
};
pub use content::{ContentError, ContentSource, FsContentSource, SourceFile};
pub use fetch::{FetchSettings, FetchedImage, ImageFetcher, SUPPORTED_MEDIA_TYPES};
pub use mastodon::{MastodonClient, MastodonSettings};
pub use media::{MediaLoader, MediaResolver};
pub use persist::{ensure_dir, AtomicFileWriter, FileTrackingStore, PersistError};
pub use publish::{publish_thread, PublishedThread, ThreadError};
pub use publisher::{DryRunPublisher, Publisher};
pub use runner::{FailureReason, PostFailure, RunError, RunSummary, Runner, RunnerSettings};
pub use types::{
    FailureKind, FetchError, MediaId, MediaPayload, PublishError, StatusDraft, StatusId,
    SubmissionFailure,
};
