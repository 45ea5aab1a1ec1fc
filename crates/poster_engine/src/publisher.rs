use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use engine_logging::engine_info;

use crate::{MediaId, MediaPayload, PublishError, StatusDraft, StatusId};

/// The posting API boundary.
#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    async fn upload_media(&self, media: MediaPayload) -> Result<MediaId, PublishError>;
    async fn create_status(&self, draft: StatusDraft) -> Result<StatusId, PublishError>;
}

/// Logs would-be payloads instead of sending them.
///
/// Identifiers are synthetic (`dry-run-1`, `dry-run-2`, ...) so reply linkage
/// can still be followed in the log.
#[derive(Debug, Default)]
pub struct DryRunPublisher {
    statuses: AtomicUsize,
    uploads: AtomicUsize,
    drafts: Mutex<Vec<StatusDraft>>,
}

impl DryRunPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drafts seen so far, in submission order.
    pub fn drafts(&self) -> Vec<StatusDraft> {
        self.drafts.lock().map(|d| d.clone()).unwrap_or_default()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl Publisher for DryRunPublisher {
    async fn upload_media(&self, media: MediaPayload) -> Result<MediaId, PublishError> {
        let n = self.uploads.fetch_add(1, Ordering::Relaxed) + 1;
        engine_info!(
            "[dry run] would upload {} ({}, {} bytes, alt: {:?})",
            media.file_name,
            media.mime,
            media.bytes.len(),
            media.description
        );
        Ok(MediaId(format!("dry-run-media-{n}")))
    }

    async fn create_status(&self, draft: StatusDraft) -> Result<StatusId, PublishError> {
        let n = self.statuses.fetch_add(1, Ordering::Relaxed) + 1;
        engine_info!(
            "[dry run] would post status {} ({} chars, {} media, reply to {}):\n{}",
            n,
            draft.text.chars().count(),
            draft.media_ids.len(),
            draft.in_reply_to.as_ref().map_or("-", StatusId::as_str),
            draft.text
        );
        if let Ok(mut drafts) = self.drafts.lock() {
            drafts.push(draft);
        }
        Ok(StatusId(format!("dry-run-{n}")))
    }
}
