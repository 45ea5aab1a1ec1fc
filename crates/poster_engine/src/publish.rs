use std::path::Path;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info};
use futures_util::future::try_join_all;
use poster_core::{PlannedPost, ThreadPlan};

use crate::{MediaId, MediaLoader, PublishError, Publisher, StatusDraft, StatusId};

/// Identifiers of a fully posted thread, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedThread {
    pub post_id: String,
    pub status_ids: Vec<StatusId>,
}

#[derive(Debug, thiserror::Error)]
pub enum ThreadError {
    #[error("first status could not be posted: {0}")]
    FirstPost(#[source] PublishError),
    /// Some statuses are live but the chain is incomplete. The post stays
    /// unpublished, so a retry posts the whole thread again.
    #[error(
        "status {failed_index} failed after {} status(es) were posted ({}): {source}",
        .posted.len(),
        join_ids(.posted)
    )]
    PartialThread {
        posted: Vec<StatusId>,
        failed_index: usize,
        #[source]
        source: PublishError,
    },
}

fn join_ids(ids: &[StatusId]) -> String {
    ids.iter().map(StatusId::as_str).collect::<Vec<_>>().join(", ")
}

/// Posts `plan` as a reply chain.
///
/// Each status replies to the one before it, so statuses go out strictly in
/// order; only the attachments of a single status are uploaded concurrently.
/// `delay` is slept between statuses.
pub async fn publish_thread(
    plan: &ThreadPlan,
    asset_dir: &Path,
    publisher: &dyn Publisher,
    media: &dyn MediaLoader,
    delay: Duration,
) -> Result<PublishedThread, ThreadError> {
    let mut posted: Vec<StatusId> = Vec::with_capacity(plan.len());

    for planned in plan.posts() {
        if !posted.is_empty() && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let previous = posted.last().cloned();
        match publish_one(planned, previous, asset_dir, publisher, media).await {
            Ok(id) => {
                engine_debug!("status {}/{} posted as {}", planned.index, plan.len(), id);
                posted.push(id);
            }
            Err(source) if posted.is_empty() => return Err(ThreadError::FirstPost(source)),
            Err(source) => {
                return Err(ThreadError::PartialThread {
                    posted,
                    failed_index: planned.index,
                    source,
                })
            }
        }
    }

    engine_info!("posted {} status(es) for {}", posted.len(), plan.post_id);
    Ok(PublishedThread {
        post_id: plan.post_id.clone(),
        status_ids: posted,
    })
}

async fn publish_one(
    planned: &PlannedPost,
    in_reply_to: Option<StatusId>,
    asset_dir: &Path,
    publisher: &dyn Publisher,
    media: &dyn MediaLoader,
) -> Result<StatusId, PublishError> {
    let media_ids: Vec<MediaId> = try_join_all(planned.media.iter().map(|image| async move {
        let payload = media.load(image, asset_dir).await?;
        publisher.upload_media(payload).await
    }))
    .await?;

    publisher
        .create_status(StatusDraft {
            text: planned.text.clone(),
            media_ids,
            visibility: planned.visibility,
            in_reply_to,
        })
        .await
}
