//! Poster core: the pure content-to-thread pipeline.
//!
//! Frontmatter parsing, markup stripping, chunking, image association, thread
//! planning and the publication tracker. Nothing in here touches the network
//! or the filesystem; storage goes through [`TrackingStore`].
mod associate;
mod chunk;
mod error;
mod frontmatter;
mod permalink;
mod post;
mod strip;
mod thread;
mod tracker;

pub use associate::{associate_images, chunk_for_offset, MAX_MEDIA_PER_POST};
pub use chunk::{chunk_text, shorten, Chunk, ChunkOptions, DEFAULT_BUDGET, TRUNCATION_MARKER};
pub use error::PipelineError;
pub use frontmatter::{parse_post, split_frontmatter};
pub use permalink::{canonical_url, site_path};
pub use post::{ImageRef, ImageRole, Post, PostLocation};
pub use strip::{strip_markup, StrippedBody};
pub use thread::{
    build_plan, plan_post, ParseVisibilityError, PlannedPost, ThreadMode, ThreadPlan,
    ThreadSettings, Visibility, MIN_LEAD_ROOM,
};
pub use tracker::{MemoryTrackingStore, PublicationTracker, TrackerError, TrackingStore};
