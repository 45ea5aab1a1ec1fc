use std::fmt;
use std::str::FromStr;

use engine_logging::engine_debug;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::associate::associate_images;
use crate::chunk::{char_len, chunk_text, shorten, Chunk, ChunkOptions, DEFAULT_BUDGET};
use crate::permalink::canonical_url;
use crate::strip::{strip_markup, StrippedBody};
use crate::{ImageRef, PipelineError, Post};

/// Below this many characters of room after the title and link, the first
/// post carries only the title and link.
pub const MIN_LEAD_ROOM: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Unlisted,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Unlisted => "unlisted",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("unknown visibility `{0}` (expected public, unlisted or private)")]
pub struct ParseVisibilityError(String);

impl FromStr for Visibility {
    type Err = ParseVisibilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "unlisted" => Ok(Visibility::Unlisted),
            "private" => Ok(Visibility::Private),
            _ => Err(ParseVisibilityError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadSettings {
    pub site_base: Url,
    pub budget: usize,
    pub visibility: Visibility,
}

impl ThreadSettings {
    pub fn new(site_base: Url) -> Self {
        Self {
            site_base,
            budget: DEFAULT_BUDGET,
            visibility: Visibility::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadMode {
    /// One announcement post linking to the article.
    Single,
    /// The whole article as a reply chain.
    Thread,
}

/// One status waiting to be posted.
///
/// `in_reply_to` stays empty in the plan; the publisher fills it with the
/// identifier the previous status received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPost {
    pub index: usize,
    pub text: String,
    pub media: Vec<ImageRef>,
    pub visibility: Visibility,
    pub in_reply_to: Option<String>,
}

impl PlannedPost {
    pub fn is_first(&self) -> bool {
        self.index == 1
    }
}

/// Ordered statuses for one post. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadPlan {
    pub post_id: String,
    pub title: String,
    pub url: String,
    pub mode: ThreadMode,
    pub dropped_images: Vec<ImageRef>,
    posts: Vec<PlannedPost>,
}

impl ThreadPlan {
    pub fn posts(&self) -> &[PlannedPost] {
        &self.posts
    }

    pub fn into_posts(self) -> Vec<PlannedPost> {
        self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn first(&self) -> &PlannedPost {
        &self.posts[0]
    }
}

/// Runs the whole pipeline for one parsed post.
pub fn plan_post(post: &Post, settings: &ThreadSettings) -> Result<ThreadPlan, PipelineError> {
    let body = if post.thread {
        strip_markup(&post.body)
    } else {
        StrippedBody::default()
    };
    build_plan(post, body, settings)
}

/// Builds the plan from an already stripped body.
pub fn build_plan(
    post: &Post,
    body: StrippedBody,
    settings: &ThreadSettings,
) -> Result<ThreadPlan, PipelineError> {
    let url = canonical_url(&settings.site_base, post)?.to_string();
    let budget = settings.budget.max(1);
    let featured = post.featured_image_ref();

    let (mode, mut chunks, body_images) = if post.thread {
        (ThreadMode::Thread, thread_chunks(post, &body.text, &url, budget)?, body.images)
    } else {
        (ThreadMode::Single, vec![announcement_chunk(post, &url, budget)], Vec::new())
    };
    let dropped_images = associate_images(&mut chunks, featured, body_images);

    engine_debug!(
        "planned {} status(es) for {} ({} image(s) dropped)",
        chunks.len(),
        post.id,
        dropped_images.len()
    );

    let posts = chunks
        .into_iter()
        .map(|chunk| PlannedPost {
            index: chunk.index,
            text: chunk.text,
            media: chunk.images,
            visibility: settings.visibility,
            in_reply_to: None,
        })
        .collect();

    Ok(ThreadPlan {
        post_id: post.id.clone(),
        title: post.title.clone(),
        url,
        mode,
        dropped_images,
        posts,
    })
}

fn announcement_chunk(post: &Post, url: &str, budget: usize) -> Chunk {
    let lead = post
        .announcement
        .clone()
        .unwrap_or_else(|| format!("New post: {}", post.title));
    let room = budget.saturating_sub(char_len(url) + 2);
    let text = if room == 0 {
        url.to_string()
    } else {
        format!("{}\n\n{url}", shorten(&lead, room))
    };
    header_chunk(text)
}

fn thread_chunks(
    post: &Post,
    body: &str,
    url: &str,
    budget: usize,
) -> Result<Vec<Chunk>, PipelineError> {
    let title_room = budget.saturating_sub(char_len(url) + 2);
    let header = if title_room == 0 {
        url.to_string()
    } else {
        format!("{}\n\n{url}", shorten(&post.title, title_room))
    };
    let reserved = char_len(&header) + 2;
    let mut standalone = budget.saturating_sub(reserved) < MIN_LEAD_ROOM;

    let options = ChunkOptions::new(budget).with_reserved(if standalone { 0 } else { reserved });
    let mut chunks = chunk_text(body, options);
    if chunks.is_empty() {
        return Err(PipelineError::EmptyThread);
    }
    // The body opened with a word too wide to share the first post.
    if !standalone && chunks[0].char_len() + reserved > budget {
        standalone = true;
    }

    if standalone {
        chunks.insert(0, header_chunk(header));
        for (i, chunk) in chunks.iter_mut().enumerate() {
            chunk.index = i + 1;
        }
    } else {
        let first = &mut chunks[0];
        first.text = format!("{header}\n\n{}", first.text);
    }
    Ok(chunks)
}

fn header_chunk(text: String) -> Chunk {
    Chunk {
        index: 1,
        text,
        span: 0..0,
        images: Vec::new(),
    }
}
