#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRole {
    /// Post-wide image from the `image` frontmatter field.
    Featured,
    /// Image found inside the body text.
    Body,
}

/// An image the thread may attach.
///
/// `offset` is a byte offset into the stripped plain text. It is meaningless
/// for featured images, which always go to the first post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub src: String,
    pub alt: Option<String>,
    pub offset: usize,
    pub role: ImageRole,
}

impl ImageRef {
    pub fn featured(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            alt: None,
            offset: 0,
            role: ImageRole::Featured,
        }
    }

    pub fn body(src: impl Into<String>, alt: Option<String>, offset: usize) -> Self {
        Self {
            src: src.into(),
            alt: alt.filter(|a| !a.trim().is_empty()),
            offset,
            role: ImageRole::Body,
        }
    }
}

/// Where a content file lives.
///
/// `id` is the dedup key (path relative to the content directory's parent,
/// e.g. `content/tech/post/index.md`); `site_path` is relative to the content
/// directory itself and feeds the canonical url.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostLocation {
    pub id: String,
    pub site_path: String,
}

impl PostLocation {
    pub fn new(id: impl Into<String>, site_path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            site_path: site_path.into(),
        }
    }
}

/// A parsed content file. Read fresh every run and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: String,
    pub site_path: String,
    pub title: String,
    pub date: Option<String>,
    pub featured_image: Option<String>,
    /// `mastodon_text`: replaces the default announcement in single-post mode.
    pub announcement: Option<String>,
    /// `mastodon`: posts without the flag are never published.
    pub share: bool,
    /// `mastodon_thread`: publish the whole article as a reply chain.
    pub thread: bool,
    pub slug: Option<String>,
    pub url_override: Option<String>,
    pub body: String,
}

impl Post {
    pub fn featured_image_ref(&self) -> Option<ImageRef> {
        self.featured_image
            .as_deref()
            .map(str::trim)
            .filter(|src| !src.is_empty())
            .map(ImageRef::featured)
    }
}
