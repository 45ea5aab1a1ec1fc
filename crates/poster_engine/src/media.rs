use std::path::{Path, PathBuf};

use engine_logging::engine_debug;
use poster_core::ImageRef;

use crate::fetch::{essence, ImageFetcher, SUPPORTED_MEDIA_TYPES};
use crate::{MediaPayload, PublishError};

/// Turns an image reference into upload-ready bytes.
#[async_trait::async_trait]
pub trait MediaLoader: Send + Sync {
    /// `asset_dir` is the directory of the post the image belongs to.
    async fn load(&self, image: &ImageRef, asset_dir: &Path) -> Result<MediaPayload, PublishError>;
}

/// Resolves Hugo image sources.
///
/// `http(s)` sources are downloaded, `/`-rooted paths are read from the site
/// static directory and anything else from the post's own directory.
pub struct MediaResolver {
    static_dir: PathBuf,
    fetcher: ImageFetcher,
}

impl MediaResolver {
    pub fn new(static_dir: impl Into<PathBuf>, fetcher: ImageFetcher) -> Self {
        Self {
            static_dir: static_dir.into(),
            fetcher,
        }
    }

    /// Local file an image source points at, or `None` for remote sources.
    pub fn local_path(&self, src: &str, asset_dir: &Path) -> Option<PathBuf> {
        if is_remote(src) {
            return None;
        }
        let src = src.split(['?', '#']).next().unwrap_or(src);
        Some(match src.strip_prefix('/') {
            Some(rooted) => self.static_dir.join(rooted),
            None => asset_dir.join(src),
        })
    }

    async fn load_remote(&self, image: &ImageRef) -> Result<MediaPayload, PublishError> {
        let fetched = self
            .fetcher
            .fetch(&image.src)
            .await
            .map_err(|err| PublishError::media(&image.src, err))?;
        let file_name = file_name_of(url_path(&fetched.final_url));
        let mime = match fetched.content_type {
            Some(content_type) => content_type,
            None => guess_mime(&file_name).ok_or_else(|| {
                PublishError::media(&image.src, "cannot determine the image type")
            })?,
        };
        payload(image, file_name, mime, fetched.bytes)
    }

    async fn load_local(&self, image: &ImageRef, path: PathBuf) -> Result<MediaPayload, PublishError> {
        let file_name = file_name_of(&path.to_string_lossy());
        let mime = guess_mime(&file_name).ok_or_else(|| {
            PublishError::media(&image.src, format!("unsupported image type `{file_name}`"))
        })?;

        let max_bytes = self.fetcher.settings().max_bytes;
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|err| PublishError::media(&image.src, format!("{}: {err}", path.display())))?;
        if meta.len() > max_bytes {
            return Err(PublishError::media(
                &image.src,
                format!("{} bytes exceeds the {max_bytes} byte limit", meta.len()),
            ));
        }
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|err| PublishError::media(&image.src, format!("{}: {err}", path.display())))?;
        engine_debug!("read {} bytes from {}", bytes.len(), path.display());
        payload(image, file_name, mime, bytes)
    }
}

#[async_trait::async_trait]
impl MediaLoader for MediaResolver {
    async fn load(&self, image: &ImageRef, asset_dir: &Path) -> Result<MediaPayload, PublishError> {
        match self.local_path(&image.src, asset_dir) {
            Some(path) => self.load_local(image, path).await,
            None => self.load_remote(image).await,
        }
    }
}

fn payload(
    image: &ImageRef,
    file_name: String,
    mime: String,
    bytes: Vec<u8>,
) -> Result<MediaPayload, PublishError> {
    let mime = essence(&mime);
    if !SUPPORTED_MEDIA_TYPES.contains(&mime.as_str()) {
        return Err(PublishError::media(
            &image.src,
            format!("unsupported media type {mime}"),
        ));
    }
    Ok(MediaPayload {
        file_name,
        mime,
        bytes,
        description: image.alt.clone(),
    })
}

fn is_remote(src: &str) -> bool {
    let lower = src.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn url_path(url: &str) -> &str {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query
        .split_once("://")
        .map_or(without_query, |(_, rest)| rest)
}

fn file_name_of(path: &str) -> String {
    path.rsplit(['/', '\\'])
        .find(|segment| !segment.is_empty())
        .unwrap_or("image")
        .to_string()
}

fn guess_mime(file_name: &str) -> Option<String> {
    mime_guess::from_path(file_name)
        .first()
        .map(|mime| mime.essence_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::{file_name_of, guess_mime, url_path};

    #[test]
    fn file_names_come_from_the_last_segment() {
        assert_eq!(file_name_of("a/b/cat.png"), "cat.png");
        assert_eq!(file_name_of(url_path("https://x.dev/img/dog.jpg?w=2")), "dog.jpg");
        assert_eq!(file_name_of(""), "image");
    }

    #[test]
    fn mime_is_guessed_from_extension() {
        assert_eq!(guess_mime("a.JPG").as_deref(), Some("image/jpeg"));
        assert_eq!(guess_mime("a.webp").as_deref(), Some("image/webp"));
        assert_eq!(guess_mime("noext"), None);
    }
}
