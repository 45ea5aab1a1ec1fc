use url::Url;

use crate::{PipelineError, Post};

/// Site-relative path of a page, Hugo style.
///
/// `tech/post/index.md` and `tech/post.md` both become `tech/post/`,
/// `tech/_index.md` becomes `tech/`. A `slug` replaces the last segment.
pub fn site_path(content_relative: &str, slug: Option<&str>) -> String {
    let normalized = content_relative.replace('\\', "/");
    let mut segments: Vec<&str> = normalized
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();

    match segments.pop() {
        Some("index.md") | Some("_index.md") | None => {}
        Some(file) => {
            let stem = file
                .strip_suffix(".md")
                .or_else(|| file.strip_suffix(".markdown"))
                .unwrap_or(file);
            segments.push(stem);
        }
    }

    if let Some(slug) = slug.map(|s| s.trim_matches('/')).filter(|s| !s.is_empty()) {
        segments.pop();
        segments.push(slug);
    }

    if segments.is_empty() {
        String::new()
    } else {
        format!("{}/", segments.join("/"))
    }
}

/// Canonical url of `post` under `base`. A frontmatter `url` wins over the
/// file location.
pub fn canonical_url(base: &Url, post: &Post) -> Result<Url, PipelineError> {
    let path = match &post.url_override {
        Some(url) => url.trim_start_matches('/').to_string(),
        None => site_path(&post.site_path, post.slug.as_deref()),
    };
    directory_base(base)
        .join(&path)
        .map_err(|err| PipelineError::InvalidUrl(format!("{path}: {err}")))
}

/// `base` with a trailing slash so joins append instead of replacing.
fn directory_base(base: &Url) -> Url {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}
