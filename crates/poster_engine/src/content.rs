use std::fs;
use std::path::{Path, PathBuf};

use engine_logging::{engine_debug, engine_warn};
use poster_core::PostLocation;
use walkdir::WalkDir;

/// One raw content file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub location: PostLocation,
    /// Directory holding the file; relative image sources resolve against it.
    pub asset_dir: PathBuf,
    pub raw: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("content directory {0} does not exist")]
    MissingDirectory(PathBuf),
    #[error("failed to walk content directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("content scan task failed: {0}")]
    Task(String),
}

/// Where posts come from.
#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    /// All markdown files, in a stable order.
    async fn list(&self) -> Result<Vec<SourceFile>, ContentError>;
}

/// Markdown files under a Hugo `content` directory.
#[derive(Debug, Clone)]
pub struct FsContentSource {
    root: PathBuf,
}

impl FsContentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait::async_trait]
impl ContentSource for FsContentSource {
    async fn list(&self) -> Result<Vec<SourceFile>, ContentError> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || scan(&root))
            .await
            .map_err(|err| ContentError::Task(err.to_string()))?
    }
}

fn scan(root: &Path) -> Result<Vec<SourceFile>, ContentError> {
    if !root.is_dir() {
        return Err(ContentError::MissingDirectory(root.to_path_buf()));
    }
    let label = root_label(root);

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || !is_markdown(path) {
            continue;
        }
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let site_path = slash_path(relative);
        let id = if label.is_empty() {
            site_path.clone()
        } else {
            format!("{label}/{site_path}")
        };

        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) => {
                engine_warn!("skipping unreadable {}: {}", path.display(), err);
                continue;
            }
        };
        files.push(SourceFile {
            location: PostLocation::new(id, site_path),
            asset_dir: path.parent().unwrap_or(root).to_path_buf(),
            raw,
        });
    }
    engine_debug!("found {} markdown file(s) under {}", files.len(), root.display());
    Ok(files)
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

/// Name of the content directory itself, used as the identity prefix.
fn root_label(root: &Path) -> String {
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .or_else(|| {
            fs::canonicalize(root)
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        });
    name.unwrap_or_default()
}

fn slash_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

