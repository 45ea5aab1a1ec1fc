use std::collections::BTreeSet;
use std::io;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Backing storage for the tracking document.
pub trait TrackingStore: Send + Sync {
    /// Returns `Ok(None)` when nothing has been stored yet.
    fn read(&self) -> io::Result<Option<String>>;
    fn write(&self, contents: &str) -> io::Result<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("tracking state is corrupt: {0}")]
    CorruptTrackingState(String),
    #[error("tracking state io error: {0}")]
    TrackingIo(#[from] io::Error),
    #[error("failed to encode tracking state: {0}")]
    Encode(#[source] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TrackingDocument {
    #[serde(default)]
    published: Vec<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Set of post identities that already went out.
///
/// Loaded once per run and owned by the runner; additions are monotonic.
/// Unknown fields of the stored document survive a rewrite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublicationTracker {
    published: BTreeSet<String>,
    extra: Map<String, Value>,
}

impl PublicationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads from `store`; a store with nothing in it yields an empty tracker.
    pub fn load_from(store: &dyn TrackingStore) -> Result<Self, TrackerError> {
        match store.read()? {
            Some(contents) => Self::from_json(&contents),
            None => Ok(Self::new()),
        }
    }

    pub fn from_json(contents: &str) -> Result<Self, TrackerError> {
        let doc: TrackingDocument = serde_json::from_str(contents)
            .map_err(|err| TrackerError::CorruptTrackingState(err.to_string()))?;
        Ok(Self {
            published: doc.published.into_iter().collect(),
            extra: doc.extra,
        })
    }

    /// Pretty JSON with identities sorted, ending in a newline.
    pub fn to_json(&self) -> Result<String, TrackerError> {
        let doc = TrackingDocument {
            published: self.published.iter().cloned().collect(),
            extra: self.extra.clone(),
        };
        let mut json = serde_json::to_string_pretty(&doc).map_err(TrackerError::Encode)?;
        json.push('\n');
        Ok(json)
    }

    /// Rewrites the whole document.
    pub fn serialize_to(&self, store: &dyn TrackingStore) -> Result<(), TrackerError> {
        store.write(&self.to_json()?)?;
        Ok(())
    }

    pub fn is_published(&self, post_id: &str) -> bool {
        self.published.contains(post_id)
    }

    /// Returns `true` when the identity was not yet tracked.
    pub fn mark_published(&mut self, post_id: impl Into<String>) -> bool {
        self.published.insert(post_id.into())
    }

    pub fn len(&self) -> usize {
        self.published.len()
    }

    pub fn is_empty(&self) -> bool {
        self.published.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.published.iter().map(String::as_str)
    }
}

/// In-memory store, for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryTrackingStore {
    contents: Mutex<Option<String>>,
    writes: Mutex<usize>,
}

impl MemoryTrackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(Some(contents.into())),
            writes: Mutex::new(0),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().ok().and_then(|c| c.clone())
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().map(|w| *w).unwrap_or_default()
    }
}

impl TrackingStore for MemoryTrackingStore {
    fn read(&self) -> io::Result<Option<String>> {
        self.contents
            .lock()
            .map(|c| c.clone())
            .map_err(|_| io::Error::other("tracking store lock poisoned"))
    }

    fn write(&self, contents: &str) -> io::Result<()> {
        let mut slot = self
            .contents
            .lock()
            .map_err(|_| io::Error::other("tracking store lock poisoned"))?;
        *slot = Some(contents.to_string());
        if let Ok(mut writes) = self.writes.lock() {
            *writes += 1;
        }
        Ok(())
    }
}
