use std::io;

use poster_core::{MemoryTrackingStore, PublicationTracker, TrackerError, TrackingStore};
use pretty_assertions::assert_eq;

struct BrokenStore;

impl TrackingStore for BrokenStore {
    fn read(&self) -> io::Result<Option<String>> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
    }

    fn write(&self, _contents: &str) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
    }
}

#[test]
fn empty_store_loads_an_empty_tracker() {
    let tracker = PublicationTracker::load_from(&MemoryTrackingStore::new()).unwrap();
    assert!(tracker.is_empty());
    assert!(!tracker.is_published("content/a.md"));
}

#[test]
fn marks_are_deduplicated_and_written_sorted() {
    let store = MemoryTrackingStore::new();
    let mut tracker = PublicationTracker::new();
    assert!(tracker.mark_published("b"));
    assert!(tracker.mark_published("a"));
    assert!(!tracker.mark_published("b"));
    tracker.serialize_to(&store).unwrap();

    assert_eq!(
        store.contents().as_deref(),
        Some("{\n  \"published\": [\n    \"a\",\n    \"b\"\n  ]\n}\n")
    );
    assert_eq!(store.write_count(), 1);
    assert_eq!(tracker.iter().collect::<Vec<_>>(), vec!["a", "b"]);
}

#[test]
fn round_trips_through_a_store() {
    let store = MemoryTrackingStore::new();
    let mut tracker = PublicationTracker::new();
    tracker.mark_published("content/tech/x/index.md");
    tracker.serialize_to(&store).unwrap();

    let reloaded = PublicationTracker::load_from(&store).unwrap();
    assert_eq!(reloaded, tracker);
    assert!(reloaded.is_published("content/tech/x/index.md"));
    assert_eq!(reloaded.len(), 1);
}

#[test]
fn unknown_fields_are_preserved() {
    let store = MemoryTrackingStore::with_contents(
        r#"{"published": ["x"], "note": "kept", "version": 2}"#,
    );
    let mut tracker = PublicationTracker::load_from(&store).unwrap();
    tracker.mark_published("y");
    tracker.serialize_to(&store).unwrap();

    let value: serde_json::Value = serde_json::from_str(&store.contents().unwrap()).unwrap();
    assert_eq!(value["note"], "kept");
    assert_eq!(value["version"], 2);
    assert_eq!(value["published"], serde_json::json!(["x", "y"]));
}

#[test]
fn missing_published_list_means_nothing_published() {
    let tracker = PublicationTracker::from_json("{}").unwrap();
    assert!(tracker.is_empty());
}

#[test]
fn corrupt_documents_are_rejected() {
    for bad in ["not json", r#"{"published": "x"}"#, "[1, 2]", ""] {
        let result = PublicationTracker::from_json(bad);
        assert!(
            matches!(result, Err(TrackerError::CorruptTrackingState(_))),
            "{bad:?} was accepted"
        );
    }
}

#[test]
fn store_failures_surface_as_io_errors() {
    assert!(matches!(
        PublicationTracker::load_from(&BrokenStore),
        Err(TrackerError::TrackingIo(_))
    ));
    assert!(matches!(
        PublicationTracker::new().serialize_to(&BrokenStore),
        Err(TrackerError::TrackingIo(_))
    ));
}
