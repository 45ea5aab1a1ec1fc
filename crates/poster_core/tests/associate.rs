use poster_core::{
    associate_images, chunk_for_offset, chunk_text, strip_markup, ChunkOptions, ImageRef,
    ImageRole, MAX_MEDIA_PER_POST,
};
use pretty_assertions::assert_eq;

const TEXT: &str = "First para.\n\nSecond para.";

fn two_chunks() -> Vec<poster_core::Chunk> {
    let chunks = chunk_text(TEXT, ChunkOptions::new(12));
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].span, 0..11);
    assert_eq!(chunks[1].span, 13..25);
    chunks
}

fn body(src: &str, offset: usize) -> ImageRef {
    ImageRef::body(src, None, offset)
}

#[test]
fn offsets_map_to_the_containing_or_following_chunk() {
    let chunks = two_chunks();
    assert_eq!(chunk_for_offset(&chunks, 0), Some(0));
    assert_eq!(chunk_for_offset(&chunks, 3), Some(0));
    assert_eq!(chunk_for_offset(&chunks, 11), Some(1));
    assert_eq!(chunk_for_offset(&chunks, 12), Some(1));
    assert_eq!(chunk_for_offset(&chunks, 20), Some(1));
    assert_eq!(chunk_for_offset(&chunks, 25), Some(1));
    assert_eq!(chunk_for_offset(&chunks, 999), Some(1));
    assert_eq!(chunk_for_offset(&[], 0), None);
}

#[test]
fn featured_image_goes_first_on_the_first_chunk() {
    let mut chunks = two_chunks();
    let dropped = associate_images(
        &mut chunks,
        Some(ImageRef::featured("cover.jpg")),
        vec![body("inline.png", 5), body("late.png", 20)],
    );
    assert!(dropped.is_empty());
    let first: Vec<_> = chunks[0].images.iter().map(|i| i.src.as_str()).collect();
    assert_eq!(first, vec!["cover.jpg", "inline.png"]);
    assert_eq!(chunks[0].images[0].role, ImageRole::Featured);
    let second: Vec<_> = chunks[1].images.iter().map(|i| i.src.as_str()).collect();
    assert_eq!(second, vec!["late.png"]);
}

#[test]
fn body_images_keep_document_order() {
    let mut chunks = two_chunks();
    associate_images(
        &mut chunks,
        None,
        vec![body("a.png", 14), body("b.png", 15), body("c.png", 16)],
    );
    let srcs: Vec<_> = chunks[1].images.iter().map(|i| i.src.as_str()).collect();
    assert_eq!(srcs, vec!["a.png", "b.png", "c.png"]);
    assert!(chunks[0].images.is_empty());
}

#[test]
fn excess_images_are_dropped() {
    let mut chunks = two_chunks();
    let images = (0..6).map(|i| body(&format!("{i}.png"), 2)).collect();
    let dropped = associate_images(&mut chunks, Some(ImageRef::featured("cover.jpg")), images);

    assert_eq!(chunks[0].images.len(), MAX_MEDIA_PER_POST);
    assert_eq!(chunks[0].images[0].src, "cover.jpg");
    let dropped: Vec<_> = dropped.iter().map(|i| i.src.as_str()).collect();
    assert_eq!(dropped, vec!["3.png", "4.png", "5.png"]);
}

#[test]
fn nothing_to_attach_to_drops_everything() {
    let dropped = associate_images(
        &mut [],
        Some(ImageRef::featured("cover.jpg")),
        vec![body("a.png", 0)],
    );
    assert_eq!(dropped.len(), 2);
}

#[test]
fn image_ending_a_paragraph_stays_with_that_paragraph() {
    let stripped = strip_markup("First paragraph text here ![pic](a.png)\n\nSecond paragraph text.");
    let mut chunks = chunk_text(&stripped.text, ChunkOptions::new(25));
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].span, 0..25);

    let dropped = associate_images(&mut chunks, None, stripped.images);
    assert!(dropped.is_empty());
    assert_eq!(chunks[0].images.len(), 1);
    assert_eq!(chunks[0].images[0].src, "a.png");
    assert!(chunks[1].images.is_empty());
}
