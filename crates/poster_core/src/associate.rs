use engine_logging::engine_warn;

use crate::{Chunk, ImageRef};

/// Mastodon accepts at most four attachments per status.
pub const MAX_MEDIA_PER_POST: usize = 4;

/// Index of the chunk an image at `offset` belongs to.
///
/// The chunk whose span contains the offset wins; an offset between two
/// chunks goes to the following one, and an offset past the end goes to the
/// last chunk. Chunks with empty spans never match by offset.
pub fn chunk_for_offset(chunks: &[Chunk], offset: usize) -> Option<usize> {
    chunks
        .iter()
        .position(|chunk| offset < chunk.span.end)
        .or_else(|| chunks.len().checked_sub(1))
}

/// Distributes images over `chunks` and returns the ones that were dropped.
///
/// The featured image always goes first on the first chunk. Body images are
/// placed by offset. Each chunk then keeps at most [`MAX_MEDIA_PER_POST`]
/// images; the excess is dropped with a warning.
pub fn associate_images(
    chunks: &mut [Chunk],
    featured: Option<ImageRef>,
    body: Vec<ImageRef>,
) -> Vec<ImageRef> {
    let mut dropped = Vec::new();
    let Some(first) = chunks.first_mut() else {
        dropped.extend(featured);
        dropped.extend(body);
        if !dropped.is_empty() {
            engine_warn!("no chunks to attach {} image(s) to", dropped.len());
        }
        return dropped;
    };

    if let Some(featured) = featured {
        first.images.insert(0, featured);
    }
    for image in body {
        if let Some(index) = chunk_for_offset(chunks, image.offset) {
            chunks[index].images.push(image);
        }
    }

    for chunk in chunks.iter_mut() {
        if chunk.images.len() > MAX_MEDIA_PER_POST {
            let excess = chunk.images.split_off(MAX_MEDIA_PER_POST);
            for image in &excess {
                engine_warn!(
                    "chunk {} already has {} images; dropping {}",
                    chunk.index,
                    MAX_MEDIA_PER_POST,
                    image.src
                );
            }
            dropped.extend(excess);
        }
    }
    dropped
}
