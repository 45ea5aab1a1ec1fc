use std::ops::Range;

use crate::ImageRef;

/// Default per-post character budget, below Mastodon's 500 limit.
pub const DEFAULT_BUDGET: usize = 480;
/// Appended to words that had to be cut to fit a chunk.
pub const TRUNCATION_MARKER: char = '…';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkOptions {
    pub budget: usize,
    /// Characters already spoken for in the first chunk (title and link).
    ///
    /// When the opening word does not fit in what is left, the first chunk
    /// gets the whole budget instead and the caller has to post the header
    /// on its own.
    pub reserved: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self::new(DEFAULT_BUDGET)
    }
}

impl ChunkOptions {
    pub fn new(budget: usize) -> Self {
        Self {
            budget,
            reserved: 0,
        }
    }

    pub fn with_reserved(mut self, reserved: usize) -> Self {
        self.reserved = reserved;
        self
    }

    fn full(&self) -> usize {
        self.budget.max(1)
    }

    fn limit_for(&self, index: usize) -> usize {
        if index == 0 {
            self.full().saturating_sub(self.reserved).max(1)
        } else {
            self.full()
        }
    }
}

/// One 1-indexed segment of a thread.
///
/// `span` is the byte range of the source text the chunk was cut from; the
/// image associator matches image offsets against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
    pub span: Range<usize>,
    pub images: Vec<ImageRef>,
}

impl Chunk {
    pub fn is_first(&self) -> bool {
        self.index == 1
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Splits `text` into chunks no longer than the budget.
///
/// Whole paragraphs are packed greedily; an oversized paragraph falls back to
/// sentences, an oversized sentence to words, and an oversized word is cut
/// and marked with [`TRUNCATION_MARKER`]. Only words longer than the whole
/// budget are cut. Chunks never start or end with whitespace and never split
/// a word.
pub fn chunk_text(text: &str, options: ChunkOptions) -> Vec<Chunk> {
    let mut packer = Packer {
        text,
        options,
        chunks: Vec::new(),
        current: None,
        reservation_dropped: false,
    };
    for paragraph in paragraphs(text) {
        packer.push(paragraph, Level::Paragraph);
    }
    packer.finish()
}

/// Shortens `text` to at most `limit` characters, cutting at a word boundary
/// and appending [`TRUNCATION_MARKER`] when anything was removed.
pub fn shorten(text: &str, limit: usize) -> String {
    let text = text.trim();
    if char_len(text) <= limit {
        return text.to_string();
    }
    if limit == 0 {
        return String::new();
    }
    let room = limit - 1;
    let mut kept = 0;
    for word in words(text, 0..text.len()) {
        if char_len(&text[..word.end]) > room {
            break;
        }
        kept = word.end;
    }
    let mut out = if kept > 0 {
        text[..kept].to_string()
    } else {
        text.chars().take(room).collect()
    };
    out.push(TRUNCATION_MARKER);
    out
}

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[derive(Debug, Clone, Copy)]
enum Level {
    Paragraph,
    Sentence,
    Word,
}

struct Packer<'a> {
    text: &'a str,
    options: ChunkOptions,
    chunks: Vec<Chunk>,
    current: Option<Range<usize>>,
    reservation_dropped: bool,
}

impl Packer<'_> {
    fn limit_for(&self, index: usize) -> usize {
        if self.reservation_dropped {
            self.options.full()
        } else {
            self.options.limit_for(index)
        }
    }

    fn width(&self, range: Range<usize>) -> usize {
        char_len(&self.text[range])
    }

    fn current_limit(&self) -> usize {
        self.limit_for(self.chunks.len())
    }

    /// Limit of the chunk a unit would open if it cannot join the current one.
    fn fresh_limit(&self) -> usize {
        let next = self.chunks.len() + usize::from(self.current.is_some());
        self.limit_for(next)
    }

    fn push(&mut self, unit: Range<usize>, level: Level) {
        if let Some(current) = &self.current {
            let joined = current.start..unit.end;
            if self.width(joined.clone()) <= self.current_limit() {
                self.current = Some(joined);
                return;
            }
        }
        if self.width(unit.clone()) <= self.fresh_limit() {
            self.flush();
            self.current = Some(unit);
            return;
        }

        let text = self.text;
        match level {
            Level::Paragraph => {
                for sentence in sentences(text, unit) {
                    self.push(sentence, Level::Sentence);
                }
            }
            Level::Sentence => {
                for word in words(text, unit) {
                    self.push(word, Level::Word);
                }
            }
            Level::Word => {
                self.flush();
                // Only an empty first chunk gets here with a word that fits
                // the budget: give it the full budget.
                if self.chunks.is_empty() {
                    self.reservation_dropped = true;
                }
                if self.width(unit.clone()) <= self.options.full() {
                    self.current = Some(unit);
                } else {
                    self.push_truncated(unit);
                }
            }
        }
    }

    fn push_truncated(&mut self, unit: Range<usize>) {
        let keep = self.options.full() - 1;
        let mut text: String = self.text[unit.clone()].chars().take(keep).collect();
        text.push(TRUNCATION_MARKER);
        self.chunks.push(Chunk {
            index: self.chunks.len() + 1,
            text,
            span: unit,
            images: Vec::new(),
        });
    }

    fn flush(&mut self) {
        if let Some(span) = self.current.take() {
            self.chunks.push(Chunk {
                index: self.chunks.len() + 1,
                text: self.text[span.clone()].to_string(),
                span,
                images: Vec::new(),
            });
        }
    }

    fn finish(mut self) -> Vec<Chunk> {
        self.flush();
        self.chunks
    }
}

/// Runs of non-blank lines, trimmed.
fn paragraphs(text: &str) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;
    let mut end = 0;
    let mut pos = 0;
    for line in text.split_inclusive('\n') {
        let line_start = pos;
        pos += line.len();
        if line.trim().is_empty() {
            if let Some(s) = start.take() {
                out.push(trim_range(text, s..end));
            }
        } else {
            start.get_or_insert(line_start);
            end = pos;
        }
    }
    if let Some(s) = start {
        out.push(trim_range(text, s..end));
    }
    out
}

/// Sentences end at `.`, `!` or `?` (plus closing quotes or brackets)
/// followed by whitespace.
fn sentences(text: &str, range: Range<usize>) -> Vec<Range<usize>> {
    let slice = &text[range.clone()];
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = slice.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        while let Some(&(_, closer)) = chars.peek() {
            if matches!(closer, '"' | '\'' | ')' | ']' | '”' | '’' | '»') {
                chars.next();
            } else {
                break;
            }
        }
        if let Some(&(end, next)) = chars.peek() {
            if next.is_whitespace() {
                let sentence = trim_range(text, range.start + start..range.start + end);
                if !sentence.is_empty() {
                    out.push(sentence);
                }
                start = end;
            }
        }
    }
    let tail = trim_range(text, range.start + start..range.end);
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

fn words(text: &str, range: Range<usize>) -> Vec<Range<usize>> {
    let slice = &text[range.clone()];
    let mut out = Vec::new();
    let mut start: Option<usize> = None;
    for (i, c) in slice.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                out.push(range.start + s..range.start + i);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        out.push(range.start + s..range.end);
    }
    out
}

fn trim_range(text: &str, range: Range<usize>) -> Range<usize> {
    let slice = &text[range.clone()];
    let lead = slice.len() - slice.trim_start().len();
    if lead == slice.len() {
        return range.start..range.start;
    }
    let trail = slice.len() - slice.trim_end().len();
    range.start + lead..range.end - trail
}
