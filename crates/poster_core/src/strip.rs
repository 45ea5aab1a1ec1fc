//! Markdown to plain text for posting.
//!
//! A forward-only scanner: a line pass handles fences, headings, quotes, rules
//! and paragraph breaks, and an inline pass handles images, links, code spans,
//! emphasis, HTML and shortcodes. Image markup is lifted out into
//! [`ImageRef`]s whose offsets point into the produced text.

use std::collections::HashMap;

use crate::ImageRef;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StrippedBody {
    pub text: String,
    pub images: Vec<ImageRef>,
}

/// Strips markup from `markup`. Total: every input produces output.
pub fn strip_markup(markup: &str) -> StrippedBody {
    let refs = collect_reference_definitions(markup);
    let mut out = Output::default();
    let mut fence: Option<Fence> = None;
    let mut in_comment = false;

    for raw_line in markup.lines() {
        if let Some(open) = &fence {
            if open.is_closed_by(raw_line) {
                fence = None;
                out.paragraph_break();
            } else if raw_line.trim().is_empty() {
                out.paragraph_break();
            } else {
                out.push_line(raw_line, Vec::new());
            }
            continue;
        }

        let mut line = raw_line;
        if in_comment {
            match line.find("-->") {
                Some(end) => {
                    in_comment = false;
                    line = &line[end + 3..];
                    if line.trim().is_empty() {
                        continue;
                    }
                }
                None => continue,
            }
        }

        if line.trim().is_empty() {
            out.paragraph_break();
            continue;
        }
        if let Some(open) = Fence::open(line) {
            fence = Some(open);
            out.paragraph_break();
            continue;
        }
        if is_reference_definition(line) {
            continue;
        }
        if is_horizontal_rule(line) {
            out.paragraph_break();
            continue;
        }

        let mut scanner = Inline::new(&refs);
        scanner.scan(strip_block_markers(line));
        in_comment = scanner.open_comment;
        out.push_line(&scanner.buf, scanner.images);
    }

    out.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Pending {
    #[default]
    Nothing,
    Line,
    Paragraph,
}

#[derive(Default)]
struct Output {
    text: String,
    images: Vec<ImageRef>,
    pending: Pending,
}

impl Output {
    fn paragraph_break(&mut self) {
        if !self.text.is_empty() {
            self.pending = Pending::Paragraph;
        }
    }

    /// Appends one processed line. Image offsets are relative to `line`.
    fn push_line(&mut self, line: &str, images: Vec<ImageRef>) {
        let content = line.trim();
        if content.is_empty() {
            // Image-only lines: the image sits where the preceding text ended.
            let at = self.text.len();
            self.images.extend(images.into_iter().map(|mut image| {
                image.offset = at;
                image
            }));
            return;
        }

        match self.pending {
            Pending::Paragraph => self.text.push_str("\n\n"),
            Pending::Line => self.text.push('\n'),
            Pending::Nothing => {}
        }
        let lead = line.len() - line.trim_start().len();
        let base = self.text.len();
        // Inline images stay inside their line's text, even at its very end.
        let last_char = content.char_indices().next_back().map_or(0, |(i, _)| i);
        self.text.push_str(content);
        self.images.extend(images.into_iter().map(|mut image| {
            image.offset = base + image.offset.saturating_sub(lead).min(last_char);
            image
        }));
        self.pending = Pending::Line;
    }

    fn finish(self) -> StrippedBody {
        let len = self.text.len();
        let images = self
            .images
            .into_iter()
            .map(|mut image| {
                image.offset = image.offset.min(len);
                image
            })
            .collect();
        StrippedBody {
            text: self.text,
            images,
        }
    }
}

struct Fence {
    marker: char,
    len: usize,
}

impl Fence {
    fn open(line: &str) -> Option<Self> {
        let trimmed = line.trim_start();
        let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let len = trimmed.chars().take_while(|c| *c == marker).count();
        // A backtick fence's info string never contains backticks.
        if marker == '`' && trimmed[len..].contains('`') {
            return None;
        }
        (len >= 3).then_some(Self { marker, len })
    }

    fn is_closed_by(&self, line: &str) -> bool {
        let trimmed = line.trim();
        trimmed.chars().take_while(|c| *c == self.marker).count() >= self.len
            && trimmed.chars().all(|c| c == self.marker)
    }
}

fn is_horizontal_rule(line: &str) -> bool {
    let compact: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
    compact.len() >= 3
        && matches!(compact[0], '-' | '*' | '_' | '=')
        && compact.iter().all(|c| *c == compact[0])
}

fn is_reference_definition(line: &str) -> bool {
    parse_reference_definition(line).is_some()
}

fn parse_reference_definition(line: &str) -> Option<(String, String)> {
    let rest = line.trim_start().strip_prefix('[')?;
    let (label, after) = rest.split_once("]:")?;
    if label.is_empty() || label.starts_with('^') {
        return None;
    }
    let target = after.split_whitespace().next()?;
    let target = target.trim_start_matches('<').trim_end_matches('>');
    Some((label.trim().to_lowercase(), target.to_string()))
}

fn collect_reference_definitions(markup: &str) -> HashMap<String, String> {
    markup
        .lines()
        .filter_map(parse_reference_definition)
        .collect()
}

fn strip_block_markers(line: &str) -> &str {
    let mut rest = line.trim_start();
    while let Some(quoted) = rest.strip_prefix('>') {
        rest = quoted.trim_start();
    }
    let hashes = rest.chars().take_while(|c| *c == '#').count();
    if (1..=6).contains(&hashes) {
        let after = &rest[hashes..];
        if after.is_empty() || after.starts_with(char::is_whitespace) {
            rest = after.trim_start();
        }
    }
    rest
}

/// Inline pass over a single line.
struct Inline<'r> {
    refs: &'r HashMap<String, String>,
    buf: String,
    images: Vec<ImageRef>,
    open_comment: bool,
}

impl<'r> Inline<'r> {
    fn new(refs: &'r HashMap<String, String>) -> Self {
        Self {
            refs,
            buf: String::new(),
            images: Vec::new(),
            open_comment: false,
        }
    }

    fn scan(&mut self, src: &str) {
        let mut pos = 0;
        while pos < src.len() {
            let rest = &src[pos..];
            let Some(c) = rest.chars().next() else {
                break;
            };
            let consumed = match c {
                '\\' => self.escape(rest),
                '!' if rest.starts_with("![") => self.image(rest),
                '[' => self.link(rest),
                '`' => self.code_span(rest),
                '<' => self.html(rest),
                '{' if rest.starts_with("{{<") || rest.starts_with("{{%") => self.shortcode(rest),
                '*' | '_' | '~' => self.emphasis(src, pos, c),
                _ => None,
            };
            match consumed {
                Some(n) => pos += n,
                None => {
                    self.buf.push(c);
                    pos += c.len_utf8();
                }
            }
            if self.open_comment {
                return;
            }
        }
    }

    fn escape(&mut self, rest: &str) -> Option<usize> {
        let next = rest[1..].chars().next()?;
        if !next.is_ascii_punctuation() {
            return None;
        }
        self.buf.push(next);
        Some(1 + next.len_utf8())
    }

    fn image(&mut self, rest: &str) -> Option<usize> {
        let link = parse_link(&rest[1..])?;
        let src = match link.target {
            Target::Inline(dest) => dest,
            Target::Reference(key) => self.refs.get(&key)?.clone(),
        };
        let alt = plain_label(link.label, self.refs);
        self.images.push(ImageRef::body(src, Some(alt), self.buf.len()));
        Some(1 + link.consumed)
    }

    fn link(&mut self, rest: &str) -> Option<usize> {
        let link = parse_link(rest)?;
        let mut inner = Inline::new(self.refs);
        inner.scan(link.label);
        let base = self.buf.len();
        self.buf.push_str(&inner.buf);
        self.images
            .extend(inner.images.into_iter().map(|mut image| {
                image.offset += base;
                image
            }));
        Some(link.consumed)
    }

    fn code_span(&mut self, rest: &str) -> Option<usize> {
        let ticks = rest.chars().take_while(|c| *c == '`').count();
        let body = &rest[ticks..];
        let mut search = 0;
        while let Some(found) = body[search..].find('`') {
            let start = search + found;
            let run = body[start..].chars().take_while(|c| *c == '`').count();
            if run == ticks {
                self.buf.push_str(body[..start].trim());
                return Some(ticks + start + run);
            }
            search = start + run;
        }
        // Unmatched backticks are literal text.
        self.buf.push_str(&rest[..ticks]);
        Some(ticks)
    }

    fn html(&mut self, rest: &str) -> Option<usize> {
        if let Some(comment) = rest.strip_prefix("<!--") {
            return match comment.find("-->") {
                Some(end) => Some(4 + end + 3),
                None => {
                    self.open_comment = true;
                    Some(rest.len())
                }
            };
        }
        let close = rest.find('>')?;
        let inner = &rest[1..close];
        if is_autolink(inner) {
            self.buf.push_str(inner.trim_start_matches("mailto:"));
            return Some(close + 1);
        }
        let name = if inner.starts_with(['!', '?']) {
            String::new()
        } else {
            tag_name(inner)?
        };
        match name.as_str() {
            "img" => {
                if let Some(src) = attribute(inner, "src") {
                    let alt = attribute(inner, "alt");
                    self.images.push(ImageRef::body(src, alt, self.buf.len()));
                }
            }
            "br" => self.buf.push(' '),
            _ => {}
        }
        Some(close + 1)
    }

    fn shortcode(&mut self, rest: &str) -> Option<usize> {
        let closing = if rest.starts_with("{{<") { ">}}" } else { "%}}" };
        let end = rest[3..].find(closing)? + 3;
        let inner = rest[3..end].trim();
        let name = inner.split_whitespace().next().unwrap_or_default();
        if matches!(name, "figure" | "img" | "image") {
            if let Some(src) = attribute(inner, "src") {
                let alt = attribute(inner, "alt").or_else(|| attribute(inner, "caption"));
                self.images.push(ImageRef::body(src, alt, self.buf.len()));
            }
        }
        Some(end + closing.len())
    }

    /// Drops emphasis delimiters; keeps isolated markers and intra-word underscores.
    fn emphasis(&mut self, src: &str, pos: usize, marker: char) -> Option<usize> {
        let run = src[pos..].chars().take_while(|c| *c == marker).count();
        let prev = src[..pos].chars().next_back();
        let next = src[pos + run..].chars().next();
        let spaced = |c: Option<char>| c.map_or(true, char::is_whitespace);

        let literal = match marker {
            '~' => run < 2,
            '_' => {
                (spaced(prev) && spaced(next))
                    || (prev.is_some_and(char::is_alphanumeric)
                        && next.is_some_and(char::is_alphanumeric))
            }
            _ => spaced(prev) && spaced(next),
        };
        if literal {
            self.buf.push_str(&src[pos..pos + run]);
        }
        Some(run)
    }
}

enum Target {
    Inline(String),
    Reference(String),
}

struct ParsedLink<'a> {
    label: &'a str,
    target: Target,
    consumed: usize,
}

/// Parses `[label](dest "title")` or `[label][ref]` at the start of `src`.
fn parse_link(src: &str) -> Option<ParsedLink<'_>> {
    let label_end = matching_close(src, '[', ']')?;
    let label = &src[1..label_end];
    let after = &src[label_end + 1..];
    if after.starts_with('(') {
        let close = matching_close(after, '(', ')')?;
        let inside = after[1..close].trim();
        let dest = if let Some(bracketed) = inside.strip_prefix('<') {
            bracketed.split('>').next().unwrap_or_default()
        } else {
            inside.split_whitespace().next().unwrap_or_default()
        };
        return Some(ParsedLink {
            label,
            target: Target::Inline(dest.to_string()),
            consumed: label_end + 1 + close + 1,
        });
    }
    if after.starts_with('[') {
        let close = matching_close(after, '[', ']')?;
        let key = after[1..close].trim();
        let key = if key.is_empty() { label } else { key };
        return Some(ParsedLink {
            label,
            target: Target::Reference(key.to_lowercase()),
            consumed: label_end + 1 + close + 1,
        });
    }
    None
}

/// Byte index of the delimiter closing the one at `src[0]`, honouring nesting
/// and backslash escapes.
fn matching_close(src: &str, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut escaped = false;
    for (i, c) in src.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
        } else if c == open {
            depth += 1;
        } else if c == close {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

fn plain_label(label: &str, refs: &HashMap<String, String>) -> String {
    let mut inner = Inline::new(refs);
    inner.scan(label);
    inner.buf.trim().to_string()
}

const HTML_TAGS: &[&str] = &[
    "a", "abbr", "article", "aside", "audio", "b", "blockquote", "br", "caption", "center",
    "cite", "code", "dd", "del", "details", "div", "dl", "dt", "em", "figcaption", "figure",
    "font", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "i", "iframe", "img",
    "ins", "kbd", "li", "main", "mark", "nav", "ol", "p", "picture", "pre", "q", "s", "section",
    "small", "source", "span", "strong", "sub", "summary", "sup", "table", "tbody", "td", "th",
    "thead", "tr", "u", "ul", "video",
];

/// Lowercased name of a known HTML tag opening or closing with `inner`.
fn tag_name(inner: &str) -> Option<String> {
    let body = inner.strip_prefix('/').unwrap_or(inner);
    let len = body
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(body.len());
    let after = body[len..].chars().next();
    if !after.map_or(true, |c| c.is_whitespace() || c == '/') {
        return None;
    }
    let name = body[..len].to_ascii_lowercase();
    HTML_TAGS.contains(&name.as_str()).then_some(name)
}

fn is_autolink(inner: &str) -> bool {
    let lower = inner.to_ascii_lowercase();
    (lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("mailto:"))
        && !inner.contains(char::is_whitespace)
}

/// Reads `name="value"`, `name='value'` or `name=value` out of a tag body.
fn attribute(tag: &str, name: &str) -> Option<String> {
    let lower = tag.to_ascii_lowercase();
    let needle = format!("{name}=");
    let mut search = 0;
    while let Some(found) = lower[search..].find(&needle) {
        let start = search + found;
        let boundary = lower[..start]
            .chars()
            .next_back()
            .map_or(true, char::is_whitespace);
        let value_start = start + needle.len();
        if boundary {
            let value = &tag[value_start..];
            let parsed = match value.chars().next() {
                Some(q @ ('"' | '\'')) => value[1..].split(q).next(),
                Some(_) => value.split(|c: char| c.is_whitespace() || c == '>').next(),
                None => None,
            };
            return parsed
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string);
        }
        search = value_start;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{attribute, is_horizontal_rule, matching_close, strip_block_markers, tag_name};

    #[test]
    fn attributes_support_quote_styles() {
        assert_eq!(attribute(r#"img src="a.png" alt='A B'"#, "src").as_deref(), Some("a.png"));
        assert_eq!(attribute(r#"img src="a.png" alt='A B'"#, "alt").as_deref(), Some("A B"));
        assert_eq!(attribute("img src=b.png", "src").as_deref(), Some("b.png"));
        assert_eq!(attribute(r#"img data-src="x""#, "src"), None);
    }

    #[test]
    fn nested_brackets_are_matched() {
        assert_eq!(matching_close("[a [b] c](x)", '[', ']'), Some(8));
        assert_eq!(matching_close(r"[a \] b]", '[', ']'), Some(7));
        assert_eq!(matching_close("[open", '[', ']'), None);
    }

    #[test]
    fn block_markers_are_removed() {
        assert_eq!(strip_block_markers("## Heading"), "Heading");
        assert_eq!(strip_block_markers("> > quoted"), "quoted");
        assert_eq!(strip_block_markers("#hashtag"), "#hashtag");
    }

    #[test]
    fn only_known_tags_are_recognised() {
        assert_eq!(tag_name("img src=\"a.png\"").as_deref(), Some("img"));
        assert_eq!(tag_name("/EM").as_deref(), Some("em"));
        assert_eq!(tag_name("br/").as_deref(), Some("br"));
        assert_eq!(tag_name("y and z"), None);
        assert_eq!(tag_name("b=c"), None);
        assert_eq!(tag_name(""), None);
    }

    #[test]
    fn rules_need_three_markers() {
        assert!(is_horizontal_rule("---"));
        assert!(is_horizontal_rule("* * *"));
        assert!(!is_horizontal_rule("--"));
        assert!(!is_horizontal_rule("- item"));
    }
}
