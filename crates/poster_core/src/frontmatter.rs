use serde::Deserialize;

use crate::{PipelineError, Post, PostLocation};

const DELIMITER: &str = "---";

#[derive(Debug, Default, Deserialize)]
struct RawFrontmatter {
    title: Option<String>,
    date: Option<serde_yaml::Value>,
    #[serde(default)]
    mastodon: bool,
    mastodon_text: Option<String>,
    #[serde(default)]
    mastodon_thread: bool,
    image: Option<String>,
    slug: Option<String>,
    url: Option<String>,
}

/// Splits `---`-delimited YAML frontmatter from the body.
///
/// Returns `(frontmatter, body)`. A leading BOM and CRLF line endings are
/// accepted.
pub fn split_frontmatter(raw: &str) -> Result<(&str, &str), PipelineError> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut lines = raw.split_inclusive('\n');
    match lines.next() {
        Some(first) if first.trim_end() == DELIMITER => {
            let start = first.len();
            let mut pos = start;
            for line in lines {
                if line.trim_end() == DELIMITER {
                    return Ok((&raw[start..pos], &raw[pos + line.len()..]));
                }
                pos += line.len();
            }
            Err(PipelineError::MalformedFrontmatter(
                "metadata block is not terminated by `---`".into(),
            ))
        }
        _ => Err(PipelineError::MalformedFrontmatter(
            "content does not start with a `---` metadata block".into(),
        )),
    }
}

/// Parses a content file into a [`Post`].
///
/// Unknown keys are ignored. Fails when the block is missing, unterminated,
/// not a YAML mapping, or has no `title`.
pub fn parse_post(location: PostLocation, raw: &str) -> Result<Post, PipelineError> {
    let (yaml, body) = split_frontmatter(raw)?;
    let meta: RawFrontmatter = if yaml.trim().is_empty() {
        RawFrontmatter::default()
    } else {
        serde_yaml::from_str(yaml)
            .map_err(|err| PipelineError::MalformedFrontmatter(err.to_string()))?
    };

    let title = meta
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(PipelineError::MissingRequiredField("title"))?;

    Ok(Post {
        id: location.id,
        site_path: location.site_path,
        title,
        date: meta.date.and_then(scalar_to_string),
        featured_image: non_blank(meta.image),
        announcement: non_blank(meta.mastodon_text),
        share: meta.mastodon,
        thread: meta.mastodon_thread,
        slug: non_blank(meta.slug),
        url_override: non_blank(meta.url),
        body: body.to_string(),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn scalar_to_string(value: serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Null => None,
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        other => serde_yaml::to_string(&other)
            .ok()
            .map(|s| s.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::split_frontmatter;

    #[test]
    fn splits_block_and_body() {
        let (meta, body) = split_frontmatter("---\ntitle: x\n---\nbody\n").unwrap();
        assert_eq!(meta, "title: x\n");
        assert_eq!(body, "body\n");
    }

    #[test]
    fn accepts_bom_and_crlf() {
        let (meta, body) = split_frontmatter("\u{feff}---\r\ntitle: x\r\n---\r\nbody").unwrap();
        assert_eq!(meta, "title: x\r\n");
        assert_eq!(body, "body");
    }

    #[test]
    fn closing_delimiter_at_eof_yields_empty_body() {
        let (meta, body) = split_frontmatter("---\ntitle: x\n---").unwrap();
        assert_eq!(meta, "title: x\n");
        assert_eq!(body, "");
    }
}
