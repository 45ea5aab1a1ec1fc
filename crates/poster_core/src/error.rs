/// Per-post failures raised while turning a content file into a thread plan.
///
/// None of these abort a run: the runner logs the post, leaves it unmarked and
/// moves on to the next one.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("malformed frontmatter: {0}")]
    MalformedFrontmatter(String),
    #[error("frontmatter is missing required field `{0}`")]
    MissingRequiredField(&'static str),
    #[error("post body has no text to thread")]
    EmptyThread,
    #[error("cannot build canonical url: {0}")]
    InvalidUrl(String),
}
