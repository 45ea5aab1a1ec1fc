use std::fmt;

use poster_core::Visibility;

/// Identifier the server assigned to a created status.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatusId(pub String);

impl StatusId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle of an uploaded attachment, usable in one later status.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaId(pub String);

impl MediaId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Everything needed to submit one status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusDraft {
    pub text: String,
    pub media_ids: Vec<MediaId>,
    pub visibility: Visibility,
    pub in_reply_to: Option<StatusId>,
}

/// Image bytes ready for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaPayload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
    pub description: Option<String>,
}

impl fmt::Debug for MediaPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaPayload")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("bytes", &self.bytes.len())
            .field("description", &self.description)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    /// 401 or 403: the token is missing, wrong or lacks scope.
    Unauthorized,
    /// 429, with the `Retry-After` seconds when the server sent them.
    RateLimited { retry_after: Option<u64> },
    /// 400 or 422: the server refused the content.
    Rejected,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    /// Uploaded media never finished server-side processing.
    ProcessingTimeout,
    InvalidResponse,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Unauthorized => write!(f, "unauthorized"),
            FailureKind::RateLimited { retry_after: Some(secs) } => {
                write!(f, "rate limited (retry after {secs}s)")
            }
            FailureKind::RateLimited { retry_after: None } => write!(f, "rate limited"),
            FailureKind::Rejected => write!(f, "rejected by server"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::ProcessingTimeout => write!(f, "media processing timed out"),
            FailureKind::InvalidResponse => write!(f, "invalid response"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// A failed request against the posting API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl SubmissionFailure {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for SubmissionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for SubmissionFailure {}

/// A failed image download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum PublishError {
    #[error("media upload failed for {src}: {reason}")]
    MediaUpload { src: String, reason: String },
    #[error("status submission failed: {0}")]
    PostSubmission(SubmissionFailure),
}

impl PublishError {
    pub(crate) fn media(src: impl Into<String>, reason: impl fmt::Display) -> Self {
        PublishError::MediaUpload {
            src: src.into(),
            reason: reason.to_string(),
        }
    }
}
