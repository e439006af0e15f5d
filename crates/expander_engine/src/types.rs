use std::fmt;

use expander_core::DomError;

/// A fetched message page, decoded to UTF-8 and ready for selector queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    pub url: String,
    pub final_url: String,
    pub content_type: Option<String>,
    pub html: String,
}

impl FetchedDocument {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            final_url: url.clone(),
            url,
            content_type: Some("text/html".to_string()),
            html: html.into(),
        }
    }

    pub fn parse(&self) -> scraper::Html {
        scraper::Html::parse_document(&self.html)
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    InvalidRequest,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Decode,
    Aborted,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::InvalidRequest => write!(f, "invalid request"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Decode => write!(f, "undecodable body"),
            FailureKind::Aborted => write!(f, "aborted"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Why an expansion attempt did not replace the preview.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ExpandError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    /// The fetched page had no message fragment, or one without text.
    #[error("empty message body in {url}")]
    EmptyContent { url: String },
    #[error(transparent)]
    Dom(#[from] DomError),
}
