use std::time::Duration;

use expander_core::ResourceId;
use expander_logging::expander_debug;
use futures_util::StreamExt;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, CACHE_CONTROL, CONTENT_TYPE, PRAGMA, USER_AGENT,
};
use serde::{Deserialize, Serialize};

use crate::decode::decode_body;
use crate::{FailureKind, FetchError, FetchedDocument};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    /// `None` leaves a hung request pending until the page navigates away.
    pub request_timeout: Option<Duration>,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
    pub user_agent: Option<String>,
    /// Sent with every request, e.g. the session cookie of the signed-in user.
    pub extra_headers: Vec<(String, String)>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            allowed_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
            ],
            user_agent: None,
            extra_headers: Vec::new(),
        }
    }
}

/// Retrieves one message page. Implementations never retry.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, id: &ResourceId) -> Result<FetchedDocument, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = build_client(&settings)?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let ct = content_type.split(';').next().unwrap_or(content_type).trim();
        self.settings
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ct))
    }

    fn too_large(&self, actual: u64) -> FetchError {
        FetchError::new(
            FailureKind::TooLarge {
                max_bytes: self.settings.max_bytes,
                actual: Some(actual),
            },
            "response too large",
        )
    }
}

fn build_client(settings: &FetchSettings) -> Result<reqwest::Client, FetchError> {
    let mut headers = HeaderMap::new();
    // The message page must never come out of an intermediate cache.
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(
        HeaderName::from_static("max-stale"),
        HeaderValue::from_static(""),
    );
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9"),
    );
    if let Some(agent) = settings.user_agent.as_deref() {
        headers.insert(USER_AGENT, header_value(agent)?);
    }
    for (name, value) in &settings.extra_headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
            FetchError::new(FailureKind::InvalidRequest, format!("header {name:?}: {err}"))
        })?;
        headers.insert(name, header_value(value)?);
    }

    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(settings.connect_timeout)
        .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit));
    if let Some(timeout) = settings.request_timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
}

fn header_value(value: &str) -> Result<HeaderValue, FetchError> {
    HeaderValue::from_str(value)
        .map_err(|err| FetchError::new(FailureKind::InvalidRequest, err.to_string()))
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, id: &ResourceId) -> Result<FetchedDocument, FetchError> {
        let url = reqwest::Url::parse(id.as_str())
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;

        expander_debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(self.too_large(content_len));
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        if let Some(ct) = content_type.as_deref() {
            if !self.is_content_type_allowed(ct) {
                return Err(FetchError::new(
                    FailureKind::UnsupportedContentType {
                        content_type: ct.to_string(),
                    },
                    "unsupported content type",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(self.too_large(next_len));
            }
            bytes.extend_from_slice(&chunk);
        }

        let decoded = decode_body(&bytes, content_type.as_deref())
            .map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))?;
        expander_debug!(
            "fetched {} ({} bytes, {} via {:?})",
            final_url,
            bytes.len(),
            decoded.encoding,
            decoded.source
        );

        Ok(FetchedDocument {
            url: id.to_string(),
            final_url,
            content_type,
            html: decoded.text,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    if err.is_body() {
        return FetchError::new(FailureKind::Aborted, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
