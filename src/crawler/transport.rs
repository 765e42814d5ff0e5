//! Page transports behind the fetch contract
//!
//! A [`Transport`] performs exactly one retrieval and reports what came back.
//! Retries, throttling, readiness checks and outcome classification live in
//! [`crate::crawler::fetcher::FetchClient`], so a plain HTTP client and a
//! browser-automation driver are interchangeable.

use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

use crate::crawler::headers::{build_browser_headers, random_user_agent};
use crate::utils::error::FetchError;

/// How a transport produces page markup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Raw server response
    Http,
    /// DOM after client-side rendering
    Rendered,
}

/// One retrieved page, before classification
#[derive(Debug, Clone)]
pub struct RawPage {
    /// HTTP status (rendered transports report 200 once navigation settles)
    pub status: u16,

    /// URL after redirects
    pub final_url: String,

    /// Decoded markup
    pub body: String,
}

impl RawPage {
    pub fn new(status: u16, final_url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            final_url: final_url.into(),
            body: body.into(),
        }
    }
}

/// A "next page" control located on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextControl {
    /// CSS selector that located the control
    pub selector: String,

    /// Absolute destination, when the control is a link
    pub href: Option<String>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Retrieve a URL once
    async fn get(&self, url: &str) -> Result<RawPage, FetchError>;

    fn mode(&self) -> FetchMode {
        FetchMode::Http
    }

    /// Re-read the currently rendered document
    ///
    /// Rendered transports return the live DOM so readiness can be polled;
    /// HTTP transports have nothing newer to offer.
    async fn snapshot(&self) -> Option<RawPage> {
        None
    }

    /// Trigger a "next" control found on `current` and return the new page
    ///
    /// The default follows the control's link; browser transports click it.
    async fn activate(&self, current: &RawPage, control: &NextControl) -> Result<RawPage, FetchError> {
        match &control.href {
            Some(href) => self.get(href).await,
            None => Err(FetchError::Transport(format!(
                "next control '{}' on {} has no link to follow",
                control.selector, current.final_url
            ))),
        }
    }
}

/// `reqwest`-backed transport
pub struct HttpTransport {
    client: Client,
    user_agent: Option<String>,
}

impl HttpTransport {
    /// Create a transport with the given per-request timeout
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        Self::with_user_agent(timeout, None)
    }

    /// Create a transport that always sends `user_agent` instead of rotating
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn with_user_agent(timeout: Duration, user_agent: Option<String>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .cookie_store(true)
            .redirect(Policy::limited(10))
            .build()?;

        Ok(Self { client, user_agent })
    }

    /// Decode bytes to a string, preserving non-ASCII text
    ///
    /// Uses the charset from the Content-Type header when present, then
    /// strict UTF-8, then Windows-1252 as a last resort.
    pub fn decode_bytes(bytes: &[u8], content_type: &str) -> Result<String, FetchError> {
        let declared = content_type
            .to_ascii_lowercase()
            .split(';')
            .filter_map(|part| part.trim().strip_prefix("charset=").map(str::to_string))
            .next()
            .and_then(|label| Encoding::for_label(label.trim_matches('"').as_bytes()));

        if let Some(encoding) = declared {
            let (cow, _, had_errors) = encoding.decode(bytes);
            if !had_errors {
                return Ok(cow.into_owned());
            }
        }

        let (cow, _, had_errors) = UTF_8.decode(bytes);
        if !had_errors {
            return Ok(cow.into_owned());
        }

        let (cow, _, had_errors) = WINDOWS_1252.decode(bytes);
        if had_errors {
            return Err(FetchError::Decode(
                "Failed to decode content with declared charset, UTF-8 or Windows-1252".to_string(),
            ));
        }
        Ok(cow.into_owned())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<RawPage, FetchError> {
        let user_agent = self
            .user_agent
            .as_deref()
            .unwrap_or_else(|| random_user_agent());
        let headers = build_browser_headers(user_agent, url);

        let target = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;

        let response = self
            .client
            .get(target)
            .headers(headers)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else if e.is_builder() {
                    FetchError::InvalidUrl(format!("{url}: {e}"))
                } else {
                    FetchError::Http(e)
                }
            })?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_default();

        let bytes = response.bytes().await?;
        let body = Self::decode_bytes(&bytes, &content_type)?;

        Ok(RawPage {
            status,
            final_url,
            body,
        })
    }
}
