//! Fetch client with retry, throttling and outcome classification
//!
//! This module wraps a [`Transport`] with the fetch contract used by the
//! harvest loop:
//! - One shared retry loop for listing and article pages
//! - Politeness throttle between consecutive requests (governor)
//! - Extended wait after HTTP 403/429
//! - Readiness polling for rendered-DOM transports
//! - Redirect-to-home detection for listing pages

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::crawler::transport::{FetchMode, HttpTransport, NextControl, RawPage, Transport};
use crate::parser::selectors::compile_selectors;
use crate::utils::error::{FetchError, ParseError};
use crate::utils::retry::{with_retry_if, RetryAction, RetryConfig};
use crate::utils::urls_equivalent;

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_rate_limited_delay_ms() -> u64 {
    10_000
}

fn default_min_interval_ms() -> u64 {
    2000
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_ready_timeout_ms() -> u64 {
    10_000
}

fn default_ready_poll_ms() -> u64 {
    500
}

/// Upper bound on a single exponential backoff step
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Retry, throttle and readiness settings for one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchPolicy {
    /// Total attempts per page, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between attempts (the first step when backoff is exponential)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Double the retry delay after each failed attempt
    #[serde(default)]
    pub exponential_backoff: bool,

    /// Delay before retrying after HTTP 403/429
    #[serde(default = "default_rate_limited_delay_ms")]
    pub rate_limited_delay_ms: u64,

    /// Minimum gap between consecutive requests (0 disables the throttle)
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Elements whose presence marks a rendered page as ready
    #[serde(default)]
    pub ready_selectors: Vec<String>,

    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,

    #[serde(default = "default_ready_poll_ms")]
    pub ready_poll_ms: u64,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            exponential_backoff: false,
            rate_limited_delay_ms: default_rate_limited_delay_ms(),
            min_interval_ms: default_min_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            ready_selectors: Vec::new(),
            ready_timeout_ms: default_ready_timeout_ms(),
            ready_poll_ms: default_ready_poll_ms(),
        }
    }
}

impl FetchPolicy {
    /// Policy with every wait set to zero, for tests and local fixtures
    pub fn immediate() -> Self {
        Self {
            retry_delay_ms: 0,
            rate_limited_delay_ms: 0,
            min_interval_ms: 0,
            ready_timeout_ms: 0,
            ready_poll_ms: 0,
            ..Self::default()
        }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn rate_limited_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limited_delay_ms)
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn ready_poll(&self) -> Duration {
        Duration::from_millis(self.ready_poll_ms)
    }

    pub fn retry_config(&self) -> RetryConfig {
        if self.exponential_backoff {
            RetryConfig::exponential(self.max_attempts, self.retry_delay(), MAX_BACKOFF)
        } else {
            RetryConfig::fixed(self.max_attempts, self.retry_delay())
        }
    }
}

/// A successfully retrieved page
#[derive(Debug, Clone)]
pub struct Page {
    pub requested_url: String,
    pub final_url: String,
    pub body: String,
}

impl Page {
    fn from_raw(requested_url: &str, raw: RawPage) -> Self {
        Self {
            requested_url: requested_url.to_string(),
            final_url: raw.final_url,
            body: raw.body,
        }
    }

    fn to_raw(&self) -> RawPage {
        RawPage::new(200, self.final_url.clone(), self.body.clone())
    }

    /// Whether the page landed on one of `canonical` instead of where it was sent
    pub fn redirected_to_any(&self, canonical: &[&str]) -> bool {
        !urls_equivalent(&self.final_url, &self.requested_url)
            && canonical.iter().any(|c| urls_equivalent(&self.final_url, c))
    }
}

/// Final result of a fetch after all retries
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Success(Page),

    /// Terminal 404/410, never retried
    NotFound,

    /// A listing page past the first landed on the seed or home URL
    Redirected { final_url: String },

    /// Every attempt failed; the page is unavailable
    Exhausted { attempts: u32, last_error: String },
}

impl FetchOutcome {
    pub fn into_page(self) -> Option<Page> {
        match self {
            Self::Success(page) => Some(page),
            _ => None,
        }
    }
}

type Throttle = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Transport wrapper implementing the fetch contract
pub struct FetchClient {
    transport: Arc<dyn Transport>,
    policy: FetchPolicy,
    retry: RetryConfig,
    throttle: Option<Throttle>,
    ready: Vec<Selector>,
}

impl FetchClient {
    /// Wrap a transport
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidSelector` if a readiness selector does not parse
    pub fn new(transport: Arc<dyn Transport>, policy: FetchPolicy) -> Result<Self, ParseError> {
        let ready = compile_selectors(&policy.ready_selectors)?;
        let throttle = Quota::with_period(policy.min_interval()).map(RateLimiter::direct);

        Ok(Self {
            transport,
            retry: policy.retry_config(),
            policy,
            throttle,
            ready,
        })
    }

    /// Client over a plain HTTP transport
    ///
    /// # Errors
    ///
    /// Returns `crate::error::Error` if the HTTP client or a readiness selector fails
    pub fn http(policy: FetchPolicy, user_agent: Option<String>) -> crate::error::Result<Self> {
        let transport = HttpTransport::with_user_agent(policy.request_timeout(), user_agent)?;
        Ok(Self::new(Arc::new(transport), policy)?)
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    pub fn mode(&self) -> FetchMode {
        self.transport.mode()
    }

    /// Fetch a page with retries
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        let result = with_retry_if(
            &self.retry,
            move |_attempt| self.attempt(url),
            |e| self.classify(e),
        )
        .await;

        match result {
            Ok(raw) => FetchOutcome::Success(Page::from_raw(url, raw)),
            Err(failure) => match failure.last_error {
                FetchError::NotFound(status) => {
                    debug!(url, status, "Page not found");
                    FetchOutcome::NotFound
                }
                last_error => {
                    warn!(
                        url,
                        attempts = failure.attempts,
                        error = %last_error,
                        "Fetch failed, page unavailable"
                    );
                    FetchOutcome::Exhausted {
                        attempts: failure.attempts,
                        last_error: last_error.to_string(),
                    }
                }
            },
        }
    }

    /// Fetch a listing page, surfacing redirects back to `canonical` URLs
    ///
    /// Page 1 is the seed itself, so only later pages can be redirected.
    pub async fn fetch_listing(&self, url: &str, page_number: u32, canonical: &[&str]) -> FetchOutcome {
        match self.fetch(url).await {
            FetchOutcome::Success(page) if page_number > 1 && page.redirected_to_any(canonical) => {
                info!(url, final_url = %page.final_url, page_number, "Listing redirected home");
                FetchOutcome::Redirected {
                    final_url: page.final_url,
                }
            }
            outcome => outcome,
        }
    }

    /// Trigger a "next" control on `current` and return the resulting page
    pub async fn activate(&self, current: &Page, control: &NextControl) -> FetchOutcome {
        let raw_current = current.to_raw();
        let raw_current = &raw_current;
        let requested = control
            .href
            .clone()
            .unwrap_or_else(|| current.final_url.clone());

        let result = with_retry_if(
            &self.retry,
            move |_attempt| self.activate_once(raw_current, control),
            |e| self.classify(e),
        )
        .await;

        match result {
            Ok(raw) => FetchOutcome::Success(Page::from_raw(&requested, raw)),
            Err(failure) => match failure.last_error {
                FetchError::NotFound(_) => FetchOutcome::NotFound,
                last_error => {
                    warn!(
                        selector = %control.selector,
                        attempts = failure.attempts,
                        error = %last_error,
                        "Next control failed"
                    );
                    FetchOutcome::Exhausted {
                        attempts: failure.attempts,
                        last_error: last_error.to_string(),
                    }
                }
            },
        }
    }

    async fn attempt(&self, url: &str) -> Result<RawPage, FetchError> {
        self.wait_turn().await;
        let raw = self.transport.get(url).await?;
        let raw = check_status(raw)?;
        self.await_ready(raw).await
    }

    async fn activate_once(&self, current: &RawPage, control: &NextControl) -> Result<RawPage, FetchError> {
        self.wait_turn().await;
        let raw = self.transport.activate(current, control).await?;
        let raw = check_status(raw)?;
        self.await_ready(raw).await
    }

    async fn wait_turn(&self) {
        if let Some(throttle) = &self.throttle {
            throttle.until_ready().await;
        }
    }

    fn classify(&self, error: &FetchError) -> RetryAction {
        if !error.is_retryable() {
            RetryAction::Abort
        } else if error.is_rate_limited() {
            RetryAction::RetryAfter(self.policy.rate_limited_delay())
        } else {
            RetryAction::Retry
        }
    }

    /// Poll the rendered DOM until a readiness selector matches
    async fn await_ready(&self, raw: RawPage) -> Result<RawPage, FetchError> {
        if self.ready.is_empty()
            || self.transport.mode() != FetchMode::Rendered
            || self.is_ready(&raw.body)
        {
            return Ok(raw);
        }

        let started = Instant::now();
        let timeout = self.policy.ready_timeout();
        while started.elapsed() < timeout {
            tokio::time::sleep(self.policy.ready_poll()).await;
            match self.transport.snapshot().await {
                Some(snapshot) if self.is_ready(&snapshot.body) => return Ok(snapshot),
                Some(_) => continue,
                None => break,
            }
        }

        Err(FetchError::NotReady {
            waited_ms: started.elapsed().as_millis() as u64,
        })
    }

    fn is_ready(&self, body: &str) -> bool {
        let document = Html::parse_document(body);
        self.ready
            .iter()
            .any(|selector| document.select(selector).next().is_some())
    }
}

/// Map an HTTP status to success or a classified error
fn check_status(raw: RawPage) -> Result<RawPage, FetchError> {
    match raw.status {
        200..=299 => Ok(raw),
        404 | 410 => Err(FetchError::NotFound(raw.status)),
        403 | 429 => Err(FetchError::RateLimited(raw.status)),
        status => Err(FetchError::Status(status)),
    }
}
