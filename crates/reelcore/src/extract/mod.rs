//! Client for the third-party media extraction API
//!
//! One call to [`ExtractionClient::extract`] is exactly one attempt: pick a
//! proxy (if any are configured), POST the link, classify the answer and
//! report the proxy's health back to the pool. Every path returns an
//! [`ExtractionResult`]; nothing is propagated as an error.
//!
//! Proxy health tracks connectivity only. A proxy that delivered any HTTP
//! response, including a 5xx or garbage, is reported successful. Timeouts and
//! connection failures mark it failed.

pub mod response;

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;

use crate::config::{network, Config};
use crate::error::{AppResult, ExtractError};
use crate::proxy::{Proxy, ProxyPool};

pub use response::{server_error_detail, ApiOutcome, ApiResponse};

/// Quality requested from the extraction API
pub const VIDEO_QUALITY: &str = "max";

const USER_AGENT: &str = concat!("reelfetch/", env!("CARGO_PKG_VERSION"));

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExtractRequest<'a> {
    url: &'a str,
    video_quality: &'a str,
}

/// Normalized outcome of one extraction attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    Success {
        /// Direct media URL
        url: String,
        elapsed_ms: u64,
    },
    Failure {
        error: ExtractError,
        /// 0 when the attempt ended before the request was issued
        elapsed_ms: u64,
    },
}

impl ExtractionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ExtractionResult::Success { .. })
    }

    pub fn elapsed_ms(&self) -> u64 {
        match self {
            ExtractionResult::Success { elapsed_ms, .. } | ExtractionResult::Failure { elapsed_ms, .. } => *elapsed_ms,
        }
    }

    /// Human-readable failure cause, `None` on success
    pub fn error_message(&self) -> Option<String> {
        match self {
            ExtractionResult::Success { .. } => None,
            ExtractionResult::Failure { error, .. } => Some(error.to_string()),
        }
    }

    fn failure(error: ExtractError, elapsed_ms: u64) -> Self {
        ExtractionResult::Failure { error, elapsed_ms }
    }
}

/// Rounded milliseconds since `started`
fn elapsed_ms(started: Instant) -> u64 {
    let micros = started.elapsed().as_micros();
    u64::try_from((micros + 500) / 1000).unwrap_or(u64::MAX)
}

/// Error text including the source chain (reqwest hides the cause otherwise)
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn transport_error(err: &reqwest::Error) -> ExtractError {
    if err.is_timeout() {
        ExtractError::Timeout
    } else {
        ExtractError::Transport(error_chain(err))
    }
}

/// Proxy-aware client for the extraction endpoint.
///
/// Cheap to share behind an `Arc`; concurrent calls are independent apart
/// from the shared pool.
pub struct ExtractionClient {
    endpoint: Option<String>,
    timeout: Duration,
    pool: Arc<ProxyPool>,
    direct: reqwest::Client,
    /// One client per proxy URL, built on first use
    proxied: DashMap<String, reqwest::Client>,
}

impl ExtractionClient {
    /// Builds the client. Fails only if the HTTP stack cannot be initialized.
    pub fn new(config: &Config, pool: Arc<ProxyPool>) -> AppResult<Self> {
        let direct = Self::client_builder().no_proxy().build()?;
        Ok(Self {
            endpoint: config.api_endpoint.clone(),
            timeout: config.timeout(),
            pool,
            direct,
            proxied: DashMap::new(),
        })
    }

    fn client_builder() -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(network::connect_timeout())
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn pool(&self) -> &Arc<ProxyPool> {
        &self.pool
    }

    /// Client routed through `proxy`, built and cached on first use.
    fn proxied_client(&self, proxy: &Proxy) -> Result<reqwest::Client, reqwest::Error> {
        let proxy_url = self.pool.to_connection_url(proxy);
        if let Some(client) = self.proxied.get(&proxy_url) {
            return Ok(client.value().clone());
        }

        // Raw passwords may contain URL-reserved characters
        let mut route = reqwest::Proxy::all(proxy.address_url().as_str())?;
        if let Some(credentials) = &proxy.credentials {
            route = route.basic_auth(&credentials.username, &credentials.password);
        }
        let client = Self::client_builder().proxy(route).build()?;
        log::debug!("Built HTTP client for proxy {}", proxy);
        Ok(self.proxied.entry(proxy_url).or_insert(client).value().clone())
    }

    /// Performs one extraction attempt for `input_url`.
    pub async fn extract(&self, input_url: &str) -> ExtractionResult {
        let Some(endpoint) = self.endpoint.as_deref() else {
            log::error!("❌ Extraction skipped: API_ENDPOINT is not set");
            return ExtractionResult::failure(ExtractError::Misconfigured, 0);
        };

        let proxy = if self.pool.has_proxies() { self.pool.next() } else { None };

        let client = match &proxy {
            Some(proxy) => match self.proxied_client(proxy) {
                Ok(client) => client,
                Err(e) => {
                    log::warn!("⚠️ Cannot use proxy {}: {}", proxy, error_chain(&e));
                    let error = ExtractError::Transport(error_chain(&e));
                    return self.settle(input_url, Some(proxy), Err(error), 0);
                }
            },
            None => self.direct.clone(),
        };

        let route = proxy.as_ref().map_or_else(|| "direct".to_string(), Proxy::to_string);
        log::info!("🔗 Extracting {} via {}", input_url, route);

        let request = client
            .post(endpoint)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&ExtractRequest {
                url: input_url,
                video_quality: VIDEO_QUALITY,
            });

        let started = Instant::now();
        let exchange = tokio::time::timeout(self.timeout, async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        })
        .await;
        let elapsed = elapsed_ms(started);

        let outcome = match exchange {
            Ok(Ok((status, body))) => interpret(status, &body),
            Ok(Err(e)) => Err(transport_error(&e)),
            Err(_) => Err(ExtractError::Timeout),
        };
        self.settle(input_url, proxy.as_ref(), outcome, elapsed)
    }

    /// Reports proxy health and logs the outcome. Only transport failures
    /// blame the proxy; any HTTP answer counts as a working route.
    fn settle(&self, input_url: &str, proxy: Option<&Proxy>, outcome: ApiOutcome, elapsed_ms: u64) -> ExtractionResult {
        let transport_failed = outcome.as_ref().err().is_some_and(ExtractError::is_transport);
        if let Some(proxy) = proxy {
            if transport_failed {
                self.pool.report_failure(proxy);
            } else {
                self.pool.report_success(proxy);
            }
        }

        match outcome {
            Ok(url) => {
                log::info!("✅ Extracted {} in {} ms", input_url, elapsed_ms);
                ExtractionResult::Success { url, elapsed_ms }
            }
            Err(error) => {
                match (proxy, transport_failed) {
                    (Some(proxy), true) => {
                        log::warn!("❌ Request via proxy {} failed after {} ms: {}", proxy, elapsed_ms, error)
                    }
                    (None, true) => log::warn!("❌ Direct request failed after {} ms: {}", elapsed_ms, error),
                    (_, false) => log::warn!(
                        "❌ Extraction of {} failed [{}] after {} ms: {}",
                        input_url,
                        error.subcategory(),
                        elapsed_ms,
                        error
                    ),
                }
                ExtractionResult::failure(error, elapsed_ms)
            }
        }
    }
}

/// Classifies a completed HTTP exchange
fn interpret(status: reqwest::StatusCode, body: &str) -> ApiOutcome {
    if !status.is_success() {
        return Err(ExtractError::Server(server_error_detail(body, status.as_u16())));
    }
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => ApiResponse::classify(&value),
        Err(_) => Err(ExtractError::InvalidJson),
    }
}
