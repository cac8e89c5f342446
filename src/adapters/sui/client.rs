//! Sui JSON-RPC Client - Rate-limited, bounded-concurrency transport
//!
//! Wraps reqwest with a request-rate limiter, a concurrency semaphore and
//! exponential-backoff retries for all Sui full-node JSON-RPC calls.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::ports::object_gateway::GatewayError;

use super::types::RpcEnvelope;

/// Configuration for the Sui RPC client.
#[derive(Debug, Clone)]
pub struct SuiRpcConfig {
  /// Full-node JSON-RPC endpoint.
  pub url: String,
  /// Per-request timeout. `None` leaves requests unbounded.
  pub timeout: Option<Duration>,
  /// Maximum in-flight requests.
  pub max_concurrent: usize,
  /// Request rate ceiling; 0 disables rate limiting.
  pub requests_per_second: u32,
  /// Maximum retries on transient errors (reads only).
  pub max_retries: u32,
  /// Base delay between retries (exponential backoff).
  pub retry_base_delay: Duration,
}

impl Default for SuiRpcConfig {
  fn default() -> Self {
    Self {
      url: "https://fullnode.mainnet.sui.io:443".to_string(),
      timeout: None,
      max_concurrent: 8,
      requests_per_second: 20,
      max_retries: 3,
      retry_base_delay: Duration::from_millis(250),
    }
  }
}

/// Rate-limited JSON-RPC client for a Sui full node.
pub struct SuiRpcClient {
  http: Client,
  config: SuiRpcConfig,
  semaphore: Semaphore,
  limiter: Option<DefaultDirectRateLimiter>,
  next_id: AtomicU64,
}

impl std::fmt::Debug for SuiRpcClient {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SuiRpcClient")
      .field("url", &self.config.url)
      .field("max_concurrent", &self.config.max_concurrent)
      .finish_non_exhaustive()
  }
}

/// Outcome of a single HTTP attempt.
enum Attempt {
  Done(Value),
  Retry(GatewayError),
  Fatal(GatewayError),
}

impl SuiRpcClient {
  /// Create a new client.
  ///
  /// # Errors
  /// Returns `GatewayError::Transport` if the HTTP client cannot be built.
  pub fn new(config: SuiRpcConfig) -> Result<Self, GatewayError> {
    let mut builder = Client::builder().pool_max_idle_per_host(config.max_concurrent.max(1));
    if let Some(timeout) = config.timeout {
      builder = builder.timeout(timeout);
    }
    let http = builder
      .build()
      .map_err(|e| GatewayError::Transport(format!("failed to build HTTP client: {e}")))?;

    let limiter = NonZeroU32::new(config.requests_per_second)
      .map(|rps| RateLimiter::direct(Quota::per_second(rps)));

    Ok(Self {
      http,
      semaphore: Semaphore::new(config.max_concurrent.max(1)),
      limiter,
      next_id: AtomicU64::new(1),
      config,
    })
  }

  /// Endpoint this client talks to.
  pub fn url(&self) -> &str {
    &self.config.url
  }

  /// Call `method`, retrying transient failures with exponential backoff.
  pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, GatewayError> {
    self.execute(method, params, self.config.max_retries).await
  }

  /// Call `method` exactly once. Used for transaction execution, which must not be replayed.
  pub async fn call_once<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, GatewayError> {
    self.execute(method, params, 0).await
  }

  async fn execute<T: DeserializeOwned>(
    &self,
    method: &str,
    params: Value,
    max_retries: u32,
  ) -> Result<T, GatewayError> {
    let _permit = self
      .semaphore
      .acquire()
      .await
      .map_err(|_| GatewayError::Transport("semaphore closed".to_string()))?;

    let body = json!({
      "jsonrpc": "2.0",
      "id": self.next_id.fetch_add(1, Ordering::Relaxed),
      "method": method,
      "params": params,
    });

    let mut last_error = None;

    for attempt in 0..=max_retries {
      if attempt > 0 {
        let delay = self.config.retry_base_delay * 2u32.pow(attempt - 1);
        debug!(method, attempt, delay_ms = delay.as_millis(), "Retrying RPC call");
        sleep(delay).await;
      }

      if let Some(limiter) = &self.limiter {
        limiter.until_ready().await;
      }

      match self.attempt(method, &body).await {
        Attempt::Done(result) => {
          return serde_json::from_value(result)
            .map_err(|e| GatewayError::Malformed(format!("{method}: {e}")));
        }
        Attempt::Retry(e) => {
          warn!(method, attempt, error = %e, "Transient RPC failure");
          last_error = Some(e);
        }
        Attempt::Fatal(e) => return Err(e),
      }
    }

    Err(last_error.unwrap_or_else(|| GatewayError::Transport("max retries exceeded".to_string())))
  }

  async fn attempt(&self, method: &str, body: &Value) -> Attempt {
    let response = match self.http.post(&self.config.url).json(body).send().await {
      Ok(r) => r,
      Err(e) => return Attempt::Retry(GatewayError::Transport(e.to_string())),
    };

    match response.status() {
      StatusCode::OK => {}
      StatusCode::TOO_MANY_REQUESTS => {
        return Attempt::Retry(GatewayError::Transport("rate limited by node".to_string()));
      }
      status if status.is_server_error() => {
        return Attempt::Retry(GatewayError::Transport(format!("server error: {status}")));
      }
      status => {
        let text = response.text().await.unwrap_or_default();
        return Attempt::Fatal(GatewayError::Transport(format!("HTTP {status}: {text}")));
      }
    }

    let envelope: RpcEnvelope = match response.json().await {
      Ok(e) => e,
      Err(e) => return Attempt::Fatal(GatewayError::Malformed(format!("{method}: {e}"))),
    };

    match (envelope.result, envelope.error) {
      (_, Some(err)) => Attempt::Fatal(GatewayError::Rpc {
        code: err.code,
        message: err.message,
      }),
      (Some(result), None) => Attempt::Done(result),
      (None, None) => Attempt::Fatal(GatewayError::Malformed(format!("{method}: empty response"))),
    }
  }
}
