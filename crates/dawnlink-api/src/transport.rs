// Rate-limited, retrying HTTP transport for the device.
//
// The appliance runs a tiny embedded HTTPS server that resets connections
// when requests overlap or arrive back-to-back. All device traffic therefore
// funnels through one `Transport`, which serializes requests behind a fair
// async mutex and spaces them by a minimum interval. Retry handles the
// transient failures the device produces anyway.

use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;

/// Configuration for building a device transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Minimum spacing between the completion of one device request and
    /// the dispatch of the next.
    pub min_interval: Duration,
    /// Total attempts per request (1 = no retries).
    pub max_attempts: u32,
    /// Initial retry backoff; doubles per attempt.
    pub initial_backoff: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            min_interval: Duration::from_millis(1050),
            max_attempts: 4,
            initial_backoff: Duration::from_millis(250),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` for the device.
    ///
    /// The device presents a self-signed certificate on a legacy TLS stack,
    /// so verification is disabled. It also expects a `Content-Encoding: gzip`
    /// request header regardless of actual encoding — a firmware quirk that
    /// must be preserved.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            reqwest::header::CONTENT_ENCODING,
            reqwest::header::HeaderValue::from_static("gzip"),
        );

        reqwest::Client::builder()
            .timeout(self.timeout)
            .danger_accept_invalid_certs(true)
            .default_headers(headers)
            .user_agent("dawnlink/0.1.0")
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// Single-flight, paced, retrying transport.
///
/// Safe to share and call concurrently; excess callers queue in submission
/// order on the pacing gate (tokio mutexes are FIFO-fair). Owns no domain
/// state beyond the last-dispatch timestamp.
pub struct Transport {
    http: reqwest::Client,
    base_url: Url,
    config: TransportConfig,
    /// Completion instant of the most recent device request.
    gate: Mutex<Option<Instant>>,
}

impl Transport {
    pub fn new(base_url: Url, config: TransportConfig) -> Result<Self, Error> {
        let http = config.build_client()?;
        Ok(Self {
            http,
            base_url,
            config,
            gate: Mutex::new(None),
        })
    }

    /// The device base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Send a GET request and deserialize the JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let body = self.execute(Method::GET, path, None).await?;
        parse_json(&body)
    }

    /// Send a partial-object PUT and deserialize the JSON response.
    ///
    /// The device only touches fields present in the payload.
    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, Error> {
        let payload =
            serde_json::to_string(body).map_err(|e| Error::Serialization(e.to_string()))?;
        let body = self.execute(Method::PUT, path, Some(payload)).await?;
        parse_json(&body)
    }

    /// Send a PUT and discard the response body.
    ///
    /// Some write endpoints (factory reset) answer with an empty body.
    pub async fn put_discard(&self, path: &str, body: &impl Serialize) -> Result<(), Error> {
        let payload =
            serde_json::to_string(body).map_err(|e| Error::Serialization(e.to_string()))?;
        self.execute(Method::PUT, path, Some(payload)).await?;
        Ok(())
    }

    /// Run one logical request through the pacing gate with retries.
    ///
    /// The gate is held for the full duration, retries included: at most one
    /// request is ever in flight against the device, and consecutive
    /// requests are spaced by at least `min_interval`.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        payload: Option<String>,
    ) -> Result<String, Error> {
        let url = self.url(path)?;

        let mut gate = self.gate.lock().await;
        if let Some(last) = *gate {
            tokio::time::sleep_until(last + self.config.min_interval).await;
        }
        let result = self.send_with_retry(&method, &url, payload.as_deref()).await;
        *gate = Some(Instant::now());
        drop(gate);

        result
    }

    async fn send_with_retry(
        &self,
        method: &Method,
        url: &Url,
        payload: Option<&str>,
    ) -> Result<String, Error> {
        let mut backoff = self.config.initial_backoff;

        for attempt in 1..=self.config.max_attempts {
            debug!(
                %method,
                path = url.path(),
                body = payload.map(truncated),
                attempt,
                "device request"
            );

            match self.send_once(method, url, payload).await {
                Ok(body) => {
                    debug!(%method, path = url.path(), body = truncated(&body), "device response");
                    return Ok(body);
                }
                Err(e) if e.is_transient() && attempt < self.config.max_attempts => {
                    warn!(
                        %method,
                        path = url.path(),
                        error = %e,
                        attempt,
                        "transient device failure, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => {
                    warn!(%method, path = url.path(), error = %e, "device request failed");
                    return Err(e);
                }
            }
        }

        unreachable!("retry loop always returns")
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &Url,
        payload: Option<&str>,
    ) -> Result<String, Error> {
        let mut request = self.http.request(method.clone(), url.clone());
        if let Some(payload) = payload {
            request = request.body(payload.to_owned());
        }

        let response = request.send().await.map_err(Error::Transport)?;
        let status = response.status();
        let body = response.text().await.map_err(Error::Transport)?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(Error::Http {
                status: status.as_u16(),
                body: truncated(&body),
            })
        }
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        let full = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&full)?)
    }
}

fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: truncated(body),
    })
}

/// Cap logged bodies; sensor and alarm payloads are small, but there is no
/// reason to trust the device about that.
fn truncated(body: &str) -> String {
    const MAX: usize = 256;
    if body.len() <= MAX {
        body.to_owned()
    } else {
        let mut cut = MAX;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}…", &body[..cut])
    }
}

#[cfg(test)]
mod tests {
    use super::truncated;

    #[test]
    fn truncated_leaves_short_bodies_alone() {
        assert_eq!(truncated("{}"), "{}");
    }

    #[test]
    fn truncated_caps_long_bodies() {
        let long = "x".repeat(1000);
        assert!(truncated(&long).len() < 300);
    }
}
