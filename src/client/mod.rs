//! HTTP client for the translation server's REST API.
//!
//! Communicates with the server at `[server] base_url` using the synchronous
//! `ureq` HTTP client. Every call is a single request/response: no retries,
//! no backoff.
//!
//! Failures are split into two kinds (see [`ClientError`]):
//! - **Transport** — the server could not be reached or its reply could not
//!   be read.
//! - **Application** — the server answered with `success: false` and an
//!   `error` string, including 4xx/5xx replies that carry that shape.

pub mod keepalive;
pub mod models;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::storage::{CorrectionRelay, NewCorrection, RemoteCorrection};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure of a single API call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection refused, timeout, or an unreadable body.
    #[error("connection error: {0}")]
    Transport(String),
    /// The server reported a failure; the message is shown verbatim.
    #[error("{0}")]
    Application(String),
    /// A non-2xx reply without a usable error body.
    #[error("server returned HTTP {0}")]
    Status(u16),
}

impl ClientError {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// `GET /api/models/{id}/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStatus {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub loaded: bool,
    /// `"loaded"`, `"not_loaded"`, or `"error"` when synthesized locally.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ModelStatus {
    fn synthesized_error(id: &str, message: String) -> Self {
        Self {
            id: id.to_string(),
            loaded: false,
            status: "error".to_string(),
            message: Some(message),
        }
    }
}

/// Reply shape shared by load / unload / download / corrections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `POST /api/models/download`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadRequest {
    pub username: String,
    pub repo: String,
    pub token: String,
    pub path: String,
}

/// One entry of `GET /api/models`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub source_language: String,
    #[serde(default)]
    pub target_language: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub loaded: bool,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    model: &'a str,
}

/// `POST /api/translate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub translated_text: String,
    #[serde(default)]
    pub source_language: String,
    #[serde(default)]
    pub target_language: String,
    /// Set when the server answered from its fallback dictionary.
    #[serde(default)]
    pub fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Disk usage block of the system metrics reply, in GB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskUsage {
    pub total: f64,
    pub used: f64,
    pub free: f64,
    pub percent: f64,
}

/// `GET /api/system-metrics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMetricsResponse {
    #[serde(default)]
    pub success: bool,
    /// Percent.
    #[serde(default)]
    pub cpu_usage: f64,
    /// Megabytes.
    #[serde(default)]
    pub memory_usage: f64,
    /// Degrees Celsius.
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub translations_today: u64,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub architecture: Option<String>,
    #[serde(default)]
    pub is_raspberry_pi: bool,
    #[serde(default)]
    pub raspberry_pi_model: Option<String>,
    #[serde(default)]
    pub python_version: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub disk_usage: Option<DiskUsage>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Result of a keep-alive ping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingOutcome {
    pub status: u16,
    pub latency: Duration,
}

impl PingOutcome {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

// ---------------------------------------------------------------------------
// Request timing log
// ---------------------------------------------------------------------------

/// One completed request, as seen from this process.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestTiming {
    /// Endpoint path, e.g. `/api/system-metrics`.
    pub path: String,
    pub duration_ms: f64,
    /// Whether a reply was received (any status).
    pub reached: bool,
}

/// Requests kept by a default [`RequestLog`].
pub const REQUEST_LOG_CAP: usize = 200;

#[derive(Debug, Default)]
struct RequestEntries {
    recent: VecDeque<RequestTiming>,
    /// Reached requests evicted from `recent`.
    dropped_reached: usize,
}

/// Shared log of the most recent request timings, oldest evicted first.
///
/// Cloning shares the same log.
#[derive(Debug, Clone)]
pub struct RequestLog {
    entries: Arc<Mutex<RequestEntries>>,
    cap: usize,
}

impl Default for RequestLog {
    fn default() -> Self {
        Self::with_capacity(REQUEST_LOG_CAP)
    }
}

impl RequestLog {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            entries: Arc::default(),
            cap: cap.max(1),
        }
    }

    fn push(&self, timing: RequestTiming) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        if entries.recent.len() == self.cap
            && let Some(evicted) = entries.recent.pop_front()
            && evicted.reached
        {
            entries.dropped_reached += 1;
        }
        entries.recent.push_back(timing);
    }

    /// Copy of the retained timings, oldest first.
    pub fn snapshot(&self) -> Vec<RequestTiming> {
        self.entries
            .lock()
            .map(|entries| entries.recent.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.recent.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retained requests that reached the server, oldest first, with the
    /// number of earlier reached requests already evicted.
    pub fn reached(&self) -> (usize, Vec<RequestTiming>) {
        let Ok(entries) = self.entries.lock() else {
            return (0, Vec::new());
        };
        let reached = entries.recent.iter().filter(|t| t.reached).cloned().collect();
        (entries.dropped_reached, reached)
    }

    /// Round-trip time of the latest request that reached the server.
    pub fn last_rtt_ms(&self) -> Option<f64> {
        let entries = self.entries.lock().ok()?;
        entries
            .recent
            .iter()
            .rev()
            .find(|t| t.reached)
            .map(|t| t.duration_ms)
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Synchronous client for the translation server.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    timeout: Duration,
    log: RequestLog,
}

impl ApiClient {
    /// Build a client from the resolved `[server]` config.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(&config.base_url, Duration::from_millis(config.timeout_ms))
    }

    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            log: RequestLog::default(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The timing log shared by every clone of this client.
    pub fn request_log(&self) -> RequestLog {
        self.log.clone()
    }

    // -- Models --

    /// `GET /api/models`.
    pub fn list_models(&self) -> Result<Vec<ModelInfo>, ClientError> {
        let path = "/api/models";
        let result = self.timed(path, || ureq::get(&self.url(path)).timeout(self.timeout).call());
        read_json(result)
    }

    /// `GET /api/models/{id}/status`.
    ///
    /// Never fails: any error is folded into a status of `"error"` with the
    /// failure message.
    pub fn model_status(&self, model_id: &str) -> ModelStatus {
        let path = format!("/api/models/{model_id}/status");
        let result = self.timed(&path, || {
            ureq::get(&self.url(&path)).timeout(self.timeout).call()
        });
        match read_json::<ModelStatus>(result) {
            Ok(status) => status,
            Err(e) => {
                log::warn!("status check for {model_id} failed: {e}");
                ModelStatus::synthesized_error(model_id, e.to_string())
            }
        }
    }

    /// `POST /api/models/{id}/load`.
    pub fn load_model(&self, model_id: &str) -> Result<ActionResponse, ClientError> {
        self.post_action(&format!("/api/models/{model_id}/load"), &serde_json::json!({}))
    }

    /// `POST /api/models/{id}/unload`.
    pub fn unload_model(&self, model_id: &str) -> Result<ActionResponse, ClientError> {
        self.post_action(&format!("/api/models/{model_id}/unload"), &serde_json::json!({}))
    }

    /// `POST /api/models/download`.
    pub fn download_model(&self, request: &DownloadRequest) -> Result<ActionResponse, ClientError> {
        self.post_action("/api/models/download", request)
    }

    // -- Translation --

    /// `POST /api/translate`.
    pub fn translate(&self, text: &str, model_id: &str) -> Result<TranslateResponse, ClientError> {
        let path = "/api/translate";
        let body = TranslateRequest {
            text,
            model: model_id,
        };
        let result = self.timed(path, || {
            ureq::post(&self.url(path))
                .timeout(self.timeout)
                .send_json(&body)
        });
        let reply: TranslateResponse = read_json(result)?;
        if !reply.success {
            return Err(ClientError::Application(
                reply.error.unwrap_or_else(|| "translation failed".to_string()),
            ));
        }
        Ok(reply)
    }

    // -- Corrections --

    /// `GET /api/corrections`, optionally only those newer than `since`.
    pub fn fetch_corrections(
        &self,
        since: Option<&str>,
    ) -> Result<Vec<RemoteCorrection>, ClientError> {
        let path = "/api/corrections";
        let result = self.timed(path, || {
            let mut request = ureq::get(&self.url(path)).timeout(self.timeout);
            if let Some(since) = since {
                request = request.query("since", since);
            }
            request.call()
        });
        read_json(result)
    }

    // -- Metrics --

    /// `GET /api/system-metrics`.
    pub fn system_metrics(&self) -> Result<SystemMetricsResponse, ClientError> {
        let path = "/api/system-metrics";
        let result = self.timed(path, || ureq::get(&self.url(path)).timeout(self.timeout).call());
        let reply: SystemMetricsResponse = read_json(result)?;
        if !reply.success {
            return Err(ClientError::Application(
                reply
                    .error
                    .clone()
                    .unwrap_or_else(|| "system metrics unavailable".to_string()),
            ));
        }
        Ok(reply)
    }

    // -- Keep-alive --

    /// GET `url` and measure how long the reply took. Non-2xx replies are
    /// returned as outcomes; only transport failures are errors.
    pub fn ping(&self, url: &str) -> Result<PingOutcome, ClientError> {
        let started = Instant::now();
        let result = ureq::get(url).timeout(self.timeout).call();
        let latency = started.elapsed();
        match result {
            Ok(resp) => Ok(PingOutcome {
                status: resp.status(),
                latency,
            }),
            Err(ureq::Error::Status(status, _)) => Ok(PingOutcome { status, latency }),
            Err(ureq::Error::Transport(t)) => Err(ClientError::Transport(t.to_string())),
        }
    }

    // -- Internal --

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn post_action<B: Serialize>(&self, path: &str, body: &B) -> Result<ActionResponse, ClientError> {
        let result = self.timed(path, || {
            ureq::post(&self.url(path))
                .timeout(self.timeout)
                .send_json(body)
        });
        let reply: ActionResponse = read_json(result)?;
        if !reply.success {
            return Err(ClientError::Application(
                reply.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(reply)
    }

    fn timed<F>(&self, path: &str, call: F) -> Result<ureq::Response, ureq::Error>
    where
        F: FnOnce() -> Result<ureq::Response, ureq::Error>,
    {
        let started = Instant::now();
        let result = call();
        let reached = !matches!(result, Err(ureq::Error::Transport(_)));
        self.log.push(RequestTiming {
            path: path.to_string(),
            duration_ms: started.elapsed().as_secs_f64() * 1000.0,
            reached,
        });
        result
    }
}

/// Decode a reply, turning error statuses with a `{success: false, error}`
/// body into [`ClientError::Application`].
fn read_json<T: DeserializeOwned>(
    result: Result<ureq::Response, ureq::Error>,
) -> Result<T, ClientError> {
    match result {
        Ok(resp) => resp
            .into_json()
            .map_err(|e| ClientError::Transport(format!("unreadable response: {e}"))),
        Err(ureq::Error::Status(status, resp)) => match resp.into_json::<ActionResponse>() {
            Ok(ActionResponse {
                error: Some(error), ..
            }) => Err(ClientError::Application(error)),
            _ => Err(ClientError::Status(status)),
        },
        Err(ureq::Error::Transport(t)) => Err(ClientError::Transport(t.to_string())),
    }
}

impl CorrectionRelay for ApiClient {
    /// `POST /api/corrections`, returning the server's reply as-is.
    fn send_correction(&self, correction: &NewCorrection) -> anyhow::Result<serde_json::Value> {
        let path = "/api/corrections";
        let result = self.timed(path, || {
            ureq::post(&self.url(path))
                .timeout(self.timeout)
                .send_json(correction)
        });
        Ok(read_json(result)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
