//! Embedded diagnostics dashboard for transctl.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - A single-page dashboard that samples the browser's performance APIs
//!   and posts the readings back
//! - JSON endpoints for reports, rendered diagnostics, exports, log
//!   highlighting, and translation
//!
//! Launched via `transctl web` (default: `http://127.0.0.1:9747`).

mod api;
mod frontend;

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::client::ApiClient;
use crate::config::TransctlConfig;
use crate::metrics::{MetricsCollector, Sampler, SharedCollector};
use crate::storage::{FileStore, KeyValueStore, PreferenceStore};
use crate::translate::Translator;

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// Everything the request handlers share.
pub struct Dashboard {
    config: TransctlConfig,
    client: ApiClient,
    collector: SharedCollector,
    sampler: Option<Sampler>,
    translator: Translator,
}

impl Dashboard {
    pub fn new(config: TransctlConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let client = ApiClient::from_config(&config.server);
        let collector: SharedCollector =
            Arc::new(Mutex::new(MetricsCollector::new(&config.collector)));
        let translator = Translator::new(client.clone(), PreferenceStore::new(store))
            .with_collector(collector.clone());
        Self {
            config,
            client,
            collector,
            sampler: None,
            translator,
        }
    }

    /// Start the server poll and inactivity sweep. Client readings arrive
    /// from the page itself. Returns `false` if already running.
    pub fn start_collection(&mut self) -> Result<bool> {
        if self.sampler.is_some() {
            return Ok(false);
        }
        let sampler = Sampler::start(
            self.collector.clone(),
            self.client.clone(),
            None,
            &self.config.collector,
        )
        .context("failed to start sampling threads")?;
        self.sampler = Some(sampler);
        Ok(true)
    }

    /// Returns `false` if nothing was running.
    pub fn stop_collection(&mut self) -> bool {
        match self.sampler.take() {
            Some(sampler) => {
                sampler.stop();
                true
            }
            None => false,
        }
    }

    pub fn collector(&self) -> &SharedCollector {
        &self.collector
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the dashboard server on the configured address.
///
/// Blocks the current thread. Handles requests sequentially (sufficient for
/// a local single-user dashboard). Errors are handled per request without
/// stopping the server.
pub fn serve(config: TransctlConfig) -> Result<()> {
    let addr = config.dashboard.addr.clone();
    let open = config.dashboard.open_browser;
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::from_config(&config.storage));
    let mut dashboard = Dashboard::new(config, store);

    let server = Server::http(&addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    dashboard.start_collection()?;

    println!("transctl dashboard running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");

    if open && let Err(e) = open_browser(&format!("http://{addr}")) {
        log::debug!("could not open browser: {e:#}");
    }

    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        // Read body up-front for methods that carry one
        let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
            let mut buf = String::new();
            let _ = request.as_reader().read_to_string(&mut buf);
            Some(buf)
        } else {
            None
        };

        let result = dispatch(&mut dashboard, &method, &url, body.as_deref());

        match result {
            Ok(resp) => {
                let _ = request.respond(resp);
            }
            Err(e) => {
                log::warn!("{method} {url} failed: {e:#}");
                let _ = request.respond(error_response(&e));
            }
        }

        // Brief access log
        println!(
            "{} {} {}",
            method,
            url,
            chrono::Local::now().format("%H:%M:%S")
        );
    }

    dashboard.stop_collection();
    Ok(())
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch an incoming request to the appropriate handler.
pub fn dispatch(
    dashboard: &mut Dashboard,
    method: &Method,
    url: &str,
    body: Option<&str>,
) -> Result<Response<Cursor<Vec<u8>>>> {
    // Strip query string for path matching
    let path = url.split('?').next().unwrap_or(url);
    let body = body.unwrap_or("");

    match (method, path) {
        // Frontend
        (&Method::Get, "/") | (&Method::Get, "/index.html") => Ok(serve_frontend()),

        // API: reports
        (&Method::Get, "/api/report") => api::get_report(dashboard),
        (&Method::Get, "/api/report/comparative") => api::get_comparative(dashboard),
        (&Method::Get, "/api/report/client") => api::get_client(dashboard),
        (&Method::Get, "/api/report/server") => api::get_server(dashboard),

        // API: rendered diagnostics
        (&Method::Get, "/api/diagnostics/comparative") => api::get_comparative_html(dashboard),
        (&Method::Get, "/api/diagnostics/client") => api::get_client_html(dashboard),
        (&Method::Get, "/api/diagnostics/raspberry-pi") => api::get_raspberry_panel(dashboard),
        (&Method::Post, "/api/format-log") => api::post_format_log(body),

        // API: collection
        (&Method::Post, "/api/browser-metrics") => api::post_browser_metrics(dashboard, body),
        (&Method::Post, "/api/collection/start") => api::post_collection_start(dashboard),
        (&Method::Post, "/api/collection/stop") => api::post_collection_stop(dashboard),
        (&Method::Post, p) if p.starts_with("/api/export/") => {
            api::post_export(dashboard, &p["/api/export/".len()..])
        }

        // API: translation
        (&Method::Post, "/api/translate") => api::post_translate(dashboard, body),

        // API: configuration and health
        (&Method::Get, "/api/config") => api::get_config(),
        (&Method::Get, "/api/health") => api::get_health(dashboard),

        // 404
        _ => Ok(not_found()),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Serve the embedded single-page frontend.
fn serve_frontend() -> Response<Cursor<Vec<u8>>> {
    let html = frontend::INDEX_HTML;
    Response::from_data(html.as_bytes().to_vec())
        .with_header(content_type_html())
        .with_status_code(StatusCode(200))
}

/// 404 response.
fn not_found() -> Response<Cursor<Vec<u8>>> {
    let body = r#"{"error": "not found"}"#;
    Response::from_data(body.as_bytes().to_vec())
        .with_header(content_type_json())
        .with_status_code(StatusCode(404))
}

/// 500 response carrying the error chain.
fn error_response(error: &anyhow::Error) -> Response<Cursor<Vec<u8>>> {
    let body = serde_json::json!({ "error": format!("{error:#}") }).to_string();
    Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(500))
}

/// JSON content type header.
pub(crate) fn content_type_json() -> Header {
    Header::from_bytes("Content-Type", "application/json; charset=utf-8")
        .expect("static header must parse")
}

/// HTML content type header.
fn content_type_html() -> Header {
    Header::from_bytes("Content-Type", "text/html; charset=utf-8")
        .expect("static header must parse")
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
