//! JSON API handlers for the dashboard.
//!
//! Each handler corresponds to an endpoint and returns a
//! `Response<Cursor<Vec<u8>>>` with JSON content.

use std::io::Cursor;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tiny_http::{Response, StatusCode};

use super::{Dashboard, content_type_json};
use crate::config;
use crate::metrics::now_ms;
use crate::metrics::probe::BrowserSnapshot;
use crate::metrics::sampler::lock;
use crate::metrics::CollectionState;
use crate::render;
use crate::report::{self, ExportKind};

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateRequest {
    text: String,
    model_id: String,
}

#[derive(Deserialize)]
struct FormatLogRequest {
    text: String,
}

#[derive(Serialize)]
struct HtmlResponse {
    html: Option<String>,
}

#[derive(Serialize)]
struct CollectionResponse {
    changed: bool,
    state: CollectionState,
}

#[derive(Serialize)]
struct BrowserMetricsResponse {
    interactions_recorded: usize,
    state: CollectionState,
}

#[derive(Serialize)]
struct ExportResponse {
    kind: &'static str,
    path: String,
}

/// Config API response: the effective config plus its TOML rendering.
#[derive(Serialize)]
struct ConfigResponse {
    config: config::TransctlConfig,
    toml_text: String,
}

#[derive(Serialize)]
struct HealthResponse {
    server_url: String,
    server_reachable: bool,
    server_status: Option<u16>,
    latency_ms: Option<f64>,
    collecting: bool,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a JSON success response.
fn json_response<T: Serialize>(data: &T) -> Result<Response<Cursor<Vec<u8>>>> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(200)))
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// `GET /api/report` — technical report.
pub fn get_report(dashboard: &Dashboard) -> Result<Response<Cursor<Vec<u8>>>> {
    let report = report::technical_report(&lock(&dashboard.collector), now_ms());
    json_response(&report)
}

/// `GET /api/report/comparative`
pub fn get_comparative(dashboard: &Dashboard) -> Result<Response<Cursor<Vec<u8>>>> {
    let report = report::comparative_report(
        &lock(&dashboard.collector),
        dashboard.config.report.locale,
        now_ms(),
    );
    json_response(&report)
}

/// `GET /api/report/client`
pub fn get_client(dashboard: &Dashboard) -> Result<Response<Cursor<Vec<u8>>>> {
    let report = report::client_report(
        &lock(&dashboard.collector),
        dashboard.config.report.locale,
        now_ms(),
    );
    json_response(&report)
}

/// `GET /api/report/server`
pub fn get_server(dashboard: &Dashboard) -> Result<Response<Cursor<Vec<u8>>>> {
    let report = report::server_report(
        &lock(&dashboard.collector),
        dashboard.config.report.locale,
        now_ms(),
    );
    json_response(&report)
}

// ---------------------------------------------------------------------------
// Rendered diagnostics
// ---------------------------------------------------------------------------

/// `GET /api/diagnostics/comparative` — server, client, and comparison
/// panels as HTML.
pub fn get_comparative_html(dashboard: &Dashboard) -> Result<Response<Cursor<Vec<u8>>>> {
    let report = report::comparative_report(
        &lock(&dashboard.collector),
        dashboard.config.report.locale,
        now_ms(),
    );
    json_response(&render::comparative_sections(&report))
}

/// `GET /api/diagnostics/client` — client metric lists, or `null` when
/// nothing has been reported yet.
pub fn get_client_html(dashboard: &Dashboard) -> Result<Response<Cursor<Vec<u8>>>> {
    let report = report::client_report(
        &lock(&dashboard.collector),
        dashboard.config.report.locale,
        now_ms(),
    );
    json_response(&render::client_lists(&report))
}

/// `GET /api/diagnostics/raspberry-pi` — `{"html": null}` unless the server
/// is a Raspberry Pi.
pub fn get_raspberry_panel(dashboard: &Dashboard) -> Result<Response<Cursor<Vec<u8>>>> {
    let html = render::raspberry_panel(&lock(&dashboard.collector));
    json_response(&HtmlResponse { html })
}

/// `POST /api/format-log` — body `{"text": "..."}`, one or more lines.
pub fn post_format_log(body: &str) -> Result<Response<Cursor<Vec<u8>>>> {
    let req: FormatLogRequest =
        serde_json::from_str(body).context("invalid JSON in format-log request")?;
    json_response(&HtmlResponse {
        html: Some(render::log::format_log(&req.text)),
    })
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// `POST /api/browser-metrics` — one [`BrowserSnapshot`] from the page.
pub fn post_browser_metrics(dashboard: &Dashboard, body: &str) -> Result<Response<Cursor<Vec<u8>>>> {
    let mut snapshot: BrowserSnapshot =
        serde_json::from_str(body).context("invalid browser metrics payload")?;

    let mut collector = lock(&dashboard.collector);
    if let Some(page_id) = &snapshot.page_id {
        collector.begin_page(page_id);
    }
    collector.collect_client_metrics(&mut snapshot, now_ms());
    let interactions_recorded = snapshot
        .interactions
        .iter()
        .filter(|event| collector.record_interaction(event.kind, event.timestamp))
        .count();

    json_response(&BrowserMetricsResponse {
        interactions_recorded,
        state: collector.state(),
    })
}

/// `POST /api/collection/start`
pub fn post_collection_start(dashboard: &mut Dashboard) -> Result<Response<Cursor<Vec<u8>>>> {
    let changed = dashboard.start_collection()?;
    json_response(&CollectionResponse {
        changed,
        state: lock(&dashboard.collector).state(),
    })
}

/// `POST /api/collection/stop`
pub fn post_collection_stop(dashboard: &mut Dashboard) -> Result<Response<Cursor<Vec<u8>>>> {
    let changed = dashboard.stop_collection();
    json_response(&CollectionResponse {
        changed,
        state: lock(&dashboard.collector).state(),
    })
}

/// `POST /api/export/{kind}` — write the report into the export directory.
pub fn post_export(dashboard: &Dashboard, kind: &str) -> Result<Response<Cursor<Vec<u8>>>> {
    let kind: ExportKind = kind.parse()?;
    let dir = config::expand_tilde(&dashboard.config.report.export_dir);
    let path = report::export(
        &lock(&dashboard.collector),
        kind,
        dashboard.config.report.locale,
        &dir,
        now_ms(),
    )?;
    json_response(&ExportResponse {
        kind: kind.as_str(),
        path: path.display().to_string(),
    })
}

// ---------------------------------------------------------------------------
// Translation
// ---------------------------------------------------------------------------

/// `POST /api/translate` — body `{"text": "...", "modelId": "..."}`.
pub fn post_translate(dashboard: &Dashboard, body: &str) -> Result<Response<Cursor<Vec<u8>>>> {
    let req: TranslateRequest =
        serde_json::from_str(body).context("invalid JSON in translate request")?;
    let reply = dashboard.translator.translate(&req.text, &req.model_id)?;
    json_response(&reply)
}

// ---------------------------------------------------------------------------
// Configuration and health
// ---------------------------------------------------------------------------

/// `GET /api/config` — current effective configuration.
pub fn get_config() -> Result<Response<Cursor<Vec<u8>>>> {
    let cfg = config::load();
    let toml_text = toml::to_string_pretty(&cfg).unwrap_or_default();
    json_response(&ConfigResponse {
        config: cfg,
        toml_text,
    })
}

/// `GET /api/health` — server reachability and collection state.
pub fn get_health(dashboard: &Dashboard) -> Result<Response<Cursor<Vec<u8>>>> {
    let url = format!("{}/api/models", dashboard.client.base_url());
    let ping = dashboard.client.ping(&url).ok();
    json_response(&HealthResponse {
        server_url: dashboard.client.base_url().to_string(),
        server_reachable: ping.is_some_and(|p| p.is_ok()),
        server_status: ping.map(|p| p.status),
        latency_ms: ping.map(|p| p.latency.as_secs_f64() * 1000.0),
        collecting: lock(&dashboard.collector).is_collecting(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_request_uses_camel_case() {
        let req: TranslateRequest =
            serde_json::from_str(r#"{"text": "olá", "modelId": "pt-en"}"#).unwrap();
        assert_eq!(req.model_id, "pt-en");
    }

    #[test]
    fn collection_response_serializes_state() {
        let json = serde_json::to_string(&CollectionResponse {
            changed: true,
            state: CollectionState::Collecting,
        })
        .unwrap();
        assert_eq!(json, r#"{"changed":true,"state":"Collecting"}"#);
    }

    #[test]
    fn format_log_rejects_plain_text() {
        assert!(post_format_log("not json").is_err());
    }
}
