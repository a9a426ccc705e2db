/// Model Control Client tests against an in-process HTTP server.
///
/// Each test spawns a `tiny_http` server on an ephemeral port that answers
/// from a routing closure and records every request it sees.
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tiny_http::{Header, Response, Server};

use transctl::cli::sync_corrections;
use transctl::client::models::{DownloadForm, DownloadPanel, DownloadState, ModelPanel, StatusLine};
use transctl::client::{ApiClient, ClientError, keepalive};
use transctl::config::schema::Locale;
use transctl::metrics::MetricsCollector;
use transctl::metrics::sampler::lock;
use transctl::storage::{CorrectionStore, MemoryStore, NewCorrection, PreferenceStore};
use transctl::translate::Translator;

// ---------------------------------------------------------------------------
// Mock server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Seen {
    method: String,
    path: String,
    body: String,
}

struct MockServer {
    base_url: String,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl MockServer {
    fn start<F>(route: F) -> Self
    where
        F: Fn(&str, &str) -> (u16, String) + Send + 'static,
    {
        let server = Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();

        thread::spawn(move || {
            for mut request in server.incoming_requests() {
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                let method = request.method().to_string();
                let path = request.url().to_string();
                let (status, reply) = route(&method, &path);
                log.lock().unwrap().push(Seen { method, path, body });

                let header = Header::from_bytes("Content-Type", "application/json").unwrap();
                let _ = request.respond(
                    Response::from_string(reply)
                        .with_header(header)
                        .with_status_code(status),
                );
            }
        });

        Self {
            base_url: format!("http://127.0.0.1:{port}"),
            seen,
        }
    }

    fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url, Duration::from_secs(5))
    }

    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

fn unreachable_client() -> ApiClient {
    ApiClient::new("http://127.0.0.1:9", Duration::from_millis(300))
}

// ---------------------------------------------------------------------------
// Model listing and status
// ---------------------------------------------------------------------------

#[test]
fn list_models_decodes_entries() {
    let server = MockServer::start(|_, _| {
        (
            200,
            r#"[{"id": "pt-en", "source_language": "pt", "target_language": "en",
                 "display_name": "Português → English", "loaded": true}]"#
                .to_string(),
        )
    });

    let models = server.client().list_models().unwrap();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].id, "pt-en");
    assert!(models[0].loaded);
    assert_eq!(server.seen()[0].path, "/api/models");
}

#[test]
fn status_check_hits_model_endpoint() {
    let server = MockServer::start(|_, _| {
        (200, r#"{"id": "pt-en", "loaded": false, "status": "not_loaded"}"#.to_string())
    });

    let status = server.client().model_status("pt-en");
    assert_eq!(status.status, "not_loaded");
    assert_eq!(server.seen()[0].path, "/api/models/pt-en/status");
}

#[test]
fn status_check_failure_is_synthesized() {
    let server = MockServer::start(|_, _| (500, "boom".to_string()));
    let status = server.client().model_status("pt-en");
    assert_eq!(status.status, "error");
    assert!(status.message.is_some());
}

// ---------------------------------------------------------------------------
// Load / unload panels
// ---------------------------------------------------------------------------

#[test]
fn load_success_flips_controls() {
    let server = MockServer::start(|_, _| (200, r#"{"success": true}"#.to_string()));
    let mut panel = ModelPanel::new("pt-en", false);

    assert_eq!(panel.load(&server.client()), &StatusLine::Loaded);
    assert!(!panel.load_enabled);
    assert!(panel.unload_enabled);

    let seen = server.seen();
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].path, "/api/models/pt-en/load");
}

#[test]
fn unload_success_reenables_load() {
    let server = MockServer::start(|_, _| (200, r#"{"success": true}"#.to_string()));
    let mut panel = ModelPanel::new("pt-en", true);

    assert_eq!(panel.unload(&server.client()), &StatusLine::Unloaded);
    assert!(panel.load_enabled);
    assert!(!panel.unload_enabled);
    assert_eq!(server.seen()[0].path, "/api/models/pt-en/unload");
}

#[test]
fn application_failure_shows_server_message() {
    let server = MockServer::start(|_, _| {
        (200, r#"{"success": false, "error": "Modelo não encontrado"}"#.to_string())
    });
    let mut panel = ModelPanel::new("xx", false);

    let status = panel.load(&server.client()).clone();
    assert_eq!(status, StatusLine::Error("Modelo não encontrado".to_string()));
    assert_eq!(status.text(Locale::Pt), "Erro: Modelo não encontrado");
    assert!(panel.load_enabled);
}

#[test]
fn error_status_with_body_is_application_failure() {
    let server = MockServer::start(|_, _| {
        (404, r#"{"success": false, "error": "unknown model"}"#.to_string())
    });
    let err = server.client().load_model("xx").unwrap_err();
    assert!(matches!(err, ClientError::Application(ref m) if m == "unknown model"));
}

#[test]
fn transport_failure_shows_connection_error() {
    let mut panel = ModelPanel::new("pt-en", true);
    let status = panel.unload(&unreachable_client()).clone();
    assert_eq!(status, StatusLine::ConnectionError);
    assert_eq!(status.text(Locale::En), "Connection error");
    assert!(panel.unload_enabled);
}

// ---------------------------------------------------------------------------
// Download
// ---------------------------------------------------------------------------

#[test]
fn download_rejects_blank_fields_without_request() {
    let server = MockServer::start(|_, _| (200, r#"{"success": true}"#.to_string()));
    let mut panel = DownloadPanel::default();
    let form = DownloadForm {
        username: "  ".to_string(),
        repo: "opus-mt".to_string(),
        ..Default::default()
    };

    assert!(panel.submit(&server.client(), &form).is_err());
    assert_eq!(panel.state, DownloadState::Idle);
    assert!(server.seen().is_empty());
}

#[test]
fn download_posts_trimmed_form() {
    let server = MockServer::start(|_, _| (200, r#"{"success": true}"#.to_string()));
    let mut panel = DownloadPanel::default();
    let form = DownloadForm {
        username: " helsinki ".to_string(),
        repo: "opus-mt-pt-en".to_string(),
        token: String::new(),
        path: "models/".to_string(),
    };

    let state = panel.submit(&server.client(), &form).unwrap().clone();
    assert_eq!(state, DownloadState::Succeeded);

    let seen = server.seen();
    assert_eq!(seen[0].path, "/api/models/download");
    let body: serde_json::Value = serde_json::from_str(&seen[0].body).unwrap();
    assert_eq!(body["username"], "helsinki");
    assert_eq!(body["repo"], "opus-mt-pt-en");
}

// ---------------------------------------------------------------------------
// Translation and corrections
// ---------------------------------------------------------------------------

#[test]
fn translation_records_history_and_timing() {
    let server = MockServer::start(|_, _| {
        (
            200,
            r#"{"success": true, "translated_text": "good morning",
                "source_language": "pt", "target_language": "en"}"#
                .to_string(),
        )
    });
    let prefs = PreferenceStore::new(Arc::new(MemoryStore::new()));
    let collector = Arc::new(Mutex::new(MetricsCollector::default()));
    let translator =
        Translator::new(server.client(), prefs.clone()).with_collector(collector.clone());

    let reply = translator.translate("bom dia", "pt-en").unwrap();
    assert_eq!(reply.translated_text, "good morning");

    assert_eq!(prefs.last_used_model().as_deref(), Some("pt-en"));
    let history = prefs.translation_history();
    assert_eq!(history[0].source_text, "bom dia");
    assert_eq!(history[0].target_lang, "en");

    let timings = lock(&collector).translation_times().to_vec();
    assert_eq!(timings.len(), 1);
    assert_eq!(timings[0].source_length, 7);
    assert_eq!(timings[0].target_length, 12);
    assert_eq!(timings[0].model_id, "pt-en");
}

#[test]
fn failed_translation_leaves_history_alone() {
    let server = MockServer::start(|_, _| {
        (200, r#"{"success": false, "error": "model not loaded"}"#.to_string())
    });
    let prefs = PreferenceStore::new(Arc::new(MemoryStore::new()));
    let translator = Translator::new(server.client(), prefs.clone());

    let err = translator.translate("olá", "pt-en").unwrap_err();
    assert_eq!(err.to_string(), "model not loaded");
    assert!(prefs.translation_history().is_empty());
    assert_eq!(prefs.last_used_model(), None);
}

#[test]
fn correction_relay_posts_to_server() {
    let server = MockServer::start(|_, _| (200, r#"{"success": true}"#.to_string()));
    let store =
        CorrectionStore::with_relay(Arc::new(MemoryStore::new()), Arc::new(server.client()), true);

    let handle = store
        .save_correction(NewCorrection {
            source_text: "bom dia".to_string(),
            original_translation: "good day".to_string(),
            corrected_translation: "good morning".to_string(),
            model_id: "pt-en".to_string(),
            source_lang: "pt".to_string(),
            target_lang: "en".to_string(),
        })
        .unwrap()
        .unwrap();
    handle.wait().unwrap();

    let seen = server.seen();
    assert_eq!(seen[0].path, "/api/corrections");
    let body: serde_json::Value = serde_json::from_str(&seen[0].body).unwrap();
    assert_eq!(body["correctedTranslation"], "good morning");
}

#[test]
fn relay_failure_keeps_local_record() {
    let store = CorrectionStore::with_relay(
        Arc::new(MemoryStore::new()),
        Arc::new(unreachable_client()),
        true,
    );
    let handle = store
        .save_correction(NewCorrection {
            source_text: "obrigado".to_string(),
            original_translation: "thank".to_string(),
            corrected_translation: "thank you".to_string(),
            model_id: "pt-en".to_string(),
            source_lang: "pt".to_string(),
            target_lang: "en".to_string(),
        })
        .unwrap()
        .unwrap();

    assert!(handle.wait().is_err());
    assert!(store.has_correction_for("pt-en", "obrigado"));
}

#[test]
fn corrections_fetch_dedups_and_advances_cursor() {
    let server = MockServer::start(|_, path| {
        let body = if path.contains("since=") {
            r#"[{"id": 2, "modelId": "pt-en", "sourceText": "obrigado", "correctedTranslation": "thank you"},
                {"id": 3, "modelId": "pt-en", "sourceText": "tchau", "correctedTranslation": "bye, then"}]"#
        } else {
            r#"[{"id": 1, "modelId": "pt-en", "sourceText": "bom dia", "correctedTranslation": "good morning"},
                {"id": 2, "modelId": "pt-en", "sourceText": "obrigado", "correctedTranslation": "thank you"}]"#
        };
        (200, body.to_string())
    });
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("data").join("corrections.csv");
    let store = CorrectionStore::local(Arc::new(MemoryStore::new()));
    let client = server.client();

    let first = sync_corrections(&client, &store, Some(&csv)).unwrap();
    assert_eq!(first.received, 2);
    assert_eq!(first.added.len(), 2);
    assert!(store.last_fetch().is_some());

    let second = sync_corrections(&client, &store, Some(&csv)).unwrap();
    assert_eq!(second.received, 2);
    assert_eq!(second.added.len(), 1);
    assert_eq!(second.added[0].source_text, "tchau");

    let seen = server.seen();
    assert_eq!(seen[0].path, "/api/corrections");
    assert!(seen[1].path.starts_with("/api/corrections?since="));
    assert_eq!(store.fetched_corrections().len(), 3);

    let text = std::fs::read_to_string(&csv).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("id,timestamp,model_id"));
    assert_eq!(lines[3], r#"3,,pt-en,tchau,,"bye, then",,"#);
}

#[test]
fn empty_or_failed_fetch_keeps_cursor() {
    let server = MockServer::start(|_, _| (200, "[]".to_string()));
    let store = CorrectionStore::local(Arc::new(MemoryStore::new()));

    let summary = sync_corrections(&server.client(), &store, None).unwrap();
    assert_eq!(summary.received, 0);
    assert_eq!(store.last_fetch(), None);

    assert!(sync_corrections(&unreachable_client(), &store, None).is_err());
    assert_eq!(store.last_fetch(), None);
}

// ---------------------------------------------------------------------------
// System metrics and keep-alive
// ---------------------------------------------------------------------------

#[test]
fn system_poll_feeds_collector() {
    let server = MockServer::start(|_, _| {
        (
            200,
            r#"{"success": true, "cpu_usage": 42.0, "memory_usage": 512.0,
                "temperature": 61.5, "translations_today": 7,
                "platform": "Linux", "architecture": "aarch64",
                "is_raspberry_pi": true, "raspberry_pi_model": "4 Model B"}"#
                .to_string(),
        )
    });
    let mut collector = MetricsCollector::default();
    collector.start_collection(1_000);
    collector.collect_system_metrics(&server.client(), 2_000);

    assert_eq!(collector.cpu().latest_value(), Some(42.0));
    assert_eq!(collector.translations_today(), 7);
    let info = collector.server_info().unwrap();
    assert!(info.is_raspberry_pi);
    assert_eq!(server.seen()[0].path, "/api/system-metrics");
}

#[test]
fn failed_system_poll_is_recorded_as_error() {
    let mut collector = MetricsCollector::default();
    collector.start_collection(1_000);
    collector.collect_system_metrics(&unreachable_client(), 2_000);

    assert!(collector.cpu().is_empty());
    assert_eq!(collector.errors().len(), 1);
}

#[test]
fn keepalive_ping_reports_success() {
    let server = MockServer::start(|_, _| (200, "[]".to_string()));
    let client = server.client();
    let url = format!("{}/api/models", client.base_url());
    assert!(keepalive::ping_once(&client, &url));
    assert!(!keepalive::ping_once(&unreachable_client(), "http://127.0.0.1:9/api/models"));
}
