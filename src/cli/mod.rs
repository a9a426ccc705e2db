//! CLI command implementations for transctl.
//!
//! Provides subcommand handlers for:
//! - `transctl model list|status|load|unload|download` — model management
//! - `transctl translate` / `history` / `last-model` — translation and its
//!   persisted side effects
//! - `transctl correct` / `corrections list|get|fetch` — user corrections
//! - `transctl collect --seconds N` — sample the server and this host, then
//!   print or export a report
//! - `transctl keepalive` — keep a hosted server awake
//! - `transctl health` — config, storage, and server reachability
//! - `transctl log-format <file>` — highlight a log as HTML
//! - `transctl config show|init|set|reset` — configuration management

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use colored::Colorize;

use crate::client::models::{DownloadForm, DownloadPanel, DownloadState, ModelPanel};
use crate::client::{ApiClient, ModelInfo, keepalive};
use crate::config::{self, TransctlConfig};
use crate::metrics::collector::SystemMetrics;
use crate::metrics::probe::HostProbe;
use crate::metrics::sampler::lock;
use crate::metrics::stats::SeriesStats;
use crate::metrics::{MetricsCollector, Sampler, SharedCollector, now_ms};
use crate::render;
use crate::report::comparative::{ClientSection, ServerSection};
use crate::report::{self, ClientReport, ComparativeReport, ExportKind, Section, TechnicalReport};
use crate::storage::{
    CorrectionRecord, CorrectionStore, FileStore, HistoryEntry, KeyValueStore, NewCorrection,
    PreferenceStore, RelayHandle, RemoteCorrection,
};
use crate::translate::Translator;

/// Output format for listing and report commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

fn open_store(cfg: &TransctlConfig) -> Arc<dyn KeyValueStore> {
    Arc::new(FileStore::from_config(&cfg.storage))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// transctl model
// ---------------------------------------------------------------------------

/// List the models the server knows about.
pub fn run_model_list(format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let client = ApiClient::from_config(&cfg.server);
    let models = client
        .list_models()
        .with_context(|| format!("failed to list models from {}", client.base_url()))?;

    if models.is_empty() {
        println!("{}", "The server reports no models.".yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => print_json(&models)?,
        OutputFormat::Csv => print_models_csv(&models),
        OutputFormat::Table => print_models_table(&models),
    }
    Ok(())
}

fn print_models_table(models: &[ModelInfo]) {
    println!("{}", "Translation Models".bold().cyan());
    println!("{}", "=".repeat(60));
    println!(
        "  {:<16} {:<24} {:<10} Status",
        "ID", "Name", "Pair"
    );
    println!("  {}", "-".repeat(58));

    for model in models {
        let status = if model.loaded {
            "loaded".green()
        } else {
            "not loaded".dimmed()
        };
        println!(
            "  {:<16} {:<24} {:<10} {}",
            truncate(&model.id, 16),
            truncate(&model.display_name, 24),
            format!("{}→{}", model.source_language, model.target_language),
            status,
        );
    }
}

fn print_models_csv(models: &[ModelInfo]) {
    println!("id,display_name,source_language,target_language,loaded");
    for m in models {
        println!(
            "{},{},{},{},{}",
            m.id, m.display_name, m.source_language, m.target_language, m.loaded
        );
    }
}

/// Show one model's status. Failures come back as a synthesized `error`
/// status, so this never fails on transport errors.
pub fn run_model_status(model_id: &str) -> Result<()> {
    let cfg = config::load();
    let client = ApiClient::from_config(&cfg.server);
    let status = client.model_status(model_id);

    let label = match status.status.as_str() {
        "loaded" => status.status.green(),
        "error" => status.status.red(),
        _ => status.status.yellow(),
    };
    println!("  {} {}", "Model: ".bold(), model_id);
    println!("  {} {}", "Status:".bold(), label);
    if let Some(message) = &status.message {
        println!("  {} {}", "Detail:".bold(), message.dimmed());
    }
    Ok(())
}

/// Load or unload a model through its panel view model.
pub fn run_model_action(model_id: &str, load: bool) -> Result<()> {
    let cfg = config::load();
    let client = ApiClient::from_config(&cfg.server);
    let locale = cfg.report.locale;

    let mut panel = ModelPanel::new(model_id, !load);
    let status = if load {
        panel.load(&client)
    } else {
        panel.unload(&client)
    };

    if status.is_failure() {
        println!("{} {}", "✗".red().bold(), status.text(locale));
        anyhow::bail!("{} {model_id} failed", if load { "load" } else { "unload" });
    }
    println!("{} {}", "✓".green().bold(), status.text(locale));
    Ok(())
}

/// Download a model from a repository.
pub fn run_model_download(form: DownloadForm) -> Result<()> {
    let cfg = config::load();
    let client = ApiClient::from_config(&cfg.server);
    let locale = cfg.report.locale;

    let request = form.validate()?;
    let mut panel = DownloadPanel::default();
    panel.begin(&request);
    println!("{}", panel.text(locale).dimmed());

    panel.finish(client.download_model(&request));
    match panel.state {
        DownloadState::Succeeded => {
            println!("{} {}", "✓".green().bold(), panel.text(locale));
            Ok(())
        }
        _ => {
            println!("{} {}", "✗".red().bold(), panel.text(locale));
            anyhow::bail!("download of {}/{} failed", request.username, request.repo)
        }
    }
}

// ---------------------------------------------------------------------------
// transctl translate | history | last-model
// ---------------------------------------------------------------------------

/// Translate `text`. Without `--model` the last used model is taken.
pub fn run_translate(text: &str, model: Option<&str>) -> Result<()> {
    let cfg = config::load();
    let client = ApiClient::from_config(&cfg.server);
    let preferences = PreferenceStore::new(open_store(&cfg));

    let model_id = match model {
        Some(id) => id.to_string(),
        None => preferences
            .last_used_model()
            .context("no model given and no last used model stored (pass --model)")?,
    };

    let translator = Translator::new(client, preferences);
    let reply = translator.translate(text, &model_id)?;

    println!("{}", reply.translated_text);
    if reply.fallback {
        println!(
            "  {}",
            "Answered from the server's fallback dictionary.".yellow()
        );
    }
    log::debug!(
        "{} → {} via {model_id}",
        reply.source_language,
        reply.target_language
    );
    Ok(())
}

/// Show or clear the translation history.
pub fn run_history(format: OutputFormat, clear: bool) -> Result<()> {
    let cfg = config::load();
    let preferences = PreferenceStore::new(open_store(&cfg));

    if clear {
        preferences.clear_translation_history()?;
        println!("{} Translation history cleared", "✓".green().bold());
        return Ok(());
    }

    let history = preferences.translation_history();
    if history.is_empty() {
        println!("{}", "No translations yet.".yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => print_json(&history)?,
        OutputFormat::Csv => print_history_csv(&history),
        OutputFormat::Table => print_history_table(&history),
    }
    Ok(())
}

fn print_history_table(history: &[HistoryEntry]) {
    println!("{}", "Translation History (newest first)".bold().cyan());
    println!("{}", "=".repeat(70));
    for (i, entry) in history.iter().enumerate() {
        let line = format!(
            "  {:<10} {:<28} → {}",
            truncate(&entry.model_id, 10),
            truncate(&entry.source_text, 28),
            truncate(&entry.translated_text, 28),
        );
        if i % 2 == 0 {
            println!("{}", line);
        } else {
            println!("{}", line.dimmed());
        }
    }
}

fn print_history_csv(history: &[HistoryEntry]) {
    println!("timestamp,model_id,source_lang,target_lang,source_text,translated_text");
    for e in history {
        println!(
            "{},{},{},{},{},{}",
            e.timestamp,
            e.model_id,
            e.source_lang,
            e.target_lang,
            csv_field(&e.source_text),
            csv_field(&e.translated_text),
        );
    }
}

/// Print the last used model, if any.
pub fn run_last_model() -> Result<()> {
    let cfg = config::load();
    match PreferenceStore::new(open_store(&cfg)).last_used_model() {
        Some(id) => println!("{id}"),
        None => println!("{}", "No model used yet.".yellow()),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// transctl correct | corrections
// ---------------------------------------------------------------------------

/// What became of a correction relay by the time the command returns.
#[derive(Debug)]
enum RelayOutcome {
    Disabled,
    Sent(serde_json::Value),
    Failed(String),
    StillRunning,
}

/// Wait up to `timeout` for an in-flight relay so the process does not exit
/// underneath it.
fn settle_relay(relay: Option<RelayHandle>, timeout: Duration) -> RelayOutcome {
    let Some(handle) = relay else {
        return RelayOutcome::Disabled;
    };
    match handle.wait_timeout(timeout) {
        Some(Ok(reply)) => RelayOutcome::Sent(reply),
        Some(Err(e)) => RelayOutcome::Failed(format!("{e:#}")),
        None => RelayOutcome::StillRunning,
    }
}

/// Save a correction. With `[corrections] relay_enabled` it is also sent to
/// the server before the command returns. A failed relay is reported but
/// does not fail the command.
pub fn run_correct(correction: NewCorrection) -> Result<()> {
    let cfg = config::load();
    let client = ApiClient::from_config(&cfg.server);
    let store = CorrectionStore::with_relay(
        open_store(&cfg),
        Arc::new(client),
        cfg.corrections.relay_enabled,
    );

    let key = format!("{}:{}", correction.model_id, correction.source_text);
    let relay = store.save_correction(correction)?;
    println!("{} Correction saved ({})", "✓".green().bold(), key.dimmed());

    let timeout = Duration::from_millis(cfg.server.timeout_ms) + Duration::from_secs(1);
    match settle_relay(relay, timeout) {
        RelayOutcome::Sent(reply) => println!("  {} relayed: {}", "·".dimmed(), reply),
        RelayOutcome::Failed(e) => println!("  {} relay failed: {e}", "✗".red()),
        RelayOutcome::StillRunning => {
            log::warn!("correction relay still running after {timeout:?}, giving up");
            println!("  {} relay did not finish in time", "✗".red());
        }
        RelayOutcome::Disabled => {
            println!("  {}", "Stored locally only (relay disabled).".dimmed())
        }
    }
    Ok(())
}

/// List all stored corrections.
pub fn run_corrections_list(format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let corrections = CorrectionStore::local(open_store(&cfg)).all_corrections();

    if corrections.is_empty() {
        println!("{}", "No corrections stored.".yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => print_json(&corrections)?,
        OutputFormat::Csv => print_corrections_csv(&corrections),
        OutputFormat::Table => print_corrections_table(&corrections),
    }
    Ok(())
}

fn print_corrections_table(corrections: &[CorrectionRecord]) {
    println!("{}", "Translation Corrections".bold().cyan());
    println!("{}", "=".repeat(70));
    println!(
        "  {:<10} {:<18} {:<18} Corrected",
        "Model", "Source", "Original"
    );
    println!("  {}", "-".repeat(68));
    for c in corrections {
        println!(
            "  {:<10} {:<18} {:<18} {}",
            truncate(&c.model_id, 10),
            truncate(&c.source_text, 18),
            truncate(&c.original_translation, 18).dimmed(),
            c.corrected_translation.green(),
        );
    }
}

fn print_corrections_csv(corrections: &[CorrectionRecord]) {
    println!("timestamp,model_id,source_text,original_translation,corrected_translation");
    for c in corrections {
        println!(
            "{},{},{},{},{}",
            c.timestamp,
            c.model_id,
            csv_field(&c.source_text),
            csv_field(&c.original_translation),
            csv_field(&c.corrected_translation),
        );
    }
}

/// Show the correction for one `(model, source text)` pair.
pub fn run_corrections_get(model_id: &str, source_text: &str) -> Result<()> {
    let cfg = config::load();
    match CorrectionStore::local(open_store(&cfg)).get_correction(model_id, source_text) {
        Some(record) => print_json(&record),
        None => {
            println!("{}", "No correction for that text.".yellow());
            Ok(())
        }
    }
}

/// Result of one pull of server-side corrections.
#[derive(Debug)]
pub struct FetchSummary {
    pub received: usize,
    pub added: Vec<RemoteCorrection>,
}

/// Pull the corrections collected since the last fetch, keep the ones with
/// unseen ids, and append those to `csv` when given. The fetch time is
/// recorded only after everything was written.
pub fn sync_corrections(
    client: &ApiClient,
    store: &CorrectionStore,
    csv: Option<&Path>,
) -> Result<FetchSummary> {
    let since = store.last_fetch();
    let started = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    let fetched = client
        .fetch_corrections(since.as_deref())
        .with_context(|| format!("failed to fetch corrections from {}", client.base_url()))?;
    let received = fetched.len();
    if received == 0 {
        return Ok(FetchSummary {
            received,
            added: Vec::new(),
        });
    }

    let added = store.merge_fetched(fetched)?;
    if let Some(path) = csv {
        append_corrections_csv(path, &added)?;
    }
    store.save_last_fetch(&started)?;
    log::info!("fetched {received} corrections, {} new", added.len());

    Ok(FetchSummary { received, added })
}

/// Append rows to a corrections CSV, writing the header when the file is
/// new.
fn append_corrections_csv(path: &Path, corrections: &[RemoteCorrection]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let mut out = String::new();
    if !path.exists() {
        out.push_str(
            "id,timestamp,model_id,source_text,original_translation,corrected_translation,source_lang,target_lang\n",
        );
    }
    for c in corrections {
        let id = if c.id.is_null() { String::new() } else { c.id_key() };
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{}\n",
            csv_field(&id),
            csv_field(&c.timestamp),
            csv_field(&c.model_id),
            csv_field(&c.source_text),
            csv_field(&c.original_translation),
            csv_field(&c.corrected_translation),
            csv_field(&c.source_lang),
            csv_field(&c.target_lang),
        ));
    }

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.write_all(out.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Pull server-side corrections into the local store.
pub fn run_corrections_fetch(csv: Option<&str>) -> Result<()> {
    let cfg = config::load();
    let client = ApiClient::from_config(&cfg.server);
    let store = CorrectionStore::local(open_store(&cfg));
    let csv = csv.map(config::expand_tilde);

    let summary = sync_corrections(&client, &store, csv.as_deref())?;
    if summary.received == 0 {
        println!("{}", "No new corrections on the server.".yellow());
        return Ok(());
    }

    println!(
        "{} {} received, {} new",
        "✓".green().bold(),
        summary.received,
        summary.added.len()
    );
    if let Some(path) = &csv {
        println!("  {} {}", "CSV:".bold(), path.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// transctl collect
// ---------------------------------------------------------------------------

/// Sample the server and this host for `seconds`, then print the report of
/// `kind` and optionally export it.
pub fn run_collect(seconds: u64, kind: ExportKind, export: bool, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let client = ApiClient::from_config(&cfg.server);
    let probe = HostProbe::new(client.request_log());
    let collector: SharedCollector = Arc::new(Mutex::new(MetricsCollector::new(&cfg.collector)));

    println!(
        "{} {} for {seconds}s...",
        "Collecting from".dimmed(),
        client.base_url()
    );
    let sampler = Sampler::start(collector.clone(), client, Some(Box::new(probe)), &cfg.collector)
        .context("failed to start sampling threads")?;
    thread::sleep(Duration::from_secs(seconds));
    sampler.stop();

    let collector = lock(&collector);
    let now = now_ms();
    let locale = cfg.report.locale;

    match (kind, format) {
        (_, OutputFormat::Csv) => print_series_csv(&report::technical_report(&collector, now)),
        (ExportKind::Performance, OutputFormat::Json) => {
            print_json(&report::technical_report(&collector, now))?
        }
        (ExportKind::Performance, OutputFormat::Table) => {
            print_technical_table(&report::technical_report(&collector, now))
        }
        (ExportKind::Browser, OutputFormat::Json) => {
            print_json(&report::client_report(&collector, locale, now))?
        }
        (ExportKind::Browser, OutputFormat::Table) => {
            print_client_table(&report::client_report(&collector, locale, now))
        }
        (ExportKind::Comparative, OutputFormat::Json) => {
            print_json(&report::comparative_report(&collector, locale, now))?
        }
        (ExportKind::Comparative, OutputFormat::Table) => {
            print_comparative_table(&report::comparative_report(&collector, locale, now))
        }
        (ExportKind::Server, OutputFormat::Json) => {
            print_json(&report::server_report(&collector, locale, now))?
        }
        (ExportKind::Server, OutputFormat::Table) => {
            let comparative = report::comparative_report(&collector, locale, now);
            print_server_section(&comparative.servidor);
        }
    }

    if export {
        let dir = config::expand_tilde(&cfg.report.export_dir);
        let path = report::export(&collector, kind, locale, &dir, now)?;
        println!();
        println!("{} Exported to {}", "✓".green().bold(), path.display());
    }
    Ok(())
}

fn print_stats_row(name: &str, stats: &SeriesStats, unit: &str) {
    println!(
        "  {:<14} {:>9.1}{unit:<3} {:>9.1}{unit:<3} {:>9.1}{unit:<3} {:>9.1}{unit:<3}",
        name, stats.average, stats.min, stats.max, stats.median,
    );
}

fn print_system_table(system: &SystemMetrics) {
    println!(
        "  {:<14} {:>12} {:>12} {:>12} {:>12}",
        "Series", "Average", "Min", "Max", "Median"
    );
    println!("  {}", "-".repeat(66));
    print_stats_row("CPU", &system.cpu, "%");
    print_stats_row("Memory", &system.memory, "MB");
    print_stats_row("Temperature", &system.temperature, "°C");
}

fn print_technical_table(report: &TechnicalReport) {
    println!("{}", "transctl Performance Report".bold().cyan());
    println!("{}", "=".repeat(70));
    if let Some(duration) = report.collection_period.duration {
        println!("  {} {:.1}s", "Collection period:".bold(), duration as f64 / 1000.0);
    }
    println!();

    println!("{}", "Server".bold().cyan());
    match &report.system_metrics {
        Some(system) => print_system_table(system),
        None => println!("  {}", "no server samples".dimmed()),
    }
    println!();

    println!("{}", "Translations".bold().cyan());
    match &report.translation_metrics {
        Some(t) => {
            println!("  {} {}", "Total:        ".bold(), t.total_translations);
            println!(
                "  {} {:.0} ms avg, {:.0} min, {:.0} max, {:.0} median",
                "Response time:".bold(),
                t.average_response_time,
                t.min_response_time,
                t.max_response_time,
                t.median_response_time,
            );
            println!("  {} {:.2}/min", "Throughput:   ".bold(), t.throughput);
        }
        None => println!("  {}", "no translations recorded".dimmed()),
    }
    println!();

    println!("{}", "Client".bold().cyan());
    match &report.browser_metrics {
        Some(client) => {
            if let Some(heap) = &client.js_heap_memory {
                println!(
                    "  {} {:.2} MB avg, {:.2} MB peak ({:.1}% of limit)",
                    "Memory:       ".bold(),
                    heap.average_mb,
                    heap.max_mb,
                    heap.max_percent,
                );
            }
            if let Some(resources) = &client.resources {
                println!(
                    "  {} {} ({:.0} ms avg)",
                    "Resources:    ".bold(),
                    resources.count,
                    resources.avg_duration,
                );
            }
        }
        None => println!("  {}", "no client samples".dimmed()),
    }

    if !report.errors.is_empty() {
        println!();
        println!(
            "{}",
            format!("{} sampling errors", report.errors.len()).yellow()
        );
        for error in report.errors.iter().rev().take(5) {
            println!("  {} {}", "✗".red(), error.message.dimmed());
        }
    }
}

fn print_series_csv(report: &TechnicalReport) {
    println!("series,average,min,max,median");
    if let Some(system) = &report.system_metrics {
        for (name, s) in [
            ("cpu", &system.cpu),
            ("memory", &system.memory),
            ("temperature", &system.temperature),
        ] {
            println!("{name},{:.2},{:.2},{:.2},{:.2}", s.average, s.min, s.max, s.median);
        }
    }
    if let Some(h) = report
        .browser_metrics
        .as_ref()
        .and_then(|client| client.js_heap_memory.as_ref())
    {
        println!(
            "heap_mb,{:.2},{:.2},{:.2},{:.2}",
            h.average_mb, h.min_mb, h.max_mb, h.median_mb
        );
    }
    if let Some(t) = &report.translation_metrics {
        println!(
            "response_time_ms,{:.2},{:.2},{:.2},{:.2}",
            t.average_response_time, t.min_response_time, t.max_response_time, t.median_response_time
        );
    }
}

fn print_client_table(report: &ClientReport) {
    println!("{}", "transctl Client Report".bold().cyan());
    println!("{}", "=".repeat(50));
    match report {
        ClientReport::Unavailable {
            error,
            collection_status,
            ..
        } => {
            println!("  {} {}", "✗".red().bold(), error);
            println!("  {} {}", "Collection:".bold(), collection_status);
        }
        ClientReport::Available {
            metrics,
            performance_score,
            compared_to_server,
            ..
        } => {
            println!(
                "  {} {}",
                "Performance score:".bold(),
                colorize_score(*performance_score)
            );
            if let Some(heap) = &metrics.js_heap_memory {
                println!(
                    "  {} {:.2} MB avg / {:.2} MB peak",
                    "Memory:           ".bold(),
                    heap.average_mb,
                    heap.max_mb
                );
            }
            if let Some(conn) = &metrics.network_connection {
                println!(
                    "  {} {} (rtt {})",
                    "Network:          ".bold(),
                    conn.effective_type,
                    conn.rtt_ms
                        .map_or_else(|| "N/A".to_string(), |rtt| format!("{rtt} ms")),
                );
            }
            if let Some(interactions) = &metrics.user_interactions {
                println!(
                    "  {} {} clicks, {} keys, {} sessions",
                    "Interactions:     ".bold(),
                    interactions.clicks,
                    interactions.key_presses,
                    interactions.sessions.len(),
                );
            }
            println!(
                "  {} {}",
                "Memory vs server: ".bold(),
                compared_to_server.memory_ratio
            );
        }
    }
}

fn print_comparative_table(report: &ComparativeReport) {
    println!("{}", "transctl Comparative Report".bold().cyan());
    println!("{}", "=".repeat(60));
    println!();
    print_server_section(&report.servidor);
    println!();
    print_client_section(&report.computador_local);
    println!();

    let cmp = &report.comparativo;
    println!("{}", "Comparison".bold().cyan());
    print_section("Translation", &cmp.traducao, |t| {
        format!("{} avg, {}", t.tempo_medio_resposta, t.throughput)
    });
    println!("  {:<18} {}", "Browser memory".bold(), cmp.memoria_navegador_vs_servidor);
    println!();
    println!("  {}", cmp.resumo.titulo.bold());
    println!("  {}", cmp.resumo.conclusao.dimmed());
}

fn print_server_section(server: &ServerSection) {
    println!("{}", server.descricao.bold().cyan());
    println!("  {:<18} {}", "Type".bold(), server.sistema.tipo);
    println!(
        "  {:<18} {} / {}",
        "Platform".bold(),
        server.sistema.plataforma,
        server.sistema.arquitetura
    );
    print_section("CPU", &server.cpu, |u| {
        format!("{} now, {} avg, {} peak", u.utilizacao_atual, u.utilizacao_media, u.utilizacao_pico)
    });
    print_section("Memory", &server.memoria, |u| {
        format!("{} now, {} avg, {} peak", u.utilizacao_atual, u.utilizacao_media, u.utilizacao_pico)
    });
    print_section("Temperature", &server.temperatura, |t| {
        format!("{} now, {} avg, {} peak", t.atual, t.media, t.pico)
    });
    print_section("Storage", &server.armazenamento, |s| {
        format!("{} used of {}, {} free", s.usado, s.total, s.livre)
    });
    println!("  {:<18} {}", "Translations today".bold(), server.traducoes_hoje);
    if let Some(pi) = &server.detalhes_raspberry_pi {
        println!(
            "  {:<18} {} at {}: {}",
            "Raspberry Pi".bold(),
            pi.modelo,
            pi.temperatura_atual,
            pi.estado_termico.yellow()
        );
    }
}

fn print_client_section(client: &ClientSection) {
    println!("{}", client.descricao.bold().cyan());
    print_section("Client", &client.navegador, |b| {
        format!("{} ({})", truncate(&b.user_agent, 40), b.plataforma)
    });
    print_section("Memory", &client.memoria, |m| {
        format!("{} now, {} of limit", m.utilizacao_atual, m.percentual_utilizado)
    });
    print_section("Network", &client.rede, |n| {
        format!("{}, latency {}", n.tipo_conexao, n.latencia)
    });
    print_section("Page load", &client.desempenho, |p| p.tempo_carregamento_total.clone());
    print_section("Resources", &client.recursos, |r| {
        format!("{} loaded, {} avg", r.total_recursos_carregados, r.tempo_medio_carregamento)
    });
}

fn print_section<T>(name: &str, section: &Section<T>, describe: impl Fn(&T) -> String) {
    match section {
        Section::Data(data) => println!("  {:<18} {}", name.bold(), describe(data)),
        Section::Missing(reason) => println!("  {:<18} {}", name.bold(), reason.dimmed()),
    }
}

fn colorize_score(score: u8) -> colored::ColoredString {
    let text = format!("{score}/100");
    match score {
        80.. => text.green().bold(),
        50..80 => text.yellow().bold(),
        _ => text.red().bold(),
    }
}

// ---------------------------------------------------------------------------
// transctl keepalive
// ---------------------------------------------------------------------------

/// Ping the server every `[keepalive] interval_secs` until interrupted, or
/// once with `once`.
pub fn run_keepalive(once: bool) -> Result<()> {
    let cfg = config::load();
    let client = ApiClient::from_config(&cfg.server);
    let url = keepalive::target_url(&cfg.keepalive, &client);

    if once {
        if !keepalive::ping_once(&client, &url) {
            anyhow::bail!("server did not answer 200 at {url}");
        }
        return Ok(());
    }

    println!(
        "{} {url} every {}s. Press Ctrl+C to stop.",
        "Keeping alive".bold().cyan(),
        cfg.keepalive.interval_secs
    );
    // The sender lives until the process is interrupted.
    let (_stop_tx, stop_rx) = mpsc::channel::<()>();
    keepalive::run(
        &client,
        &url,
        Duration::from_secs(cfg.keepalive.interval_secs),
        &stop_rx,
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// transctl health
// ---------------------------------------------------------------------------

/// Check config files, the local store, and server reachability.
pub fn run_health() -> Result<()> {
    println!("{}", "transctl Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let cfg = config::load();
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.transctl/config.toml found"
        } else {
            "not found (run `transctl config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".transctl.toml found"
        } else {
            "none (optional)"
        },
    );

    // Local store
    let store = FileStore::from_config(&cfg.storage);
    let store_exists = store.path().exists();
    print_health_item(
        "Local store",
        store_exists,
        &if store_exists {
            store.path().display().to_string()
        } else {
            format!("{} (created on first write)", store.path().display())
        },
    );
    let store: Arc<dyn KeyValueStore> = Arc::new(store);
    let history = PreferenceStore::new(store.clone()).translation_history().len();
    let corrections = CorrectionStore::local(store).all_corrections().len();
    print_health_item(
        "Stored data",
        true,
        &format!("{history} history entries, {corrections} corrections"),
    );
    print_health_item(
        "Correction relay",
        cfg.corrections.relay_enabled,
        if cfg.corrections.relay_enabled {
            "enabled"
        } else {
            "disabled (corrections stay local)"
        },
    );

    // Server
    let client = ApiClient::from_config(&cfg.server);
    let url = format!("{}/api/models", client.base_url());
    let (server_ok, server_detail) = match client.ping(&url) {
        Ok(p) if p.is_ok() => (
            true,
            format!("reachable at {} ({:.0} ms)", client.base_url(), p.latency.as_secs_f64() * 1000.0),
        ),
        Ok(p) => (false, format!("answered HTTP {}", p.status)),
        Err(e) => (false, format!("not reachable: {e}")),
    };
    print_health_item("Translation server", server_ok, &server_detail);

    if server_ok {
        match client.system_metrics() {
            Ok(m) => {
                let device = match (m.is_raspberry_pi, &m.raspberry_pi_model) {
                    (true, Some(model)) => format!("Raspberry Pi {model}"),
                    (true, None) => "Raspberry Pi".to_string(),
                    _ => m.platform.clone().unwrap_or_else(|| "unknown".to_string()),
                };
                let thermal = render::ThermalState::from_celsius(m.temperature);
                print_health_item(
                    "Server device",
                    !matches!(
                        thermal,
                        render::ThermalState::High | render::ThermalState::Critical
                    ),
                    &format!("{device}, {:.1}°C ({})", m.temperature, thermal.label()),
                );
            }
            Err(e) => print_health_item("System metrics", false, &e.to_string()),
        }
    }

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<25} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// transctl log-format
// ---------------------------------------------------------------------------

/// Print `path` with log levels and known failures wrapped in HTML spans.
pub fn run_log_format(path: &str) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
    for line in text.lines() {
        println!("{}", render::format_log_line(line));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// transctl web
// ---------------------------------------------------------------------------

/// Run the dashboard until interrupted.
pub fn run_web(addr: Option<String>, no_open: bool) -> Result<()> {
    let mut cfg = config::load();
    if let Some(addr) = addr {
        cfg.dashboard.addr = addr;
    }
    if no_open {
        cfg.dashboard.open_browser = false;
    }
    crate::web::serve(cfg)
}

// ---------------------------------------------------------------------------
// transctl config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective transctl Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    for (exists, name) in [
        (global_exists, "~/.transctl/config.toml"),
        (project_exists, ".transctl.toml"),
    ] {
        if exists {
            println!("  {} {}", "✓".green(), name.dimmed());
        } else {
            println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
        }
    }
    println!(
        "  {} {}",
        "·".dimmed(),
        "TRANSCTL_* environment variables".dimmed()
    );

    Ok(())
}

/// Initialize a default config file at `~/.transctl/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!(
        "  {}",
        "Edit the file to point transctl at your translation server.".dimmed()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

/// Quote a CSV field when it contains a separator, quote, or newline.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{CorrectionRelay, MemoryStore};

    struct CountingRelay {
        sent: Mutex<usize>,
        delay: Duration,
        fail: bool,
    }

    impl CountingRelay {
        fn new(delay: Duration, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(0),
                delay,
                fail,
            })
        }
    }

    impl CorrectionRelay for CountingRelay {
        fn send_correction(&self, _: &NewCorrection) -> Result<serde_json::Value> {
            thread::sleep(self.delay);
            *self.sent.lock().unwrap() += 1;
            if self.fail {
                anyhow::bail!("connection refused");
            }
            Ok(serde_json::json!({ "success": true }))
        }
    }

    fn correction() -> NewCorrection {
        NewCorrection {
            source_text: "obrigado".to_string(),
            original_translation: "thank".to_string(),
            corrected_translation: "thank you".to_string(),
            model_id: "pt-en".to_string(),
            source_lang: "pt".to_string(),
            target_lang: "en".to_string(),
        }
    }

    #[test]
    fn relay_is_delivered_before_the_command_returns() {
        let relay = CountingRelay::new(Duration::from_millis(100), false);
        let store = CorrectionStore::with_relay(Arc::new(MemoryStore::new()), relay.clone(), true);

        let handle = store.save_correction(correction()).unwrap();
        let outcome = settle_relay(handle, Duration::from_secs(5));

        assert!(matches!(outcome, RelayOutcome::Sent(ref reply) if reply["success"] == true));
        assert_eq!(*relay.sent.lock().unwrap(), 1);
    }

    #[test]
    fn relay_failure_is_reported_not_raised() {
        let relay = CountingRelay::new(Duration::ZERO, true);
        let store = CorrectionStore::with_relay(Arc::new(MemoryStore::new()), relay.clone(), true);

        let handle = store.save_correction(correction()).unwrap();
        match settle_relay(handle, Duration::from_secs(5)) {
            RelayOutcome::Failed(message) => assert!(message.contains("connection refused")),
            other => panic!("expected a failed relay, got {other:?}"),
        }
        assert!(store.has_correction_for("pt-en", "obrigado"));
    }

    #[test]
    fn disabled_relay_settles_immediately() {
        let relay = CountingRelay::new(Duration::ZERO, false);
        let store =
            CorrectionStore::with_relay(Arc::new(MemoryStore::new()), relay.clone(), false);

        let handle = store.save_correction(correction()).unwrap();
        assert!(matches!(settle_relay(handle, Duration::from_secs(5)), RelayOutcome::Disabled));
        assert_eq!(*relay.sent.lock().unwrap(), 0);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("ab", 2), "ab");
        assert_eq!(truncate("tradução automática", 8), "traduçã…");
    }

    #[test]
    fn test_csv_field() {
        assert_eq!(csv_field("olá"), "olá");
        assert_eq!(csv_field("a, b"), "\"a, b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("csv")), OutputFormat::Csv);
        assert_eq!(
            OutputFormat::from_str_opt(Some("unknown")),
            OutputFormat::Table
        );
    }

    #[test]
    fn score_colors_by_band() {
        // Only the text is checked; color codes depend on the terminal.
        assert!(colorize_score(95).to_string().contains("95/100"));
        assert!(colorize_score(0).to_string().contains("0/100"));
    }
}
