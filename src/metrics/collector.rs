//! The metrics collector.
//!
//! [`MetricsCollector`] is plain owned data. Callers construct one, pass it
//! explicitly (behind `Arc<Mutex<_>>` when timers share it, see
//! [`Sampler`](super::Sampler)), and supply the current time to every
//! operation so that behavior is deterministic under test.
//!
//! Lifecycle: **Idle** ⇄ **Collecting**. Samples may be recorded in either
//! state; user interactions are only counted while collecting.

use std::collections::BTreeMap;

use serde::Serialize;

use super::interactions::{InteractionKind, InteractionTracker};
use super::probe::{ClientInfo, ClientProbe, ConnectionReading, HeapReading, NavigationTiming};
use super::series::{BoundedSeries, Sample};
use super::stats::{self, SeriesStats};
use crate::client::{ApiClient, DiskUsage, SystemMetricsResponse};
use crate::config::schema::CollectorConfig;

const MB: f64 = 1024.0 * 1024.0;

// ---------------------------------------------------------------------------
// Recorded data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CollectionState {
    Idle,
    Collecting,
}

/// Latest description of the server, replaced on every successful poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub platform: String,
    pub architecture: String,
    pub is_raspberry_pi: bool,
    pub raspberry_pi_model: Option<String>,
    pub python_version: String,
    pub encoding: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_usage: Option<DiskUsage>,
    pub timestamp: i64,
}

impl ServerInfo {
    fn from_reply(reply: &SystemMetricsResponse, now: i64) -> Self {
        Self {
            platform: reply
                .platform
                .clone()
                .unwrap_or_else(|| "Desconhecido".to_string()),
            architecture: reply
                .architecture
                .clone()
                .unwrap_or_else(|| "Desconhecido".to_string()),
            is_raspberry_pi: reply.is_raspberry_pi,
            raspberry_pi_model: reply.raspberry_pi_model.clone(),
            python_version: reply
                .python_version
                .clone()
                .unwrap_or_else(|| "Desconhecido".to_string()),
            encoding: reply.encoding.clone().unwrap_or_else(|| "utf-8".to_string()),
            disk_usage: reply.disk_usage.clone(),
            timestamp: now,
        }
    }
}

/// One completed translation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationTiming {
    /// End of the request, epoch ms.
    pub timestamp: i64,
    pub response_time: i64,
    pub source_length: usize,
    pub target_length: usize,
    pub model_id: String,
    pub chars_per_second: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    SystemMetrics,
    ClientMetrics,
}

/// A sampling failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectorError {
    pub timestamp: i64,
    #[serde(rename = "error")]
    pub message: String,
    #[serde(rename = "type")]
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeapSample {
    pub timestamp: i64,
    pub used_js_heap_size: u64,
    pub total_js_heap_size: u64,
    pub js_heap_size_limit: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSample {
    pub timestamp: i64,
    pub effective_type: String,
    pub downlink: Option<f64>,
    pub rtt: Option<f64>,
    pub save_data: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeTotals {
    pub count: usize,
    pub total_duration: f64,
}

/// Running totals over every resource seen so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTotals {
    pub count: usize,
    pub total_duration: f64,
    pub by_type: BTreeMap<String, TypeTotals>,
}

// ---------------------------------------------------------------------------
// Derived metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationMetrics {
    pub total_translations: usize,
    pub average_response_time: f64,
    pub min_response_time: f64,
    pub max_response_time: f64,
    pub median_response_time: f64,
    pub average_text_length: f64,
    /// Translations per minute since collection started.
    pub throughput: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SystemMetrics {
    pub cpu: SeriesStats,
    pub memory: SeriesStats,
    pub temperature: SeriesStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeapStats {
    #[serde(rename = "averageMB")]
    pub average_mb: f64,
    #[serde(rename = "minMB")]
    pub min_mb: f64,
    #[serde(rename = "maxMB")]
    pub max_mb: f64,
    #[serde(rename = "medianMB")]
    pub median_mb: f64,
    #[serde(rename = "averagePercent")]
    pub average_percent: f64,
    #[serde(rename = "maxPercent")]
    pub max_percent: f64,
}

/// Durations derived from [`NavigationTiming`], in ms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLoad {
    pub total_load_time: f64,
    pub dom_interactive_time: f64,
    pub dom_complete_time: f64,
    pub dns_lookup_time: f64,
    pub tcp_connect_time: f64,
    pub response_time: f64,
    pub processing_time: f64,
    pub redirect_time: f64,
}

impl From<&NavigationTiming> for PageLoad {
    fn from(t: &NavigationTiming) -> Self {
        Self {
            total_load_time: t.load_event_end - t.navigation_start,
            dom_interactive_time: t.dom_interactive - t.navigation_start,
            dom_complete_time: t.dom_complete - t.navigation_start,
            dns_lookup_time: t.domain_lookup_end - t.domain_lookup_start,
            tcp_connect_time: t.connect_end - t.connect_start,
            response_time: t.response_end - t.response_start,
            processing_time: t.dom_complete - t.response_end,
            redirect_time: t.redirect_end - t.redirect_start,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSummary {
    pub count: usize,
    pub total_duration: f64,
    pub avg_duration: f64,
    pub by_type: BTreeMap<String, TypeTotals>,
}

/// Aggregated client-side metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub js_heap_memory: Option<HeapStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_connection: Option<ConnectionReading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_load: Option<PageLoad>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_info: Option<ClientInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_interactions: Option<InteractionTracker>,
}

// ---------------------------------------------------------------------------
// Collector
// ---------------------------------------------------------------------------

/// Owned metrics state with an Idle/Collecting lifecycle.
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    state: CollectionState,
    start_time: Option<i64>,
    cpu: BoundedSeries<Sample>,
    memory: BoundedSeries<Sample>,
    temperature: BoundedSeries<Sample>,
    translations_today: u64,
    server_info: Option<ServerInfo>,
    translation_times: Vec<TranslationTiming>,
    heap: BoundedSeries<HeapSample>,
    connection: BoundedSeries<ConnectionSample>,
    navigation: Option<NavigationTiming>,
    client_info: Option<ClientInfo>,
    resources: Option<ResourceTotals>,
    /// Absolute index of the next unread resource entry of the current page.
    resource_cursor: usize,
    page_id: Option<String>,
    interactions: Option<InteractionTracker>,
    errors: Vec<CollectorError>,
    session_timeout_ms: i64,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new(&CollectorConfig::default())
    }
}

impl MetricsCollector {
    pub fn new(config: &CollectorConfig) -> Self {
        Self {
            state: CollectionState::Idle,
            start_time: None,
            cpu: BoundedSeries::new(config.system_series_cap),
            memory: BoundedSeries::new(config.system_series_cap),
            temperature: BoundedSeries::new(config.system_series_cap),
            translations_today: 0,
            server_info: None,
            translation_times: Vec::new(),
            heap: BoundedSeries::new(config.client_series_cap),
            connection: BoundedSeries::new(config.client_series_cap),
            navigation: None,
            client_info: None,
            resources: None,
            resource_cursor: 0,
            page_id: None,
            interactions: None,
            errors: Vec::new(),
            session_timeout_ms: (config.session_timeout_secs as i64).saturating_mul(1000),
        }
    }

    // -- Lifecycle --

    pub fn state(&self) -> CollectionState {
        self.state
    }

    pub fn is_collecting(&self) -> bool {
        self.state == CollectionState::Collecting
    }

    pub fn start_time(&self) -> Option<i64> {
        self.start_time
    }

    /// Idle → Collecting. Records the start time and opens an interaction
    /// session. Returns `false` if already collecting.
    pub fn start_collection(&mut self, now: i64) -> bool {
        if self.is_collecting() {
            return false;
        }
        self.state = CollectionState::Collecting;
        self.start_time = Some(now);
        match &mut self.interactions {
            Some(tracker) => tracker.resume(now),
            None => self.interactions = Some(InteractionTracker::new(now, self.session_timeout_ms)),
        }
        true
    }

    /// Collecting → Idle. Closes the open interaction session at `now`.
    /// Returns `false` if already idle.
    pub fn stop_collection(&mut self, now: i64) -> bool {
        if !self.is_collecting() {
            return false;
        }
        self.state = CollectionState::Idle;
        if let Some(tracker) = &mut self.interactions {
            tracker.close_current(now);
        }
        true
    }

    // -- System sampling --

    /// Poll `GET /api/system-metrics` once and record the outcome.
    pub fn collect_system_metrics(&mut self, client: &ApiClient, now: i64) {
        match client.system_metrics() {
            Ok(reply) => self.record_system_metrics(&reply, now),
            Err(e) => self.record_system_error(e.to_string(), now),
        }
    }

    /// Append one successful poll to the cpu / memory / temperature series
    /// and replace the server-info slot.
    pub fn record_system_metrics(&mut self, reply: &SystemMetricsResponse, now: i64) {
        self.cpu.push(Sample::new(now, reply.cpu_usage));
        self.memory.push(Sample::new(now, reply.memory_usage));
        self.temperature.push(Sample::new(now, reply.temperature));
        self.translations_today = reply.translations_today;
        self.server_info = Some(ServerInfo::from_reply(reply, now));
    }

    pub fn record_system_error(&mut self, message: impl Into<String>, now: i64) {
        let message = message.into();
        log::warn!("system metrics poll failed: {message}");
        self.errors.push(CollectorError {
            timestamp: now,
            message,
            kind: ErrorKind::SystemMetrics,
        });
    }

    // -- Client sampling --

    /// Read `probe` once and fold whatever it offers into the client series.
    pub fn collect_client_metrics(&mut self, probe: &mut dyn ClientProbe, now: i64) {
        let reading = match probe.read() {
            Ok(reading) => reading,
            Err(e) => {
                log::warn!("client probe failed: {e:#}");
                self.errors.push(CollectorError {
                    timestamp: now,
                    message: format!("{e:#}"),
                    kind: ErrorKind::ClientMetrics,
                });
                return;
            }
        };

        if let Some(heap) = reading.heap {
            self.record_heap(heap, now);
        }

        if let Some(connection) = reading.connection {
            self.connection.push(ConnectionSample {
                timestamp: now,
                effective_type: connection.effective_type,
                downlink: connection.downlink_mbps,
                rtt: connection.rtt_ms,
                save_data: connection.save_data,
            });
        }

        if self.navigation.is_none() {
            self.navigation = reading.navigation;
        }

        if self.client_info.is_none() {
            self.client_info = reading.client_info;
        }

        if let Some(entries) = reading.resources {
            let offset = reading.resources_offset;
            let skip = self.resource_cursor.saturating_sub(offset);
            self.resource_cursor = offset + entries.len();
            let totals = self.resources.get_or_insert_with(ResourceTotals::default);
            for entry in entries.iter().skip(skip) {
                totals.count += 1;
                totals.total_duration += entry.duration_ms;
                let by_type = totals.by_type.entry(entry.initiator_type.clone()).or_default();
                by_type.count += 1;
                by_type.total_duration += entry.duration_ms;
            }
        }
    }

    fn record_heap(&mut self, heap: HeapReading, now: i64) {
        self.heap.push(HeapSample {
            timestamp: now,
            used_js_heap_size: heap.used,
            total_js_heap_size: heap.total,
            js_heap_size_limit: heap.limit,
        });
    }

    /// Note which dashboard page is posting. A new page starts its resource
    /// list from zero and has its own navigation timing, so both are reset.
    /// Returns whether the page changed.
    pub fn begin_page(&mut self, page_id: &str) -> bool {
        if self.page_id.as_deref() == Some(page_id) {
            return false;
        }
        if self.page_id.is_some() {
            log::debug!("dashboard page reloaded, resetting page readings");
        }
        self.page_id = Some(page_id.to_string());
        self.resource_cursor = 0;
        self.navigation = None;
        true
    }

    // -- Interactions --

    /// Count one user activity. Ignored while idle; returns whether it was
    /// counted.
    pub fn record_interaction(&mut self, kind: InteractionKind, now: i64) -> bool {
        if !self.is_collecting() {
            return false;
        }
        match &mut self.interactions {
            Some(tracker) => {
                tracker.record(kind, now);
                true
            }
            None => false,
        }
    }

    /// Close the open session if the user has been idle for the timeout.
    pub fn sweep_inactivity(&mut self, now: i64) -> bool {
        if !self.is_collecting() {
            return false;
        }
        self.interactions
            .as_mut()
            .is_some_and(|tracker| tracker.sweep(now))
    }

    // -- Translations --

    /// Append a timing sample for a translation that ran from `start` to
    /// `end` (epoch ms). A zero-length duration records 0 chars/sec.
    pub fn record_translation_time(
        &mut self,
        start: i64,
        end: i64,
        source_length: usize,
        target_length: usize,
        model_id: &str,
    ) {
        let response_time = end - start;
        let chars_per_second = if response_time > 0 {
            source_length as f64 / (response_time as f64 / 1000.0)
        } else {
            0.0
        };
        log::info!("translation recorded: {response_time}ms for {source_length} chars");
        self.translation_times.push(TranslationTiming {
            timestamp: end,
            response_time,
            source_length,
            target_length,
            model_id: model_id.to_string(),
            chars_per_second,
        });
    }

    // -- Aggregation --

    pub fn calculate_translation_metrics(&self, now: i64) -> Option<TranslationMetrics> {
        let times: Vec<f64> = self
            .translation_times
            .iter()
            .map(|t| t.response_time as f64)
            .collect();
        let lengths: Vec<f64> = self
            .translation_times
            .iter()
            .map(|t| t.source_length as f64)
            .collect();
        let summary = stats::summarize(&times)?;

        let since = self
            .start_time
            .or_else(|| self.translation_times.first().map(|t| t.timestamp));
        let minutes = since.map_or(0.0, |start| (now - start) as f64 / 60_000.0);
        let throughput = if minutes > 0.0 {
            times.len() as f64 / minutes
        } else {
            0.0
        };

        Some(TranslationMetrics {
            total_translations: times.len(),
            average_response_time: summary.average,
            min_response_time: summary.min,
            max_response_time: summary.max,
            median_response_time: summary.median,
            average_text_length: stats::mean(&lengths).unwrap_or(0.0),
            throughput,
        })
    }

    /// Summary of the server series, or `None` before the first poll.
    pub fn calculate_system_metrics(&self) -> Option<SystemMetrics> {
        Some(SystemMetrics {
            cpu: stats::summarize(&self.cpu.values())?,
            memory: stats::summarize(&self.memory.values())?,
            temperature: stats::summarize(&self.temperature.values())?,
        })
    }

    /// Summary of the client readings, or `None` before the first heap,
    /// connection, navigation or resource reading.
    pub fn calculate_client_metrics(&self) -> Option<ClientMetrics> {
        let used: Vec<f64> = self
            .heap
            .iter()
            .map(|h| h.used_js_heap_size as f64)
            .collect();
        let percents: Vec<f64> = self
            .heap
            .iter()
            .map(|h| {
                if h.js_heap_size_limit == 0 {
                    0.0
                } else {
                    h.used_js_heap_size as f64 / h.js_heap_size_limit as f64 * 100.0
                }
            })
            .collect();
        let js_heap_memory = stats::summarize(&used)
            .zip(stats::summarize(&percents))
            .map(|(heap, percent)| HeapStats {
                average_mb: heap.average / MB,
                min_mb: heap.min / MB,
                max_mb: heap.max / MB,
                median_mb: heap.median / MB,
                average_percent: percent.average,
                max_percent: percent.max,
            });

        let network_connection = self.connection.latest().map(|c| ConnectionReading {
            effective_type: c.effective_type.clone(),
            downlink_mbps: c.downlink,
            rtt_ms: c.rtt,
            save_data: c.save_data,
        });

        let resources = self.resources.as_ref().map(|r| ResourceSummary {
            count: r.count,
            total_duration: r.total_duration,
            avg_duration: r.total_duration / r.count.max(1) as f64,
            by_type: r.by_type.clone(),
        });

        let page_load = self.navigation.as_ref().map(PageLoad::from);

        if js_heap_memory.is_none()
            && network_connection.is_none()
            && page_load.is_none()
            && resources.is_none()
        {
            return None;
        }

        Some(ClientMetrics {
            js_heap_memory,
            network_connection,
            page_load,
            client_info: self.client_info.clone(),
            resources,
            user_interactions: self.interactions.clone(),
        })
    }

    // -- Accessors --

    pub fn cpu(&self) -> &BoundedSeries<Sample> {
        &self.cpu
    }

    pub fn memory(&self) -> &BoundedSeries<Sample> {
        &self.memory
    }

    pub fn temperature(&self) -> &BoundedSeries<Sample> {
        &self.temperature
    }

    pub fn heap_samples(&self) -> &BoundedSeries<HeapSample> {
        &self.heap
    }

    pub fn connection_samples(&self) -> &BoundedSeries<ConnectionSample> {
        &self.connection
    }

    pub fn translations_today(&self) -> u64 {
        self.translations_today
    }

    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.server_info.as_ref()
    }

    pub fn translation_times(&self) -> &[TranslationTiming] {
        &self.translation_times
    }

    pub fn client_info(&self) -> Option<&ClientInfo> {
        self.client_info.as_ref()
    }

    pub fn navigation(&self) -> Option<&NavigationTiming> {
        self.navigation.as_ref()
    }

    pub fn resource_totals(&self) -> Option<&ResourceTotals> {
        self.resources.as_ref()
    }

    pub fn interactions(&self) -> Option<&InteractionTracker> {
        self.interactions.as_ref()
    }

    pub fn errors(&self) -> &[CollectorError] {
        &self.errors
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
