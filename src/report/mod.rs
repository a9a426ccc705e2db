//! Reports built from collector state.
//!
//! Every builder here is a pure function of a [`MetricsCollector`] and the
//! current time. Rendering lives in [`crate::render`]; writing files lives in
//! [`export`].

pub mod comparative;
pub mod export;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::config::schema::Locale;
use crate::metrics::MetricsCollector;
use crate::metrics::collector::{ClientMetrics, CollectorError, SystemMetrics, TranslationMetrics};
use crate::metrics::score::performance_score;

pub use comparative::{ComparativeReport, Labels, Section, comparative_report};
pub use export::{ExportKind, export};

/// Epoch milliseconds as an RFC 3339 UTC timestamp with millisecond
/// precision.
pub fn iso_timestamp(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ---------------------------------------------------------------------------
// Technical report
// ---------------------------------------------------------------------------

/// Collection window in epoch milliseconds. `start` is `None` before the
/// first `start_collection`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionPeriod {
    pub start: Option<i64>,
    pub end: i64,
    pub duration: Option<i64>,
}

impl CollectionPeriod {
    fn new(collector: &MetricsCollector, now: i64) -> Self {
        Self {
            start: collector.start_time(),
            end: now,
            duration: collector.start_time().map(|start| now - start),
        }
    }
}

/// Flat technical report of every aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalReport {
    pub collection_period: CollectionPeriod,
    pub translation_metrics: Option<TranslationMetrics>,
    pub system_metrics: Option<SystemMetrics>,
    pub browser_metrics: Option<ClientMetrics>,
    pub errors: Vec<CollectorError>,
}

pub fn technical_report(collector: &MetricsCollector, now: i64) -> TechnicalReport {
    TechnicalReport {
        collection_period: CollectionPeriod::new(collector, now),
        translation_metrics: collector.calculate_translation_metrics(now),
        system_metrics: collector.calculate_system_metrics(),
        browser_metrics: collector.calculate_client_metrics(),
        errors: collector.errors().to_vec(),
    }
}

// ---------------------------------------------------------------------------
// Client report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryRatio {
    /// Browser heap average over the latest server memory reading, both in
    /// MB, or `"N/A"` without a server reading.
    pub memory_ratio: Value,
    pub description: String,
}

/// Client-only report. Falls back to an error shape when no client reading
/// exists yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClientReport {
    #[serde(rename_all = "camelCase")]
    Available {
        collection_period: CollectionPeriod,
        metrics: ClientMetrics,
        performance_score: u8,
        timestamp: String,
        compared_to_server: MemoryRatio,
    },
    #[serde(rename_all = "camelCase")]
    Unavailable {
        error: String,
        collection_status: String,
        timestamp: String,
    },
}

pub fn client_report(collector: &MetricsCollector, locale: Locale, now: i64) -> ClientReport {
    let labels = Labels::for_locale(locale);
    let Some(metrics) = collector.calculate_client_metrics() else {
        return ClientReport::Unavailable {
            error: labels.no_client_metrics.to_string(),
            collection_status: if collector.is_collecting() {
                labels.collecting
            } else {
                labels.not_collecting
            }
            .to_string(),
            timestamp: iso_timestamp(now),
        };
    };

    let memory_ratio = collector
        .memory()
        .latest_value()
        .filter(|mb| *mb > 0.0)
        .zip(metrics.js_heap_memory.as_ref())
        .map_or_else(
            || Value::from("N/A"),
            |(server_mb, heap)| Value::from(heap.average_mb / server_mb),
        );

    ClientReport::Available {
        collection_period: CollectionPeriod::new(collector, now),
        performance_score: performance_score(&metrics),
        metrics,
        timestamp: iso_timestamp(now),
        compared_to_server: MemoryRatio {
            memory_ratio,
            description: labels.memory_ratio_description.to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Server report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDetails {
    pub tipo: String,
    pub modelo: String,
    pub temperatura: Section<comparative::Temperature>,
    pub cpu: Section<comparative::Utilization>,
    pub memoria: Section<comparative::Utilization>,
    pub armazenamento: Section<comparative::Storage>,
    pub sistema: comparative::ServerSystem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detalhes_raspberry_pi: Option<comparative::RaspberryPiDetails>,
}

/// Server-only report, the subset of the comparative report that describes
/// the device running the models.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerReport {
    pub timestamp: String,
    pub servidor: ServerDetails,
}

pub fn server_report(collector: &MetricsCollector, locale: Locale, now: i64) -> ServerReport {
    let labels = Labels::for_locale(locale);
    let system = collector.calculate_system_metrics();
    let section = comparative::server_section(collector, system.as_ref(), labels);
    let info = collector.server_info();
    let is_raspberry_pi = info.is_some_and(|i| i.is_raspberry_pi);

    let tipo = match info {
        Some(i) if i.is_raspberry_pi => "Raspberry Pi".to_string(),
        Some(i) => i.platform.clone(),
        None => labels.unknown.to_string(),
    };
    let modelo = match info {
        Some(i) if i.is_raspberry_pi => i
            .raspberry_pi_model
            .clone()
            .unwrap_or_else(|| labels.model_not_detected.to_string()),
        Some(i) => i.architecture.clone(),
        None => labels.architecture_not_detected.to_string(),
    };

    ServerReport {
        timestamp: iso_timestamp(now),
        servidor: ServerDetails {
            tipo,
            modelo,
            temperatura: section.temperatura,
            cpu: section.cpu,
            memoria: section.memoria,
            armazenamento: section.armazenamento,
            sistema: section.sistema,
            detalhes_raspberry_pi: section.detalhes_raspberry_pi.filter(|_| is_raspberry_pi),
        },
    }
}

/// File-name device slug for the server report.
pub fn device_name(collector: &MetricsCollector) -> &'static str {
    match collector.server_info() {
        Some(info) if info.is_raspberry_pi => "raspberry-pi",
        Some(info) => match info.platform.as_str() {
            "Darwin" => "mac",
            "Windows" => "windows",
            "Linux" => "linux",
            _ => "dispositivo",
        },
        None => "dispositivo",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SystemMetricsResponse;
    use crate::metrics::probe::{ClientProbe, HeapReading, ProbeReading};

    struct Heap;

    impl ClientProbe for Heap {
        fn read(&mut self) -> anyhow::Result<ProbeReading> {
            Ok(ProbeReading {
                heap: Some(HeapReading {
                    used: 100 * 1024 * 1024,
                    total: 100 * 1024 * 1024,
                    limit: 400 * 1024 * 1024,
                }),
                ..Default::default()
            })
        }
    }

    fn poll(platform: &str, rpi: bool) -> SystemMetricsResponse {
        serde_json::from_value(serde_json::json!({
            "success": true,
            "cpu_usage": 10.0,
            "memory_usage": 400.0,
            "temperature": 45.0,
            "platform": platform,
            "architecture": "x86_64",
            "is_raspberry_pi": rpi,
        }))
        .unwrap()
    }

    #[test]
    fn iso_timestamp_has_millis() {
        assert_eq!(iso_timestamp(0), "1970-01-01T00:00:00.000Z");
        assert_eq!(iso_timestamp(1_500), "1970-01-01T00:00:01.500Z");
    }

    #[test]
    fn technical_report_of_idle_collector() {
        let report = technical_report(&MetricsCollector::default(), 10);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["collectionPeriod"]["start"].is_null());
        assert!(json["translationMetrics"].is_null());
        assert!(json["systemMetrics"].is_null());
        assert!(json["browserMetrics"].is_null());
        assert_eq!(json["errors"], serde_json::json!([]));
    }

    #[test]
    fn client_report_without_readings_is_error_shape() {
        let mut collector = MetricsCollector::default();
        collector.start_collection(0);
        let json = serde_json::to_value(client_report(&collector, Locale::Pt, 5)).unwrap();
        assert_eq!(json["error"], "Nenhuma métrica do navegador disponível");
        assert_eq!(json["collectionStatus"], "Ativo");
        assert!(json.get("performanceScore").is_none());
    }

    #[test]
    fn client_report_with_readings_has_score_and_ratio() {
        let mut collector = MetricsCollector::default();
        collector.start_collection(0);
        collector.record_system_metrics(&poll("Linux", false), 1);
        collector.collect_client_metrics(&mut Heap, 1);

        let json = serde_json::to_value(client_report(&collector, Locale::Pt, 5)).unwrap();
        assert_eq!(json["performanceScore"], 75);
        assert_eq!(json["comparedToServer"]["memoryRatio"], 0.25);
        assert_eq!(json["metrics"]["jsHeapMemory"]["averageMB"], 100.0);
        assert_eq!(json["collectionPeriod"]["duration"], 5);
    }

    #[test]
    fn server_report_names_device() {
        let mut collector = MetricsCollector::default();
        assert_eq!(device_name(&collector), "dispositivo");

        collector.record_system_metrics(&poll("Darwin", false), 1);
        assert_eq!(device_name(&collector), "mac");
        let report = server_report(&collector, Locale::Pt, 2);
        assert_eq!(report.servidor.tipo, "Darwin");
        assert_eq!(report.servidor.modelo, "x86_64");
        assert!(report.servidor.detalhes_raspberry_pi.is_none());

        collector.record_system_metrics(&poll("Linux", true), 3);
        assert_eq!(device_name(&collector), "raspberry-pi");
        let report = server_report(&collector, Locale::Pt, 4);
        assert_eq!(report.servidor.tipo, "Raspberry Pi");
        assert_eq!(report.servidor.modelo, "Modelo não detectado");
        assert_eq!(
            report.servidor.detalhes_raspberry_pi.unwrap().estado_termico,
            "Normal"
        );
    }
}
