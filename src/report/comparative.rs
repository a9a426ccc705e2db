//! Server-versus-client comparative report.
//!
//! Field names are fixed Portuguese keys so exported files stay comparable
//! across machines; the human-readable values follow the configured
//! [`Locale`].

use serde::Serialize;
use serde_json::Value;

use super::iso_timestamp;
use crate::config::schema::Locale;
use crate::metrics::MetricsCollector;
use crate::metrics::collector::{ClientMetrics, PageLoad, SystemMetrics, TranslationMetrics};

/// Server temperature above which the Raspberry Pi details raise an alert.
const HIGH_TEMPERATURE_C: f64 = 70.0;

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// Human-readable strings for one locale.
pub struct Labels {
    pub unavailable: &'static str,
    pub server_description: &'static str,
    pub client_description: &'static str,
    pub backend: &'static str,
    pub unknown: &'static str,
    pub unknown_feminine: &'static str,
    pub dedicated_processing: &'static str,
    pub storage_unavailable: &'static str,
    pub model_not_detected: &'static str,
    pub architecture_not_detected: &'static str,
    pub high_temperature: &'static str,
    pub normal: &'static str,
    pub browser_unavailable: &'static str,
    pub client_kind: &'static str,
    pub client_architecture: &'static str,
    pub client_processing: &'static str,
    pub device_memory_unavailable: &'static str,
    pub browser_memory_unavailable: &'static str,
    pub network_unavailable: &'static str,
    pub performance_unavailable: &'static str,
    pub interaction_unavailable: &'static str,
    pub resources_unavailable: &'static str,
    pub enabled: &'static str,
    pub disabled: &'static str,
    pub translation_unavailable: &'static str,
    pub per_minute: &'static str,
    pub comparison_unavailable: &'static str,
    pub summary_title: &'static str,
    pub summary_description: &'static str,
    pub summary_conclusion: &'static str,
    pub no_client_metrics: &'static str,
    pub collecting: &'static str,
    pub not_collecting: &'static str,
    pub memory_ratio_description: &'static str,
    memory_comparison_prefix: &'static str,
    memory_comparison_suffix: &'static str,
}

static PT: Labels = Labels {
    unavailable: "Dados não disponíveis",
    server_description: "Métricas do servidor que executa os modelos de tradução",
    client_description: "Métricas do navegador do cliente que acessa o serviço",
    backend: "Servidor Backend",
    unknown: "Desconhecido",
    unknown_feminine: "Desconhecida",
    dedicated_processing: "Dedicado para inferência de modelos",
    storage_unavailable: "Dados de armazenamento não disponíveis",
    model_not_detected: "Modelo não detectado",
    architecture_not_detected: "Arquitetura não detectada",
    high_temperature: "Alerta: Alta temperatura!",
    normal: "Normal",
    browser_unavailable: "Dados do navegador não disponíveis",
    client_kind: "Cliente (Navegador)",
    client_architecture: "JavaScript frontend",
    client_processing: "Interface de usuário e comunicação com API",
    device_memory_unavailable: "Não disponível",
    browser_memory_unavailable: "Dados de memória do navegador não disponíveis",
    network_unavailable: "Dados de rede não disponíveis",
    performance_unavailable: "Dados de desempenho não disponíveis",
    interaction_unavailable: "Dados de interação não disponíveis",
    resources_unavailable: "Dados de recursos não disponíveis",
    enabled: "Ativado",
    disabled: "Desativado",
    translation_unavailable: "Dados de tradução não disponíveis",
    per_minute: "traduções/minuto",
    comparison_unavailable: "Comparação não disponível",
    summary_title: "Distribuição de Processamento",
    summary_description: "O servidor realiza o processamento intensivo dos modelos neurais de \
        tradução, consumindo mais recursos computacionais, enquanto o navegador (cliente) é \
        responsável pela interface de usuário e comunicação com a API, utilizando menos recursos.",
    summary_conclusion: "Este é um modelo de processamento cliente-servidor típico, onde o \
        processamento pesado dos modelos de tradução é feito no servidor, economizando recursos \
        do dispositivo do cliente.",
    no_client_metrics: "Nenhuma métrica do navegador disponível",
    collecting: "Ativo",
    not_collecting: "Inativo",
    memory_ratio_description: "Proporção entre uso de memória no navegador e no servidor",
    memory_comparison_prefix: "O navegador está usando aproximadamente",
    memory_comparison_suffix: "da memória que o servidor está usando",
};

static EN: Labels = Labels {
    unavailable: "Data not available",
    server_description: "Metrics of the server running the translation models",
    client_description: "Metrics of the client accessing the service",
    backend: "Backend Server",
    unknown: "Unknown",
    unknown_feminine: "Unknown",
    dedicated_processing: "Dedicated to model inference",
    storage_unavailable: "Storage data not available",
    model_not_detected: "Model not detected",
    architecture_not_detected: "Architecture not detected",
    high_temperature: "Alert: High temperature!",
    normal: "Normal",
    browser_unavailable: "Browser data not available",
    client_kind: "Client (Browser)",
    client_architecture: "JavaScript frontend",
    client_processing: "User interface and API communication",
    device_memory_unavailable: "Not available",
    browser_memory_unavailable: "Browser memory data not available",
    network_unavailable: "Network data not available",
    performance_unavailable: "Performance data not available",
    interaction_unavailable: "Interaction data not available",
    resources_unavailable: "Resource data not available",
    enabled: "Enabled",
    disabled: "Disabled",
    translation_unavailable: "Translation data not available",
    per_minute: "translations/minute",
    comparison_unavailable: "Comparison not available",
    summary_title: "Processing Distribution",
    summary_description: "The server performs the heavy neural translation model processing, \
        using more computing resources, while the browser (client) handles the user interface \
        and API communication, using fewer resources.",
    summary_conclusion: "This is a typical client-server processing model, where the heavy \
        translation work happens on the server, saving resources on the client device.",
    no_client_metrics: "No browser metrics available",
    collecting: "Active",
    not_collecting: "Inactive",
    memory_ratio_description: "Ratio between browser and server memory usage",
    memory_comparison_prefix: "The browser is using approximately",
    memory_comparison_suffix: "of the memory the server is using",
};

impl Labels {
    pub fn for_locale(locale: Locale) -> &'static Labels {
        match locale {
            Locale::Pt => &PT,
            Locale::En => &EN,
        }
    }

    fn raspberry_backend(&self, model: Option<&str>) -> String {
        match model.filter(|m| !m.is_empty()) {
            Some(model) => format!("{} (Raspberry Pi {model})", self.backend),
            None => format!("{} (Raspberry Pi)", self.backend),
        }
    }

    fn memory_comparison(&self, percent: f64) -> String {
        format!(
            "{} {percent:.2}% {}",
            self.memory_comparison_prefix, self.memory_comparison_suffix
        )
    }
}

// ---------------------------------------------------------------------------
// Report shape
// ---------------------------------------------------------------------------

/// A report section that is either populated or replaced by a message
/// saying why it is missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Section<T> {
    Data(T),
    Missing(String),
}

impl<T> Section<T> {
    fn from_option(value: Option<T>, missing: &str) -> Self {
        match value {
            Some(data) => Self::Data(data),
            None => Self::Missing(missing.to_string()),
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Data(data) => Some(data),
            Self::Missing(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparativeReport {
    pub timestamp: String,
    pub collection_period: IsoPeriod,
    pub servidor: ServerSection,
    pub computador_local: ClientSection,
    pub comparativo: Comparison,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IsoPeriod {
    pub start: Option<String>,
    pub end: String,
    pub duration_ms: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Utilization {
    pub utilizacao_atual: String,
    pub utilizacao_media: String,
    pub utilizacao_pico: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Temperature {
    pub atual: String,
    pub media: String,
    pub pico: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSystem {
    pub tipo: String,
    pub plataforma: String,
    pub arquitetura: String,
    pub python_versao: String,
    pub encoding: String,
    pub processamento: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Storage {
    pub total: String,
    pub usado: String,
    pub livre: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaspberryPiDetails {
    pub modelo: String,
    pub temperatura_atual: String,
    pub estado_termico: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSection {
    pub descricao: String,
    pub cpu: Section<Utilization>,
    pub memoria: Section<Utilization>,
    pub temperatura: Section<Temperature>,
    pub traducoes_hoje: u64,
    pub sistema: ServerSystem,
    pub armazenamento: Section<Storage>,
    pub detalhes_raspberry_pi: Option<RaspberryPiDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientSystem {
    pub tipo: String,
    pub arquitetura: String,
    pub processamento: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Browser {
    pub user_agent: String,
    pub plataforma: String,
    pub idioma: String,
    pub resolucao: String,
    pub viewport: String,
    pub densidade_pixels: Value,
    #[serde(rename = "nucleosCPU")]
    pub nucleos_cpu: Value,
    pub memoria_dispositivo: String,
    pub sistema: ClientSystem,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserMemory {
    pub utilizacao_atual: String,
    pub utilizacao_media: String,
    pub utilizacao_pico: String,
    pub percentual_utilizado: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub tipo_conexao: String,
    pub velocidade: String,
    pub latencia: String,
    pub economizador_dados: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    pub tempo_carregamento_total: String,
    pub tempo_renderizacao: String,
    pub tempo_conexao: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub cliques: u64,
    pub teclas_pressionadas: u64,
    pub eventos_rolagem: u64,
    pub envios_formulario: u64,
    pub num_sessoes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resources {
    pub total_recursos_carregados: usize,
    pub tempo_medio_carregamento: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientSection {
    pub descricao: String,
    pub navegador: Section<Browser>,
    pub memoria: Section<BrowserMemory>,
    pub rede: Section<Network>,
    pub desempenho: Section<Performance>,
    pub interacao: Section<Interaction>,
    pub recursos: Section<Resources>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationComparison {
    pub tempo_medio_resposta: String,
    pub tempo_minimo_resposta: String,
    pub tempo_maximo_resposta: String,
    pub throughput: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub titulo: String,
    pub descricao: String,
    pub conclusao: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub traducao: Section<TranslationComparison>,
    pub memoria_navegador_vs_servidor: String,
    pub resumo: Summary,
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

fn or_na(value: Option<f64>, unit: &str) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v}{unit}"))
}

fn dimensions(width: Option<u32>, height: Option<u32>) -> String {
    match (width, height) {
        (Some(w), Some(h)) => format!("{w}x{h}"),
        _ => "N/A".to_string(),
    }
}

/// Browser heap average as a percentage of the latest server memory
/// reading. Both sides are in MB.
pub fn browser_to_server_memory_percent(collector: &MetricsCollector) -> Option<f64> {
    let heap = collector.calculate_client_metrics()?.js_heap_memory?;
    let server_mb = collector.memory().latest_value().filter(|mb| *mb > 0.0)?;
    Some(heap.average_mb / server_mb * 100.0)
}

pub(super) fn server_section(
    collector: &MetricsCollector,
    system: Option<&SystemMetrics>,
    labels: &Labels,
) -> ServerSection {
    let info = collector.server_info();

    let cpu = collector.cpu().latest_value().zip(system).map(|(now, s)| Utilization {
        utilizacao_atual: format!("{now}%"),
        utilizacao_media: format!("{:.1}%", s.cpu.average),
        utilizacao_pico: format!("{:.1}%", s.cpu.max),
    });
    let memoria = collector.memory().latest_value().zip(system).map(|(now, s)| Utilization {
        utilizacao_atual: format!("{now:.1} MB"),
        utilizacao_media: format!("{:.1} MB", s.memory.average),
        utilizacao_pico: format!("{:.1} MB", s.memory.max),
    });
    let latest_temperature = collector.temperature().latest_value();
    let temperatura = latest_temperature.zip(system).map(|(now, s)| Temperature {
        atual: format!("{now:.1}°C"),
        media: format!("{:.1}°C", s.temperature.average),
        pico: format!("{:.1}°C", s.temperature.max),
    });

    let is_raspberry_pi = info.is_some_and(|i| i.is_raspberry_pi);
    let model = info.and_then(|i| i.raspberry_pi_model.as_deref());

    let sistema = ServerSystem {
        tipo: if is_raspberry_pi {
            labels.raspberry_backend(model)
        } else {
            labels.backend.to_string()
        },
        plataforma: info.map_or(labels.unknown, |i| i.platform.as_str()).to_string(),
        arquitetura: info
            .map_or(labels.unknown_feminine, |i| i.architecture.as_str())
            .to_string(),
        python_versao: info
            .map_or(labels.unknown_feminine, |i| i.python_version.as_str())
            .to_string(),
        encoding: info.map_or("utf-8", |i| i.encoding.as_str()).to_string(),
        processamento: labels.dedicated_processing.to_string(),
    };

    let armazenamento = info.and_then(|i| i.disk_usage.as_ref()).map(|disk| Storage {
        total: format!("{} GB", disk.total),
        usado: format!("{} GB ({}%)", disk.used, disk.percent),
        livre: format!("{} GB", disk.free),
    });

    let detalhes_raspberry_pi = is_raspberry_pi.then(|| RaspberryPiDetails {
        modelo: model.unwrap_or(labels.model_not_detected).to_string(),
        temperatura_atual: latest_temperature
            .map_or_else(|| "N/A".to_string(), |t| format!("{t:.1}°C")),
        estado_termico: match latest_temperature {
            Some(t) if t > HIGH_TEMPERATURE_C => labels.high_temperature.to_string(),
            Some(_) => labels.normal.to_string(),
            None => "N/A".to_string(),
        },
    });

    ServerSection {
        descricao: labels.server_description.to_string(),
        cpu: Section::from_option(cpu, labels.unavailable),
        memoria: Section::from_option(memoria, labels.unavailable),
        temperatura: Section::from_option(temperatura, labels.unavailable),
        traducoes_hoje: collector.translations_today(),
        sistema,
        armazenamento: Section::from_option(armazenamento, labels.storage_unavailable),
        detalhes_raspberry_pi,
    }
}

fn client_section(
    collector: &MetricsCollector,
    client: Option<&ClientMetrics>,
    labels: &Labels,
) -> ClientSection {
    let navegador = collector.client_info().map(|info| Browser {
        user_agent: info.user_agent.clone(),
        plataforma: info.platform.clone(),
        idioma: info.language.clone(),
        resolucao: dimensions(info.screen_width, info.screen_height),
        viewport: dimensions(info.viewport_width, info.viewport_height),
        densidade_pixels: info.device_pixel_ratio.map_or(Value::Null, Value::from),
        nucleos_cpu: info.cpu_cores.map_or_else(|| Value::from("N/A"), Value::from),
        memoria_dispositivo: info.device_memory_gb.map_or_else(
            || labels.device_memory_unavailable.to_string(),
            |gb| format!("{} GB", (gb * 10.0).round() / 10.0),
        ),
        sistema: ClientSystem {
            tipo: labels.client_kind.to_string(),
            arquitetura: labels.client_architecture.to_string(),
            processamento: labels.client_processing.to_string(),
        },
    });

    let memoria = collector
        .heap_samples()
        .latest()
        .zip(client.and_then(|metrics| metrics.js_heap_memory.as_ref()))
        .map(|(latest, heap)| BrowserMemory {
            utilizacao_atual: format!("{:.1} MB", latest.used_js_heap_size as f64 / 1024.0 / 1024.0),
            utilizacao_media: format!("{:.1} MB", heap.average_mb),
            utilizacao_pico: format!("{:.1} MB", heap.max_mb),
            percentual_utilizado: format!("{:.1}%", heap.average_percent),
        });

    let rede = collector.connection_samples().latest().map(|c| Network {
        tipo_conexao: c.effective_type.clone(),
        velocidade: or_na(c.downlink, " Mbps"),
        latencia: or_na(c.rtt, " ms"),
        economizador_dados: if c.save_data { labels.enabled } else { labels.disabled }.to_string(),
    });

    let desempenho = collector.navigation().map(PageLoad::from).map(|page| Performance {
        tempo_carregamento_total: format!("{} ms", page.total_load_time),
        tempo_renderizacao: format!("{} ms", page.processing_time),
        tempo_conexao: format!("{} ms", page.tcp_connect_time),
    });

    let interacao = collector.interactions().map(|t| Interaction {
        cliques: t.clicks,
        teclas_pressionadas: t.key_presses,
        eventos_rolagem: t.scroll_events,
        envios_formulario: t.form_submissions,
        num_sessoes: t.sessions.len(),
    });

    let recursos = collector.resource_totals().map(|r| Resources {
        total_recursos_carregados: r.count,
        tempo_medio_carregamento: format!("{:.1} ms", r.total_duration / r.count.max(1) as f64),
    });

    ClientSection {
        descricao: labels.client_description.to_string(),
        navegador: Section::from_option(navegador, labels.browser_unavailable),
        memoria: Section::from_option(memoria, labels.browser_memory_unavailable),
        rede: Section::from_option(rede, labels.network_unavailable),
        desempenho: Section::from_option(desempenho, labels.performance_unavailable),
        interacao: Section::from_option(interacao, labels.interaction_unavailable),
        recursos: Section::from_option(recursos, labels.resources_unavailable),
    }
}

fn comparison(
    collector: &MetricsCollector,
    translation: Option<&TranslationMetrics>,
    labels: &Labels,
) -> Comparison {
    let traducao = translation.map(|t| TranslationComparison {
        tempo_medio_resposta: format!("{:.1} ms", t.average_response_time),
        tempo_minimo_resposta: format!("{} ms", t.min_response_time),
        tempo_maximo_resposta: format!("{} ms", t.max_response_time),
        throughput: format!("{:.2} {}", t.throughput, labels.per_minute),
    });

    Comparison {
        traducao: Section::from_option(traducao, labels.translation_unavailable),
        memoria_navegador_vs_servidor: browser_to_server_memory_percent(collector).map_or_else(
            || labels.comparison_unavailable.to_string(),
            |percent| labels.memory_comparison(percent),
        ),
        resumo: Summary {
            titulo: labels.summary_title.to_string(),
            descricao: labels.summary_description.to_string(),
            conclusao: labels.summary_conclusion.to_string(),
        },
    }
}

/// Build the comparative report from the collector's current state.
pub fn comparative_report(collector: &MetricsCollector, locale: Locale, now: i64) -> ComparativeReport {
    let labels = Labels::for_locale(locale);
    let system = collector.calculate_system_metrics();
    let client = collector.calculate_client_metrics();
    let translation = collector.calculate_translation_metrics(now);

    ComparativeReport {
        timestamp: iso_timestamp(now),
        collection_period: IsoPeriod {
            start: collector.start_time().map(iso_timestamp),
            end: iso_timestamp(now),
            duration_ms: collector.start_time().map(|start| now - start),
        },
        servidor: server_section(collector, system.as_ref(), labels),
        computador_local: client_section(collector, client.as_ref(), labels),
        comparativo: comparison(collector, translation.as_ref(), labels),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SystemMetricsResponse;
    use crate::metrics::probe::{ClientProbe, HeapReading, ProbeReading};

    struct Heap(u64);

    impl ClientProbe for Heap {
        fn read(&mut self) -> anyhow::Result<ProbeReading> {
            Ok(ProbeReading {
                heap: Some(HeapReading {
                    used: self.0,
                    total: self.0,
                    limit: self.0 * 4,
                }),
                ..Default::default()
            })
        }
    }

    fn poll(temperature: f64, rpi: bool) -> SystemMetricsResponse {
        serde_json::from_value(serde_json::json!({
            "success": true,
            "cpu_usage": 42.5,
            "memory_usage": 200.0,
            "temperature": temperature,
            "translations_today": 7,
            "platform": "Linux",
            "architecture": "aarch64",
            "is_raspberry_pi": rpi,
            "raspberry_pi_model": "4 Model B",
            "disk_usage": {"total": 64.0, "used": 16.0, "free": 48.0, "percent": 25.0},
        }))
        .unwrap()
    }

    #[test]
    fn empty_collector_reports_missing_sections() {
        let collector = MetricsCollector::default();
        let report = comparative_report(&collector, Locale::Pt, 0);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["servidor"]["cpu"], "Dados não disponíveis");
        assert_eq!(
            json["servidor"]["armazenamento"],
            "Dados de armazenamento não disponíveis"
        );
        assert!(json["servidor"]["detalhesRaspberryPi"].is_null());
        assert_eq!(
            json["computadorLocal"]["navegador"],
            "Dados do navegador não disponíveis"
        );
        assert_eq!(
            json["comparativo"]["memoriaNavegadorVsServidor"],
            "Comparação não disponível"
        );
        assert_eq!(json["comparativo"]["resumo"]["titulo"], "Distribuição de Processamento");
    }

    #[test]
    fn server_section_formats_values() {
        let mut collector = MetricsCollector::default();
        collector.record_system_metrics(&poll(72.34, true), 1);
        let report = comparative_report(&collector, Locale::Pt, 2);
        let server = &report.servidor;

        let cpu = server.cpu.data().unwrap();
        assert_eq!(cpu.utilizacao_atual, "42.5%");
        assert_eq!(cpu.utilizacao_media, "42.5%");
        assert_eq!(server.memoria.data().unwrap().utilizacao_atual, "200.0 MB");
        assert_eq!(server.temperatura.data().unwrap().atual, "72.3°C");
        assert_eq!(server.traducoes_hoje, 7);
        assert_eq!(server.sistema.tipo, "Servidor Backend (Raspberry Pi 4 Model B)");
        assert_eq!(server.armazenamento.data().unwrap().usado, "16 GB (25%)");

        let rpi = server.detalhes_raspberry_pi.as_ref().unwrap();
        assert_eq!(rpi.estado_termico, "Alerta: Alta temperatura!");
        assert_eq!(rpi.temperatura_atual, "72.3°C");
    }

    #[test]
    fn english_labels_keep_portuguese_keys() {
        let mut collector = MetricsCollector::default();
        collector.record_system_metrics(&poll(50.0, false), 1);
        let json = serde_json::to_value(comparative_report(&collector, Locale::En, 2)).unwrap();
        assert_eq!(json["servidor"]["sistema"]["tipo"], "Backend Server");
        assert_eq!(json["computadorLocal"]["rede"], "Network data not available");
        assert_eq!(json["servidor"]["sistema"]["processamento"], "Dedicated to model inference");
    }

    #[test]
    fn memory_comparison_uses_megabytes_on_both_sides() {
        let mut collector = MetricsCollector::default();
        collector.record_system_metrics(&poll(50.0, false), 1);
        collector.collect_client_metrics(&mut Heap(50 * 1024 * 1024), 1);

        assert_eq!(browser_to_server_memory_percent(&collector), Some(25.0));
        let report = comparative_report(&collector, Locale::Pt, 2);
        assert_eq!(
            report.comparativo.memoria_navegador_vs_servidor,
            "O navegador está usando aproximadamente 25.00% da memória que o servidor está usando"
        );
    }
}
