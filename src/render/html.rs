use std::fmt::Write;

use serde::Serialize;

use super::{ThermalState, escape_html, health_indicator};
use crate::metrics::MetricsCollector;
use crate::metrics::collector::ClientMetrics;
use crate::report::comparative::{ClientSection, Comparison, ServerSection};
use crate::report::{ClientReport, ComparativeReport, Section};

/// The three panels of the comparative view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparativeHtml {
    pub server: String,
    pub client: String,
    pub comparison: String,
}

/// One list per client sub-metric; `None` where the metric is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientHtml {
    pub memory: Option<String>,
    pub network: Option<String>,
    pub page_load: Option<String>,
    pub resources: Option<String>,
    pub interactions: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn header_row(out: &mut String, title: &str) {
    let _ = write!(out, r#"<tr><th colspan="3">{}</th></tr>"#, escape_html(title));
}

fn cell(label: &str, value: &str) -> String {
    format!(
        "<td><strong>{}:</strong> {}</td>",
        escape_html(label),
        escape_html(value)
    )
}

fn row<V: AsRef<str>>(out: &mut String, cells: [(&str, V); 3]) {
    out.push_str("<tr>");
    for (label, value) in cells {
        out.push_str(&cell(label, value.as_ref()));
    }
    out.push_str("</tr>");
}

fn wide_row(out: &mut String, label: &str, value: &str) {
    let _ = write!(
        out,
        r#"<tr><td colspan="3"><strong>{}:</strong> {}</td></tr>"#,
        escape_html(label),
        escape_html(value)
    );
}

fn list(items: &[String]) -> String {
    let mut out = String::from("<ul>");
    for item in items {
        let _ = write!(out, "<li>{item}</li>");
    }
    out.push_str("</ul>");
    out
}

fn missing(message: &str) -> String {
    format!("<p>{}</p>", escape_html(message))
}

fn num(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "N/A".to_string(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Comparative report
// ---------------------------------------------------------------------------

fn server_html(server: &ServerSection) -> String {
    let mut out = String::from("<h4>Métricas do Servidor</h4>");
    let (Section::Data(cpu), Section::Data(memory), Section::Data(temperature)) =
        (&server.cpu, &server.memoria, &server.temperatura)
    else {
        let message = match &server.cpu {
            Section::Missing(message) => message.as_str(),
            Section::Data(_) => "",
        };
        out.push_str(&missing(message));
        return out;
    };

    out.push_str(r#"<table class="metrics-table">"#);
    header_row(&mut out, "CPU");
    row(
        &mut out,
        [
            ("Atual", &cpu.utilizacao_atual),
            ("Média", &cpu.utilizacao_media),
            ("Pico", &cpu.utilizacao_pico),
        ],
    );
    header_row(&mut out, "Memória");
    row(
        &mut out,
        [
            ("Atual", &memory.utilizacao_atual),
            ("Média", &memory.utilizacao_media),
            ("Pico", &memory.utilizacao_pico),
        ],
    );
    header_row(&mut out, "Temperatura");
    row(
        &mut out,
        [
            ("Atual", &temperature.atual),
            ("Média", &temperature.media),
            ("Pico", &temperature.pico),
        ],
    );
    header_row(&mut out, "Sistema");
    row(
        &mut out,
        [
            ("Tipo", &server.sistema.tipo),
            ("Plataforma", &server.sistema.plataforma),
            ("Arquitetura", &server.sistema.arquitetura),
        ],
    );
    wide_row(&mut out, "Python Versão", &server.sistema.python_versao);

    if let Section::Data(storage) = &server.armazenamento {
        header_row(&mut out, "Armazenamento");
        row(
            &mut out,
            [
                ("Total", &storage.total),
                ("Usado", &storage.usado),
                ("Livre", &storage.livre),
            ],
        );
    }

    if let Some(rpi) = &server.detalhes_raspberry_pi {
        header_row(&mut out, "Detalhes do Raspberry Pi");
        let class = if rpi.estado_termico.contains("Alert") {
            "log-error"
        } else {
            "log-info"
        };
        let _ = write!(
            out,
            r#"<tr>{}{}<td><strong>Estado:</strong> <span class="{class}">{}</span></td></tr>"#,
            cell("Modelo", &rpi.modelo),
            cell("Temperatura", &rpi.temperatura_atual),
            escape_html(&rpi.estado_termico)
        );
    }

    header_row(&mut out, "Traduções");
    wide_row(&mut out, "Realizadas hoje", &server.traducoes_hoje.to_string());
    out.push_str("</table>");
    out
}

fn client_html(client: &ClientSection) -> String {
    let mut out = String::from("<h4>Métricas do Cliente (Navegador)</h4>");
    let browser = match &client.navegador {
        Section::Data(browser) => browser,
        Section::Missing(message) => {
            out.push_str(&missing(message));
            return out;
        }
    };

    out.push_str(r#"<table class="metrics-table">"#);
    header_row(&mut out, "Navegador");
    row(
        &mut out,
        [
            ("Plataforma", &browser.plataforma),
            ("CPU Cores", &num(&browser.nucleos_cpu)),
            ("Memória", &browser.memoria_dispositivo),
        ],
    );
    row(
        &mut out,
        [
            ("Resolução", &browser.resolucao),
            ("Viewport", &browser.viewport),
            ("Densidade", &num(&browser.densidade_pixels)),
        ],
    );

    if let Section::Data(memory) = &client.memoria {
        header_row(&mut out, "Memória");
        row(
            &mut out,
            [
                ("Atual", &memory.utilizacao_atual),
                ("Média", &memory.utilizacao_media),
                ("Pico", &memory.utilizacao_pico),
            ],
        );
    }
    if let Section::Data(network) = &client.rede {
        header_row(&mut out, "Rede");
        row(
            &mut out,
            [
                ("Tipo", &network.tipo_conexao),
                ("Velocidade", &network.velocidade),
                ("Latência", &network.latencia),
            ],
        );
    }
    if let Section::Data(performance) = &client.desempenho {
        header_row(&mut out, "Desempenho");
        row(
            &mut out,
            [
                ("Tempo total", &performance.tempo_carregamento_total),
                ("Renderização", &performance.tempo_renderizacao),
                ("Conexão", &performance.tempo_conexao),
            ],
        );
    }

    out.push_str("</table>");
    out
}

fn comparison_html(comparison: &Comparison) -> String {
    let mut out = String::from("<h4>Métricas Comparativas</h4>");
    match &comparison.traducao {
        Section::Missing(message) => out.push_str(&missing(message)),
        Section::Data(t) => {
            out.push_str(r#"<div class="comparative-box">"#);
            for (label, value) in [
                ("Proporção de memória", &comparison.memoria_navegador_vs_servidor),
                ("Tempo médio de resposta", &t.tempo_medio_resposta),
                ("Tempo mínimo de resposta", &t.tempo_minimo_resposta),
                ("Tempo máximo de resposta", &t.tempo_maximo_resposta),
                ("Throughput", &t.throughput),
            ] {
                let _ = write!(
                    out,
                    "<p><strong>{}:</strong> {}</p>",
                    escape_html(label),
                    escape_html(value)
                );
            }
            out.push_str("</div>");
        }
    }
    out
}

/// Render the comparative report as server, client, and comparison panels.
pub fn comparative_sections(report: &ComparativeReport) -> ComparativeHtml {
    ComparativeHtml {
        server: server_html(&report.servidor),
        client: client_html(&report.computador_local),
        comparison: comparison_html(&report.comparativo),
    }
}

// ---------------------------------------------------------------------------
// Client report
// ---------------------------------------------------------------------------

fn metrics_lists(metrics: &ClientMetrics, score: u8) -> ClientHtml {
    let memory = match &metrics.js_heap_memory {
        Some(heap) => list(&[
            format!(
                "Uso médio: {:.2} MB ({:.1}% do limite)",
                heap.average_mb, heap.average_percent
            ),
            format!("Uso máximo: {:.2} MB", heap.max_mb),
            format!("Pico de uso: {:.1}% do limite", heap.max_percent),
            format!("Pontuação: <strong>{score}</strong>/100"),
        ]),
        None => list(&[
            "Memória JS indisponível neste navegador".to_string(),
            format!("Pontuação: <strong>{score}</strong>/100"),
        ]),
    };

    let network = metrics.network_connection.as_ref().map(|c| {
        let or_na = |v: Option<f64>| v.map_or_else(|| "N/A".to_string(), |v| v.to_string());
        list(&[
            format!("Tipo de conexão: {}", escape_html(&c.effective_type)),
            format!("Velocidade: {} Mbps", or_na(c.downlink_mbps)),
            format!("Latência (RTT): {} ms", or_na(c.rtt_ms)),
            format!(
                "Modo de economia de dados: {}",
                if c.save_data { "Ativado" } else { "Desativado" }
            ),
        ])
    });

    let page_load = metrics.page_load.as_ref().map(|p| {
        list(&[
            format!("Tempo total: {} ms", p.total_load_time),
            format!("DOM interativo: {} ms", p.dom_interactive_time),
            format!("DOM completo: {} ms", p.dom_complete_time),
            format!("Tempo de resposta do servidor: {} ms", p.response_time),
            format!("Tempo de DNS: {} ms", p.dns_lookup_time),
        ])
    });

    let resources = metrics.resources.as_ref().map(|r| {
        let mut html = list(&[
            format!("Total de recursos: {}", r.count),
            format!("Tempo médio: {:.2} ms", r.avg_duration),
            format!("Tempo total: {:.2} ms", r.total_duration),
        ]);
        if !r.by_type.is_empty() {
            let by_type: Vec<String> = r
                .by_type
                .iter()
                .map(|(kind, totals)| {
                    format!(
                        "{}: {} recursos ({:.2} ms)",
                        escape_html(kind),
                        totals.count,
                        totals.total_duration
                    )
                })
                .collect();
            html.push_str("<br>Por tipo:");
            html.push_str(&list(&by_type));
        }
        html
    });

    let interactions = metrics.user_interactions.as_ref().map(|t| {
        list(&[
            format!("Cliques: {}", t.clicks),
            format!("Teclas: {}", t.key_presses),
            format!("Eventos de rolagem: {}", t.scroll_events),
            format!("Envios de formulário: {}", t.form_submissions),
            format!("Seleções de texto: {}", t.text_selections),
            format!(
                "Sessões: {} ({} ativa(s))",
                t.sessions.len(),
                t.active_sessions()
            ),
        ])
    });

    ClientHtml {
        memory: Some(memory),
        network,
        page_load,
        resources,
        interactions,
    }
}

/// Render the client report as lists, or `None` for the error shape.
pub fn client_lists(report: &ClientReport) -> Option<ClientHtml> {
    match report {
        ClientReport::Available {
            metrics,
            performance_score,
            ..
        } => Some(metrics_lists(metrics, *performance_score)),
        ClientReport::Unavailable { .. } => None,
    }
}

// ---------------------------------------------------------------------------
// Raspberry Pi panel
// ---------------------------------------------------------------------------

/// Status panel shown only while the server reports itself as a Raspberry
/// Pi.
pub fn raspberry_panel(collector: &MetricsCollector) -> Option<String> {
    let info = collector.server_info().filter(|info| info.is_raspberry_pi)?;

    let temperature = match collector.temperature().latest_value() {
        Some(celsius) => {
            let state = ThermalState::from_celsius(celsius);
            format!(
                r#"{}{celsius:.1}°C <span class="{}">({})</span>"#,
                health_indicator(state.health()),
                state.css_class(),
                state.label()
            )
        }
        None => "Indisponível".to_string(),
    };

    let storage = info.disk_usage.as_ref().map_or_else(String::new, |disk| {
        format!(
            r#"<div class="mt-2"><strong>Armazenamento:</strong> {} GB de {} GB usado ({}%)</div>"#,
            disk.used, disk.total, disk.percent
        )
    });

    Some(format!(
        concat!(
            r#"<div id="raspberry-pi-status" class="mb-6 p-4 bg-red-50 border border-red-200 rounded-lg">"#,
            r#"<h3 class="text-lg font-medium mb-2">Raspberry Pi Detectado</h3>"#,
            r#"<div class="grid grid-cols-1 md:grid-cols-2 gap-2">"#,
            "<div><strong>Modelo:</strong> {model}</div>",
            "<div><strong>Arquitetura:</strong> {arch}</div>",
            "<div><strong>Python:</strong> {python}</div>",
            "<div><strong>Temperatura:</strong> {temperature}</div>",
            "</div>{storage}</div>"
        ),
        model = escape_html(info.raspberry_pi_model.as_deref().unwrap_or("Não identificado")),
        arch = escape_html(&info.architecture),
        python = escape_html(&info.python_version),
        temperature = temperature,
        storage = storage,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SystemMetricsResponse;
    use crate::config::schema::Locale;
    use crate::metrics::probe::{
        ClientProbe, ConnectionReading, HeapReading, ProbeReading, ResourceEntry,
    };
    use crate::report::{client_report, comparative_report};

    struct Full;

    impl ClientProbe for Full {
        fn read(&mut self) -> anyhow::Result<ProbeReading> {
            Ok(ProbeReading {
                heap: Some(HeapReading {
                    used: 10 * 1024 * 1024,
                    total: 20 * 1024 * 1024,
                    limit: 100 * 1024 * 1024,
                }),
                connection: Some(ConnectionReading {
                    effective_type: "4g".to_string(),
                    downlink_mbps: Some(10.0),
                    rtt_ms: Some(50.0),
                    save_data: false,
                }),
                resources: Some(vec![ResourceEntry {
                    initiator_type: "script".to_string(),
                    duration_ms: 12.0,
                }]),
                ..Default::default()
            })
        }
    }

    fn poll(temperature: f64, rpi: bool) -> SystemMetricsResponse {
        serde_json::from_value(serde_json::json!({
            "success": true,
            "cpu_usage": 20.0,
            "memory_usage": 300.0,
            "temperature": temperature,
            "architecture": "aarch64",
            "python_version": "3.11.2",
            "is_raspberry_pi": rpi,
            "raspberry_pi_model": "5",
        }))
        .unwrap()
    }

    #[test]
    fn panel_present_only_for_raspberry_pi() {
        let mut collector = MetricsCollector::default();
        assert!(raspberry_panel(&collector).is_none());

        collector.record_system_metrics(&poll(68.0, true), 1);
        let html = raspberry_panel(&collector).unwrap();
        assert!(html.contains("<strong>Modelo:</strong> 5"));
        assert!(html.contains("68.0°C"));
        assert!(html.contains("Alta - Monitorar"));
        assert!(html.contains("health-warning"));

        collector.record_system_metrics(&poll(40.0, false), 2);
        assert!(raspberry_panel(&collector).is_none());
    }

    #[test]
    fn comparative_panels_without_data_show_messages() {
        let report = comparative_report(&MetricsCollector::default(), Locale::Pt, 0);
        let html = comparative_sections(&report);
        assert!(html.server.contains("<p>Dados não disponíveis</p>"));
        assert!(html.client.contains("<p>Dados do navegador não disponíveis</p>"));
        assert!(html.comparison.contains("<p>Dados de tradução não disponíveis</p>"));
    }

    #[test]
    fn comparative_server_table() {
        let mut collector = MetricsCollector::default();
        collector.record_system_metrics(&poll(50.0, true), 1);
        let html = comparative_sections(&comparative_report(&collector, Locale::Pt, 2));
        assert!(html.server.contains(r#"<table class="metrics-table">"#));
        assert!(html.server.contains("<td><strong>Atual:</strong> 20%</td>"));
        assert!(html.server.contains("Detalhes do Raspberry Pi"));
        assert!(html.server.contains(r#"<span class="log-info">Normal</span>"#));
    }

    #[test]
    fn client_lists_render_each_metric() {
        let mut collector = MetricsCollector::default();
        collector.start_collection(0);
        collector.collect_client_metrics(&mut Full, 1);
        let html = client_lists(&client_report(&collector, Locale::Pt, 2)).unwrap();

        assert!(html.memory.unwrap().contains("Uso médio: 10.00 MB (10.0% do limite)"));
        assert!(html.network.unwrap().contains("Tipo de conexão: 4g"));
        assert!(html.page_load.is_none());
        assert!(html.resources.unwrap().contains("script: 1 recursos (12.00 ms)"));
        assert!(html.interactions.unwrap().contains("Sessões: 1 (1 ativa(s))"));
    }

    #[test]
    fn client_lists_absent_without_readings() {
        let report = client_report(&MetricsCollector::default(), Locale::Pt, 0);
        assert!(client_lists(&report).is_none());
    }
}
