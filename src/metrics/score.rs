//! Composite client performance score.

use super::collector::ClientMetrics;

/// Score for one effective connection type.
fn connection_type_score(effective_type: &str) -> f64 {
    match effective_type {
        "slow-2g" => 25.0,
        "2g" => 50.0,
        "3g" => 75.0,
        "4g" => 100.0,
        _ => 50.0,
    }
}

/// Integer score in 0..=100 averaged over whichever components are present:
/// heap pressure, connection quality, page load time, and resource load
/// time. Returns 0 when no component can be scored.
pub fn performance_score(metrics: &ClientMetrics) -> u8 {
    let mut score = 0.0;
    let mut components = 0u32;

    if let Some(heap) = &metrics.js_heap_memory {
        score += (100.0 - heap.max_percent).max(0.0);
        components += 1;
    }

    if let Some(connection) = &metrics.network_connection {
        let mut network = connection_type_score(&connection.effective_type);
        if let Some(rtt) = connection.rtt_ms.filter(|rtt| *rtt != 0.0) {
            network = (network + (100.0 - rtt / 10.0).max(0.0)) / 2.0;
        }
        score += network;
        components += 1;
    }

    if let Some(page) = &metrics.page_load {
        score += (100.0 - page.total_load_time / 50.0).max(0.0);
        components += 1;
    }

    if let Some(resources) = &metrics.resources
        && resources.avg_duration != 0.0
    {
        score += (100.0 - resources.avg_duration / 5.0).max(0.0);
        components += 1;
    }

    if components == 0 {
        return 0;
    }
    (score / components as f64).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::metrics::collector::{HeapStats, PageLoad, ResourceSummary};
    use crate::metrics::probe::ConnectionReading;

    fn heap(max_percent: f64) -> HeapStats {
        HeapStats {
            average_mb: 10.0,
            min_mb: 10.0,
            max_mb: 10.0,
            median_mb: 10.0,
            average_percent: max_percent,
            max_percent,
        }
    }

    fn metrics(max_percent: f64) -> ClientMetrics {
        ClientMetrics {
            js_heap_memory: Some(heap(max_percent)),
            network_connection: None,
            page_load: None,
            client_info: None,
            resources: None,
            user_interactions: None,
        }
    }

    #[test]
    fn heap_only() {
        assert_eq!(performance_score(&metrics(40.0)), 60);
        assert_eq!(performance_score(&metrics(130.0)), 0);
    }

    #[test]
    fn all_components() {
        let mut m = metrics(40.0);
        m.network_connection = Some(ConnectionReading {
            effective_type: "4g".to_string(),
            downlink_mbps: Some(10.0),
            rtt_ms: Some(100.0),
            save_data: false,
        });
        m.page_load = Some(PageLoad {
            total_load_time: 1000.0,
            dom_interactive_time: 0.0,
            dom_complete_time: 0.0,
            dns_lookup_time: 0.0,
            tcp_connect_time: 0.0,
            response_time: 0.0,
            processing_time: 0.0,
            redirect_time: 0.0,
        });
        m.resources = Some(ResourceSummary {
            count: 2,
            total_duration: 100.0,
            avg_duration: 50.0,
            by_type: BTreeMap::new(),
        });
        // memory 60, network (100 + 90) / 2 = 95, page 80, resources 90
        assert_eq!(performance_score(&m), 81);
    }

    #[test]
    fn unknown_connection_without_rtt() {
        let mut m = metrics(0.0);
        m.network_connection = Some(ConnectionReading {
            effective_type: "wifi".to_string(),
            downlink_mbps: None,
            rtt_ms: Some(0.0),
            save_data: false,
        });
        assert_eq!(performance_score(&m), 75);
    }

    #[test]
    fn no_components_scores_zero() {
        let mut m = metrics(0.0);
        m.js_heap_memory = None;
        assert_eq!(performance_score(&m), 0);

        // A zero resource average is not a component either.
        m.resources = Some(ResourceSummary {
            count: 0,
            total_duration: 0.0,
            avg_duration: 0.0,
            by_type: BTreeMap::new(),
        });
        assert_eq!(performance_score(&m), 0);
    }

    #[test]
    fn connection_without_heap() {
        let mut m = metrics(0.0);
        m.js_heap_memory = None;
        m.network_connection = Some(ConnectionReading {
            effective_type: "3g".to_string(),
            downlink_mbps: None,
            rtt_ms: None,
            save_data: false,
        });
        assert_eq!(performance_score(&m), 75);
    }

    #[test]
    fn zero_resource_average_is_skipped() {
        let mut m = metrics(20.0);
        m.resources = Some(ResourceSummary {
            count: 0,
            total_duration: 0.0,
            avg_duration: 0.0,
            by_type: BTreeMap::new(),
        });
        assert_eq!(performance_score(&m), 80);
    }
}
