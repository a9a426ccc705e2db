//! Client-side probes.
//!
//! A [`ClientProbe`] produces one [`ProbeReading`] per client sampling tick.
//! Every capability in a reading is optional; the collector skips whatever
//! is absent.
//!
//! Two probes exist:
//! - [`HostProbe`] reads this process through `sysinfo` and derives
//!   connection quality and resource timings from the API client's request
//!   log.
//! - [`BrowserSnapshot`] carries readings that the dashboard page took from
//!   the browser's performance APIs and posted back.

use serde::{Deserialize, Serialize};
use sysinfo::{Pid, ProcessesToUpdate, System};

use super::interactions::InteractionKind;
use crate::client::RequestLog;

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

/// Memory of the client runtime, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeapReading {
    pub used: u64,
    pub total: u64,
    pub limit: u64,
}

/// Network quality as the client sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionReading {
    /// `slow-2g`, `2g`, `3g`, or `4g`.
    pub effective_type: String,
    #[serde(default)]
    pub downlink_mbps: Option<f64>,
    #[serde(default)]
    pub rtt_ms: Option<f64>,
    #[serde(default)]
    pub save_data: bool,
}

/// Page navigation milestones (epoch ms).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NavigationTiming {
    pub navigation_start: f64,
    pub load_event_end: f64,
    pub dom_complete: f64,
    pub dom_interactive: f64,
    pub response_end: f64,
    pub response_start: f64,
    pub connect_end: f64,
    pub connect_start: f64,
    pub domain_lookup_end: f64,
    pub domain_lookup_start: f64,
    pub redirect_end: f64,
    pub redirect_start: f64,
}

/// Static description of the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientInfo {
    pub user_agent: String,
    pub platform: String,
    pub language: String,
    pub cookies_enabled: Option<bool>,
    pub device_pixel_ratio: Option<f64>,
    pub screen_width: Option<u32>,
    pub screen_height: Option<u32>,
    pub viewport_width: Option<u32>,
    pub viewport_height: Option<u32>,
    pub cpu_cores: Option<u32>,
    pub device_memory_gb: Option<f64>,
}

/// One loaded resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEntry {
    pub initiator_type: String,
    pub duration_ms: f64,
}

/// Everything one probe read produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProbeReading {
    pub heap: Option<HeapReading>,
    pub connection: Option<ConnectionReading>,
    pub navigation: Option<NavigationTiming>,
    pub client_info: Option<ClientInfo>,
    /// Resources loaded so far, oldest first. The collector only looks at
    /// entries past its cursor.
    pub resources: Option<Vec<ResourceEntry>>,
    /// Number of older entries the source dropped before `resources[0]`.
    pub resources_offset: usize,
}

/// A source of client readings.
pub trait ClientProbe: Send {
    fn read(&mut self) -> anyhow::Result<ProbeReading>;
}

// ---------------------------------------------------------------------------
// Host probe
// ---------------------------------------------------------------------------

/// Effective connection type for a round-trip time, using the thresholds
/// of the Network Information API.
pub fn effective_type_for_rtt(rtt_ms: f64) -> &'static str {
    if rtt_ms >= 2000.0 {
        "slow-2g"
    } else if rtt_ms >= 1400.0 {
        "2g"
    } else if rtt_ms >= 270.0 {
        "3g"
    } else {
        "4g"
    }
}

/// Probe of the process running transctl.
pub struct HostProbe {
    system: System,
    pid: Pid,
    requests: RequestLog,
}

impl HostProbe {
    pub fn new(requests: RequestLog) -> Self {
        let mut system = System::new();
        let pid = Pid::from_u32(std::process::id());
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]));
        Self {
            system,
            pid,
            requests,
        }
    }

    fn client_info(&self) -> ClientInfo {
        let cpu_cores = std::thread::available_parallelism()
            .ok()
            .map(|n| n.get() as u32);
        let total = self.system.total_memory();
        ClientInfo {
            user_agent: format!("transctl/{}", env!("CARGO_PKG_VERSION")),
            platform: System::long_os_version().unwrap_or_else(|| std::env::consts::OS.to_string()),
            language: std::env::var("LANG").unwrap_or_default(),
            cpu_cores,
            device_memory_gb: (total > 0).then(|| total as f64 / (1024.0 * 1024.0 * 1024.0)),
            ..Default::default()
        }
    }
}

impl ClientProbe for HostProbe {
    fn read(&mut self) -> anyhow::Result<ProbeReading> {
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[self.pid]));
        self.system.refresh_memory();

        let limit = self.system.total_memory();
        let heap = self.system.process(self.pid).map(|process| HeapReading {
            used: process.memory(),
            total: process.virtual_memory(),
            limit,
        });

        let connection = self.requests.last_rtt_ms().map(|rtt| ConnectionReading {
            effective_type: effective_type_for_rtt(rtt).to_string(),
            downlink_mbps: None,
            rtt_ms: Some(rtt.round()),
            save_data: false,
        });

        let (resources_offset, reached) = self.requests.reached();
        let resources = reached
            .into_iter()
            .map(|t| ResourceEntry {
                initiator_type: "api".to_string(),
                duration_ms: t.duration_ms,
            })
            .collect();

        Ok(ProbeReading {
            heap,
            connection,
            navigation: None,
            client_info: Some(self.client_info()),
            resources: Some(resources),
            resources_offset,
        })
    }
}

// ---------------------------------------------------------------------------
// Browser snapshot
// ---------------------------------------------------------------------------

/// One user-activity event reported by the browser.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub kind: InteractionKind,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

/// Readings posted by the dashboard page to `POST /api/browser-metrics`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrowserSnapshot {
    /// Random id the page picks on load.
    pub page_id: Option<String>,
    #[serde(flatten)]
    pub reading: ProbeReading,
    pub interactions: Vec<InteractionEvent>,
}

impl ClientProbe for BrowserSnapshot {
    fn read(&mut self) -> anyhow::Result<ProbeReading> {
        Ok(self.reading.clone())
    }
}
