/// Configuration schema and defaults for transctl.
///
/// Defines the TOML-serializable configuration structure with all sections:
/// `[server]`, `[storage]`, `[corrections]`, `[collector]`, `[report]`,
/// `[dashboard]`, `[keepalive]`, and `[logging]`.
///
/// Every field has a built-in default. Users only need to set the values
/// they want to override.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level transctl configuration.
///
/// Maps directly to the `~/.transctl/config.toml` and `.transctl.toml` file
/// schemas. All sections and fields are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransctlConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub corrections: CorrectionsConfig,
    pub collector: CollectorConfig,
    pub report: ReportConfig,
    pub dashboard: DashboardConfig,
    pub keepalive: KeepaliveConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// Translation server connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the translation server (no trailing slash needed).
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_ms: 30_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [storage]
// ---------------------------------------------------------------------------

/// Local key-value storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the JSON store file. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "~/.transctl/storage.json".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [corrections]
// ---------------------------------------------------------------------------

/// Correction relay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionsConfig {
    /// Connectivity flag: when `false`, corrections are only stored locally.
    pub relay_enabled: bool,
}

impl Default for CorrectionsConfig {
    fn default() -> Self {
        Self {
            relay_enabled: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [collector]
// ---------------------------------------------------------------------------

/// Metrics collector timers and series capacities.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Interval between server metric polls (milliseconds).
    pub system_interval_ms: u64,
    /// Interval between client probe reads (milliseconds).
    pub client_interval_ms: u64,
    /// Interval of the idle-session sweep (milliseconds).
    pub inactivity_sweep_ms: u64,
    /// Inactivity gap that ends an interaction session (seconds).
    pub session_timeout_secs: u64,
    /// Capacity of the cpu / memory / temperature series.
    pub system_series_cap: usize,
    /// Capacity of the client heap and connection series.
    pub client_series_cap: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            system_interval_ms: 2_000,
            client_interval_ms: 5_000,
            inactivity_sweep_ms: 30_000,
            session_timeout_secs: 60,
            system_series_cap: 100,
            client_series_cap: 50,
        }
    }
}

// ---------------------------------------------------------------------------
// [report]
// ---------------------------------------------------------------------------

/// Label language for the comparative report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Locale {
    /// Portuguese labels (the server's native language).
    #[default]
    Pt,
    /// English labels.
    En,
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pt => write!(f, "pt"),
            Self::En => write!(f, "en"),
        }
    }
}

/// Report generation and export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Label language for the comparative report.
    pub locale: Locale,
    /// Directory exported JSON files are written to.
    pub export_dir: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            export_dir: ".".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [dashboard]
// ---------------------------------------------------------------------------

/// Embedded web dashboard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Listen address for `transctl web`.
    pub addr: String,
    /// Open the dashboard in the default browser on start.
    pub open_browser: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9747".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [keepalive]
// ---------------------------------------------------------------------------

/// Keep-alive pinger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepaliveConfig {
    /// URL to ping. Empty means `<server.base_url>/api/models`.
    pub url: String,
    /// Seconds between pings.
    pub interval_secs: u64,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            interval_secs: 25,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl TransctlConfig {
    /// The annotated default config written by `transctl config init`.
    pub fn default_toml() -> String {
        r#"# transctl Configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (TRANSCTL_*)
#   2. Project config (.transctl.toml in current directory)
#   3. User global config (~/.transctl/config.toml)
#   4. Built-in defaults

[server]
base_url = "http://127.0.0.1:5000"
timeout_ms = 30000

[storage]
path = "~/.transctl/storage.json"

[corrections]
relay_enabled = true        # false keeps corrections local only

[collector]
system_interval_ms = 2000
client_interval_ms = 5000
inactivity_sweep_ms = 30000
session_timeout_secs = 60
system_series_cap = 100
client_series_cap = 50

[report]
locale = "pt"               # pt | en
export_dir = "."

[dashboard]
addr = "127.0.0.1:9747"
open_browser = true

[keepalive]
url = ""                    # empty = <server.base_url>/api/models
interval_secs = 25

[logging]
level = "warn"              # RUST_LOG overrides
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_toml_parses_back() {
        let toml_str = TransctlConfig::default_toml();
        let config: TransctlConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.server.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.collector.system_series_cap, 100);
        assert_eq!(config.collector.client_series_cap, 50);
        assert_eq!(config.report.locale, Locale::Pt);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config: TransctlConfig = toml::from_str(
            r#"
[server]
base_url = "http://pi.local:5000"
"#,
        )
        .unwrap();
        assert_eq!(config.server.base_url, "http://pi.local:5000");
        assert_eq!(config.server.timeout_ms, 30_000);
        assert!(config.corrections.relay_enabled);
    }

    #[test]
    fn locale_display() {
        assert_eq!(Locale::Pt.to_string(), "pt");
        assert_eq!(Locale::En.to_string(), "en");
    }
}
