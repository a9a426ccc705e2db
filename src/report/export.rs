//! Writing reports to disk.
//!
//! Files are UTF-8 JSON with a byte-order mark, pretty-printed, and named
//! `<prefix>-<YYYY-MM-DD>.json`. Strings are cleaned of mis-decoded accent
//! sequences before writing.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use unicode_normalization::UnicodeNormalization;

use super::{client_report, comparative_report, device_name, server_report, technical_report};
use crate::config::schema::Locale;
use crate::metrics::MetricsCollector;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// UTF-8 read as Latin-1, mapped back to the intended character.
const MOJIBAKE: &[(&str, &str)] = &[
    ("Ã©", "é"),
    ("Ã§", "ç"),
    ("Ã£", "ã"),
    ("Ã¡", "á"),
    ("Ã\u{a0}", "à"),
    ("Ã¢", "â"),
    ("Ã³", "ó"),
    ("Ãµ", "õ"),
    ("Ãº", "ú"),
    ("Ã\u{ad}", "í"),
    ("Â°C", "°C"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    /// Technical report.
    Performance,
    /// Client-only report.
    Browser,
    /// Server versus client.
    Comparative,
    /// Server-only report, named after the device.
    Server,
}

impl FromStr for ExportKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "performance" | "technical" => Ok(Self::Performance),
            "browser" | "client" => Ok(Self::Browser),
            "comparative" => Ok(Self::Comparative),
            "server" => Ok(Self::Server),
            other => anyhow::bail!(
                "unknown export kind '{other}' (expected performance, browser, comparative, or server)"
            ),
        }
    }
}

impl ExportKind {
    pub const ALL: [ExportKind; 4] = [
        ExportKind::Performance,
        ExportKind::Browser,
        ExportKind::Comparative,
        ExportKind::Server,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Performance => "performance",
            Self::Browser => "browser",
            Self::Comparative => "comparative",
            Self::Server => "server",
        }
    }
}

/// Repair mis-decoded accents in one string, drop stray `Â`, and compose
/// to NFC.
pub fn clean_text(text: &str) -> String {
    let mut cleaned = text.to_string();
    for (broken, fixed) in MOJIBAKE {
        if cleaned.contains(broken) {
            cleaned = cleaned.replace(broken, fixed);
        }
    }
    cleaned.replace('Â', "").nfc().collect()
}

/// Apply [`clean_text`] to every string in `value`, recursively.
pub fn clean_special_chars(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(clean_text(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(clean_special_chars).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, clean_special_chars(v)))
                .collect(),
        ),
        other => other,
    }
}

pub fn export_file_name(prefix: &str, now: i64) -> String {
    let date = DateTime::<Utc>::from_timestamp_millis(now)
        .unwrap_or_default()
        .format("%Y-%m-%d");
    format!("{prefix}-{date}.json")
}

/// Serialize `report`, clean it, and write it with a BOM to `path`.
pub fn write_json_with_bom<T: Serialize>(report: &T, path: &Path) -> Result<()> {
    let value = clean_special_chars(serde_json::to_value(report)?);
    let mut bytes = BOM.to_vec();
    serde_json::to_writer_pretty(&mut bytes, &value)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}

/// Build the report for `kind` and write it into `dir`. Returns the path
/// written.
pub fn export(
    collector: &MetricsCollector,
    kind: ExportKind,
    locale: Locale,
    dir: &Path,
    now: i64,
) -> Result<PathBuf> {
    let path = |prefix: &str| dir.join(export_file_name(prefix, now));

    let written = match kind {
        ExportKind::Performance => {
            let path = path("performance-metrics");
            write_json_with_bom(&technical_report(collector, now), &path)?;
            path
        }
        ExportKind::Browser => {
            let path = path("browser-metrics");
            write_json_with_bom(&client_report(collector, locale, now), &path)?;
            path
        }
        ExportKind::Comparative => {
            let path = path("comparativo-servidor-cliente");
            write_json_with_bom(&comparative_report(collector, locale, now), &path)?;
            path
        }
        ExportKind::Server => {
            let path = path(&format!("{}-metrics", device_name(collector)));
            write_json_with_bom(&server_report(collector, locale, now), &path)?;
            path
        }
    };

    log::info!("exported {} report to {}", kind.as_str(), written.display());
    Ok(written)
}
