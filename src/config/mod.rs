/// Configuration system for transctl.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults** — hardcoded in [`schema::TransctlConfig::default()`]
/// 2. **User global config** — `~/.transctl/config.toml`
/// 3. **Project local config** — `.transctl.toml` in the current working directory
/// 4. **Environment variables** — `TRANSCTL_*` overrides (highest precedence)
///
/// Later layers override earlier ones key by key. Keys a TOML file leaves
/// out keep the previous layer's values.
///
/// # Usage
///
/// ```rust,ignore
/// use transctl::config;
///
/// let cfg = config::load();
/// let client = ApiClient::from_config(&cfg.server);
/// ```
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::TransctlConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved transctl configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars.
pub fn load() -> TransctlConfig {
    let layers = [global_config_path(), project_config_path()];
    let mut config = load_layers(layers.iter().flatten());
    apply_env_overrides(&mut config);
    config
}

/// Merge the TOML files at `paths` over the defaults, later files winning
/// key by key.
///
/// Missing files are skipped. A malformed file, or a merge result that no
/// longer fits the schema, leaves the previous layers in effect.
pub fn load_layers<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) -> TransctlConfig {
    let defaults = TransctlConfig::default();
    let Ok(mut merged) = toml::Value::try_from(&defaults) else {
        return defaults;
    };

    for path in paths {
        let Some(layer) = load_toml_file(path) else {
            continue;
        };
        let mut candidate = merged.clone();
        merge_toml(&mut candidate, layer);
        match candidate.clone().try_into::<TransctlConfig>() {
            Ok(_) => merged = candidate,
            Err(e) => log::warn!("ignoring config {}: {e}", path.display()),
        }
    }

    merged.try_into().unwrap_or(defaults)
}

/// Read a TOML file as a raw value tree (if it exists and parses).
fn load_toml_file(path: &Path) -> Option<toml::Value> {
    let content = fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("ignoring malformed config {}: {e}", path.display());
            None
        }
    }
}

/// Recursively overlay `overlay` onto `base`. Tables merge; any other value
/// replaces.
fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// `~/.transctl`, the home of the global config and the default store.
pub fn home_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".transctl"))
}

fn global_config_path() -> Option<PathBuf> {
    home_dir().map(|dir| dir.join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".transctl.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `TRANSCTL_SERVER_URL` — translation server base URL
/// - `TRANSCTL_TIMEOUT_MS` — request timeout
/// - `TRANSCTL_STORAGE` — store file path
/// - `TRANSCTL_RELAY` — correction relay on/off (`1`/`true`/`yes`/`on`)
/// - `TRANSCTL_LOCALE` — report locale (`pt`, `en`)
/// - `TRANSCTL_EXPORT_DIR` — export directory
/// - `TRANSCTL_DASHBOARD_ADDR` — dashboard listen address
/// - `TRANSCTL_LOG` — log level
fn apply_env_overrides(config: &mut TransctlConfig) {
    if let Ok(val) = std::env::var("TRANSCTL_SERVER_URL")
        && !val.is_empty()
    {
        config.server.base_url = val;
    }
    if let Ok(val) = std::env::var("TRANSCTL_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.server.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var("TRANSCTL_STORAGE")
        && !val.is_empty()
    {
        config.storage.path = val;
    }
    if let Ok(val) = std::env::var("TRANSCTL_RELAY") {
        config.corrections.relay_enabled = is_truthy(&val);
    }
    if let Ok(val) = std::env::var("TRANSCTL_LOCALE")
        && let Some(locale) = parse_locale(&val)
    {
        config.report.locale = locale;
    }
    if let Ok(val) = std::env::var("TRANSCTL_EXPORT_DIR")
        && !val.is_empty()
    {
        config.report.export_dir = val;
    }
    if let Ok(val) = std::env::var("TRANSCTL_DASHBOARD_ADDR")
        && !val.is_empty()
    {
        config.dashboard.addr = val;
    }
    if let Ok(val) = std::env::var("TRANSCTL_LOG")
        && !val.is_empty()
    {
        config.logging.level = val;
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_locale(val: &str) -> Option<schema::Locale> {
    match val.to_ascii_lowercase().as_str() {
        "pt" | "pt-br" | "pt_br" => Some(schema::Locale::Pt),
        "en" | "en-us" | "en_us" => Some(schema::Locale::En),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.transctl/config.toml`.
///
/// Returns an error if the file already exists (use `force = true` to
/// overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.transctl/ directory")?;
    }

    fs::write(&path, TransctlConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Supports dotted keys like `server.base_url`. When the file does not exist
/// yet, the defaults are written out first.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&TransctlConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    // Reject values that no longer deserialize into the schema.
    let check = toml::to_string_pretty(&root).context("failed to serialize config")?;
    toml::from_str::<TransctlConfig>(&check)
        .with_context(|| format!("invalid value for '{key}': {value}"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, check).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("invalid config key: '{key}'");
    }

    let mut current = root;
    for &part in &parts[..parts.len() - 1] {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let leaf = parts[parts.len() - 1];
    let table = current
        .as_table_mut()
        .with_context(|| format!("expected a table above '{key}'"))?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(_) => toml::Value::String(raw_value.to_string()),
        None => anyhow::bail!("config key not found: '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
