//! HTML fragments for the diagnostics page.
//!
//! - [`log`]: log-line highlighting
//! - [`html`]: report sections, client lists, and the Raspberry Pi panel
//!
//! Small shared pieces (escaping, health dots, thermal state) live here.

pub mod html;
pub mod log;

pub use html::{ClientHtml, ComparativeHtml, client_lists, comparative_sections, raspberry_panel};
pub use self::log::format_log_line;

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Colored status dot. `status` is one of the page's CSS variants
/// (`good`, `warning`, `error`, ...).
pub fn health_indicator(status: &str) -> String {
    format!(
        r#"<span class="health-indicator health-{}"></span>"#,
        escape_html(status)
    )
}

/// Thermal classification of a server temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThermalState {
    Normal,
    Elevated,
    High,
    Critical,
}

impl ThermalState {
    pub fn from_celsius(celsius: f64) -> Self {
        if celsius > 75.0 {
            Self::Critical
        } else if celsius > 65.0 {
            Self::High
        } else if celsius > 55.0 {
            Self::Elevated
        } else {
            Self::Normal
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Elevated => "Elevada",
            Self::High => "Alta - Monitorar",
            Self::Critical => "Crítico - Resfriamento necessário!",
        }
    }

    /// Variant for [`health_indicator`].
    pub fn health(self) -> &'static str {
        match self {
            Self::Normal => "good",
            Self::Elevated | Self::High => "warning",
            Self::Critical => "error",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::Normal => "text-green-600",
            Self::Elevated => "text-yellow-600",
            Self::High => "text-orange-600 font-bold",
            Self::Critical => "text-red-600 font-bold",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<a href="x">&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn health_dot() {
        assert_eq!(
            health_indicator("good"),
            r#"<span class="health-indicator health-good"></span>"#
        );
    }

    #[test]
    fn thermal_boundaries() {
        assert_eq!(ThermalState::from_celsius(55.0), ThermalState::Normal);
        assert_eq!(ThermalState::from_celsius(55.1), ThermalState::Elevated);
        assert_eq!(ThermalState::from_celsius(65.0), ThermalState::Elevated);
        assert_eq!(ThermalState::from_celsius(70.0), ThermalState::High);
        assert_eq!(ThermalState::from_celsius(75.0), ThermalState::High);
        assert_eq!(ThermalState::from_celsius(80.0), ThermalState::Critical);
    }
}
