//! Log-line highlighting.
//!
//! One case-insensitive pass over the line. At any position the earliest
//! alternative wins, in this order: error level tags, warning level tags,
//! info tags, debug tags, the diagnostics tag, known failure substrings,
//! and tracebacks. Text outside a match is HTML-escaped.

use std::sync::LazyLock;

use regex::Regex;

use super::escape_html;

static LOG_TOKENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)",
        r"(?P<error>\[ERROR\]|\[ERRO\]|\bERROR\b|ERRO)",
        r"|(?P<warning>\[WARNING\]|\[AVISO\]|AVISO|\bWARNING\b)",
        r"|(?P<info>\[INFO\]|INFO)",
        r"|(?P<debug>\[DEBUG\]|DEBUG)",
        r"|(?P<diagnostic>\[DIAGNÓSTICO\])",
        r"|(?P<failure>english-snejag-translator|\b500\b|modelo problemático|Error|Exception)",
        r"|(?P<traceback>Traceback)",
    ))
    .expect("log token regex must compile")
});

/// CSS class for each named group.
const CLASSES: &[(&str, &str)] = &[
    ("error", "log-error"),
    ("warning", "log-warning"),
    ("info", "log-info"),
    ("debug", "log-debug"),
    ("diagnostic", "log-info"),
    ("failure", "log-error"),
    ("traceback", "log-warning"),
];

/// Highlight one log line as HTML.
pub fn format_log_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + 32);
    let mut last = 0;

    for caps in LOG_TOKENS.captures_iter(line) {
        let Some((class, m)) = CLASSES
            .iter()
            .find_map(|(group, class)| caps.name(group).map(|m| (*class, m)))
        else {
            continue;
        };
        out.push_str(&escape_html(&line[last..m.start()]));
        out.push_str(&format!(
            r#"<span class="{class}">{}</span>"#,
            escape_html(m.as_str())
        ));
        last = m.end();
    }

    out.push_str(&escape_html(&line[last..]));
    out
}

/// Highlight every line of `text`, joined with `<br>`.
pub fn format_log(text: &str) -> String {
    text.lines().map(format_log_line).collect::<Vec<_>>().join("<br>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_line_is_empty() {
        assert_eq!(format_log_line(""), "");
    }

    #[test]
    fn wraps_error_tag() {
        assert_eq!(
            format_log_line("[ERROR] model failed"),
            r#"<span class="log-error">[ERROR]</span> model failed"#
        );
    }

    #[test]
    fn full_error_word_beats_portuguese_prefix() {
        assert_eq!(
            format_log_line("ERROR here"),
            r#"<span class="log-error">ERROR</span> here"#
        );
    }

    #[test]
    fn case_insensitive_levels() {
        let html = format_log_line("[aviso] disco cheio; info: ok");
        assert!(html.contains(r#"<span class="log-warning">[aviso]</span>"#));
        assert!(html.contains(r#"<span class="log-info">info</span>"#));
    }

    #[test]
    fn known_failures_and_tracebacks() {
        let html = format_log_line("Traceback: HTTP 500 from english-snejag-translator");
        assert!(html.starts_with(r#"<span class="log-warning">Traceback</span>"#));
        assert!(html.contains(r#"<span class="log-error">500</span>"#));
        assert!(html.contains(r#"<span class="log-error">english-snejag-translator</span>"#));
    }

    #[test]
    fn status_5000_is_not_500() {
        assert_eq!(format_log_line("took 5000ms"), "took 5000ms");
    }

    #[test]
    fn diagnostic_tag_is_info() {
        assert_eq!(
            format_log_line("[DIAGNÓSTICO] ok"),
            r#"<span class="log-info">[DIAGNÓSTICO]</span> ok"#
        );
    }

    #[test]
    fn escapes_surrounding_text() {
        assert_eq!(
            format_log_line("<b>DEBUG</b>"),
            r#"&lt;b&gt;<span class="log-debug">DEBUG</span>&lt;/b&gt;"#
        );
    }

    #[test]
    fn multi_line() {
        assert_eq!(
            format_log("a\nINFO"),
            r#"a<br><span class="log-info">INFO</span>"#
        );
    }
}
