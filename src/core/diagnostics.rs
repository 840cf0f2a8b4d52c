use crate::config::DiagnosticsConfig;
use crate::domain::model::{DiagnosticRecord, Severity};
use once_cell::sync::Lazy;
use regex::Regex;

static ERROR_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^!\s*(\S.*)$").expect("error pattern is valid"));
static LINE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bl\.(\d+)").expect("line marker pattern is valid"));
static WARNING_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^LaTeX Warning:\s*(.+)$").expect("warning pattern is valid"));

/// Turns a raw TeX log into structured records.
///
/// The `l.<n>` marker is only looked up on the same line as the `!` error and is cut from
/// the message; a marker on a later line leaves the record at line 0.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticsParser {
    max_records: usize,
    max_message_chars: usize,
}

impl DiagnosticsParser {
    pub fn new(config: DiagnosticsConfig) -> Self {
        Self {
            max_records: config.max_records,
            max_message_chars: config.max_message_chars,
        }
    }

    pub fn parse(&self, log: &str) -> Vec<DiagnosticRecord> {
        log.lines()
            .filter_map(|line| self.parse_line(line))
            .take(self.max_records)
            .collect()
    }

    fn parse_line(&self, line: &str) -> Option<DiagnosticRecord> {
        if let Some(caps) = ERROR_LINE.captures(line) {
            let text = caps[1].trim();
            let (line_number, message) = split_line_marker(text);

            return Some(DiagnosticRecord {
                line: line_number,
                message: truncate_chars(message, self.max_message_chars),
                severity: Severity::Error,
            });
        }

        WARNING_LINE.captures(line).map(|caps| DiagnosticRecord {
            line: 0,
            message: truncate_chars(caps[1].trim(), self.max_message_chars),
            severity: Severity::Warning,
        })
    }
}

impl Default for DiagnosticsParser {
    fn default() -> Self {
        Self::new(DiagnosticsConfig::default())
    }
}

/// `"Undefined control sequence. l.12 \\foo"` → `(12, "Undefined control sequence.")`.
/// A marker with nothing before it keeps the full text.
fn split_line_marker(text: &str) -> (u32, &str) {
    let Some(caps) = LINE_MARKER.captures(text) else {
        return (0, text);
    };
    let line_number = caps[1].parse().unwrap_or(0);

    let before = caps.get(0).map_or(text, |m| text[..m.start()].trim_end());
    if before.is_empty() {
        (line_number, text)
    } else {
        (line_number, before)
    }
}

/// Cuts on a char boundary, never mid code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => text[..index].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(line: u32, message: &str) -> DiagnosticRecord {
        DiagnosticRecord {
            line,
            message: message.to_string(),
            severity: Severity::Error,
        }
    }

    #[test]
    fn test_error_with_line_marker_on_same_line() {
        let records = DiagnosticsParser::default().parse("! Undefined control sequence. l.12 \\foo");
        assert_eq!(records, vec![error(12, "Undefined control sequence.")]);
    }

    #[test]
    fn test_bang_without_text_is_not_an_error() {
        assert!(DiagnosticsParser::default().parse("!   ").is_empty());
        assert!(DiagnosticsParser::default().parse("!   \n!\t\n!").is_empty());
    }

    #[test]
    fn test_marker_only_error_keeps_its_text() {
        let records = DiagnosticsParser::default().parse("! l.7 \\bad");
        assert_eq!(records, vec![error(7, "l.7 \\bad")]);
    }

    #[test]
    fn test_marker_needs_word_boundary() {
        let records = DiagnosticsParser::default().parse("! Overfull.3 detected");
        assert_eq!(records, vec![error(0, "Overfull.3 detected")]);
    }

    #[test]
    fn test_line_marker_on_following_line_is_ignored() {
        let log = "! Undefined control sequence.\n<recently read> \\foo\nl.12 \\foo\n";
        let records = DiagnosticsParser::default().parse(log);
        assert_eq!(records, vec![error(0, "Undefined control sequence.")]);
    }

    #[test]
    fn test_warning_line() {
        let records = DiagnosticsParser::default().parse("LaTeX Warning: Reference undefined");
        assert_eq!(
            records,
            vec![DiagnosticRecord {
                line: 0,
                message: "Reference undefined".to_string(),
                severity: Severity::Warning,
            }]
        );
    }

    #[test]
    fn test_mixed_log_preserves_order_and_ignores_noise() {
        let log = "This is pdfTeX, Version 3.141592653\r\n\
                   (./main.tex\r\n\
                   LaTeX Warning: Citation `knuth' on page 1 undefined on input line 5.\r\n\
                   ! Missing $ inserted.\r\n\
                   <inserted text>\r\n\
                   !\r\n\
                   Output written on main.pdf (1 page).\r\n";

        let records = DiagnosticsParser::default().parse(log);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].severity, Severity::Warning);
        assert_eq!(
            records[0].message,
            "Citation `knuth' on page 1 undefined on input line 5."
        );
        assert_eq!(records[1], error(0, "Missing $ inserted."));
    }

    #[test]
    fn test_record_count_is_capped() {
        let log = (0..50)
            .map(|i| format!("! Error number {}", i))
            .collect::<Vec<_>>()
            .join("\n");

        let records = DiagnosticsParser::default().parse(&log);

        assert_eq!(records.len(), 20);
        assert_eq!(records[0].message, "Error number 0");
        assert_eq!(records[19].message, "Error number 19");
    }

    #[test]
    fn test_message_is_truncated() {
        let parser = DiagnosticsParser::new(DiagnosticsConfig {
            max_message_chars: 5,
            ..DiagnosticsConfig::default()
        });

        let records = parser.parse("! Überfull hbox\nLaTeX Warning: Label multiply defined");
        assert_eq!(records[0].message, "Überf");
        assert_eq!(records[1].message, "Label");
    }

    #[test]
    fn test_parse_is_repeatable() {
        let parser = DiagnosticsParser::default();
        let log = "! Emergency stop.\nLaTeX Warning: There were undefined references.";
        assert_eq!(parser.parse(log), parser.parse(log));
    }

    #[test]
    fn test_empty_log_yields_nothing() {
        assert!(DiagnosticsParser::default().parse("").is_empty());
    }
}
