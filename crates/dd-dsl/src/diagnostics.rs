use ariadne::{Color, Label, Report, ReportKind, Source};
use std::fmt;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The story cannot be loaded.
    Error,
    /// The story loads, but something is probably wrong.
    Warning,
}

/// A compile diagnostic with source location.
///
/// Diagnostics produced by the loader (duplicate ids, missing first page)
/// refer to the document as a whole and carry an empty span.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// How bad it is.
    pub severity: Severity,
    /// Byte range of the offending input.
    pub span: std::ops::Range<usize>,
    /// Human-readable description.
    pub message: String,
    /// Optional label shown at the span.
    pub label: Option<String>,
}

impl Diagnostic {
    /// An error diagnostic.
    pub fn error(span: std::ops::Range<usize>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            span,
            message: message.into(),
            label: None,
        }
    }

    /// A warning diagnostic.
    pub fn warning(span: std::ops::Range<usize>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            span,
            message: message.into(),
            label: None,
        }
    }

    /// Attach a label shown at the span.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// True for error severity.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{prefix}: {}", self.message)
    }
}

/// Render diagnostics against the source text using ariadne.
pub fn render_diagnostics(source: &str, filename: &str, diagnostics: &[Diagnostic]) -> String {
    let mut output = Vec::new();

    for diag in diagnostics {
        let (kind, color) = match diag.severity {
            Severity::Error => (ReportKind::Error, Color::Red),
            Severity::Warning => (ReportKind::Warning, Color::Yellow),
        };

        let mut report =
            Report::build(kind, (filename, diag.span.clone())).with_message(&diag.message);

        if !diag.span.is_empty() {
            let label_text = diag.label.as_deref().unwrap_or(&diag.message);
            report = report.with_label(
                Label::new((filename, diag.span.clone()))
                    .with_message(label_text)
                    .with_color(color),
            );
        }

        report
            .finish()
            .write((filename, Source::from(source)), &mut output)
            .ok();
    }

    String::from_utf8(output).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_display() {
        let d = Diagnostic::error(3..9, "unknown tag <pge>");
        assert_eq!(d.to_string(), "error: unknown tag <pge>");
        assert!(d.is_error());

        let w = Diagnostic::warning(0..0, "duplicate page id");
        assert!(!w.is_error());
    }

    #[test]
    fn render_includes_message() {
        let source = "<page id=\"start\">\n</pge>";
        let diags =
            vec![Diagnostic::error(18..24, "mismatched closing tag").with_label("expected </page>")];
        let output = render_diagnostics(source, "story.ded", &diags);
        assert!(output.contains("mismatched closing tag"));
    }
}
