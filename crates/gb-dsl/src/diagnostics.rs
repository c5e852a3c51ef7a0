use ariadne::{Color, Label, Report, ReportKind, Source};
use gb_core::ChapterId;
use std::fmt;
use std::ops::Range;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The script could not be compiled into a usable table.
    Error,
    /// The script compiled, but something needs the author's attention.
    Warning,
}

/// What a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A line no directive recognized; kept as an `unknown` action.
    UnknownDirective,
    /// A choice or navigation names a chapter that does not exist.
    UnresolvedTarget,
    /// A chapter id was defined more than once.
    DuplicateChapter,
    /// The last chapter is missing its terminator line.
    UnterminatedChapter,
    /// Input could not be read or contains no chapters.
    Input,
}

impl DiagnosticKind {
    /// Short code shown in rendered reports.
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticKind::UnknownDirective => "unknown-directive",
            DiagnosticKind::UnresolvedTarget => "unresolved-target",
            DiagnosticKind::DuplicateChapter => "duplicate-chapter",
            DiagnosticKind::UnterminatedChapter => "unterminated-chapter",
            DiagnosticKind::Input => "input",
        }
    }

    /// What happens to the script at play time.
    fn note(self) -> Option<&'static str> {
        match self {
            DiagnosticKind::UnknownDirective => {
                Some("the line is kept and reported as a notice when the chapter is played")
            }
            DiagnosticKind::UnresolvedTarget => {
                Some("choosing this target at play time leaves the player where they are")
            }
            DiagnosticKind::DuplicateChapter => Some("only the last definition is playable"),
            DiagnosticKind::UnterminatedChapter => {
                Some("add a line holding only `End` after the chapter")
            }
            DiagnosticKind::Input => None,
        }
    }

    fn color(self) -> Color {
        match self {
            DiagnosticKind::UnknownDirective => Color::Yellow,
            DiagnosticKind::UnresolvedTarget => Color::Magenta,
            DiagnosticKind::DuplicateChapter | DiagnosticKind::UnterminatedChapter => Color::Cyan,
            DiagnosticKind::Input => Color::Red,
        }
    }
}

/// A diagnostic message with source location.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub span: Range<usize>,
    pub message: String,
    pub label: Option<String>,
    /// Chapter the diagnostic was raised in.
    pub chapter: Option<ChapterId>,
    /// Span of that chapter's header line.
    pub header: Option<Range<usize>>,
    /// Offending script text, verbatim.
    pub source_line: Option<String>,
}

impl Diagnostic {
    pub fn error(span: Range<usize>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            kind: DiagnosticKind::Input,
            span,
            message: message.into(),
            label: None,
            chapter: None,
            header: None,
            source_line: None,
        }
    }

    pub fn warning(kind: DiagnosticKind, span: Range<usize>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            span,
            message: message.into(),
            label: None,
            chapter: None,
            header: None,
            source_line: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn in_chapter(mut self, chapter: &ChapterId) -> Self {
        self.chapter = Some(chapter.clone());
        self
    }

    pub fn with_header(mut self, header: Range<usize>) -> Self {
        self.header = Some(header);
        self
    }

    pub fn with_source_line(mut self, line: impl Into<String>) -> Self {
        self.source_line = Some(line.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match &self.chapter {
            Some(chapter) => write!(f, "{prefix}: [{chapter}] {}", self.message),
            None => write!(f, "{prefix}: {}", self.message),
        }
    }
}

/// Render diagnostics with ariadne: one report per diagnostic, coded by
/// kind. When the offending line sits inside a chapter, the chapter header
/// gets a secondary label.
pub fn render_diagnostics(source: &str, filename: &str, diagnostics: &[Diagnostic]) -> String {
    let mut output = Vec::new();

    for diag in diagnostics {
        let report_kind = match diag.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
        };

        let mut report = Report::build(report_kind, (filename, diag.span.clone()))
            .with_code(diag.kind.code())
            .with_message(&diag.message)
            .with_label(
                Label::new((filename, diag.span.clone()))
                    .with_message(diag.label.as_deref().unwrap_or(&diag.message))
                    .with_color(diag.kind.color()),
            );

        let header = diag.header.as_ref().filter(|header| **header != diag.span);
        if let (Some(chapter), Some(header)) = (&diag.chapter, header) {
            report = report.with_label(
                Label::new((filename, header.clone()))
                    .with_message(format!("in chapter `{chapter}`"))
                    .with_color(Color::Blue),
            );
        }
        if let Some(note) = diag.kind.note() {
            report = report.with_note(note);
        }

        report
            .finish()
            .write((filename, Source::from(source)), &mut output)
            .ok();
    }

    String::from_utf8(output).unwrap_or_default()
}

/// Author review report: one `chapter: line` entry per unrecognized line.
pub fn rest_report(diagnostics: &[Diagnostic]) -> Vec<String> {
    diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::UnknownDirective)
        .map(|d| {
            let chapter = d.chapter.as_ref().map(ChapterId::as_str).unwrap_or("?");
            let line = d.source_line.as_deref().unwrap_or_default();
            format!("{chapter}: {line}")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_display() {
        let d = Diagnostic::error(0..5, "script defines no chapters");
        assert_eq!(d.to_string(), "error: script defines no chapters");

        let d = Diagnostic::warning(DiagnosticKind::UnknownDirective, 0..3, "unrecognized line")
            .in_chapter(&ChapterId::new("cave"));
        assert_eq!(d.to_string(), "warning: [cave] unrecognized line");
    }

    #[test]
    fn render_produces_output() {
        let source = ":start\nbtn cave\nEnd\n";
        let diags = vec![
            Diagnostic::warning(DiagnosticKind::UnknownDirective, 7..15, "malformed choice")
                .with_label("expected `btn <target>, <label>`"),
        ];
        let output = render_diagnostics(source, "book.txt", &diags);
        assert!(!output.is_empty());
        assert!(output.contains("malformed choice"));
        assert!(output.contains("unknown-directive"));
        assert!(!output.contains("in chapter"));
    }

    #[test]
    fn render_points_at_chapter_header() {
        let source = ":start\npln ok\n:cave\nbtn nowhere\nEnd\n";
        let diags = vec![
            Diagnostic::warning(DiagnosticKind::UnknownDirective, 20..31, "unrecognized line")
                .in_chapter(&ChapterId::new("start"))
                .with_header(0..6),
            Diagnostic::warning(
                DiagnosticKind::UnterminatedChapter,
                0..6,
                "chapter `start` has no `End` line",
            )
            .in_chapter(&ChapterId::new("start"))
            .with_header(0..6),
        ];
        let output = render_diagnostics(source, "book.txt", &diags);
        assert_eq!(output.matches("in chapter `start`").count(), 1);
        assert!(output.contains("unterminated-chapter"));
        assert!(output.contains("kept and reported as a notice"));
    }

    #[test]
    fn rest_report_lists_unknown_lines() {
        let diags = vec![
            Diagnostic::warning(DiagnosticKind::UnknownDirective, 0..1, "unrecognized line")
                .in_chapter(&ChapterId::new("start"))
                .with_source_line("dance wildly"),
            Diagnostic::warning(DiagnosticKind::UnresolvedTarget, 0..1, "unresolved target"),
        ];
        assert_eq!(rest_report(&diags), vec!["start: dance wildly".to_string()]);
    }
}
