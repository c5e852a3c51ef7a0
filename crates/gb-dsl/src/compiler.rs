use std::collections::BTreeMap;

use gb_core::ChapterTable;
use tracing::debug;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Severity, rest_report};
use crate::directive::LineParser;
use crate::options::CompileOptions;
use crate::resolver;
use crate::scanner::{self, RawChapter};

/// Result of compiling script text into a chapter table.
#[derive(Debug, Clone)]
pub struct CompileResult {
    /// The compiled table (may be partial if errors occurred).
    pub table: ChapterTable,
    /// Errors and warnings produced during compilation.
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileResult {
    /// Returns `true` if any diagnostic has error severity.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Number of warning diagnostics.
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// `chapter: line` entries for every unrecognized script line.
    pub fn rest_report(&self) -> Vec<String> {
        rest_report(&self.diagnostics)
    }
}

/// Compile script text into a chapter table.
///
/// The compilation happens in two passes:
/// 1. **Usable pass**: chapters named `<use prefix><item>` mark `<item>` usable
/// 2. **Directive pass**: each chapter body is parsed line by line
///
/// A final check reports navigation targets that name no chapter.
pub fn compile(source: &str, options: &CompileOptions) -> CompileResult {
    let chapters = scanner::split_chapters(source);
    let usable = scanner::collect_usable_items(&chapters, &options.use_prefix);

    let mut table = ChapterTable::new();
    let mut diagnostics = Vec::new();
    let mut references = BTreeMap::new();
    let mut headers = BTreeMap::new();

    for raw in &chapters {
        let id = raw.id();
        if id.as_str().is_empty() {
            diagnostics.push(empty_header(raw));
            continue;
        }

        let mut parser = LineParser::new(options, &usable, &id);
        let actions = parser.parse_lines(&raw.lines);
        let (found, refs) = parser.finish();
        diagnostics.extend(found.into_iter().map(|d| d.with_header(raw.header.span.clone())));

        if !raw.terminated {
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::UnterminatedChapter,
                    raw.header.span.clone(),
                    format!("chapter `{id}` has no `End` line"),
                )
                .in_chapter(&id)
                .with_header(raw.header.span.clone()),
            );
        }
        if table.insert(id.clone(), actions).is_some() {
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::DuplicateChapter,
                    raw.header.span.clone(),
                    format!("chapter `{id}` is defined more than once"),
                )
                .with_label("this definition replaces the earlier one")
                .in_chapter(&id)
                .with_header(raw.header.span.clone()),
            );
        }
        headers.insert(id.clone(), raw.header.span.clone());
        references.insert(id, refs);
    }

    if table.is_empty() {
        diagnostics.push(Diagnostic::error(0..0, "script defines no chapters"));
    }
    diagnostics.extend(
        resolver::unresolved_targets(&table, &references)
            .into_iter()
            .map(|d| match d.chapter.as_ref().and_then(|c| headers.get(c)) {
                Some(header) => d.with_header(header.clone()),
                None => d,
            }),
    );

    debug!(
        chapters = table.len(),
        actions = table.action_count(),
        usable = usable.len(),
        diagnostics = diagnostics.len(),
        "compiled script"
    );
    CompileResult { table, diagnostics }
}

fn empty_header(raw: &RawChapter<'_>) -> Diagnostic {
    let line = raw.header.text.trim();
    Diagnostic::warning(
        DiagnosticKind::UnknownDirective,
        raw.header.span.clone(),
        "chapter header is empty; chapter skipped",
    )
    .with_source_line(line)
}
