use std::collections::BTreeMap;
use std::ops::Range;

use gb_core::{ChapterId, ChapterTable};

use crate::diagnostics::{Diagnostic, DiagnosticKind};

/// A chapter id named by a choice or navigation, with the line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub target: ChapterId,
    pub span: Range<usize>,
}

/// Report every reference that names no chapter in the table.
///
/// `references` maps each defining chapter to the targets it names.
pub fn unresolved_targets(
    table: &ChapterTable,
    references: &BTreeMap<ChapterId, Vec<Reference>>,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for (chapter, refs) in references {
        for reference in refs.iter().filter(|r| !table.contains(&r.target)) {
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::UnresolvedTarget,
                    reference.span.clone(),
                    format!("unresolved target `{}`", reference.target),
                )
                .with_label("no chapter with this id")
                .in_chapter(chapter),
            );
        }
    }
    diagnostics
}
