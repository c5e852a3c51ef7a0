//! Splits script text into raw chapters and runs the usable-item pass.

use std::collections::BTreeSet;
use std::ops::Range;

use gb_core::ChapterId;

/// One line of script text with its byte span (line ending excluded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine<'a> {
    pub text: &'a str,
    pub span: Range<usize>,
}

/// A chapter before directive parsing: its header line and body lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChapter<'a> {
    pub header: SourceLine<'a>,
    pub lines: Vec<SourceLine<'a>>,
    /// Whether the chapter ended with a terminator line.
    pub terminated: bool,
}

impl RawChapter<'_> {
    /// Chapter id from the header: surrounding `:` stripped, lower-cased.
    pub fn id(&self) -> ChapterId {
        ChapterId::new(self.header.text.trim().trim_matches(':'))
    }
}

/// Iterate over the lines of `source` with byte spans.
pub fn source_lines(source: &str) -> impl Iterator<Item = SourceLine<'_>> {
    let mut offset = 0;
    source.split_inclusive('\n').map(move |raw| {
        let start = offset;
        offset += raw.len();
        let text = raw.trim_end_matches(['\n', '\r']);
        SourceLine {
            text,
            span: start..start + text.len(),
        }
    })
}

/// A chapter terminator is a line holding exactly `End`. Text after `End`
/// keeps the line in the chapter body, where it is reported.
pub fn is_terminator(line: &str) -> bool {
    line.trim() == "End"
}

fn is_blank_or_comment(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with(';')
}

/// Segment a script into chapters. The first non-blank, non-comment line
/// after a terminator is the next chapter's header. Stray terminators are
/// ignored.
pub fn split_chapters(source: &str) -> Vec<RawChapter<'_>> {
    let mut chapters = Vec::new();
    let mut current: Option<RawChapter<'_>> = None;

    for line in source_lines(source) {
        if is_terminator(line.text) {
            if let Some(mut chapter) = current.take() {
                chapter.terminated = true;
                chapters.push(chapter);
            }
            continue;
        }
        match current.as_mut() {
            Some(chapter) => chapter.lines.push(line),
            None if is_blank_or_comment(line.text) => {}
            None => {
                current = Some(RawChapter {
                    header: line,
                    lines: Vec::new(),
                    terminated: false,
                });
            }
        }
    }

    if let Some(chapter) = current {
        chapters.push(chapter);
    }
    chapters
}

/// Pass 1: every chapter named `<prefix><item>` makes `<item>` usable.
pub fn collect_usable_items(chapters: &[RawChapter<'_>], prefix: &str) -> BTreeSet<String> {
    chapters
        .iter()
        .filter_map(|chapter| {
            chapter
                .id()
                .used_item(prefix)
                .map(|item| item.trim().to_string())
        })
        .collect()
}
