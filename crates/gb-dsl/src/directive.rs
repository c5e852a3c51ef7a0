//! Per-line directive dispatch.
//!
//! Every line of a chapter body becomes at most one [`Action`]. Lines that no
//! directive claims are kept as [`Action::Unknown`] and reported, so a broken
//! line never stops the rest of the script from compiling.

use std::collections::BTreeSet;
use std::ops::Range;

use gb_core::{Action, ChapterId, CurrencyOp, InventoryOp, Target};
use tracing::debug;

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::options::CompileOptions;
use crate::resolver::Reference;
use crate::scanner::SourceLine;

/// Parses the body lines of one chapter.
pub struct LineParser<'a> {
    options: &'a CompileOptions,
    usable: &'a BTreeSet<String>,
    chapter: &'a ChapterId,
    diagnostics: Vec<Diagnostic>,
    references: Vec<Reference>,
}

impl<'a> LineParser<'a> {
    pub fn new(
        options: &'a CompileOptions,
        usable: &'a BTreeSet<String>,
        chapter: &'a ChapterId,
    ) -> Self {
        Self {
            options,
            usable,
            chapter,
            diagnostics: Vec::new(),
            references: Vec::new(),
        }
    }

    /// Consume the parser, returning its diagnostics and chapter references.
    pub fn finish(self) -> (Vec<Diagnostic>, Vec<Reference>) {
        (self.diagnostics, self.references)
    }

    /// Parse a chapter body, coalescing consecutive text lines.
    pub fn parse_lines(&mut self, lines: &[SourceLine<'_>]) -> Vec<Action> {
        let mut actions = Vec::new();
        for line in lines {
            if let Some(action) = self.parse_line(line.text, &line.span) {
                push_action(&mut actions, action);
            }
        }
        actions
    }

    /// Parse a single directive. Returns `None` for blank, comment and
    /// pacing lines.
    pub fn parse_line(&mut self, raw: &str, span: &Range<usize>) -> Option<Action> {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') {
            return None;
        }
        if line
            .split_whitespace()
            .next()
            .is_some_and(|word| word.eq_ignore_ascii_case("pause"))
        {
            return None;
        }

        if let Some(text) = strip_keyword(line, "pln") {
            return Some(Action::Text(text.to_string()));
        }
        if let Some(rest) = strip_keyword(line, "xbtn") {
            return Some(self.extended_choice(line, rest, span));
        }
        if let Some(rest) = strip_keyword(line, "btn") {
            return Some(self.choice(line, rest, span));
        }
        for (prefix, op) in [("inv+", InventoryOp::Add), ("inv-", InventoryOp::Remove)] {
            if let Some(rest) = strip_prefix_ci(line, prefix) {
                return Some(self.inventory(line, rest.trim(), op, span));
            }
        }
        if let Some(rest) = strip_keyword(line, "gold") {
            match parse_gold(rest) {
                Some((op, amount)) => return Some(Action::CurrencyDelta { op, amount }),
                None if !line.contains('=') => {
                    return Some(self.unknown(line, span, "expected `gold +n`, `gold -n` or `gold n`"));
                }
                None => {}
            }
        }
        if let Some(rest) = strip_keyword(line, "goto") {
            if rest.is_empty() {
                return Some(self.unknown(line, span, "`goto` needs a target"));
            }
            return Some(Action::Navigate(self.target(rest, span)));
        }
        if let Some(rest) = strip_keyword(line, "if") {
            return Some(self.conditional(line, rest, span));
        }
        if let Some(path) = strip_prefix_ci(line, "image")
            .map(str::trim_start)
            .and_then(|rest| rest.strip_prefix('='))
        {
            let path = path.trim().trim_matches('"').trim().replace('\\', "/");
            if path.is_empty() {
                return Some(self.unknown(line, span, "`image` needs a path"));
            }
            return Some(Action::Asset(path));
        }
        if line.eq_ignore_ascii_case("end") {
            return Some(Action::Terminate);
        }
        if line.contains('=') {
            return Some(self.assign(line, span));
        }
        if strip_keyword(line, "end").is_some() {
            return Some(self.unknown(
                line,
                span,
                "`End` must stand alone; this line does not end the chapter",
            ));
        }
        Some(self.unknown(line, span, "no directive matches this line"))
    }

    /// Parse `&`- or `,`-separated inline actions into one list.
    fn parse_list<'l>(
        &mut self,
        segments: impl IntoIterator<Item = &'l str>,
        span: &Range<usize>,
    ) -> Vec<Action> {
        let mut actions = Vec::new();
        for segment in segments {
            if let Some(action) = self.parse_line(segment, span) {
                push_action(&mut actions, action);
            }
        }
        actions
    }

    fn choice(&mut self, line: &str, rest: &str, span: &Range<usize>) -> Action {
        match rest.split_once(',') {
            Some((target, label)) if !target.trim().is_empty() && !label.trim().is_empty() => {
                Action::Choice {
                    label: label.trim().to_string(),
                    target: self.target(target, span),
                }
            }
            _ => self.unknown(line, span, "expected `btn <target>, <label>`"),
        }
    }

    fn extended_choice(&mut self, line: &str, rest: &str, span: &Range<usize>) -> Action {
        let parts: Vec<&str> = rest.split(',').map(str::trim).collect();
        let (target, label) = match parts.as_slice() {
            [target, .., label] if parts.len() >= 2 && !target.is_empty() && !label.is_empty() => {
                (*target, *label)
            }
            _ => {
                return self.unknown(
                    line,
                    span,
                    "expected `xbtn <target>, <action>, ..., <label>`",
                );
            }
        };
        let actions = self.parse_list(parts[1..parts.len() - 1].iter().copied(), span);
        Action::ExtendedChoice {
            label: label.to_string(),
            target: self.target(target, span),
            actions,
        }
    }

    fn inventory(&mut self, line: &str, item: &str, op: InventoryOp, span: &Range<usize>) -> Action {
        if self.options.is_currency(line) {
            let Some(amount) = first_integer(line) else {
                return self.unknown(line, span, "currency change without an amount");
            };
            let op = match op {
                InventoryOp::Add => CurrencyOp::Add,
                InventoryOp::Remove => CurrencyOp::Remove,
            };
            return Action::CurrencyDelta { op, amount };
        }

        let item = item.to_lowercase();
        if item.is_empty() {
            return self.unknown(line, span, "inventory change without an item");
        }
        let usable = self.usable.contains(&item);
        Action::InventoryDelta { op, item, usable }
    }

    fn conditional(&mut self, line: &str, rest: &str, span: &Range<usize>) -> Action {
        let Some((condition, branches)) = split_word(rest, "then") else {
            return self.unknown(line, span, "expected `if <condition> then <actions>`");
        };
        let condition = condition.trim().to_lowercase();
        if condition.is_empty() {
            return self.unknown(line, span, "`if` without a condition");
        }
        let (then_part, else_part) = split_word(branches, "else").unwrap_or((branches, ""));
        let then_actions = self.parse_list(then_part.split('&'), span);
        let else_actions = self.parse_list(else_part.split('&'), span);
        Action::Conditional {
            condition,
            then_actions,
            else_actions,
        }
    }

    fn assign(&mut self, line: &str, span: &Range<usize>) -> Action {
        let (binding, display_name) = match line.split_once(';') {
            Some((binding, name)) => (binding, name.trim()),
            None => (line, ""),
        };
        let Some((key, expression)) = binding.split_once('=') else {
            return self.unknown(line, span, "assignment without `=` before `;`");
        };
        let key = key.trim().to_lowercase();
        if key.is_empty() {
            return self.unknown(line, span, "assignment without a key");
        }
        Action::Assign {
            key,
            expression: expression.trim().to_lowercase(),
            display_name: (!display_name.is_empty()).then(|| display_name.to_string()),
        }
    }

    fn target(&mut self, raw: &str, span: &Range<usize>) -> Target {
        let target = Target::parse(raw);
        if let Target::Chapter(id) = &target {
            self.references.push(Reference {
                target: id.clone(),
                span: span.clone(),
            });
        }
        target
    }

    fn unknown(&mut self, line: &str, span: &Range<usize>, reason: &str) -> Action {
        let line = line.trim();
        debug!(chapter = %self.chapter, line, reason, "unrecognized directive");
        self.diagnostics.push(
            Diagnostic::warning(
                DiagnosticKind::UnknownDirective,
                span.clone(),
                format!("unrecognized line `{line}`"),
            )
            .with_label(reason)
            .in_chapter(self.chapter)
            .with_source_line(line),
        );
        Action::Unknown(line.to_string())
    }
}

/// Append an action, merging it into a preceding text action.
pub fn push_action(actions: &mut Vec<Action>, action: Action) {
    if let (Action::Text(next), Some(Action::Text(previous))) = (&action, actions.last_mut()) {
        previous.push('\n');
        previous.push_str(next);
        return;
    }
    actions.push(action);
}

/// Strip an ASCII prefix case-insensitively.
fn strip_prefix_ci<'l>(line: &'l str, prefix: &str) -> Option<&'l str> {
    let head = line.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &line[prefix.len()..])
}

/// Strip a keyword that must be followed by whitespace or end of line.
/// Returns the trimmed remainder.
fn strip_keyword<'l>(line: &'l str, keyword: &str) -> Option<&'l str> {
    let rest = strip_prefix_ci(line, keyword)?;
    (rest.is_empty() || rest.starts_with(char::is_whitespace)).then(|| rest.trim())
}

/// Split `text` at the first whole-word, case-insensitive occurrence of `word`.
fn split_word<'t>(text: &'t str, word: &str) -> Option<(&'t str, &'t str)> {
    let is_word_char = |c: char| c.is_alphanumeric() || c == '_';
    for (i, _) in text.char_indices() {
        let Some(candidate) = text.get(i..i + word.len()) else {
            continue;
        };
        if !candidate.eq_ignore_ascii_case(word) {
            continue;
        }
        let after = &text[i + word.len()..];
        let starts_word = text[..i].chars().next_back().is_none_or(|c| !is_word_char(c));
        let ends_word = after.chars().next().is_none_or(|c| !is_word_char(c));
        if starts_word && ends_word {
            return Some((&text[..i], after));
        }
    }
    None
}

fn first_integer(line: &str) -> Option<i64> {
    let start = line.find(|c: char| c.is_ascii_digit())?;
    let digits = &line[start..];
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse().ok()
}

fn parse_gold(arg: &str) -> Option<(CurrencyOp, i64)> {
    let (op, digits) = if let Some(digits) = arg.strip_prefix('+') {
        (CurrencyOp::Add, digits)
    } else if let Some(digits) = arg.strip_prefix('-') {
        (CurrencyOp::Remove, digits)
    } else {
        (CurrencyOp::Set, arg)
    };
    let digits = digits.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(|amount| (op, amount))
}
