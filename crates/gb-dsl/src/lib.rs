//! Script compiler for gamebook chapter files.
//!
//! A script is a sequence of chapters. Each chapter starts with a header line
//! naming it (`:start`) and ends with a line whose first word is `End`. Body
//! lines are directives (`pln`, `btn`, `xbtn`, `inv+`, `goto`, `if`, ...)
//! that compile into [`gb_core::Action`]s. Malformed lines never fail the
//! compilation: they become `unknown` actions plus a warning.

pub mod compiler;
pub mod diagnostics;
pub mod directive;
pub mod options;
pub mod resolver;
pub mod scanner;

use std::path::Path;

pub use compiler::CompileResult;
pub use diagnostics::{Diagnostic, DiagnosticKind, Severity, render_diagnostics};
pub use options::CompileOptions;

/// Compile script text into a chapter table.
pub fn compile_source(source: &str, options: &CompileOptions) -> CompileResult {
    compiler::compile(source, options)
}

/// Read and compile a script file.
pub fn compile_file(path: &Path, options: &CompileOptions) -> CompileResult {
    match std::fs::read_to_string(path) {
        Ok(source) => compile_source(&source, options),
        Err(e) => CompileResult {
            table: gb_core::ChapterTable::new(),
            diagnostics: vec![Diagnostic::error(
                0..0,
                format!("cannot read {}: {e}", path.display()),
            )],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn script_line() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z]{1,8}".prop_map(|id| format!(":{id}")),
            "[A-Za-z ]{0,12}".prop_map(|t| format!("pln {t}")),
            ("[a-z]{1,6}", "[A-Za-z ]{1,10}").prop_map(|(t, l)| format!("btn {t}, {l}")),
            "[a-z]{1,6}".prop_map(|i| format!("inv+ {i}")),
            "[a-z]{1,6}".prop_map(|t| format!("goto {t}")),
            ("[a-z]{1,4}", "[0-9]{1,3}").prop_map(|(k, v)| format!("{k}={v}")),
            "[a-z]{1,4}".prop_map(|c| format!("if {c} then end else goto {c}")),
            Just("End".to_string()),
            Just("end".to_string()),
            ".{0,20}",
        ]
    }

    proptest! {
        #[test]
        fn compiling_twice_yields_identical_tables(lines in prop::collection::vec(script_line(), 0..40)) {
            let source = lines.join("\n");
            let options = CompileOptions::default();
            let first = compile_source(&source, &options);
            let second = compile_source(&source, &options);
            prop_assert_eq!(first.table, second.table);
            prop_assert_eq!(first.diagnostics.len(), second.diagnostics.len());
        }
    }

    #[test]
    fn compile_file_reports_missing_file() {
        let result = compile_file(Path::new("/nonexistent/book.txt"), &CompileOptions::default());
        assert!(result.has_errors());
        assert!(result.table.is_empty());
    }
}
