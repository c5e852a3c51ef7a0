pub mod build;
pub mod check;
pub mod play;
pub mod saves;

use std::path::Path;

use gb_dsl::diagnostics::{Severity, render_diagnostics};
use gb_dsl::{CompileOptions, CompileResult};

/// Compile a script file and print diagnostics.
/// Returns the result if there are no errors.
fn compile_script(path: &Path, options: &CompileOptions) -> Result<CompileResult, String> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let result = gb_dsl::compile_source(&source, options);
    print_diagnostics(&result, &source, path);

    if result.has_errors() {
        Err("compilation failed with errors".into())
    } else {
        Ok(result)
    }
}

/// Print diagnostics to stderr using ariadne.
fn print_diagnostics(result: &CompileResult, source: &str, path: &Path) {
    if result.diagnostics.is_empty() {
        return;
    }

    let filename = path.display().to_string();
    let rendered = render_diagnostics(source, &filename, &result.diagnostics);
    eprint!("{rendered}");

    let errors = result
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let warnings = result.warning_count();

    if errors > 0 {
        eprintln!(
            "  {} error{}, {} warning{}",
            errors,
            plural(errors),
            warnings,
            plural(warnings),
        );
    } else if warnings > 0 {
        eprintln!("  {} warning{}", warnings, plural(warnings));
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}
