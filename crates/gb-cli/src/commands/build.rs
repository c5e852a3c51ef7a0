use std::path::Path;

use gb_dsl::CompileOptions;

pub fn run(
    script: &Path,
    options: &CompileOptions,
    output: Option<&Path>,
    rest: Option<&Path>,
) -> Result<(), String> {
    let result = super::compile_script(script, options)?;

    let json = serde_json::to_string_pretty(&result.table)
        .map_err(|e| format!("JSON serialization error: {e}"))?;

    if let Some(path) = rest {
        let lines = result.rest_report();
        let mut report = lines.join("\n");
        if !report.is_empty() {
            report.push('\n');
        }
        std::fs::write(path, report)
            .map_err(|e| format!("cannot write to {}: {e}", path.display()))?;
        eprintln!(
            "  {} unrecognized line{} written to {}",
            lines.len(),
            super::plural(lines.len()),
            path.display()
        );
    }

    if let Some(path) = output {
        std::fs::write(path, &json)
            .map_err(|e| format!("cannot write to {}: {e}", path.display()))?;
        println!(
            "  Exported {} chapters to {}",
            result.table.len(),
            path.display()
        );
    } else {
        println!("{json}");
    }

    Ok(())
}
