use std::path::Path;

use gb_dsl::CompileOptions;

pub fn run(script: &Path, options: &CompileOptions) -> Result<(), String> {
    let result = super::compile_script(script, options)?;
    let table = &result.table;

    println!("  All checks passed for '{}'.", script.display());
    println!(
        "  {} chapter{}, {} action{}",
        table.len(),
        super::plural(table.len()),
        table.action_count(),
        super::plural(table.action_count()),
    );
    if let Some(start) = table.start() {
        println!("  Starts at '{start}'.");
    }

    Ok(())
}
