use std::path::Path;

use comfy_table::{ContentArrangement, Table};
use gb_core::PlayerId;
use gb_runtime::{JsonFileStorage, SlotStorage};

pub fn run(player: &str, saves: &Path) -> Result<(), String> {
    let storage = JsonFileStorage::new(saves);
    let record = storage
        .load_record(&PlayerId::from(player))
        .map_err(|e| format!("cannot read saves for '{player}': {e}"))?;

    if record.slots.is_empty() {
        println!("  No saves for '{player}'.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Slot", "Chapter", "Gold", "Items"]);
    for (name, session) in &record.slots {
        table.add_row(vec![
            name.clone(),
            session.chapter.to_string(),
            session.currency.to_string(),
            session.inventory.len().to_string(),
        ]);
    }

    println!("{table}");
    println!();
    println!("  {} save{}", record.slots.len(), super::plural(record.slots.len()));

    Ok(())
}
