use std::path::Path;

use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::store::{DataStore, ACTUALS_FILE};

pub fn run(data_dir: &Path) -> Result<()> {
    println!("Data dir:   {}", data_dir.display());

    if !data_dir.join(ACTUALS_FILE).exists() {
        println!();
        println!(
            "No tables found. Point --data-dir at the normalized CSV exports or run `cfo-copilot init <dir>`."
        );
        return Ok(());
    }

    let store = DataStore::load(data_dir)?;
    let entities = store.entities();
    let listed = if entities.is_empty() {
        "(none)".to_string()
    } else {
        entities.join(", ")
    };
    println!("Entities:   {listed}");

    let mut table = Table::new();
    table.set_header(vec!["Table", "Rows", "First month", "Last month"]);
    for t in store.summary() {
        table.add_row(vec![
            Cell::new(t.name),
            Cell::new(t.rows),
            Cell::new(t.first_month.as_deref().unwrap_or("-")),
            Cell::new(t.last_month.as_deref().unwrap_or("-")),
        ]);
    }
    println!("\n{table}");
    Ok(())
}
