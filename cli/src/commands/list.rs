use anyhow::Result;

use nibble_core::FoodLogService;

use super::helpers::{print_entry_table, resolve_date};

pub(crate) fn cmd_list(svc: &FoodLogService, date: Option<String>, json: bool) -> Result<()> {
    let date = resolve_date(date, svc.today());
    let entries = svc.get_food_items(date.as_deref())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        match date {
            Some(date) => eprintln!("No entries for {date}"),
            None => eprintln!("No entries yet. Use `nibble add` to log a food item."),
        }
        return Ok(());
    }

    print_entry_table(&entries, svc.zone());
    Ok(())
}
