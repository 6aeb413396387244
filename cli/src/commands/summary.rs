use anyhow::Result;

use nibble_core::FoodLogService;

use super::helpers::resolve_date;

pub(crate) fn cmd_summary(svc: &FoodLogService, date: Option<String>, json: bool) -> Result<()> {
    let date = resolve_date(date, svc.today());
    let summary = svc.get_daily_summary(date.as_deref())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let date = &summary.date;
    println!("=== {date} ===\n");

    let entries = svc.get_food_items(Some(date.as_str()))?;
    if entries.is_empty() {
        println!("  No entries");
    } else {
        for e in &entries {
            let time = e.logged_at.with_timezone(&svc.zone()).format("%H:%M");
            println!("  [{}] {time}  {} — {} kcal", e.id, e.name, e.calories);
        }
    }
    println!();

    let total = summary.total_calories;
    let count = summary.items_count;
    let noun = if count == 1 { "item" } else { "items" };
    println!("  TOTAL: {total} kcal ({count} {noun})");

    Ok(())
}
