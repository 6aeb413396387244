use anyhow::Result;

use nibble_core::FoodLogService;

use super::helpers::parse_logged_at;

pub(crate) fn cmd_add(
    svc: &FoodLogService,
    name: &str,
    calories: i64,
    at: Option<&str>,
    json: bool,
) -> Result<()> {
    let entry = match at {
        Some(at) => svc.create_food_item_at(name, calories, parse_logged_at(at)?)?,
        None => svc.create_food_item(name, calories)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        let when = entry
            .logged_at
            .with_timezone(&svc.zone())
            .format("%Y-%m-%d %H:%M");
        println!(
            "Logged [{}] {} — {} kcal at {when}",
            entry.id, entry.name, entry.calories
        );
    }

    Ok(())
}
