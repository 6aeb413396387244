use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nibble_core::day::DAY_FORMAT;
use nibble_core::models::FoodLogEntry;

/// Resolve a CLI date argument to a `YYYY-MM-DD` string.
///
/// `today`, `yesterday` and `tomorrow` are relative to `today`; anything else
/// is passed through for the core to validate.
pub(crate) fn resolve_date(date: Option<String>, today: NaiveDate) -> Option<String> {
    let date = date?;
    let day = match date.as_str() {
        "today" => today,
        "yesterday" => today - chrono::Duration::days(1),
        "tomorrow" => today + chrono::Duration::days(1),
        _ => return Some(date),
    };
    Some(day.format(DAY_FORMAT).to_string())
}

pub(crate) fn parse_logged_at(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|t| t.with_timezone(&Utc))
        .with_context(|| format!("Invalid timestamp '{s}'. Use RFC 3339, e.g. 2024-01-15T10:00:00Z"))
}

pub(crate) fn print_entry_table(entries: &[FoodLogEntry], zone: FixedOffset) {
    #[derive(Tabled)]
    struct EntryRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Logged")]
        logged_at: String,
        #[tabled(rename = "Food")]
        name: String,
        #[tabled(rename = "Calories")]
        calories: i64,
    }

    let rows: Vec<EntryRow> = entries
        .iter()
        .map(|e| EntryRow {
            id: e.id,
            logged_at: e
                .logged_at
                .with_timezone(&zone)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
            name: truncate(&e.name, 40),
            calories: e.calories,
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
