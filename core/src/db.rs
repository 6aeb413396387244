use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params, types::Type};
use tracing::debug;

use crate::day::DayWindow;
use crate::error::Result;
use crate::models::{FoodLogEntry, NewFoodLogEntry, is_storable_instant};

/// Fixed-width UTC text so that lexical order in SQLite equals time order.
/// Only holds for years 0000 through 9999.
const STORED_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9fZ";

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(STORED_TIMESTAMP_FORMAT).to_string()
}

/// A window edge as a query bound. `None` when the edge lies outside the
/// storable years, where every stored row is already on the inside.
fn format_bound(at: DateTime<Utc>) -> Option<String> {
    is_storable_instant(at).then(|| format_timestamp(at))
}

fn parse_timestamp(raw: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|t| t.with_timezone(&Utc))
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "opening database");
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS food_items (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    calories INTEGER NOT NULL CHECK (calories BETWEEN 0 AND 2147483647),
                    logged_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_food_items_logged_at ON food_items(logged_at);

                PRAGMA user_version = 1;",
            )?;
            debug!(from = version, to = 1, "migrated schema");
        }

        Ok(())
    }

    // Expects columns: 0: id, 1: name, 2: calories, 3: logged_at
    fn food_item_from_row(row: &rusqlite::Row) -> rusqlite::Result<FoodLogEntry> {
        let raw: String = row.get(3)?;
        let logged_at = parse_timestamp(&raw)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
        Ok(FoodLogEntry {
            id: row.get(0)?,
            name: row.get(1)?,
            calories: row.get(2)?,
            logged_at,
        })
    }

    // --- Record store ---

    pub fn insert_food_item(&self, entry: &NewFoodLogEntry) -> Result<FoodLogEntry> {
        self.conn.execute(
            "INSERT INTO food_items (name, calories, logged_at) VALUES (?1, ?2, ?3)",
            params![entry.name, entry.calories, format_timestamp(entry.logged_at)],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, calories = entry.calories, "inserted food item");
        self.get_food_item(id)
    }

    pub fn get_food_item(&self, id: i64) -> Result<FoodLogEntry> {
        let entry = self.conn.query_row(
            "SELECT id, name, calories, logged_at FROM food_items WHERE id = ?1",
            params![id],
            Self::food_item_from_row,
        )?;
        Ok(entry)
    }

    // --- Queries ---

    pub fn list_food_items(&self) -> Result<Vec<FoodLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, calories, logged_at FROM food_items
             ORDER BY logged_at DESC, id DESC",
        )?;
        let entries = stmt
            .query_map([], Self::food_item_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn list_food_items_in(&self, window: &DayWindow) -> Result<Vec<FoodLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, calories, logged_at FROM food_items
             WHERE (?1 IS NULL OR logged_at >= ?1) AND (?2 IS NULL OR logged_at < ?2)
             ORDER BY logged_at DESC, id DESC",
        )?;
        let entries = stmt
            .query_map(
                params![format_bound(window.start), format_bound(window.end)],
                Self::food_item_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// `(total_calories, items_count)` over the same interval
    /// [`Database::list_food_items_in`] reads.
    pub fn totals_in(&self, window: &DayWindow) -> Result<(i64, i64)> {
        let totals = self.conn.query_row(
            "SELECT COALESCE(SUM(calories), 0), COUNT(id) FROM food_items
             WHERE (?1 IS NULL OR logged_at >= ?1) AND (?2 IS NULL OR logged_at < ?2)",
            params![format_bound(window.start), format_bound(window.end)],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::day::{parse_day, utc};

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn entry(name: &str, calories: i64, at: &str) -> NewFoodLogEntry {
        NewFoodLogEntry {
            name: name.to_string(),
            calories,
            logged_at: ts(at),
        }
    }

    fn window(day: &str) -> DayWindow {
        DayWindow::new(parse_day(day).unwrap(), utc())
    }

    #[test]
    fn test_stored_timestamp_is_fixed_width() {
        assert_eq!(
            format_timestamp(ts("2024-01-15T10:00:00Z")),
            "2024-01-15T10:00:00.000000000Z"
        );
        assert_eq!(
            format_timestamp(ts("2024-01-15T10:00:00.5+02:00")),
            "2024-01-15T08:00:00.500000000Z"
        );
    }

    #[test]
    fn test_nanoseconds_survive_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let at = ts("2024-01-15T10:00:00.000000500Z");
        let item = db
            .insert_food_item(&entry("Apple", 95, "2024-01-15T10:00:00.000000500Z"))
            .unwrap();
        assert_eq!(item.logged_at, at);

        db.insert_food_item(&entry("Banana", 105, "2024-01-15T10:00:00.000000400Z"))
            .unwrap();
        let names: Vec<String> = db
            .list_food_items()
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["Apple", "Banana"]);
    }

    #[test]
    fn test_calories_above_limit_rejected_by_schema() {
        let db = Database::open_in_memory().unwrap();
        assert!(
            db.insert_food_item(&entry("Broken", 2_147_483_648, "2024-01-15T10:00:00Z"))
                .is_err()
        );
    }

    #[test]
    fn test_last_storable_day_is_queryable() {
        let db = Database::open_in_memory().unwrap();
        db.insert_food_item(&entry("Party", 900, "9999-12-31T10:00:00Z"))
            .unwrap();
        db.insert_food_item(&entry("Eve", 300, "9999-12-30T23:59:59Z"))
            .unwrap();

        let last = window("9999-12-31");
        let items = db.list_food_items_in(&last).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Party");
        assert_eq!(db.totals_in(&last).unwrap(), (900, 1));

        let behind = DayWindow::new(
            parse_day("9999-12-31").unwrap(),
            crate::day::parse_utc_offset("-05:00").unwrap(),
        );
        assert_eq!(db.totals_in(&behind).unwrap(), (900, 1));
    }

    #[test]
    fn test_first_storable_day_is_queryable() {
        let db = Database::open_in_memory().unwrap();
        db.insert_food_item(&entry("Ancient", 50, "0000-01-01T03:00:00Z"))
            .unwrap();

        let ahead = DayWindow::new(
            parse_day("0000-01-01").unwrap(),
            crate::day::parse_utc_offset("+05:00").unwrap(),
        );
        assert_eq!(db.totals_in(&ahead).unwrap(), (50, 1));
        assert_eq!(db.list_food_items_in(&ahead).unwrap().len(), 1);
    }

    #[test]
    fn test_insert_and_get_food_item() {
        let db = Database::open_in_memory().unwrap();
        let item = db
            .insert_food_item(&entry("Apple", 95, "2024-01-15T10:00:00Z"))
            .unwrap();

        assert_eq!(item.name, "Apple");
        assert_eq!(item.calories, 95);
        assert_eq!(item.logged_at, ts("2024-01-15T10:00:00Z"));

        let fetched = db.get_food_item(item.id).unwrap();
        assert_eq!(fetched, item);
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let db = Database::open_in_memory().unwrap();
        let a = db
            .insert_food_item(&entry("Apple", 95, "2024-01-15T10:00:00Z"))
            .unwrap();
        let b = db
            .insert_food_item(&entry("Banana", 105, "2024-01-15T10:00:00Z"))
            .unwrap();
        assert!(b.id > a.id);
    }

    #[test]
    fn test_get_missing_food_item() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_food_item(42).is_err());
    }

    #[test]
    fn test_negative_calories_rejected_by_schema() {
        let db = Database::open_in_memory().unwrap();
        assert!(
            db.insert_food_item(&entry("Broken", -1, "2024-01-15T10:00:00Z"))
                .is_err()
        );
    }

    #[test]
    fn test_list_orders_newest_first() {
        let db = Database::open_in_memory().unwrap();
        db.insert_food_item(&entry("First Item", 100, "2024-01-15T08:00:00Z"))
            .unwrap();
        db.insert_food_item(&entry("Latest Item", 200, "2024-01-15T10:00:00Z"))
            .unwrap();
        db.insert_food_item(&entry("Middle Item", 150, "2024-01-15T09:00:00Z"))
            .unwrap();

        let names: Vec<String> = db
            .list_food_items()
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["Latest Item", "Middle Item", "First Item"]);
    }

    #[test]
    fn test_list_ties_broken_by_id_desc() {
        let db = Database::open_in_memory().unwrap();
        for name in ["Apple", "Banana", "Orange"] {
            db.insert_food_item(&entry(name, 90, "2024-01-15T10:00:00Z"))
                .unwrap();
        }
        let names: Vec<String> = db
            .list_food_items()
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["Orange", "Banana", "Apple"]);
    }

    #[test]
    fn test_window_excludes_neighbouring_midnights() {
        let db = Database::open_in_memory().unwrap();
        db.insert_food_item(&entry("Late Snack", 150, "2024-01-14T23:59:59.999999Z"))
            .unwrap();
        db.insert_food_item(&entry("Breakfast", 300, "2024-01-15T00:00:00Z"))
            .unwrap();
        db.insert_food_item(&entry("Dinner", 400, "2024-01-15T23:59:59Z"))
            .unwrap();
        db.insert_food_item(&entry("Next Day", 200, "2024-01-16T00:00:00Z"))
            .unwrap();

        let day = window("2024-01-15");
        let items = db.list_food_items_in(&day).unwrap();
        let names: Vec<&str> = items.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Dinner", "Breakfast"]);

        assert_eq!(db.totals_in(&day).unwrap(), (700, 2));
    }

    #[test]
    fn test_totals_empty_window() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.totals_in(&window("2024-01-15")).unwrap(), (0, 0));
        assert!(db.list_food_items_in(&window("2024-01-15")).unwrap().is_empty());
    }

    #[test]
    fn test_reopen_keeps_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nibble.db");

        let id = {
            let db = Database::open(&path).unwrap();
            db.insert_food_item(&entry("Apple", 95, "2024-01-15T10:00:00Z"))
                .unwrap()
                .id
        };

        let db = Database::open(&path).unwrap();
        let items = db.list_food_items().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, id);
        assert_eq!(items[0].name, "Apple");
    }
}
