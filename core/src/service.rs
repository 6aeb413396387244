use std::path::Path;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use tracing::{debug, info};

use crate::day::{self, Clock, DayWindow, SystemClock};
use crate::db::Database;
use crate::error::Result;
use crate::models::{
    DailySummary, FoodLogEntry, NewFoodLogEntry, validate_calories, validate_food_name,
    validate_logged_at,
};

/// The food log: one store plus the clock and reference zone that decide
/// what "now" and "a day" mean.
pub struct FoodLogService {
    db: Database,
    clock: Box<dyn Clock>,
    zone: FixedOffset,
}

impl FoodLogService {
    pub fn new(db_path: &Path, zone: FixedOffset) -> Result<Self> {
        let db = Database::open(db_path)?;
        Ok(Self::with_database(db, zone))
    }

    pub fn new_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self::with_database(db, day::utc()))
    }

    #[must_use]
    pub fn with_database(db: Database, zone: FixedOffset) -> Self {
        Self {
            db,
            clock: Box::new(SystemClock),
            zone,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    #[must_use]
    pub fn zone(&self) -> FixedOffset {
        self.zone
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        day::today(self.clock.as_ref(), self.zone)
    }

    // --- Record store ---

    /// Log an entry stamped with the current time.
    pub fn create_food_item(&self, name: &str, calories: i64) -> Result<FoodLogEntry> {
        let now = self.clock.now();
        self.create_food_item_at(name, calories, now)
    }

    pub fn create_food_item_at(
        &self,
        name: &str,
        calories: i64,
        logged_at: DateTime<Utc>,
    ) -> Result<FoodLogEntry> {
        let name = validate_food_name(name)?;
        let calories = validate_calories(calories)?;
        let logged_at = validate_logged_at(logged_at)?;
        let entry = self.db.insert_food_item(&NewFoodLogEntry {
            name,
            calories,
            logged_at,
        })?;
        info!(id = entry.id, calories = entry.calories, "logged food item");
        Ok(entry)
    }

    // --- Queries ---

    /// All entries, or only those of one calendar day, newest first.
    pub fn get_food_items(&self, date: Option<&str>) -> Result<Vec<FoodLogEntry>> {
        match date {
            None => self.db.list_food_items(),
            Some(date) => {
                let window = self.window_for(date)?;
                debug!(day = %window.label(), "listing food items");
                self.db.list_food_items_in(&window)
            }
        }
    }

    /// Totals for one calendar day; today when `date` is omitted.
    pub fn get_daily_summary(&self, date: Option<&str>) -> Result<DailySummary> {
        let window = match date {
            Some(date) => self.window_for(date)?,
            None => DayWindow::new(self.today(), self.zone),
        };
        let (total_calories, items_count) = self.db.totals_in(&window)?;
        Ok(DailySummary {
            date: window.label(),
            total_calories,
            items_count,
        })
    }

    fn window_for(&self, date: &str) -> Result<DayWindow> {
        let day = day::parse_day(date)?;
        Ok(DayWindow::new(day, self.zone))
    }
}
