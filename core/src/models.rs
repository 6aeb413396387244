use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LogError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodLogEntry {
    pub id: i64,
    pub name: String,
    pub calories: i64,
    pub logged_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFoodLogEntry {
    pub name: String,
    pub calories: i64,
    pub logged_at: DateTime<Utc>,
}

/// Totals for one calendar day. Derived on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: String,
    pub total_calories: i64,
    pub items_count: i64,
}

pub fn validate_food_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(LogError::validation("Food name is required"));
    }
    Ok(trimmed.to_string())
}

/// Largest calorie count a single entry may carry.
pub const MAX_CALORIES: i64 = i32::MAX as i64;

pub fn validate_calories(calories: i64) -> Result<i64> {
    if calories < 0 {
        return Err(LogError::validation(
            "Calories must be a non-negative integer",
        ));
    }
    if calories > MAX_CALORIES {
        return Err(LogError::validation(format!(
            "Calories must be at most {MAX_CALORIES}"
        )));
    }
    Ok(calories)
}

/// Whether `at` falls in years 0000 through 9999, the range the store keeps
/// in fixed-width text.
#[must_use]
pub fn is_storable_instant(at: DateTime<Utc>) -> bool {
    (0..=9999).contains(&at.year())
}

pub fn validate_logged_at(at: DateTime<Utc>) -> Result<DateTime<Utc>> {
    if !is_storable_instant(at) {
        return Err(LogError::validation(format!(
            "Timestamp {at} is out of range. Use a year between 0000 and 9999"
        )));
    }
    Ok(at)
}

/// Accept a JSON number as a calorie count. Integral floats such as `95.0`
/// pass; fractions, negatives and values above [`MAX_CALORIES`] do not.
#[allow(clippy::cast_precision_loss)]
pub fn calories_from_json(value: &serde_json::Number) -> Result<i64> {
    if let Some(n) = value.as_i64() {
        return validate_calories(n);
    }
    if value.is_u64() {
        return Err(LogError::validation(format!(
            "Calories must be at most {MAX_CALORIES}"
        )));
    }
    match value.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            validate_calories(f as i64)
        }
        _ => Err(LogError::validation(
            "Calories must be a non-negative integer",
        )),
    }
}
