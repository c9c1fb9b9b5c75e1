use crate::domain::error::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One day's farm metrics. The date is the unique key; a later upsert for the
/// same date replaces the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub chicken_count: u32,
    pub eggs_produced: u32,
    pub feed_consumed_kg: f64,
    pub daily_expense: f64,
}

/// Raw form submission as it arrives over the wire. Numeric fields stay
/// strings so validation owns all parsing; omitted fields default to empty,
/// which the validators treat as zero (date excepted, it is required).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailyRecordForm {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub chickens: String,
    #[serde(default)]
    pub eggs: String,
    #[serde(default)]
    pub feed: String,
    #[serde(default)]
    pub expenses: String,
}

impl DailyRecordForm {
    /// Validates every field and converts into a `DailyRecord`. Fails with a
    /// `ValidationError` before any value reaches the store, so a rejected
    /// submission never causes a partial write.
    pub fn validate_into_record(self) -> anyhow::Result<DailyRecord> {
        let date_str = self.date.trim();
        if date_str.is_empty() {
            return Err(ValidationError::new("date", "date is required").into());
        }
        let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT).map_err(|_| {
            ValidationError::new("date", format!("expected YYYY-MM-DD, got {date_str:?}"))
        })?;

        Ok(DailyRecord {
            date,
            chicken_count: parse_count("chickens", &self.chickens)?,
            eggs_produced: parse_count("eggs", &self.eggs)?,
            feed_consumed_kg: parse_amount("feed", &self.feed)?,
            daily_expense: parse_amount("expenses", &self.expenses)?,
        })
    }
}

fn parse_count(field: &'static str, raw: &str) -> anyhow::Result<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    let value: i64 = raw
        .parse()
        .map_err(|_| ValidationError::new(field, format!("not a whole number: {raw:?}")))?;
    if value < 0 {
        return Err(ValidationError::new(field, "must be non-negative").into());
    }
    u32::try_from(value)
        .map_err(|_| ValidationError::new(field, format!("value out of range: {value}")).into())
}

fn parse_amount(field: &'static str, raw: &str) -> anyhow::Result<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0.0);
    }
    let value: f64 = raw
        .parse()
        .map_err(|_| ValidationError::new(field, format!("not a number: {raw:?}")))?;
    if !value.is_finite() {
        return Err(ValidationError::new(field, "must be finite").into());
    }
    if value < 0.0 {
        return Err(ValidationError::new(field, "must be non-negative").into());
    }
    Ok(value)
}
