use crate::storage::MetricsStore;
use chrono::NaiveDate;
use serde::Serialize;

/// Chart label format, month/day as the original dashboard rendered it.
const LABEL_FORMAT: &str = "%m/%d";

pub const DEFAULT_WINDOW_DAYS: usize = 7;

/// Assumed unit economics for the profit/loss derivation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pricing {
    pub egg_unit_price: f64,
    pub feed_cost_per_kg: f64,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            egg_unit_price: 0.50,
            feed_cost_per_kg: 2.00,
        }
    }
}

/// The latest day's raw metrics plus derived profit/loss. An empty store
/// yields the all-zero default rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub date: Option<NaiveDate>,
    pub total_chickens: u32,
    pub eggs_today: u32,
    pub feed_today: f64,
    pub profit_loss: f64,
}

pub fn latest_summary(store: &MetricsStore, pricing: &Pricing) -> DashboardSummary {
    let Some(record) = store.latest() else {
        return DashboardSummary::default();
    };

    let revenue = f64::from(record.eggs_produced) * pricing.egg_unit_price;
    let feed_cost = record.feed_consumed_kg * pricing.feed_cost_per_kg;
    let profit_loss = revenue - record.daily_expense - feed_cost;

    DashboardSummary {
        date: Some(record.date),
        total_chickens: record.chicken_count,
        eggs_today: record.eggs_produced,
        feed_today: record.feed_consumed_kg,
        profit_loss,
    }
}

/// Pre-shaped series for the chart renderer: parallel label/egg/feed arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub eggs: Vec<u32>,
    pub feed: Vec<f64>,
}

/// Series over the most recent `window_days` dates present in the store, in
/// chronological order. Dates with no record are omitted rather than
/// zero-filled, so the arrays always line up with actual data points.
pub fn trailing_series(store: &MetricsStore, window_days: usize) -> ChartSeries {
    let records = store.trailing(window_days);

    let mut series = ChartSeries {
        labels: Vec::with_capacity(records.len()),
        eggs: Vec::with_capacity(records.len()),
        feed: Vec::with_capacity(records.len()),
    };
    for record in records {
        series.labels.push(record.date.format(LABEL_FORMAT).to_string());
        series.eggs.push(record.eggs_produced);
        series.feed.push(record.feed_consumed_kg);
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::DailyRecord;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
    }

    fn record(date: NaiveDate, eggs: u32, feed: f64, expenses: f64) -> DailyRecord {
        DailyRecord {
            date,
            chicken_count: 150,
            eggs_produced: eggs,
            feed_consumed_kg: feed,
            daily_expense: expenses,
        }
    }

    #[test]
    fn summary_on_empty_store_is_the_zero_default() {
        let store = MetricsStore::new();
        let summary = latest_summary(&store, &Pricing::default());
        assert_eq!(summary, DashboardSummary::default());
        assert_eq!(summary.profit_loss, 0.0);
    }

    #[test]
    fn summary_derives_profit_loss_from_latest_record() {
        let mut store = MetricsStore::new();
        store.upsert(record(day(9), 90, 20.0, 100.0));
        store.upsert(record(day(10), 120, 25.5, 150.0));

        let summary = latest_summary(&store, &Pricing::default());
        assert_eq!(summary.date, Some(day(10)));
        assert_eq!(summary.eggs_today, 120);
        assert_eq!(summary.total_chickens, 150);
        // 120 * 0.50 - 150.0 - 25.5 * 2.00
        assert!((summary.profit_loss - (-141.0)).abs() < 1e-9);
    }

    #[test]
    fn summary_respects_configured_pricing() {
        let mut store = MetricsStore::new();
        store.upsert(record(day(10), 100, 10.0, 20.0));
        let pricing = Pricing {
            egg_unit_price: 1.0,
            feed_cost_per_kg: 3.0,
        };
        let summary = latest_summary(&store, &pricing);
        assert!((summary.profit_loss - 50.0).abs() < 1e-9);
    }

    #[test]
    fn weekly_series_sums_and_orders_a_full_week() {
        let mut store = MetricsStore::new();
        let eggs = [10u32, 12, 11, 13, 12, 14, 15];
        for (i, &e) in eggs.iter().enumerate() {
            store.upsert(record(day(1 + i as u32), e, 1.0, 1.0));
        }

        let series = trailing_series(&store, DEFAULT_WINDOW_DAYS);
        assert_eq!(series.labels.len(), 7);
        assert_eq!(series.eggs.iter().sum::<u32>(), 87);
        assert_eq!(series.labels.first().unwrap(), "08/01");
        assert_eq!(series.labels.last().unwrap(), "08/07");
    }

    #[test]
    fn series_never_exceeds_the_window() {
        let mut store = MetricsStore::new();
        for d in 1..=20 {
            store.upsert(record(day(d), d, 1.0, 1.0));
        }
        let series = trailing_series(&store, 7);
        assert_eq!(series.labels.len(), 7);
        assert_eq!(series.eggs, vec![14, 15, 16, 17, 18, 19, 20]);
    }

    #[test]
    fn series_omits_missing_dates_inside_the_window() {
        let mut store = MetricsStore::new();
        store.upsert(record(day(1), 10, 1.0, 1.0));
        store.upsert(record(day(4), 12, 1.0, 1.0));
        let series = trailing_series(&store, 7);
        assert_eq!(series.labels, vec!["08/01", "08/04"]);
        assert_eq!(series.eggs, vec![10, 12]);
    }

    #[test]
    fn series_serializes_with_chart_field_names() {
        let mut store = MetricsStore::new();
        store.upsert(record(day(1), 10, 2.5, 1.0));
        let series = trailing_series(&store, 7);
        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(json["labels"][0], "08/01");
        assert_eq!(json["eggs"][0], 10);
        assert_eq!(json["feed"][0], 2.5);
    }

    #[test]
    fn empty_store_yields_empty_series() {
        let store = MetricsStore::new();
        let series = trailing_series(&store, 7);
        assert_eq!(series, ChartSeries::default());
    }
}
