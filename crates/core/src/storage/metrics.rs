use crate::domain::record::DailyRecord;
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

/// In-memory, date-keyed store for daily farm records. The `BTreeMap` keeps
/// records in chronological order regardless of insertion order, and the date
/// key guarantees at most one record per day.
///
/// The store itself does no locking; the serving process wraps it in a coarse
/// `RwLock` so concurrent requests cannot interleave writes.
#[derive(Debug, Clone, Default)]
pub struct MetricsStore {
    records: BTreeMap<NaiveDate, DailyRecord>,
}

impl MetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores or silently replaces the record for its date.
    pub fn upsert(&mut self, record: DailyRecord) {
        tracing::debug!(date = %record.date, "upsert daily record");
        self.records.insert(record.date, record);
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DailyRecord> {
        self.records.get(&date)
    }

    /// The most recent record by date, if any.
    pub fn latest(&self) -> Option<&DailyRecord> {
        self.records.values().next_back()
    }

    /// All records in chronological order.
    pub fn records(&self) -> impl Iterator<Item = &DailyRecord> {
        self.records.values()
    }

    /// The most recent `window_days` records present in the store, in
    /// chronological order. Days with no record are skipped, not zero-filled.
    pub fn trailing(&self, window_days: usize) -> Vec<&DailyRecord> {
        let mut out: Vec<&DailyRecord> = self.records.values().rev().take(window_days).collect();
        out.reverse();
        out
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Populates the trailing seven days with the demonstration rows the
    /// original dashboard shipped with.
    pub fn seed_demo(&mut self, today: NaiveDate) {
        const SAMPLE: [(u32, u32, f64, f64); 7] = [
            (150, 120, 25.5, 150.0),
            (148, 115, 24.8, 140.0),
            (152, 125, 26.2, 160.0),
            (151, 118, 25.0, 145.0),
            (149, 122, 24.5, 155.0),
            (153, 128, 26.8, 170.0),
            (150, 130, 25.2, 165.0),
        ];

        for (i, (chickens, eggs, feed, expenses)) in SAMPLE.into_iter().enumerate() {
            let date = today - Duration::days(6 - i as i64);
            self.upsert(DailyRecord {
                date,
                chicken_count: chickens,
                eggs_produced: eggs,
                feed_consumed_kg: feed,
                daily_expense: expenses,
            });
        }
        tracing::info!(records = self.len(), "seeded demo data");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: NaiveDate, eggs: u32) -> DailyRecord {
        DailyRecord {
            date,
            chicken_count: 150,
            eggs_produced: eggs,
            feed_consumed_kg: 25.0,
            daily_expense: 100.0,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
    }

    #[test]
    fn upsert_then_get_returns_submitted_values() {
        let mut store = MetricsStore::new();
        let r = DailyRecord {
            date: day(10),
            chicken_count: 151,
            eggs_produced: 118,
            feed_consumed_kg: 25.0,
            daily_expense: 145.0,
        };
        store.upsert(r.clone());
        assert_eq!(store.get(day(10)), Some(&r));
    }

    #[test]
    fn upsert_same_date_keeps_second_write() {
        let mut store = MetricsStore::new();
        store.upsert(record(day(10), 100));
        store.upsert(record(day(10), 130));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(day(10)).unwrap().eggs_produced, 130);
    }

    #[test]
    fn records_are_chronological_regardless_of_insertion_order() {
        let mut store = MetricsStore::new();
        store.upsert(record(day(12), 3));
        store.upsert(record(day(10), 1));
        store.upsert(record(day(11), 2));
        let dates: Vec<NaiveDate> = store.records().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(10), day(11), day(12)]);
        assert_eq!(store.latest().unwrap().date, day(12));
    }

    #[test]
    fn trailing_caps_at_window_and_skips_missing_days() {
        let mut store = MetricsStore::new();
        for d in [1, 2, 3, 5, 8, 13, 21, 22, 23] {
            store.upsert(record(day(d), d));
        }
        let trailing = store.trailing(7);
        assert_eq!(trailing.len(), 7);
        let dates: Vec<NaiveDate> = trailing.iter().map(|r| r.date).collect();
        assert_eq!(
            dates,
            vec![day(3), day(5), day(8), day(13), day(21), day(22), day(23)]
        );
    }

    #[test]
    fn trailing_on_sparse_store_returns_what_exists() {
        let mut store = MetricsStore::new();
        store.upsert(record(day(10), 5));
        let trailing = store.trailing(7);
        assert_eq!(trailing.len(), 1);
        assert_eq!(trailing[0].date, day(10));
    }

    #[test]
    fn seed_demo_fills_the_trailing_week() {
        let mut store = MetricsStore::new();
        let today = day(20);
        store.seed_demo(today);
        assert_eq!(store.len(), 7);
        assert_eq!(store.records().next().unwrap().date, day(14));
        let latest = store.latest().unwrap();
        assert_eq!(latest.date, today);
        assert_eq!(latest.eggs_produced, 130);
    }
}
