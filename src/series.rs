//! Dense cumulative counts over a calendar window.
//!
//! The log is sparse: most days have no events at all. Charts want one point
//! per bucket for every user, so events are summed per `(bucket, user)`,
//! reindexed onto the full bucket axis with zero fill, accumulated left to
//! right, and finally every bucket after "now" is blanked out so a line stops
//! at today instead of running flat into the future.

use crate::calendar::{Window, month_start, week_start};
use crate::models::Event;
use chrono::{DateTime, Duration, FixedOffset, Months, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketSize {
    Day,
    Week,
    Month,
}

impl BucketSize {
    /// Start date of the bucket containing `date`.
    pub fn floor(self, date: NaiveDate) -> NaiveDate {
        match self {
            BucketSize::Day => date,
            BucketSize::Week => week_start(date),
            BucketSize::Month => month_start(date),
        }
    }

    fn next(self, bucket: NaiveDate) -> Option<NaiveDate> {
        match self {
            BucketSize::Day => bucket.checked_add_signed(Duration::days(1)),
            BucketSize::Week => bucket.checked_add_signed(Duration::weeks(1)),
            BucketSize::Month => bucket.checked_add_months(Months::new(1)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesColumn {
    pub name: String,
    /// Running total per bucket; `None` for buckets that have not happened yet.
    pub values: Vec<Option<u64>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CumulativeSeries {
    pub bucket_size: BucketSize,
    pub buckets: Vec<NaiveDate>,
    pub columns: Vec<SeriesColumn>,
}

impl CumulativeSeries {
    pub fn column(&self, name: &str) -> Option<&SeriesColumn> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Largest known value across all columns, 0 when nothing is known.
    pub fn max_value(&self) -> u64 {
        self.columns
            .iter()
            .flat_map(|column| column.values.iter().flatten())
            .copied()
            .max()
            .unwrap_or(0)
    }
}

/// Every bucket start from the bucket holding `window.start` through the one
/// holding `window.end`, independent of the data.
pub fn bucket_sequence(window: &Window, bucket_size: BucketSize) -> Vec<NaiveDate> {
    let last = window.end_date();
    let mut buckets = Vec::new();
    let mut cursor = Some(bucket_size.floor(window.start_date()));
    while let Some(bucket) = cursor {
        if bucket > last {
            break;
        }
        buckets.push(bucket);
        cursor = bucket_size.next(bucket);
    }
    buckets
}

/// Builds one cumulative column per tracked user (plus any other user seen in
/// the window) over the dense bucket axis of `window`.
///
/// Events are bucketed by their local date in the window's offset. Buckets
/// whose start lies after the bucket containing `now` are `None`.
pub fn build_series<'a, I>(
    events: I,
    window: &Window,
    bucket_size: BucketSize,
    tracked_users: &[String],
    now: DateTime<FixedOffset>,
) -> CumulativeSeries
where
    I: IntoIterator<Item = &'a Event>,
{
    let offset = window.offset();
    let buckets = bucket_sequence(window, bucket_size);

    let mut names: Vec<String> = tracked_users.to_vec();
    let mut index: HashMap<String, usize> = names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect();
    let mut counts: Vec<Vec<u64>> = vec![vec![0; buckets.len()]; names.len()];

    for event in events.into_iter().filter(|event| window.contains(&event.created_at)) {
        let local = event.created_at.with_timezone(&offset).date_naive();
        let Ok(slot) = buckets.binary_search(&bucket_size.floor(local)) else {
            continue;
        };
        let column = match index.get(&event.user_name) {
            Some(column) => *column,
            None => {
                names.push(event.user_name.clone());
                counts.push(vec![0; buckets.len()]);
                index.insert(event.user_name.clone(), names.len() - 1);
                names.len() - 1
            }
        };
        counts[column][slot] = counts[column][slot].saturating_add(event.value);
    }

    let cutoff = bucket_size.floor(now.with_timezone(&offset).date_naive());
    let columns = names
        .into_iter()
        .zip(counts)
        .map(|(name, per_bucket)| {
            let mut running = 0u64;
            let values = per_bucket
                .into_iter()
                .zip(&buckets)
                .map(|(count, bucket)| {
                    running = running.saturating_add(count);
                    (*bucket <= cutoff).then_some(running)
                })
                .collect();
            SeriesColumn { name, values }
        })
        .collect();

    CumulativeSeries {
        bucket_size,
        buckets,
        columns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{Period, window_for};
    use crate::models::DrinkKind;
    use chrono::{TimeZone, Utc};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<FixedOffset> {
        utc().with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn event(user: &str, value: u64, kind: DrinkKind, created_at: DateTime<FixedOffset>) -> Event {
        Event {
            id: None,
            user_name: user.to_string(),
            value,
            drink_kind: kind,
            created_at: created_at.with_timezone(&Utc),
        }
    }

    fn users(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn two_days(t0: DateTime<FixedOffset>) -> Window {
        Window {
            start: utc().from_local_datetime(&t0.date_naive().and_hms_opt(0, 0, 0).unwrap()).unwrap(),
            end: utc()
                .from_local_datetime(&(t0.date_naive() + Duration::days(1)).and_hms_opt(23, 59, 59).unwrap())
                .unwrap(),
        }
    }

    #[test]
    fn two_user_scenario() {
        let t0 = at(2026, 3, 9, 10);
        let events = vec![
            event("A", 1, DrinkKind::Coffee, t0),
            event("A", 1, DrinkKind::Coffee, t0 + Duration::days(1)),
            event("B", 1, DrinkKind::Tea, t0),
        ];
        let coffee: Vec<&Event> = events
            .iter()
            .filter(|e| e.drink_kind == DrinkKind::Coffee)
            .collect();

        let series = build_series(
            coffee,
            &two_days(t0),
            BucketSize::Day,
            &users(&["A", "B"]),
            t0 + Duration::days(1),
        );

        assert_eq!(series.buckets.len(), 2);
        assert_eq!(series.column("A").unwrap().values, vec![Some(1), Some(2)]);
        assert_eq!(series.column("B").unwrap().values, vec![Some(0), Some(0)]);
    }

    #[test]
    fn empty_window_is_all_zero_not_missing() {
        let now = at(2026, 3, 15, 12);
        let window = window_for(Period::Week, now).unwrap();
        let events: Vec<Event> = vec![event("A", 4, DrinkKind::Coffee, at(2026, 1, 2, 9))];

        let series = build_series(&events, &window, BucketSize::Day, &users(&["A", "B"]), now);
        assert_eq!(series.buckets.len(), 7);
        assert_eq!(series.columns.len(), 2);
        for column in &series.columns {
            assert_eq!(column.values, vec![Some(0); 7]);
        }
    }

    #[test]
    fn future_buckets_are_masked_and_past_ones_never() {
        // Wednesday.
        let now = at(2026, 3, 11, 8);
        let window = window_for(Period::Week, now).unwrap();
        let events = vec![
            event("A", 1, DrinkKind::Coffee, at(2026, 3, 9, 7)),
            event("A", 2, DrinkKind::Coffee, at(2026, 3, 11, 7)),
            event("C", 5, DrinkKind::Coffee, at(2026, 3, 10, 20)),
        ];

        let series = build_series(&events, &window, BucketSize::Day, &users(&["A", "B"]), now);
        assert_eq!(
            series.column("A").unwrap().values,
            vec![Some(1), Some(1), Some(3), None, None, None, None]
        );
        assert_eq!(
            series.column("B").unwrap().values,
            vec![Some(0), Some(0), Some(0), None, None, None, None]
        );
        // Untracked users still get a column, after the tracked ones.
        assert_eq!(series.columns[2].name, "C");
        assert_eq!(
            series.columns[2].values,
            vec![Some(0), Some(5), Some(5), None, None, None, None]
        );

        for column in &series.columns {
            for (bucket, value) in series.buckets.iter().zip(&column.values) {
                assert_eq!(value.is_none(), *bucket > now.date_naive());
            }
        }
    }

    #[test]
    fn windows_fully_past_or_future() {
        let now = at(2026, 6, 1, 12);
        let past = window_for(Period::Month, at(2026, 4, 10, 0)).unwrap();
        let future = window_for(Period::Month, at(2026, 9, 10, 0)).unwrap();
        let events = vec![event("A", 1, DrinkKind::Coffee, at(2026, 4, 30, 23))];

        let series = build_series(&events, &past, BucketSize::Day, &users(&["A"]), now);
        assert_eq!(series.buckets.len(), 30);
        let values = &series.column("A").unwrap().values;
        assert!(values.iter().all(Option::is_some));
        assert_eq!(values[29], Some(1));
        assert_eq!(values[28], Some(0));

        let series = build_series(&events, &future, BucketSize::Day, &users(&["A"]), now);
        assert!(series.column("A").unwrap().values.iter().all(Option::is_none));
        assert_eq!(series.max_value(), 0);
    }

    #[test]
    fn cumulative_values_never_decrease() {
        let now = at(2026, 8, 20, 12);
        let window = window_for(Period::Year, now).unwrap();
        let mut events = Vec::new();
        for i in 0..200i64 {
            let user = ["A", "B", "C"][(i % 3) as usize];
            events.push(event(user, (i % 4) as u64, DrinkKind::Coffee, at(2026, 1, 1, 0) + Duration::hours(i * 29)));
        }

        let series = build_series(&events, &window, BucketSize::Day, &users(&["A", "B", "C"]), now);
        assert_eq!(series.buckets.len(), 365);
        for column in &series.columns {
            let known: Vec<u64> = column.values.iter().flatten().copied().collect();
            assert!(known.windows(2).all(|pair| pair[0] <= pair[1]));
            let total: u64 = events
                .iter()
                .filter(|e| e.user_name == column.name && window.contains(&e.created_at))
                .filter(|e| e.created_at.date_naive() <= now.date_naive())
                .map(|e| e.value)
                .sum();
            assert_eq!(known.last().copied(), Some(total));
        }
    }

    #[test]
    fn events_bucket_by_local_date_of_the_window() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = plus_two.with_ymd_and_hms(2026, 3, 11, 12, 0, 0).unwrap();
        let window = window_for(Period::Week, now).unwrap();
        // 23:30 UTC on Monday is already Tuesday at +02:00.
        let late = Utc.with_ymd_and_hms(2026, 3, 9, 23, 30, 0).unwrap();
        let events = vec![Event {
            id: None,
            user_name: "A".to_string(),
            value: 1,
            drink_kind: DrinkKind::Coffee,
            created_at: late,
        }];

        let series = build_series(&events, &window, BucketSize::Day, &users(&["A"]), now);
        assert_eq!(
            series.column("A").unwrap().values[..3],
            [Some(0), Some(1), Some(1)]
        );
    }

    #[test]
    fn coarser_buckets() {
        let now = at(2026, 3, 18, 12);
        let year = window_for(Period::Year, now).unwrap();
        let events = vec![
            event("A", 1, DrinkKind::Coffee, at(2026, 1, 20, 9)),
            event("A", 3, DrinkKind::Coffee, at(2026, 3, 2, 9)),
        ];

        let monthly = build_series(&events, &year, BucketSize::Month, &users(&["A"]), now);
        assert_eq!(monthly.buckets.len(), 12);
        assert_eq!(
            monthly.column("A").unwrap().values[..4],
            [Some(1), Some(1), Some(4), None]
        );

        let month = window_for(Period::Month, now).unwrap();
        let weekly = build_series(&events, &month, BucketSize::Week, &users(&["A"]), now);
        // March 2026 starts on a Sunday, so the first bucket begins in February.
        assert_eq!(weekly.buckets[0], NaiveDate::from_ymd_opt(2026, 2, 23).unwrap());
        assert_eq!(weekly.buckets.len(), 6);
        assert_eq!(
            weekly.column("A").unwrap().values,
            vec![Some(0), Some(3), Some(3), Some(3), None, None]
        );
    }
}
