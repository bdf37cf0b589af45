use crate::models::{DrinkKind, Event};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

/// Totals keyed by `(user_name, drink_kind)`. Rebuilt from the raw log on every read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreMap {
    totals: BTreeMap<(String, DrinkKind), u64>,
}

impl ScoreMap {
    pub fn get(&self, user: &str, kind: DrinkKind) -> u64 {
        self.totals
            .get(&(user.to_string(), kind))
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self, kind: DrinkKind) -> u64 {
        self.totals
            .iter()
            .filter(|((_, k), _)| *k == kind)
            .fold(0u64, |acc, (_, value)| acc.saturating_add(*value))
    }

    /// Every user with at least one event of `kind`, in name order.
    pub fn by_user(&self, kind: DrinkKind) -> Vec<(&str, u64)> {
        self.totals
            .iter()
            .filter(|((_, k), _)| *k == kind)
            .map(|((user, _), value)| (user.as_str(), *value))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }
}

pub type LastEventMap = HashMap<String, DateTime<Utc>>;

pub fn aggregate<'a, I>(events: I) -> ScoreMap
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut scores = ScoreMap::default();
    for event in events {
        let entry = scores
            .totals
            .entry((event.user_name.clone(), event.drink_kind))
            .or_default();
        *entry = entry.saturating_add(event.value);
    }
    scores
}

/// Latest `created_at` per user, across every drink kind.
pub fn last_event_map<'a, I>(events: I) -> LastEventMap
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut latest = LastEventMap::new();
    for event in events {
        latest
            .entry(event.user_name.clone())
            .and_modify(|at| {
                if event.created_at > *at {
                    *at = event.created_at;
                }
            })
            .or_insert(event.created_at);
    }
    latest
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn event(user: &str, value: u64, kind: DrinkKind, at: DateTime<Utc>) -> Event {
        Event {
            id: None,
            user_name: user.to_string(),
            value,
            drink_kind: kind,
            created_at: at,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 8, 30, 0).unwrap()
    }

    #[test]
    fn groups_by_user_and_kind() {
        let events = vec![
            event("A", 1, DrinkKind::Coffee, t0()),
            event("A", 1, DrinkKind::Coffee, t0() + Duration::days(1)),
            event("B", 1, DrinkKind::Tea, t0()),
        ];

        let scores = aggregate(&events);
        assert_eq!(scores.len(), 2);
        assert_eq!(scores.get("A", DrinkKind::Coffee), 2);
        assert_eq!(scores.get("B", DrinkKind::Tea), 1);
        assert_eq!(scores.get("B", DrinkKind::Coffee), 0);
        assert_eq!(scores.total(DrinkKind::Coffee), 2);
        assert_eq!(scores.by_user(DrinkKind::Tea), vec![("B", 1)]);
    }

    #[test]
    fn sums_match_per_key_event_sums_in_any_order() {
        let kinds = [DrinkKind::Coffee, DrinkKind::Tea];
        let users = ["Cris", "Bea", "Fer"];
        let mut events = Vec::new();
        for i in 0..60u64 {
            events.push(event(
                users[(i % 3) as usize],
                i % 4,
                kinds[(i % 5 % 2) as usize],
                t0() + Duration::minutes(i as i64),
            ));
        }

        let forward = aggregate(&events);
        let reversed = aggregate(events.iter().rev());
        assert_eq!(forward, reversed);

        for user in users {
            for kind in kinds {
                let expected: u64 = events
                    .iter()
                    .filter(|e| e.user_name == user && e.drink_kind == kind)
                    .map(|e| e.value)
                    .sum();
                assert_eq!(forward.get(user, kind), expected);
            }
        }
    }

    #[test]
    fn empty_log_gives_empty_maps() {
        let events: Vec<Event> = Vec::new();
        assert!(aggregate(&events).is_empty());
        assert!(last_event_map(&events).is_empty());
    }

    #[test]
    fn last_event_spans_drink_kinds() {
        let events = vec![
            event("A", 1, DrinkKind::Tea, t0() + Duration::hours(2)),
            event("A", 1, DrinkKind::Coffee, t0()),
            event("B", 1, DrinkKind::Coffee, t0() + Duration::hours(1)),
        ];

        let latest = last_event_map(&events);
        assert_eq!(latest["A"], t0() + Duration::hours(2));
        assert_eq!(latest["B"], t0() + Duration::hours(1));
    }
}
