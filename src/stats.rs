use crate::aggregate::{ScoreMap, aggregate};
use crate::calendar::{Period, window_for};
use crate::config::Config;
use crate::models::{
    DrinkKind, DrinkStats, Event, ScoresResponse, ShareSlice, StatsResponse, UserScore, WindowSeries,
};
use crate::series::{BucketSize, build_series};
use chrono::{DateTime, Utc};

pub fn build_scores(config: &Config, events: &[Event]) -> ScoresResponse {
    scores_from_map(config, &aggregate(events))
}

pub fn scores_from_map(config: &Config, scores: &ScoreMap) -> ScoresResponse {
    let users = config
        .users
        .iter()
        .map(|user| UserScore {
            user: user.clone(),
            coffee: scores.get(user, DrinkKind::Coffee),
            tea: scores.get(user, DrinkKind::Tea),
        })
        .collect();

    ScoresResponse {
        users,
        total_coffee: scores.total(DrinkKind::Coffee),
        total_tea: scores.total(DrinkKind::Tea),
    }
}

/// Column name used when a user's tea is plotted among the coffee drinkers.
pub fn tea_alias(user: &str) -> String {
    format!("{user}(tea)")
}

pub fn build_stats_at(config: &Config, events: &[Event], now: DateTime<Utc>) -> StatsResponse {
    let scores = aggregate(events);
    let local_now = now.with_timezone(&config.utc_offset);

    let (coffee, tea): (Vec<Event>, Vec<Event>) = events
        .iter()
        .cloned()
        .partition(|event| event.drink_kind == DrinkKind::Coffee);

    let coffee_stats = (!coffee.is_empty()).then(|| {
        let mut charted = coffee.clone();
        let mut columns = config.users.clone();
        let mut aliases = Vec::new();

        for user in &config.tea_with_coffee {
            let alias = tea_alias(user);
            let own_tea: Vec<Event> = tea
                .iter()
                .filter(|event| &event.user_name == user)
                .map(|event| Event {
                    user_name: alias.clone(),
                    ..event.clone()
                })
                .collect();
            if own_tea.is_empty() {
                continue;
            }
            charted.extend(own_tea);
            columns.push(alias.clone());
            aliases.push((alias, scores.get(user, DrinkKind::Tea)));
        }
        let mut share = scores.by_user(DrinkKind::Coffee);
        share.extend(aliases.iter().map(|(alias, count)| (alias.as_str(), *count)));

        DrinkStats {
            drink: DrinkKind::Coffee,
            share: share_slices(&share),
            windows: windows(&charted, &columns, local_now),
        }
    });

    let tea_stats = (!tea.is_empty()).then(|| DrinkStats {
        drink: DrinkKind::Tea,
        share: share_slices(&scores.by_user(DrinkKind::Tea)),
        windows: windows(&tea, &config.users, local_now),
    });

    StatsResponse {
        generated_at: now,
        coffee: coffee_stats,
        tea: tea_stats,
    }
}

fn windows(
    events: &[Event],
    columns: &[String],
    now: DateTime<chrono::FixedOffset>,
) -> Vec<WindowSeries> {
    Period::ALL
        .iter()
        .filter_map(|period| {
            let window = window_for(*period, now)?;
            Some(WindowSeries {
                period: period.as_str(),
                start_date: window.start_date(),
                end_date: window.end_date(),
                series: build_series(events, &window, BucketSize::Day, columns, now),
            })
        })
        .collect()
}

fn share_slices(counts: &[(&str, u64)]) -> Vec<ShareSlice> {
    let total: u64 = counts.iter().map(|(_, count)| *count).sum();
    let mut slices: Vec<ShareSlice> = counts
        .iter()
        .map(|(name, count)| ShareSlice {
            name: name.to_string(),
            count: *count,
            percentage: if total == 0 {
                0.0
            } else {
                *count as f64 / total as f64
            },
        })
        .collect();
    slices.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    slices
}
