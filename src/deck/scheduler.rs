use std::{
    cmp::Ordering,
    collections::HashMap,
};

use chrono::{
    DateTime,
    Utc,
};
use rand::Rng;

use crate::core::{
    intervals,
    Card,
};

/// Fraction of noise applied to each due card's overdueness so the same worst
/// offender cannot monopolize the head of a long queue across recomputations.
pub const DEFAULT_FUZZ: f64 = 0.1;

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Per-card multiplier is drawn uniformly from `[1 - fuzz, 1 + fuzz]`.
    /// Zero makes the ordering fully deterministic.
    pub fuzz: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { fuzz: DEFAULT_FUZZ }
    }
}

/// A card is due when it has never been studied, when its study state is
/// corrupt (unknown interval label, unparseable timestamp), or when its
/// chosen interval has fully elapsed. Corrupt data fails open on purpose.
pub fn is_due(card: &Card, now: DateTime<Utc>) -> bool {
    let (Some(last_seen), Some(label)) = (card.last_seen, card.interval.as_deref()) else {
        return true;
    };
    let Some(duration_ms) = intervals::duration_of(label) else {
        return true;
    };

    let elapsed_ms = (now - last_seen).num_milliseconds();
    elapsed_ms >= duration_ms
}

/// Elapsed time since the last review divided by the chosen interval's
/// duration. Infinity for never-studied cards and for anything invalid, which
/// puts them at the very front of their priority tier.
pub fn proportional_overdueness(card: &Card, now: DateTime<Utc>) -> f64 {
    let (Some(last_seen), Some(label)) = (card.last_seen, card.interval.as_deref()) else {
        return f64::INFINITY;
    };
    let Some(duration_ms) = intervals::duration_of(label) else {
        return f64::INFINITY;
    };
    if duration_ms <= 0 {
        return f64::INFINITY;
    }

    let elapsed_ms = (now - last_seen).num_milliseconds() as f64;
    elapsed_ms / duration_ms as f64
}

/// The study queue: ids of every due card, most urgent first. Priority is the
/// primary key (lower is more urgent); noisy overdueness breaks ties within a
/// tier. Always a pure function of the card set and the clock, recomputed
/// after every mutation and never stored independently.
pub fn compute_queue(
    cards: &HashMap<String, Card>,
    now: DateTime<Utc>,
    config: SchedulerConfig,
) -> Vec<String> {
    let mut rng = rand::rng();

    let mut due: Vec<(i64, f64, &str)> = cards
        .values()
        .filter(|card| is_due(card, now))
        .map(|card| {
            let overdueness = proportional_overdueness(card, now);
            let noisy_score = if overdueness.is_infinite() || config.fuzz <= 0.0 {
                overdueness
            } else {
                overdueness * rng.random_range(1.0 - config.fuzz..=1.0 + config.fuzz)
            };
            (card.priority_level, noisy_score, card.id.as_str())
        })
        .collect();

    due.sort_by(|a, b| {
        a.0.cmp(&b.0).then_with(|| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal))
    });

    due.into_iter().map(|(_, _, id)| id.to_string()).collect()
}
