//! The fixed catalog of study intervals. Order is significant: the catalog is
//! ascending by duration and "infinite" is the logical maximum, excluded from
//! nearest-match lookups.

const SECOND: i64 = 1000;
const MINUTE: i64 = 60 * SECOND;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 365 * DAY;

pub const INFINITE_LABEL: &str = "infinite";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub label: &'static str,
    pub duration_ms: i64,
}

const CATALOG: &[Interval] = &[
    Interval { label: "1s", duration_ms: SECOND },
    Interval { label: "10s", duration_ms: 10 * SECOND },
    Interval { label: "1min", duration_ms: MINUTE },
    Interval { label: "10min", duration_ms: 10 * MINUTE },
    Interval { label: "1hr", duration_ms: HOUR },
    Interval { label: "8hr", duration_ms: 8 * HOUR },
    Interval { label: "1d", duration_ms: DAY },
    Interval { label: "3d", duration_ms: 3 * DAY },
    Interval { label: "1wk", duration_ms: WEEK },
    Interval { label: "2wk", duration_ms: 2 * WEEK },
    Interval { label: "1mo", duration_ms: MONTH },
    Interval { label: "3mo", duration_ms: 3 * MONTH },
    Interval { label: "6mo", duration_ms: 6 * MONTH },
    Interval { label: "1yr", duration_ms: YEAR },
    Interval { label: "2yr", duration_ms: 2 * YEAR },
    Interval { label: "5yr", duration_ms: 5 * YEAR },
    Interval { label: "10yr", duration_ms: 10 * YEAR },
    Interval { label: "20yr", duration_ms: 20 * YEAR },
    Interval { label: "40yr", duration_ms: 40 * YEAR },
    Interval { label: INFINITE_LABEL, duration_ms: i64::MAX },
];

pub fn catalog() -> &'static [Interval] {
    CATALOG
}

pub fn duration_of(label: &str) -> Option<i64> {
    CATALOG.iter().find(|interval| interval.label == label).map(|interval| interval.duration_ms)
}

/// The catalog label whose duration is closest to the elapsed time. Total:
/// non-positive or non-finite input falls back to the smallest interval, and
/// the infinite sentinel is never considered.
pub fn nearest(elapsed_ms: f64) -> &'static str {
    if !elapsed_ms.is_finite() || elapsed_ms <= 0.0 {
        return CATALOG[0].label;
    }

    let mut best = CATALOG[0];
    let mut best_distance = f64::INFINITY;
    for interval in CATALOG {
        if interval.label == INFINITE_LABEL {
            continue;
        }
        let distance = (elapsed_ms - interval.duration_ms as f64).abs();
        if distance < best_distance {
            best_distance = distance;
            best = *interval;
        }
    }

    best.label
}
