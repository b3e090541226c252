// src/crossing.rs
use crate::indicators::AlignedSeries;
use chrono::{DateTime, Duration, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Above,
    Below,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Above => write!(f, "ABOVE"),
            Direction::Below => write!(f, "BELOW"),
        }
    }
}

/// Where the most recent flip was found, with the prices needed for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CrossPoint {
    pub index: usize,
    pub date: DateTime<Utc>,
    pub price_at_cross: f64,
    pub current_price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum CrossResult {
    AboveCross(CrossPoint),
    BelowCross(CrossPoint),
    NoCross,
}

impl CrossResult {
    /// 1 for a golden cross, -1 for a death cross, 0 otherwise
    pub fn signal(&self) -> i8 {
        match self {
            CrossResult::AboveCross(_) => 1,
            CrossResult::BelowCross(_) => -1,
            CrossResult::NoCross => 0,
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        match self {
            CrossResult::AboveCross(_) => Some(Direction::Above),
            CrossResult::BelowCross(_) => Some(Direction::Below),
            CrossResult::NoCross => None,
        }
    }

    pub fn point(&self) -> Option<&CrossPoint> {
        match self {
            CrossResult::AboveCross(p) | CrossResult::BelowCross(p) => Some(p),
            CrossResult::NoCross => None,
        }
    }
}

/// Walks an aligned series backward from the point just before the last one,
/// yielding `(index, short - long)`. Ends at index 0, at the first undefined
/// average, or at the first date older than `max_days` before `now`.
pub struct RecentScan<'a> {
    series: &'a AlignedSeries,
    cursor: Option<usize>,
    now: DateTime<Utc>,
    max_age: Duration,
}

impl<'a> RecentScan<'a> {
    pub fn new(series: &'a AlignedSeries, max_days: i64, now: DateTime<Utc>) -> Self {
        Self {
            series,
            cursor: series.len().checked_sub(2),
            now,
            max_age: max_age(max_days),
        }
    }

    fn is_usable(&self, index: usize) -> bool {
        !self.series.short_avg()[index].is_nan()
            && !self.series.long_avg()[index].is_nan()
            && self.now - self.series.dates()[index] <= self.max_age
    }
}

/// Day counts past chrono's range saturate instead of panicking.
fn max_age(max_days: i64) -> Duration {
    Duration::try_days(max_days).unwrap_or(if max_days < 0 {
        TimeDelta::MIN
    } else {
        TimeDelta::MAX
    })
}

impl Iterator for RecentScan<'_> {
    type Item = (usize, f64);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        if !self.is_usable(index) {
            self.cursor = None;
            return None;
        }
        self.cursor = index.checked_sub(1);
        Some((index, self.series.spread(index)))
    }
}

/// Find whether the short average crossed the long one within `max_days` of `now`.
///
/// The reported direction is the current relative position at the last
/// index, not the sign at the flip: the flip only proves that the position
/// changed inside the window.
pub fn detect_last_crossing(
    series: &AlignedSeries,
    max_days: i64,
    filter: Option<Direction>,
    symbol: &str,
    now: DateTime<Utc>,
) -> CrossResult {
    let Some(last) = series.len().checked_sub(1) else {
        return CrossResult::NoCross;
    };
    let recent_above = series.spread(last) >= 0.0;

    match filter {
        Some(Direction::Above) if !recent_above => return CrossResult::NoCross,
        Some(Direction::Below) if recent_above => return CrossResult::NoCross,
        _ => {}
    }

    let flip = RecentScan::new(series, max_days, now).find(|&(_, spread)| {
        if recent_above {
            spread < 0.0
        } else {
            spread > 0.0
        }
    });

    let Some((index, _)) = flip else {
        return CrossResult::NoCross;
    };

    let point = CrossPoint {
        index,
        date: series.dates()[index],
        price_at_cross: series.price()[index],
        current_price: series.price()[last],
    };
    let result = if recent_above {
        CrossResult::AboveCross(point)
    } else {
        CrossResult::BelowCross(point)
    };

    if let Some(direction) = result.direction() {
        info!(
            symbol,
            %direction,
            date = %point.date,
            elapsed = %format_elapsed(now - point.date),
            price_at_cross = point.price_at_cross,
            current_price = point.current_price,
            "short SMA crossed long SMA"
        );
    }

    result
}

pub fn format_elapsed(elapsed: Duration) -> String {
    let days = elapsed.num_days();
    let hours = elapsed.num_hours() - days * 24;
    let minutes = elapsed.num_minutes() - elapsed.num_hours() * 60;
    format!("{} days {:02}:{:02}", days, hours, minutes)
}

/// Human-readable line for a found cross.
#[derive(Debug, Clone, Serialize)]
pub struct CrossReport {
    pub symbol: String,
    pub result: CrossResult,
    pub checked_at: DateTime<Utc>,
}

impl CrossReport {
    pub fn signal(&self) -> i8 {
        self.result.signal()
    }
}

impl fmt::Display for CrossReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.result.direction(), self.result.point()) {
            (Some(direction), Some(p)) => write!(
                f,
                "{}: Short SMA crossed {} Long SMA at {}, which was {} ago, price at cross: {}, current price: {}",
                self.symbol,
                direction,
                p.date,
                format_elapsed(self.checked_at - p.date),
                p.price_at_cross,
                p.current_price
            ),
            _ => write!(f, "{}: no crossing", self.symbol),
        }
    }
}
