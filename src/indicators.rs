// src/indicators.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

/// Simple moving averages aligned to the price date axis.
/// Positions without a full window hold NaN, never zero.

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    pub ts: DateTime<Utc>,
    pub price: f64,
}

#[derive(Debug)]
pub struct SMA {
    period: usize,
    window: VecDeque<f64>,
}

impl SMA {
    pub fn new(period: usize) -> Self {
        SMA {
            period,
            window: VecDeque::with_capacity(period + 1),
        }
    }

    /// feed a close price and get the trailing mean, NaN until the window is full
    pub fn next(&mut self, value: f64) -> f64 {
        self.window.push_back(value);
        if self.window.len() > self.period {
            self.window.pop_front();
        }
        if self.period == 0 || self.window.len() < self.period {
            return f64::NAN;
        }
        self.window.iter().sum::<f64>() / self.period as f64
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AlignedSeries {
    price: Vec<f64>,
    short_avg: Vec<f64>,
    long_avg: Vec<f64>,
    dates: Vec<DateTime<Utc>>,
}

impl AlignedSeries {
    /// Assemble a series from already-computed columns. All four must have the same length.
    #[cfg(test)]
    pub fn from_parts(
        price: Vec<f64>,
        short_avg: Vec<f64>,
        long_avg: Vec<f64>,
        dates: Vec<DateTime<Utc>>,
    ) -> crate::error::Result<Self> {
        let n = price.len();
        if short_avg.len() != n || long_avg.len() != n || dates.len() != n {
            return Err(crate::error::AppError::Validation(format!(
                "misaligned series: price={}, short={}, long={}, dates={}",
                n,
                short_avg.len(),
                long_avg.len(),
                dates.len()
            )));
        }
        Ok(Self {
            price,
            short_avg,
            long_avg,
            dates,
        })
    }

    pub fn len(&self) -> usize {
        self.price.len()
    }

    pub fn price(&self) -> &[f64] {
        &self.price
    }

    pub fn short_avg(&self) -> &[f64] {
        &self.short_avg
    }

    pub fn long_avg(&self) -> &[f64] {
        &self.long_avg
    }

    pub fn dates(&self) -> &[DateTime<Utc>] {
        &self.dates
    }

    /// short minus long at `index`; NaN while either average is undefined
    pub fn spread(&self, index: usize) -> f64 {
        self.short_avg[index] - self.long_avg[index]
    }
}

pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let mut sma = SMA::new(window);
    values.iter().map(|v| sma.next(*v)).collect()
}

/// Build price, short SMA, long SMA and dates as one aligned table.
/// `short_window` should be smaller than `long_window`; this is not checked.
pub fn build_aligned_series(
    points: &[PricePoint],
    short_window: usize,
    long_window: usize,
) -> AlignedSeries {
    let price: Vec<f64> = points.iter().map(|p| p.price).collect();
    let dates = points.iter().map(|p| p.ts).collect();
    let short_avg = rolling_mean(&price, short_window);
    let long_avg = rolling_mean(&price, long_window);
    AlignedSeries {
        price,
        short_avg,
        long_avg,
        dates,
    }
}
