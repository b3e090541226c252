// src/app.rs
use crate::broker::{Brokerage, OrderConfirmation, Position};
use crate::config::{AppConfig, CrossoverConfig};
use crate::crossing::{CrossReport, Direction, detect_last_crossing};
use crate::error::{AppError, Result};
use crate::indicators::build_aligned_series;

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossoverParams {
    pub short_window: usize,
    pub long_window: usize,
    pub max_days: i64,
    pub direction: Option<Direction>,
}

impl From<&CrossoverConfig> for CrossoverParams {
    fn from(cfg: &CrossoverConfig) -> Self {
        Self {
            short_window: cfg.short_window,
            long_window: cfg.long_window,
            max_days: cfg.max_days,
            direction: cfg.direction,
        }
    }
}

impl CrossoverParams {
    /// Replace each field that has an override; `Some(None)` clears the direction filter.
    pub fn with_overrides(
        self,
        short_window: Option<usize>,
        long_window: Option<usize>,
        max_days: Option<i64>,
        direction: Option<Option<Direction>>,
    ) -> Self {
        Self {
            short_window: short_window.unwrap_or(self.short_window),
            long_window: long_window.unwrap_or(self.long_window),
            max_days: max_days.unwrap_or(self.max_days),
            direction: direction.unwrap_or(self.direction),
        }
    }
}

#[derive(Clone)]
pub struct TradingApp {
    broker: Arc<dyn Brokerage>,
    config: Arc<AppConfig>,
}

impl TradingApp {
    pub fn new(broker: Arc<dyn Brokerage>, config: Arc<AppConfig>) -> Self {
        Self { broker, config }
    }

    #[instrument(skip(self))]
    pub async fn holdings(&self) -> Result<BTreeMap<String, Position>> {
        let holdings = self.broker.get_holdings().await?;
        debug!("Account holds {} positions", holdings.len());
        Ok(holdings)
    }

    #[instrument(skip(self))]
    pub async fn buy_stock(&self, symbol: &str, quantity: u32) -> Result<OrderConfirmation> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(AppError::Validation("symbol must not be empty".into()));
        }
        if quantity == 0 {
            return Err(AppError::Validation("quantity must be a positive integer".into()));
        }

        let order = self.broker.submit_market_buy(&symbol, quantity).await?;
        info!("Order {} for {} x {} is {}", order.id, symbol, quantity, order.state);
        Ok(order)
    }

    #[instrument(skip(self))]
    pub async fn check_crossover(&self, symbol: &str, params: CrossoverParams) -> Result<CrossReport> {
        let symbol = symbol.trim().to_uppercase();
        let history = &self.config.history;
        let points = self
            .broker
            .get_price_history(&symbol, history.span, history.bounds)
            .await?;

        if points.is_empty() {
            return Err(AppError::DataNotFound(format!(
                "No price history for symbol {} over span {}",
                symbol,
                history.span.as_str()
            )));
        }

        let series = build_aligned_series(&points, params.short_window, params.long_window);
        let now = Utc::now();
        let result = detect_last_crossing(&series, params.max_days, params.direction, &symbol, now);
        debug!("Crossover signal for {}: {}", symbol, result.signal());

        Ok(CrossReport {
            symbol,
            result,
            checked_at: now,
        })
    }

    /// Crossover parameters from the `crossover` config section.
    pub fn default_params(&self) -> CrossoverParams {
        CrossoverParams::from(&self.config.crossover)
    }

    pub fn default_symbol(&self) -> &str {
        &self.config.crossover.symbol
    }
}
