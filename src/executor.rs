// src/executor.rs
use crate::broker::{Bounds, Brokerage, OrderConfirmation, Position, Span};
use crate::error::{AppError, Result};
use crate::indicators::PricePoint;
use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveTime, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::info;

#[derive(Debug)]
struct SimAccount {
    cash: f64,
    holdings: BTreeMap<String, Position>,
}

/// Offline brokerage: random-walk histories, in-memory cash and positions.
#[derive(Clone, Debug)]
pub struct SimBroker {
    counter: Arc<AtomicUsize>,
    account: Arc<Mutex<SimAccount>>,
}

impl SimBroker {
    pub fn new(starting_cash: f64) -> Self {
        Self {
            counter: Arc::new(AtomicUsize::new(0)),
            account: Arc::new(Mutex::new(SimAccount {
                cash: starting_cash,
                holdings: BTreeMap::new(),
            })),
        }
    }

    fn check_symbol(symbol: &str) -> Result<()> {
        let valid = (1..=5).contains(&symbol.len()) && symbol.chars().all(|c| c.is_ascii_alphabetic());
        if valid {
            Ok(())
        } else {
            Err(AppError::Lookup(symbol.to_string()))
        }
    }

    /// Same symbol and span always give the same closes; dates end today.
    fn generate_history(symbol: &str, span: Span) -> Vec<PricePoint> {
        let seed = symbol
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut rng = StdRng::seed_from_u64(seed);

        let calendar_days = match span {
            Span::Day => 1,
            Span::Week => 7,
            Span::Month => 30,
            Span::ThreeMonth => 90,
            Span::Year => 365,
            Span::FiveYear => 5 * 365,
        };

        let today = Utc::now().date_naive();
        let open = NaiveTime::from_hms_opt(13, 30, 0).unwrap_or_default();
        let mut price = rng.gen_range(20.0..500.0);
        let mut out = Vec::new();
        for back in (0..calendar_days).rev() {
            let date = today - Duration::days(back);
            if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                continue;
            }
            price = f64::max(price * (1.0 + rng.gen_range(-0.02..0.02)), 0.01);
            out.push(PricePoint {
                ts: date.and_time(open).and_utc(),
                price,
            });
        }
        out
    }
}

#[async_trait]
impl Brokerage for SimBroker {
    async fn get_price_history(
        &self,
        symbol: &str,
        span: Span,
        _bounds: Bounds,
    ) -> Result<Vec<PricePoint>> {
        let symbol = symbol.to_uppercase();
        Self::check_symbol(&symbol)?;
        Ok(Self::generate_history(&symbol, span))
    }

    async fn get_holdings(&self) -> Result<BTreeMap<String, Position>> {
        Ok(self.account.lock().await.holdings.clone())
    }

    async fn submit_market_buy(&self, symbol: &str, quantity: u32) -> Result<OrderConfirmation> {
        Self::check_symbol(symbol)?;
        if quantity == 0 {
            return Err(AppError::Order("quantity must be positive".into()));
        }

        let price = Self::generate_history(symbol, Span::Year)
            .last()
            .map(|p| p.price)
            .ok_or_else(|| AppError::Order("market closed".into()))?;
        let cost = price * quantity as f64;

        let mut account = self.account.lock().await;
        if cost > account.cash {
            return Err(AppError::Order(format!(
                "insufficient funds: required {:.2}, available {:.2}",
                cost, account.cash
            )));
        }
        account.cash -= cost;
        let position = account
            .holdings
            .entry(symbol.to_string())
            .or_insert(Position {
                quantity: 0.0,
                average_buy_price: 0.0,
            });
        let held = position.quantity;
        position.quantity = held + quantity as f64;
        position.average_buy_price =
            (held * position.average_buy_price + cost) / position.quantity;

        let id = self.counter.fetch_add(1, Ordering::SeqCst);
        info!("[SIM BUY] {} @ {:.2} x {} -> id={}", symbol, price, quantity, id);
        Ok(OrderConfirmation {
            id: format!("sim-{}", id),
            symbol: symbol.to_string(),
            quantity,
            state: "filled".into(),
        })
    }
}
