// src/broker.rs
use crate::error::Result;
use crate::indicators::PricePoint;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How far back a price history request reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Span {
    Day,
    Week,
    Month,
    #[serde(rename = "3month")]
    ThreeMonth,
    Year,
    #[serde(rename = "5year")]
    FiveYear,
}

impl Span {
    pub fn as_str(&self) -> &'static str {
        match self {
            Span::Day => "day",
            Span::Week => "week",
            Span::Month => "month",
            Span::ThreeMonth => "3month",
            Span::Year => "year",
            Span::FiveYear => "5year",
        }
    }

    /// bar size the brokerage serves for this span
    pub fn interval(&self) -> &'static str {
        match self {
            Span::Day => "5minute",
            Span::Week => "10minute",
            Span::Month | Span::ThreeMonth => "hour",
            Span::Year => "day",
            Span::FiveYear => "week",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bounds {
    Regular,
    Extended,
    Trading,
}

impl Bounds {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bounds::Regular => "regular",
            Bounds::Extended => "extended",
            Bounds::Trading => "trading",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub quantity: f64,
    pub average_buy_price: f64,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{quantity: {}, average_buy_price: {:.2}}}",
            self.quantity, self.average_buy_price
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub id: String,
    pub symbol: String,
    pub quantity: u32,
    pub state: String,
}

/// Everything the app needs from a logged-in brokerage account.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Brokerage: Send + Sync {
    /// Daily closes ordered oldest first.
    async fn get_price_history(
        &self,
        symbol: &str,
        span: Span,
        bounds: Bounds,
    ) -> Result<Vec<PricePoint>>;

    async fn get_holdings(&self) -> Result<BTreeMap<String, Position>>;

    async fn submit_market_buy(&self, symbol: &str, quantity: u32) -> Result<OrderConfirmation>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_follows_span() {
        assert_eq!(Span::Year.interval(), "day");
        assert_eq!(Span::Day.interval(), "5minute");
        assert_eq!(Span::ThreeMonth.interval(), "hour");
        assert_eq!(Span::FiveYear.interval(), "week");
    }

    #[test]
    fn test_span_wire_names() {
        let span: Span = serde_json::from_str("\"3month\"").unwrap();
        assert_eq!(span, Span::ThreeMonth);
        assert_eq!(span.as_str(), "3month");
        let bounds: Bounds = serde_json::from_str("\"extended\"").unwrap();
        assert_eq!(bounds.as_str(), "extended");
    }
}
