// src/tests.rs
#[cfg(test)]
mod tests {
    use crate::app::{CrossoverParams, TradingApp};
    use crate::broker::{Bounds, MockBrokerage, OrderConfirmation, Position, Span};
    use crate::config::{AppConfig, BrokerConfig, CrossoverConfig, HistoryConfig, SimConfig};
    use crate::crossing::{CrossResult, Direction};
    use crate::error::AppError;
    use crate::indicators::PricePoint;
    use crate::prompt::run_interactive;
    use chrono::{Duration, Utc};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn test_config(direction: Option<Direction>) -> Arc<AppConfig> {
        Arc::new(AppConfig {
            name: "cross-trader".into(),
            environment: "test".into(),
            broker: BrokerConfig {
                base_url: "http://localhost".into(),
                username: None,
                password: None,
            },
            history: HistoryConfig {
                span: Span::Year,
                bounds: Bounds::Regular,
            },
            crossover: CrossoverConfig {
                symbol: "GOOGL".into(),
                short_window: 2,
                long_window: 3,
                max_days: 10,
                direction,
            },
            sim: SimConfig {
                starting_cash: 1000.0,
            },
        })
    }

    /// short SMA(2) dips under long SMA(3) one day ago, then recovers
    fn golden_cross_history() -> Vec<PricePoint> {
        let end = Utc::now() - Duration::minutes(1);
        [10.0, 10.0, 10.0, 10.0, 9.0, 11.0]
            .iter()
            .enumerate()
            .map(|(i, p)| PricePoint {
                ts: end - Duration::days(5 - i as i64),
                price: *p,
            })
            .collect()
    }

    fn one_holding() -> BTreeMap<String, Position> {
        let mut holdings = BTreeMap::new();
        holdings.insert(
            "AAPL".to_string(),
            Position {
                quantity: 10.0,
                average_buy_price: 150.0,
            },
        );
        holdings
    }

    fn params(direction: Option<Direction>) -> CrossoverParams {
        CrossoverParams {
            short_window: 2,
            long_window: 3,
            max_days: 10,
            direction,
        }
    }

    #[tokio::test]
    async fn test_check_crossover_finds_golden_cross() {
        let mut broker = MockBrokerage::new();
        broker
            .expect_get_price_history()
            .withf(|symbol, span, bounds| {
                symbol == "GOOGL" && *span == Span::Year && *bounds == Bounds::Regular
            })
            .times(1)
            .returning(|_, _, _| Ok(golden_cross_history()));

        let app = TradingApp::new(Arc::new(broker), test_config(None));
        let report = app.check_crossover(" googl ", params(None)).await.unwrap();

        assert_eq!(report.symbol, "GOOGL");
        assert_eq!(report.signal(), 1);
        match report.result {
            CrossResult::AboveCross(p) => {
                assert_eq!(p.index, 4);
                assert_eq!(p.current_price, 11.0);
            }
            other => panic!("expected AboveCross, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_check_crossover_contradicting_filter() {
        let mut broker = MockBrokerage::new();
        broker
            .expect_get_price_history()
            .returning(|_, _, _| Ok(golden_cross_history()));

        let app = TradingApp::new(Arc::new(broker), test_config(None));
        let report = app
            .check_crossover("GOOGL", params(Some(Direction::Below)))
            .await
            .unwrap();
        assert_eq!(report.result, CrossResult::NoCross);
        assert_eq!(report.signal(), 0);
    }

    #[tokio::test]
    async fn test_empty_history_is_data_not_found() {
        let mut broker = MockBrokerage::new();
        broker
            .expect_get_price_history()
            .returning(|_, _, _| Ok(Vec::new()));

        let app = TradingApp::new(Arc::new(broker), test_config(None));
        let err = app.check_crossover("GOOGL", params(None)).await.unwrap_err();
        assert!(matches!(err, AppError::DataNotFound(_)));
    }

    #[tokio::test]
    async fn test_unknown_symbol_propagates_as_fatal() {
        let mut broker = MockBrokerage::new();
        broker
            .expect_get_price_history()
            .returning(|symbol, _, _| Err(AppError::Lookup(symbol.to_string())));

        let app = TradingApp::new(Arc::new(broker), test_config(None));
        let err = app.check_crossover("zzzz", params(None)).await.unwrap_err();
        assert!(matches!(&err, AppError::Lookup(s) if s == "ZZZZ"));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_buy_rejects_zero_quantity_without_submitting() {
        let mut broker = MockBrokerage::new();
        broker.expect_submit_market_buy().never();

        let app = TradingApp::new(Arc::new(broker), test_config(None));
        let err = app.buy_stock("AAPL", 0).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_buy_normalizes_symbol() {
        let mut broker = MockBrokerage::new();
        broker
            .expect_submit_market_buy()
            .withf(|symbol, quantity| symbol == "MSFT" && *quantity == 3)
            .times(1)
            .returning(|symbol, quantity| {
                Ok(OrderConfirmation {
                    id: "ord-7".into(),
                    symbol: symbol.to_string(),
                    quantity,
                    state: "queued".into(),
                })
            });

        let app = TradingApp::new(Arc::new(broker), test_config(None));
        let order = app.buy_stock("  msft ", 3).await.unwrap();
        assert_eq!(order.id, "ord-7");
    }

    #[tokio::test]
    async fn test_interactive_no_runs_configured_check() {
        let mut broker = MockBrokerage::new();
        broker.expect_get_holdings().returning(|| Ok(one_holding()));
        broker
            .expect_get_price_history()
            .withf(|symbol, _, _| symbol == "GOOGL")
            .returning(|_, _, _| Ok(golden_cross_history()));
        broker.expect_submit_market_buy().never();

        let app = TradingApp::new(Arc::new(broker), test_config(Some(Direction::Above)));
        let mut out = Vec::new();
        run_interactive(&app, &mut "n\n".as_bytes(), &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "AAPL {quantity: 10, average_buy_price: 150.00}");
        assert_eq!(lines[1], "Would you like to buy a stock? (Y/N)");
        assert!(lines[2].starts_with("GOOGL: Short SMA crossed ABOVE Long SMA"));
        assert_eq!(lines.last(), Some(&"1"));
    }

    #[tokio::test]
    async fn test_interactive_non_numeric_quantity_skips_order() {
        let mut broker = MockBrokerage::new();
        broker.expect_get_holdings().returning(|| Ok(BTreeMap::new()));
        broker.expect_submit_market_buy().never();

        let app = TradingApp::new(Arc::new(broker), test_config(None));
        let mut out = Vec::new();
        run_interactive(&app, &mut "y\nmsft\nten\n".as_bytes(), &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Enter Symbol"));
        assert!(text.contains("Enter Quantity"));
        assert!(text.contains("Validation error"));
    }

    #[tokio::test]
    async fn test_interactive_rejected_order_is_reported() {
        let mut broker = MockBrokerage::new();
        broker.expect_get_holdings().returning(|| Ok(BTreeMap::new()));
        broker
            .expect_submit_market_buy()
            .withf(|symbol, quantity| symbol == "MSFT" && *quantity == 5)
            .times(1)
            .returning(|_, _| Err(AppError::Order("market closed".into())));

        let app = TradingApp::new(Arc::new(broker), test_config(None));
        let mut out = Vec::new();
        run_interactive(&app, &mut "y\nmsft\n5\ny\n".as_bytes(), &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Buy 5 shares of MSFT Stock? (Y/N)"));
        assert!(text.contains("Order rejected: market closed"));
    }

    #[tokio::test]
    async fn test_interactive_declined_confirmation_does_not_buy() {
        let mut broker = MockBrokerage::new();
        broker.expect_get_holdings().returning(|| Ok(BTreeMap::new()));
        broker.expect_submit_market_buy().never();

        let app = TradingApp::new(Arc::new(broker), test_config(None));
        let mut out = Vec::new();
        run_interactive(&app, &mut "y\nmsft\n5\nn\n".as_bytes(), &mut out)
            .await
            .unwrap();
    }
}
