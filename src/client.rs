// src/client.rs
use crate::broker::{Bounds, Brokerage, OrderConfirmation, Position, Span};
use crate::error::{AppError, Result};
use crate::indicators::PricePoint;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

#[derive(Deserialize, Debug)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize, Debug)]
struct HistoricalsResponse {
    historicals: Vec<HistoricalBar>,
}

#[derive(Deserialize, Debug)]
struct HistoricalBar {
    begins_at: DateTime<Utc>,
    close_price: String,
}

#[derive(Deserialize, Debug)]
struct PositionsResponse {
    results: Vec<PositionRecord>,
}

#[derive(Deserialize, Debug)]
struct PositionRecord {
    symbol: String,
    quantity: String,
    average_buy_price: String,
}

#[derive(Deserialize, Debug)]
struct OrderResponse {
    id: String,
    state: String,
}

#[derive(Deserialize, Debug)]
struct ErrorBody {
    detail: Option<String>,
}

fn parse_decimal(field: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|e| AppError::Serialization(format!("{} '{}': {}", field, value, e)))
}

/// Prefer the server's `detail` message, fall back to the raw body or status.
async fn error_detail(resp: reqwest::Response) -> String {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|b| b.detail)
        .unwrap_or_else(|| if text.is_empty() { status.to_string() } else { text })
}

/// Unauthenticated entry point to the brokerage REST API.
#[derive(Debug, Clone)]
pub struct BrokerClient {
    base_url: String,
    http: reqwest::Client,
}

impl BrokerClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let url = format!("{}/oauth2/token/", self.base_url);
        let body = serde_json::json!({
            "grant_type": "password",
            "username": username,
            "password": password,
            "scope": "internal",
        });

        let resp = self.http.post(&url).json(&body).send().await?;
        match resp.status() {
            s if s.is_success() => {}
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(AppError::Auth(error_detail(resp).await));
            }
            s => return Err(AppError::Http(format!("login returned {}", s))),
        }

        let token: TokenResponse = resp.json().await?;
        info!("Logged in as {}", username);
        Ok(Session {
            client: self.clone(),
            token: token.access_token,
        })
    }
}

/// A logged-in account. Every call carries this session's bearer token.
#[derive(Debug, Clone)]
pub struct Session {
    client: BrokerClient,
    token: String,
}

impl Session {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.client.base_url, path)
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.http.get(url).bearer_auth(&self.token)
    }
}

#[async_trait]
impl Brokerage for Session {
    #[instrument(skip(self))]
    async fn get_price_history(
        &self,
        symbol: &str,
        span: Span,
        bounds: Bounds,
    ) -> Result<Vec<PricePoint>> {
        let symbol = symbol.to_uppercase();
        let url = self.url(&format!("/marketdata/historicals/{}/", symbol));
        let resp = self
            .get(&url)
            .query(&[
                ("span", span.as_str()),
                ("bounds", bounds.as_str()),
                ("interval", span.interval()),
            ])
            .send()
            .await?;

        match resp.status() {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => return Err(AppError::Lookup(symbol)),
            StatusCode::UNAUTHORIZED => return Err(AppError::Auth(error_detail(resp).await)),
            s => return Err(AppError::Http(format!("historicals returned {}", s))),
        }

        let body: HistoricalsResponse = resp.json().await?;
        let points = body
            .historicals
            .into_iter()
            .map(|bar| {
                Ok(PricePoint {
                    ts: bar.begins_at,
                    price: parse_decimal("close_price", &bar.close_price)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("Retrieved {} bars for symbol: {}", points.len(), symbol);
        Ok(points)
    }

    #[instrument(skip(self))]
    async fn get_holdings(&self) -> Result<BTreeMap<String, Position>> {
        let url = self.url("/positions/");
        let resp = self.get(&url).query(&[("nonzero", "true")]).send().await?;

        match resp.status() {
            s if s.is_success() => {}
            StatusCode::UNAUTHORIZED => return Err(AppError::Auth(error_detail(resp).await)),
            s => return Err(AppError::Http(format!("positions returned {}", s))),
        }

        let body: PositionsResponse = resp.json().await?;
        let mut holdings = BTreeMap::new();
        for record in body.results {
            holdings.insert(
                record.symbol,
                Position {
                    quantity: parse_decimal("quantity", &record.quantity)?,
                    average_buy_price: parse_decimal(
                        "average_buy_price",
                        &record.average_buy_price,
                    )?,
                },
            );
        }
        Ok(holdings)
    }

    #[instrument(skip(self))]
    async fn submit_market_buy(&self, symbol: &str, quantity: u32) -> Result<OrderConfirmation> {
        let url = self.url("/orders/");
        let body = serde_json::json!({
            "symbol": symbol,
            "quantity": quantity,
            "side": "buy",
            "type": "market",
            "time_in_force": "gfd",
            "trigger": "immediate",
        });

        let resp = self
            .client
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(AppError::Auth(error_detail(resp).await));
        }
        if status.is_client_error() {
            return Err(AppError::Order(error_detail(resp).await));
        }
        if !status.is_success() {
            return Err(AppError::Http(format!("orders returned {}", status)));
        }

        let order: OrderResponse = resp.json().await?;
        info!("Submitted market buy {} x {} -> id={}", symbol, quantity, order.id);
        Ok(OrderConfirmation {
            id: order.id,
            symbol: symbol.to_string(),
            quantity,
            state: order.state,
        })
    }
}
