// src/config.rs
use crate::broker::{Bounds, Span};
use crate::crossing::Direction;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Deserializer};
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct BrokerConfig {
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    pub span: Span,
    pub bounds: Bounds,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CrossoverConfig {
    pub symbol: String,
    pub short_window: usize,
    pub long_window: usize,
    pub max_days: i64,
    /// "above", "below", or "any" (no filter)
    #[serde(deserialize_with = "direction_filter")]
    pub direction: Option<Direction>,
}

fn direction_filter<'de, D>(deserializer: D) -> Result<Option<Direction>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim).map(str::to_ascii_lowercase).as_deref() {
        None | Some("") | Some("any") => Ok(None),
        Some("above") => Ok(Some(Direction::Above)),
        Some("below") => Ok(Some(Direction::Below)),
        Some(other) => Err(serde::de::Error::custom(format!(
            "crossover.direction must be above, below or any, got '{}'",
            other
        ))),
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimConfig {
    pub starting_cash: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub name: String,
    pub environment: String,
    pub broker: BrokerConfig,
    pub history: HistoryConfig,
    pub crossover: CrossoverConfig,
    pub sim: SimConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Self::defaults()?
            .add_source(File::new("config/default.toml", FileFormat::Toml).required(false))
            .add_source(
                File::new(&format!("config/{}.toml", run_mode), FileFormat::Toml).required(false),
            )
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Built-in values so the binary runs without a config directory.
    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("name", "cross-trader")?
            .set_default("environment", "development")?
            .set_default("broker.base_url", "https://api.robinhood.com")?
            .set_default("history.span", "year")?
            .set_default("history.bounds", "regular")?
            .set_default("crossover.symbol", "GOOGL")?
            .set_default("crossover.short_window", 50)?
            .set_default("crossover.long_window", 200)?
            .set_default("crossover.max_days", 10)?
            .set_default("crossover.direction", "above")?
            .set_default("sim.starting_cash", 10_000.0)
    }

    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.broker.username, &self.broker.password) {
            (Some(user), Some(pass)) if !user.is_empty() => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }
}
