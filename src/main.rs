// src/main.rs
mod app;
mod broker;
mod client;
mod config;
mod crossing;
mod error;
mod executor;
mod indicators;
mod logging;
mod prompt;
mod tests;

use anyhow::{Context, Result};
use app::TradingApp;
use broker::Brokerage;
use clap::{Parser, Subcommand, ValueEnum};
use crate::config::AppConfig;
use crossing::Direction;
use error::AppError;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "cross-trader", about = "Brokerage holdings, market buys and SMA crossover checks")]
struct Cli {
    /// use the offline simulated broker instead of logging in
    #[arg(long, global = true, default_value_t = false)]
    sim: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DirectionArg {
    Above,
    Below,
    Any,
}

impl From<DirectionArg> for Option<Direction> {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Above => Some(Direction::Above),
            DirectionArg::Below => Some(Direction::Below),
            DirectionArg::Any => None,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// print current positions
    Holdings,
    /// submit a market buy
    Buy {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        quantity: u32,
        /// skip the confirmation prompt
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// look for a recent golden/death cross
    Check {
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        short: Option<usize>,
        #[arg(long)]
        long: Option<usize>,
        #[arg(long)]
        days: Option<i64>,
        #[arg(long, value_enum)]
        direction: Option<DirectionArg>,
    },
    /// prompt-driven flow: holdings, then buy or check
    Interactive,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = Arc::new(AppConfig::new().context("Failed to load configuration")?);
    logging::init_logging(&cfg.environment);
    info!("{} starting in {} mode", cfg.name, cfg.environment);

    let broker = connect(&cfg, cli.sim).await?;
    let app = TradingApp::new(broker, cfg);

    let command = cli.command.unwrap_or(Command::Interactive);
    let outcome = run(&app, command, &mut io::stdin().lock(), &mut io::stdout()).await;
    match outcome {
        Err(e) if !e.is_fatal() => {
            println!("{}", e);
            Ok(())
        }
        other => other.map_err(Into::into),
    }
}

async fn connect(cfg: &AppConfig, sim: bool) -> Result<Arc<dyn Brokerage>> {
    if sim {
        info!("Using simulated broker with {:.2} cash", cfg.sim.starting_cash);
        return Ok(Arc::new(executor::SimBroker::new(cfg.sim.starting_cash)));
    }

    let (username, password) = cfg.credentials().ok_or_else(|| {
        AppError::Auth("set APP_BROKER__USERNAME and APP_BROKER__PASSWORD".into())
    })?;
    let session = client::BrokerClient::new(&cfg.broker.base_url)
        .login(username, password)
        .await?;
    Ok(Arc::new(session))
}

async fn run<R: BufRead, W: Write>(
    app: &TradingApp,
    command: Command,
    input: &mut R,
    out: &mut W,
) -> error::Result<()> {
    match command {
        Command::Holdings => prompt::print_holdings(out, &app.holdings().await?)?,
        Command::Buy {
            symbol,
            quantity,
            yes,
        } => {
            let question = format!("Buy {} shares of {} Stock?", quantity, symbol.to_uppercase());
            if yes || prompt::confirm(input, out, &question)? {
                let order = app.buy_stock(&symbol, quantity).await?;
                writeln!(out, "Order {} {}", order.id, order.state)?;
            }
        }
        Command::Check {
            symbol,
            short,
            long,
            days,
            direction,
        } => {
            let params = app
                .default_params()
                .with_overrides(short, long, days, direction.map(Into::into));
            let symbol = symbol.unwrap_or_else(|| app.default_symbol().to_string());

            let report = app.check_crossover(&symbol, params).await?;
            if report.result.point().is_some() {
                writeln!(out, "{}", report)?;
            }
            writeln!(out, "{}", report.signal())?;
        }
        Command::Interactive => prompt::run_interactive(app, input, out).await?,
    }
    Ok(())
}
