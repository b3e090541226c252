// src/prompt.rs
use crate::app::TradingApp;
use crate::broker::Position;
use crate::error::{AppError, Result};
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

fn read_answer<R: BufRead>(input: &mut R) -> Result<String> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn is_yes(answer: &str) -> bool {
    answer.eq_ignore_ascii_case("y")
}

pub fn confirm<R: BufRead, W: Write>(input: &mut R, out: &mut W, question: &str) -> Result<bool> {
    writeln!(out, "{} (Y/N)", question)?;
    out.flush()?;
    Ok(is_yes(&read_answer(input)?))
}

/// Digits only; "0" passes here and is rejected by the order path.
pub fn parse_quantity(raw: &str) -> Result<u32> {
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(format!("'{}' is not a whole number of shares", raw)));
    }
    raw.parse::<u32>()
        .map_err(|e| AppError::Validation(format!("quantity '{}': {}", raw, e)))
}

pub fn print_holdings<W: Write>(out: &mut W, holdings: &BTreeMap<String, Position>) -> Result<()> {
    for (symbol, position) in holdings {
        writeln!(out, "{} {}", symbol, position)?;
    }
    Ok(())
}

/// Holdings, then either a confirmed market buy or the configured crossover check.
pub async fn run_interactive<R: BufRead, W: Write>(
    app: &TradingApp,
    input: &mut R,
    out: &mut W,
) -> Result<()> {
    print_holdings(out, &app.holdings().await?)?;

    if !confirm(input, out, "Would you like to buy a stock?")? {
        let report = app
            .check_crossover(app.default_symbol(), app.default_params())
            .await?;
        if report.result.point().is_some() {
            writeln!(out, "{}", report)?;
        }
        writeln!(out, "{}", report.signal())?;
        return Ok(());
    }

    writeln!(out, "Enter Symbol")?;
    let symbol = read_answer(input)?.to_uppercase();
    writeln!(out, "Enter Quantity")?;
    let quantity = match parse_quantity(&read_answer(input)?) {
        Ok(q) => q,
        Err(e) => {
            writeln!(out, "{}", e)?;
            return Ok(());
        }
    };

    let question = format!("Buy {} shares of {} Stock?", quantity, symbol);
    if !confirm(input, out, &question)? {
        return Ok(());
    }

    match app.buy_stock(&symbol, quantity).await {
        Ok(order) => writeln!(out, "Order {} {}", order.id, order.state)?,
        Err(e) if !e.is_fatal() => writeln!(out, "{}", e)?,
        Err(e) => return Err(e),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("12").unwrap(), 12);
        assert!(matches!(parse_quantity("ten"), Err(AppError::Validation(_))));
        assert!(matches!(parse_quantity("+5"), Err(AppError::Validation(_))));
        assert!(matches!(parse_quantity(""), Err(AppError::Validation(_))));
        assert!(matches!(parse_quantity("99999999999"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_confirm_accepts_only_y() {
        let mut out = Vec::new();
        assert!(confirm(&mut "Y\n".as_bytes(), &mut out, "Go?").unwrap());
        assert!(confirm(&mut "y\n".as_bytes(), &mut out, "Go?").unwrap());
        assert!(!confirm(&mut "yes\n".as_bytes(), &mut out, "Go?").unwrap());
        assert!(!confirm(&mut "n\n".as_bytes(), &mut out, "Go?").unwrap());
        assert!(!confirm(&mut "".as_bytes(), &mut out, "Go?").unwrap());
        assert_eq!(String::from_utf8(out).unwrap().lines().next(), Some("Go? (Y/N)"));
    }
}
