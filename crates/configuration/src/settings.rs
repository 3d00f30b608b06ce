use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

/// The root configuration structure for the application.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub account: Account,
    pub analytics: Analytics,
}

/// Account-level defaults applied when a portfolio does not override them.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Account {
    /// The starting capital assumed for metric and sizing calculations.
    pub starting_capital: Decimal,
}

/// Inputs to the Sharpe calculation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Analytics {
    pub risk_free_rate: f64,
    /// Trades are treated as periods; 252 mirrors a trading-day year.
    pub periods_per_year: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            account: Account::default(),
            analytics: Analytics::default(),
        }
    }
}

impl Default for Account {
    fn default() -> Self {
        Self {
            starting_capital: dec!(50000),
        }
    }
}

impl Default for Analytics {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            periods_per_year: 252.0,
        }
    }
}
