use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The default metric selection used when tabulating scenarios side by side.
pub const METRIC_KEYS: [&str; 18] = [
    "total_pnl",
    "win_rate",
    "sharpe_ratio",
    "profit_factor",
    "expectancy_dollar",
    "expectancy_r",
    "risk_of_ruin",
    "recovery_factor",
    "avg_win",
    "avg_loss",
    "avg_win_duration",
    "avg_loss_duration",
    "max_drawdown",
    "high_water_mark",
    "win_streak",
    "loss_streak",
    "trade_quality_score",
    "trades_per_day",
];

/// The complete performance record computed by the `MetricsEngine`.
///
/// Currency-valued fields are `Decimal`; dimensionless statistics whose math
/// runs through `sqrt`/`powf` are `f64`. Every field is zero for an empty
/// trade set. Dollar values and statistics are rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_pnl: Decimal,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub sharpe_ratio: f64,
    pub expectancy_dollar: Decimal,
    pub expectancy_r: f64,
    pub risk_of_ruin: f64,
    pub recovery_factor: f64,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    pub avg_win_duration: f64,
    pub avg_loss_duration: f64,
    pub max_drawdown: Decimal,
    pub max_drawdown_pct: f64,
    pub high_water_mark: Decimal,
    pub win_streak: u32,
    pub loss_streak: u32,
    pub trade_quality_score: f64,
    pub trades_per_day: f64,
    pub total_trades: usize,
    pub num_wins: usize,
    pub num_losses: usize,
    pub gross_profit: Decimal,
    pub gross_loss: Decimal,
    pub drawdown_duration_days: i64,
}

impl PerformanceMetrics {
    /// The zero-valued record returned for an empty trade set.
    pub fn empty() -> Self {
        Self {
            total_pnl: Decimal::ZERO,
            win_rate: 0.0,
            profit_factor: 0.0,
            sharpe_ratio: 0.0,
            expectancy_dollar: Decimal::ZERO,
            expectancy_r: 0.0,
            risk_of_ruin: 0.0,
            recovery_factor: 0.0,
            avg_win: Decimal::ZERO,
            avg_loss: Decimal::ZERO,
            avg_win_duration: 0.0,
            avg_loss_duration: 0.0,
            max_drawdown: Decimal::ZERO,
            max_drawdown_pct: 0.0,
            high_water_mark: Decimal::ZERO,
            win_streak: 0,
            loss_streak: 0,
            trade_quality_score: 0.0,
            trades_per_day: 0.0,
            total_trades: 0,
            num_wins: 0,
            num_losses: 0,
            gross_profit: Decimal::ZERO,
            gross_loss: Decimal::ZERO,
            drawdown_duration_days: 0,
        }
    }

    /// Returns a metric by its string key as an `f64`, for tabular comparison.
    ///
    /// Returns `None` for unknown keys.
    pub fn value(&self, key: &str) -> Option<f64> {
        let v = match key {
            "total_pnl" => self.total_pnl.to_f64().unwrap_or(0.0),
            "win_rate" => self.win_rate,
            "profit_factor" => self.profit_factor,
            "sharpe_ratio" => self.sharpe_ratio,
            "expectancy_dollar" => self.expectancy_dollar.to_f64().unwrap_or(0.0),
            "expectancy_r" => self.expectancy_r,
            "risk_of_ruin" => self.risk_of_ruin,
            "recovery_factor" => self.recovery_factor,
            "avg_win" => self.avg_win.to_f64().unwrap_or(0.0),
            "avg_loss" => self.avg_loss.to_f64().unwrap_or(0.0),
            "avg_win_duration" => self.avg_win_duration,
            "avg_loss_duration" => self.avg_loss_duration,
            "max_drawdown" => self.max_drawdown.to_f64().unwrap_or(0.0),
            "max_drawdown_pct" => self.max_drawdown_pct,
            "high_water_mark" => self.high_water_mark.to_f64().unwrap_or(0.0),
            "win_streak" => self.win_streak as f64,
            "loss_streak" => self.loss_streak as f64,
            "trade_quality_score" => self.trade_quality_score,
            "trades_per_day" => self.trades_per_day,
            "total_trades" => self.total_trades as f64,
            "num_wins" => self.num_wins as f64,
            "num_losses" => self.num_losses as f64,
            "gross_profit" => self.gross_profit.to_f64().unwrap_or(0.0),
            "gross_loss" => self.gross_loss.to_f64().unwrap_or(0.0),
            "drawdown_duration_days" => self.drawdown_duration_days as f64,
            _ => return None,
        };
        Some(v)
    }
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self::empty()
    }
}

/// One point of the equity time series, for charting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub exit_time: DateTime<Utc>,
    pub equity: Decimal,
    pub high_water_mark: Decimal,
    /// equity − high_water_mark; zero or negative.
    pub drawdown: Decimal,
    /// drawdown as a percentage of the running high-water mark.
    pub drawdown_pct: f64,
}
