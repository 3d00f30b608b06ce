use crate::error::AnalyticsError;
use crate::metrics::{EquityPoint, PerformanceMetrics};
use chrono::NaiveDate;
use core_types::Trade;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

/// A stateless calculator for deriving performance metrics from closed trades.
///
/// Sharpe is computed on per-trade returns, treating each trade as one
/// period of `periods_per_year`. This intentionally conflates "trade" with
/// "period" and must not be replaced with calendar annualization.
#[derive(Debug, Clone)]
pub struct MetricsEngine {
    risk_free_rate: f64,
    periods_per_year: f64,
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            periods_per_year: 252.0,
        }
    }
}

impl MetricsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the Sharpe inputs. `periods_per_year` must be positive.
    pub fn with_settings(risk_free_rate: f64, periods_per_year: f64) -> Self {
        Self {
            risk_free_rate,
            periods_per_year,
        }
    }

    /// The main entry point for calculating performance metrics.
    ///
    /// Returns the zero-valued record for an empty trade set. The input is
    /// never mutated. Degenerate numeric cases (zero denominators) resolve to
    /// their documented fallbacks instead of raising; only a non-positive
    /// starting capital is a structural error.
    pub fn calculate_all_metrics(
        &self,
        trades: &[Trade],
        starting_capital: Decimal,
    ) -> Result<PerformanceMetrics, AnalyticsError> {
        if starting_capital <= Decimal::ZERO {
            return Err(AnalyticsError::InvalidCapital(starting_capital));
        }
        if trades.is_empty() {
            return Ok(PerformanceMetrics::empty());
        }

        let capital = starting_capital.to_f64().unwrap_or(0.0);

        // --- Counts, sums, and per-outcome aggregates ---
        let total_trades = trades.len();
        let mut num_wins = 0usize;
        let mut num_losses = 0usize;
        let mut total_pnl = Decimal::ZERO;
        let mut gross_profit = Decimal::ZERO;
        // Signed sum of losing pnl; gross_loss is its absolute value.
        let mut losing_pnl = Decimal::ZERO;
        let mut r_sum = Decimal::ZERO;
        let mut win_minutes = 0i64;
        let mut loss_minutes = 0i64;

        for trade in trades {
            total_pnl += trade.pnl;
            r_sum += trade.r_multiple;
            if trade.pnl > Decimal::ZERO {
                num_wins += 1;
                gross_profit += trade.pnl;
                win_minutes += trade.holding_minutes();
            } else if trade.pnl < Decimal::ZERO {
                num_losses += 1;
                losing_pnl += trade.pnl;
                loss_minutes += trade.holding_minutes();
            }
        }

        let gross_loss = losing_pnl.abs();
        let win_rate = num_wins as f64 / total_trades as f64 * 100.0;
        let profit_factor = if gross_loss > Decimal::ZERO {
            (gross_profit / gross_loss).to_f64().unwrap_or(0.0)
        } else {
            0.0
        };

        let avg_win = if num_wins > 0 {
            gross_profit / Decimal::from(num_wins as u64)
        } else {
            Decimal::ZERO
        };
        // Signed mean; negative for any losing trade set.
        let avg_loss = if num_losses > 0 {
            losing_pnl / Decimal::from(num_losses as u64)
        } else {
            Decimal::ZERO
        };

        let win_prob = Decimal::from(num_wins as u64) / Decimal::from(total_trades as u64);
        let expectancy_dollar = win_prob * avg_win + (Decimal::ONE - win_prob) * avg_loss;
        let expectancy_r = (r_sum / Decimal::from(total_trades as u64))
            .to_f64()
            .unwrap_or(0.0);

        let risk_of_ruin = Self::risk_of_ruin(
            win_rate / 100.0,
            avg_win.to_f64().unwrap_or(0.0),
            avg_loss.abs().to_f64().unwrap_or(0.0),
            capital,
        );

        // --- Time-ordered walk: equity, high-water mark, drawdown ---
        let mut sorted: Vec<&Trade> = trades.iter().collect();
        sorted.sort_by_key(|t| t.exit_time);

        let mut cumulative = Decimal::ZERO;
        let mut running_hwm: Option<Decimal> = None;
        let mut max_drawdown = Decimal::ZERO;
        let mut returns = Vec::with_capacity(total_trades);
        // (equity, high-water mark) per trade, in exit-time order.
        let mut curve = Vec::with_capacity(total_trades);

        for trade in &sorted {
            cumulative += trade.pnl;
            let equity = starting_capital + cumulative;
            let hwm = match running_hwm {
                Some(h) if h >= equity => h,
                _ => equity,
            };
            running_hwm = Some(hwm);
            let drawdown = hwm - equity;
            if drawdown > max_drawdown {
                max_drawdown = drawdown;
            }
            returns.push((trade.pnl / starting_capital).to_f64().unwrap_or(0.0));
            curve.push((equity, hwm));
        }

        let high_water_mark = running_hwm.unwrap_or(starting_capital);
        let max_drawdown_pct = (max_drawdown / starting_capital * Decimal::from(100u64))
            .to_f64()
            .unwrap_or(0.0);
        let recovery_factor = if max_drawdown > Decimal::ZERO {
            (total_pnl / max_drawdown).to_f64().unwrap_or(0.0)
        } else {
            0.0
        };

        let sharpe_ratio = self.sharpe_ratio(&returns);
        let (win_streak, loss_streak) = Self::streaks(&sorted);
        let drawdown_duration_days = Self::drawdown_duration(&sorted, &curve);

        let avg_win_duration = if num_wins > 0 {
            win_minutes as f64 / num_wins as f64
        } else {
            0.0
        };
        let avg_loss_duration = if num_losses > 0 {
            loss_minutes as f64 / num_losses as f64
        } else {
            0.0
        };

        let trade_quality_score = Self::trade_quality_score(sharpe_ratio, expectancy_r, profit_factor);

        let distinct_days = sorted
            .iter()
            .map(|t| t.exit_time.date_naive())
            .collect::<std::collections::BTreeSet<NaiveDate>>()
            .len();
        let trades_per_day = total_trades as f64 / distinct_days as f64;

        debug!(total_trades, num_wins, num_losses, "calculated performance metrics");

        Ok(PerformanceMetrics {
            total_pnl: total_pnl.round_dp(2),
            win_rate: round2(win_rate),
            profit_factor: round2(profit_factor),
            sharpe_ratio: round2(sharpe_ratio),
            expectancy_dollar: expectancy_dollar.round_dp(2),
            expectancy_r: round2(expectancy_r),
            risk_of_ruin: round2(risk_of_ruin),
            recovery_factor: round2(recovery_factor),
            avg_win: avg_win.round_dp(2),
            avg_loss: avg_loss.round_dp(2),
            avg_win_duration: round2(avg_win_duration),
            avg_loss_duration: round2(avg_loss_duration),
            max_drawdown: max_drawdown.round_dp(2),
            max_drawdown_pct: round2(max_drawdown_pct),
            high_water_mark: high_water_mark.round_dp(2),
            win_streak,
            loss_streak,
            trade_quality_score: round2(trade_quality_score),
            trades_per_day: round2(trades_per_day),
            total_trades,
            num_wins,
            num_losses,
            gross_profit: gross_profit.round_dp(2),
            gross_loss: gross_loss.round_dp(2),
            drawdown_duration_days,
        })
    }

    /// The equity time series for charting, in exit-time order.
    ///
    /// `drawdown_pct` is measured against the running high-water mark, unlike
    /// `max_drawdown_pct` which is measured against starting capital.
    pub fn equity_curve(&self, trades: &[Trade], starting_capital: Decimal) -> Vec<EquityPoint> {
        let mut sorted: Vec<&Trade> = trades.iter().collect();
        sorted.sort_by_key(|t| t.exit_time);

        let mut cumulative = Decimal::ZERO;
        let mut running_hwm: Option<Decimal> = None;
        let mut points = Vec::with_capacity(sorted.len());

        for trade in sorted {
            cumulative += trade.pnl;
            let equity = starting_capital + cumulative;
            let hwm = match running_hwm {
                Some(h) if h >= equity => h,
                _ => equity,
            };
            running_hwm = Some(hwm);
            let drawdown = equity - hwm;
            let drawdown_pct = if hwm != Decimal::ZERO {
                (drawdown / hwm * Decimal::from(100u64))
                    .to_f64()
                    .unwrap_or(0.0)
            } else {
                0.0
            };
            points.push(EquityPoint {
                exit_time: trade.exit_time,
                equity,
                high_water_mark: hwm,
                drawdown,
                drawdown_pct,
            });
        }

        points
    }

    /// Sharpe ratio over per-trade returns.
    ///
    /// Fewer than two returns, or zero dispersion, yields 0. Uses the sample
    /// standard deviation (n − 1 denominator).
    pub fn sharpe_ratio(&self, returns: &[f64]) -> f64 {
        if returns.len() < 2 {
            return 0.0;
        }
        let adjustment = self.risk_free_rate / self.periods_per_year;
        let excess: Vec<f64> = returns.iter().map(|r| r - adjustment).collect();
        let mean = excess.iter().sum::<f64>() / excess.len() as f64;
        let variance = excess.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
            / (excess.len() - 1) as f64;
        let std_dev = variance.sqrt();
        if std_dev == 0.0 {
            return 0.0;
        }
        mean / std_dev * self.periods_per_year.sqrt()
    }

    /// Risk of ruin as a percentage in [0, 100].
    ///
    /// `avg_loss` is a positive magnitude. The exponent base `(q/p) × payoff`
    /// is strictly positive for every input that reaches the exponentiation
    /// (the zero-payoff and p ≥ 1 cases return early), so the lower clamp is
    /// an explicit invariant rather than a behavioral change.
    pub fn risk_of_ruin(win_prob: f64, avg_win: f64, avg_loss: f64, capital: f64) -> f64 {
        if avg_loss == 0.0 || win_prob == 0.0 {
            return 0.0;
        }
        let payoff_ratio = if avg_loss > 0.0 { avg_win / avg_loss } else { 0.0 };
        if payoff_ratio == 0.0 {
            // No upside at all: treat as certain ruin.
            return 100.0;
        }
        if win_prob >= 1.0 {
            return 0.0;
        }
        let q = 1.0 - win_prob;
        let exponent = capital / avg_loss;
        let ror = if payoff_ratio == 1.0 {
            (q / win_prob).powf(exponent)
        } else {
            (q / win_prob * payoff_ratio).powf(exponent)
        };
        (ror * 100.0).clamp(0.0, 100.0)
    }

    /// Composite 0–100 quality score from Sharpe, R-expectancy, and profit
    /// factor, each contributing at most 33.33 points.
    pub fn trade_quality_score(sharpe: f64, expectancy_r: f64, profit_factor: f64) -> f64 {
        let sharpe_component = if sharpe > 0.0 {
            (sharpe / 3.0 * 33.33).min(33.33)
        } else {
            0.0
        };
        let expectancy_component = if expectancy_r > 0.0 {
            (expectancy_r / 2.0 * 33.33).min(33.33)
        } else {
            0.0
        };
        let profit_factor_component = if profit_factor > 1.0 {
            ((profit_factor - 1.0) / 2.0 * 33.33).min(33.33)
        } else {
            0.0
        };
        sharpe_component + expectancy_component + profit_factor_component
    }

    /// Longest runs of consecutive wins and losses over exit-time order.
    ///
    /// A trade counts as a win iff pnl > 0; breakeven trades extend the
    /// losing streak.
    fn streaks(sorted: &[&Trade]) -> (u32, u32) {
        let mut max_win = 0u32;
        let mut max_loss = 0u32;
        let mut current_win = 0u32;
        let mut current_loss = 0u32;

        for trade in sorted {
            if trade.pnl > Decimal::ZERO {
                current_win += 1;
                current_loss = 0;
                max_win = max_win.max(current_win);
            } else {
                current_loss += 1;
                current_win = 0;
                max_loss = max_loss.max(current_loss);
            }
        }

        (max_win, max_loss)
    }

    /// Longest drawdown duration in days over exit-time order.
    ///
    /// A trade is underwater when its equity sits below the high-water mark.
    /// Consecutive underwater trades accumulate the calendar gap since the
    /// previous trade's exit date (at least one day per trade); surfacing
    /// resets the counter.
    fn drawdown_duration(sorted: &[&Trade], curve: &[(Decimal, Decimal)]) -> i64 {
        let mut max_duration = 0i64;
        let mut current = 0i64;
        let mut prev_date: Option<NaiveDate> = None;

        for (trade, (equity, hwm)) in sorted.iter().zip(curve) {
            let date = trade.exit_time.date_naive();
            if equity < hwm {
                current = match prev_date {
                    None => 1,
                    Some(prev) => current + (date - prev).num_days().max(1),
                };
                max_duration = max_duration.max(current);
            } else {
                current = 0;
            }
            prev_date = Some(date);
        }

        max_duration
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use core_types::{Direction, TradeOutcome};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn ts(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, min, 0).unwrap()
    }

    fn trade(
        pnl: Decimal,
        r_multiple: Decimal,
        direction: Direction,
        entry: DateTime<Utc>,
        exit: DateTime<Utc>,
    ) -> Trade {
        Trade {
            trade_id: Uuid::new_v4(),
            instrument: "MES".to_string(),
            direction,
            entry_time: entry,
            exit_time: exit,
            entry_price: dec!(5000),
            exit_price: dec!(5000),
            stop_price: None,
            contracts: 1,
            pnl,
            initial_risk: Some(dec!(50)),
            r_multiple,
            outcome: TradeOutcome::from_pnl(pnl),
            exit_reason: None,
            slippage_cost: None,
            commission_cost: None,
        }
    }

    fn three_trades() -> Vec<Trade> {
        vec![
            trade(dec!(100), dec!(2), Direction::Long, ts(10, 9, 0), ts(10, 10, 0)),
            trade(dec!(-50), dec!(-1), Direction::Long, ts(10, 10, 0), ts(10, 12, 0)),
            trade(dec!(200), dec!(3), Direction::Short, ts(10, 13, 0), ts(10, 13, 30)),
        ]
    }

    #[test]
    fn empty_trades_yield_zeroed_metrics() {
        let engine = MetricsEngine::new();
        let metrics = engine.calculate_all_metrics(&[], dec!(50000)).unwrap();
        assert_eq!(metrics, PerformanceMetrics::empty());
    }

    #[test]
    fn non_positive_capital_is_rejected() {
        let engine = MetricsEngine::new();
        assert!(engine.calculate_all_metrics(&[], dec!(0)).is_err());
        assert!(engine.calculate_all_metrics(&three_trades(), dec!(-1)).is_err());
    }

    #[test]
    fn three_trade_battery() {
        let engine = MetricsEngine::new();
        let metrics = engine
            .calculate_all_metrics(&three_trades(), dec!(50000))
            .unwrap();

        assert_eq!(metrics.total_trades, 3);
        assert_eq!(metrics.num_wins, 2);
        assert_eq!(metrics.num_losses, 1);
        assert_eq!(metrics.win_rate, 66.67);
        assert_eq!(metrics.total_pnl, dec!(250));
        assert_eq!(metrics.gross_profit, dec!(300));
        assert_eq!(metrics.gross_loss, dec!(50));
        assert_eq!(metrics.profit_factor, 6.0);
        assert_eq!(metrics.avg_win, dec!(150));
        assert_eq!(metrics.avg_loss, dec!(-50));
        assert_eq!(metrics.expectancy_dollar, dec!(83.33));
        assert_eq!(metrics.expectancy_r, 1.33);
        // Equity walk: 50100, 50050, 50250 against marks 50100, 50100, 50250.
        assert_eq!(metrics.high_water_mark, dec!(50250));
        assert_eq!(metrics.max_drawdown, dec!(50));
        assert_eq!(metrics.max_drawdown_pct, 0.1);
        assert_eq!(metrics.recovery_factor, 5.0);
        assert_eq!(metrics.win_streak, 1);
        assert_eq!(metrics.loss_streak, 1);
        assert_eq!(metrics.trades_per_day, 3.0);
        assert_eq!(metrics.drawdown_duration_days, 1);
        // Base (q/p)·payoff = 1.5 > 1, so the power explodes and clamps.
        assert_eq!(metrics.risk_of_ruin, 100.0);
        assert_eq!(metrics.avg_win_duration, 45.0);
        assert_eq!(metrics.avg_loss_duration, 120.0);
        assert_eq!(metrics.sharpe_ratio, 10.51);
        assert_eq!(metrics.trade_quality_score, 88.88);
    }

    #[test]
    fn total_pnl_matches_trade_sum() {
        let engine = MetricsEngine::new();
        let trades = three_trades();
        let metrics = engine.calculate_all_metrics(&trades, dec!(50000)).unwrap();
        let sum: Decimal = trades.iter().map(|t| t.pnl).sum();
        assert_eq!(metrics.total_pnl, sum.round_dp(2));
    }

    #[test]
    fn all_winning_trades() {
        let engine = MetricsEngine::new();
        let trades = vec![
            trade(dec!(50), dec!(1), Direction::Long, ts(10, 9, 0), ts(10, 11, 0)),
            trade(dec!(50), dec!(1), Direction::Long, ts(11, 9, 0), ts(11, 11, 0)),
        ];
        let metrics = engine.calculate_all_metrics(&trades, dec!(10000)).unwrap();
        assert_eq!(metrics.win_rate, 100.0);
        assert_eq!(metrics.avg_loss, dec!(0));
        assert_eq!(metrics.gross_loss, dec!(0));
        // No losses: profit factor degenerates to 0 by convention.
        assert_eq!(metrics.profit_factor, 0.0);
        assert_eq!(metrics.max_drawdown, dec!(0));
        assert_eq!(metrics.recovery_factor, 0.0);
        assert_eq!(metrics.trades_per_day, 1.0);
    }

    #[test]
    fn breakeven_counts_in_neither_but_extends_loss_streak() {
        let engine = MetricsEngine::new();
        let trades = vec![
            trade(dec!(10), dec!(1), Direction::Long, ts(10, 9, 0), ts(10, 10, 0)),
            trade(dec!(5), dec!(1), Direction::Long, ts(10, 10, 0), ts(10, 11, 0)),
            trade(dec!(0), dec!(0), Direction::Long, ts(10, 11, 0), ts(10, 12, 0)),
            trade(dec!(-5), dec!(-1), Direction::Long, ts(10, 12, 0), ts(10, 13, 0)),
            trade(dec!(7), dec!(1), Direction::Long, ts(10, 13, 0), ts(10, 14, 0)),
        ];
        let metrics = engine.calculate_all_metrics(&trades, dec!(50000)).unwrap();
        assert_eq!(metrics.total_trades, 5);
        assert_eq!(metrics.num_wins, 3);
        assert_eq!(metrics.num_losses, 1);
        assert!(metrics.num_wins + metrics.num_losses <= metrics.total_trades);
        assert_eq!(metrics.win_streak, 2);
        assert_eq!(metrics.loss_streak, 2);
    }

    #[test]
    fn sharpe_needs_two_returns_and_dispersion() {
        let engine = MetricsEngine::new();
        assert_eq!(engine.sharpe_ratio(&[0.01]), 0.0);
        assert_eq!(engine.sharpe_ratio(&[0.01, 0.01, 0.01]), 0.0);
        assert!(engine.sharpe_ratio(&[0.01, 0.02, 0.03]) > 0.0);
    }

    #[test]
    fn risk_of_ruin_boundaries() {
        // Certain win: no losses possible.
        assert_eq!(MetricsEngine::risk_of_ruin(1.0, 100.0, 50.0, 10000.0), 0.0);
        // No upside: certain ruin.
        assert_eq!(MetricsEngine::risk_of_ruin(0.5, 0.0, 50.0, 10000.0), 100.0);
        // Degenerate denominators fall back to zero.
        assert_eq!(MetricsEngine::risk_of_ruin(0.5, 100.0, 0.0, 10000.0), 0.0);
        assert_eq!(MetricsEngine::risk_of_ruin(0.0, 100.0, 50.0, 10000.0), 0.0);
    }

    #[test]
    fn risk_of_ruin_clamps_to_one_hundred() {
        // payoff 3 at 60% wins: ((0.4/0.6)×3)^(10000/50) = 2^200, clamped.
        let ror = MetricsEngine::risk_of_ruin(0.6, 150.0, 50.0, 10000.0);
        assert_eq!(ror, 100.0);
    }

    #[test]
    fn risk_of_ruin_even_payoff_branch() {
        // payoff 1 at 40% wins over a tiny capital buffer.
        let ror = MetricsEngine::risk_of_ruin(0.4, 50.0, 50.0, 100.0);
        let expected = (0.6f64 / 0.4).powf(2.0) * 100.0;
        assert_eq!(ror, expected.clamp(0.0, 100.0));
    }

    #[test]
    fn quality_score_caps_each_component() {
        let score = MetricsEngine::trade_quality_score(9.0, 10.0, 100.0);
        assert!((score - 99.99).abs() < 0.01);
        assert_eq!(MetricsEngine::trade_quality_score(-1.0, -1.0, 0.5), 0.0);
    }

    #[test]
    fn equity_curve_reconciles_with_total_pnl() {
        let engine = MetricsEngine::new();
        let trades = three_trades();
        let curve = engine.equity_curve(&trades, dec!(50000));
        assert_eq!(curve.len(), 3);
        let total: Decimal = trades.iter().map(|t| t.pnl).sum();
        assert_eq!(curve.last().unwrap().equity, dec!(50000) + total);
        // Drawdown is measured against the running high-water mark.
        assert_eq!(curve[1].drawdown, dec!(-50));
        assert!(curve[1].drawdown_pct < 0.0);
        assert!(engine.equity_curve(&[], dec!(50000)).is_empty());
    }

    #[test]
    fn drawdown_duration_spans_calendar_days() {
        let engine = MetricsEngine::new();
        // Win, then three losing days underwater, then recovery.
        let trades = vec![
            trade(dec!(100), dec!(1), Direction::Long, ts(10, 9, 0), ts(10, 10, 0)),
            trade(dec!(-30), dec!(-1), Direction::Long, ts(11, 9, 0), ts(11, 10, 0)),
            trade(dec!(-30), dec!(-1), Direction::Long, ts(13, 9, 0), ts(13, 10, 0)),
            trade(dec!(200), dec!(2), Direction::Long, ts(14, 9, 0), ts(14, 10, 0)),
        ];
        let metrics = engine.calculate_all_metrics(&trades, dec!(50000)).unwrap();
        // Day 11 starts the clock at 1; day 13 adds the two-day gap.
        assert_eq!(metrics.drawdown_duration_days, 3);
    }
}
