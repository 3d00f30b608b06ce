use analytics::{MetricsEngine, PerformanceMetrics};
use chrono::{DateTime, Duration, Timelike, Utc};
use configuration::ScenarioParameters;
use core_types::{Candle, ContractSpec, Direction, ExitReason, Trade, TradeOutcome};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ScenarioError;
use crate::scenario::Scenario;

/// The result of one simulation run: the transformed trade sequence and its
/// performance metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    pub trades: Vec<Trade>,
    pub metrics: PerformanceMetrics,
}

/// Where and why a re-simulated trade was closed.
struct ExitFill {
    price: Decimal,
    time: DateTime<Utc>,
    reason: ExitReason,
}

/// Re-simulates trade exits under hypothetical rules.
///
/// The simulator never mutates its input and retains no state between calls.
/// Trades dropped by a filter are removed from the output entirely; they do
/// not appear with zero pnl.
#[derive(Debug, Clone, Default)]
pub struct ScenarioSimulator {
    metrics_engine: MetricsEngine,
}

impl ScenarioSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics_engine(metrics_engine: MetricsEngine) -> Self {
        Self { metrics_engine }
    }

    /// Applies a parameter set to a trade history.
    ///
    /// Per-trade processing order is fixed: filters run before exit
    /// re-simulation, and re-sizing before the pnl recompute. The candle
    /// series may cover several instruments; each trade only ever walks the
    /// bars of its own instrument.
    pub fn apply_scenario(
        &self,
        trades: &[Trade],
        candles: &[Candle],
        params: &ScenarioParameters,
        starting_capital: Decimal,
    ) -> Result<ScenarioOutcome, ScenarioError> {
        params.validate()?;
        let effective_capital = starting_capital * params.capital_multiplier;

        // Index candles per instrument, time-ordered, once per run.
        let mut by_instrument: HashMap<&str, Vec<&Candle>> = HashMap::new();
        for candle in candles {
            by_instrument
                .entry(candle.instrument.as_str())
                .or_default()
                .push(candle);
        }
        for series in by_instrument.values_mut() {
            series.sort_by_key(|c| c.timestamp);
        }

        let mut modified = Vec::with_capacity(trades.len());

        for trade in trades {
            // --- 1. Weekday filter ---
            let weekday = trade.entry_time.format("%A").to_string();
            if params.exclude_days.contains(&weekday) {
                debug!(trade_id = %trade.trade_id, %weekday, "dropped by weekday filter");
                continue;
            }

            // --- 2. Trading-hours filter ---
            let entry_hour =
                trade.entry_time.hour() as f64 + trade.entry_time.minute() as f64 / 60.0;
            if !params.hours_window_contains(entry_hour) {
                debug!(trade_id = %trade.trade_id, entry_hour, "dropped by trading-hours filter");
                continue;
            }

            // --- 3. Minimum-hold filter ---
            if let Some(min_hold) = params.min_hold_minutes {
                if trade.holding_minutes() < min_hold {
                    debug!(trade_id = %trade.trade_id, "dropped by minimum-hold filter");
                    continue;
                }
            }

            // --- 4. Position re-sizing ---
            let spec = ContractSpec::lookup_or_default(&trade.instrument);
            let capital_for_trade = effective_capital
                * (params.capital_allocation_pct / dec!(100))
                * params.allocation_share(&trade.instrument);
            let contracts = (capital_for_trade / spec.margin_initial)
                .floor()
                .to_u32()
                .unwrap_or(0)
                .max(1);

            // --- 5. Maximum-hold truncation ---
            let (ceiling, truncated) = match params.max_hold_minutes {
                Some(max_hold) if trade.holding_minutes() > max_hold => {
                    (trade.entry_time + Duration::minutes(max_hold), true)
                }
                _ => (trade.exit_time, false),
            };

            // --- 6. Exit re-simulation ---
            let stop_price = params.stop_loss_pct.map(|pct| match trade.direction {
                Direction::Long => trade.entry_price * (Decimal::ONE - pct / dec!(100)),
                Direction::Short => trade.entry_price * (Decimal::ONE + pct / dec!(100)),
            });
            let target_price = params.take_profit_pct.map(|pct| match trade.direction {
                Direction::Long => trade.entry_price * (Decimal::ONE + pct / dec!(100)),
                Direction::Short => trade.entry_price * (Decimal::ONE - pct / dec!(100)),
            });
            let series = by_instrument
                .get(trade.instrument.as_str())
                .map(|s| s.as_slice());
            let fill = resolve_exit(trade, series, stop_price, target_price, ceiling, truncated);

            // --- 7. Slippage and commission ---
            let contracts_dec = Decimal::from(contracts);
            let slip = params
                .slippage_ticks
                .map(|ticks| Decimal::from(ticks) * spec.tick_size)
                .unwrap_or(Decimal::ZERO);
            // One tick penalty per leg: entry and exit both fill against the
            // position.
            let slippage_cost = (slip * dec!(2) * spec.point_value * contracts_dec).round_dp(2);
            let commission_cost = (params.commission_per_contract.unwrap_or(Decimal::ZERO)
                * contracts_dec)
                .round_dp(2);

            // --- 8. Recompute pnl, outcome, r-multiple ---
            let points = match trade.direction {
                Direction::Long => fill.price - trade.entry_price,
                Direction::Short => trade.entry_price - fill.price,
            };
            let pnl = (points * spec.point_value * contracts_dec - slippage_cost - commission_cost)
                .round_dp(2);
            let initial_risk = trade
                .initial_risk
                .unwrap_or_else(|| (pnl * dec!(0.5)).abs());
            let r_multiple = if initial_risk.is_zero() {
                Decimal::ZERO
            } else {
                (pnl / initial_risk.abs()).round_dp(2)
            };

            modified.push(Trade {
                trade_id: trade.trade_id,
                instrument: trade.instrument.clone(),
                direction: trade.direction,
                entry_time: trade.entry_time,
                exit_time: fill.time,
                entry_price: trade.entry_price,
                exit_price: fill.price,
                stop_price: stop_price.or(trade.stop_price),
                contracts,
                pnl,
                initial_risk: Some(initial_risk),
                r_multiple,
                outcome: TradeOutcome::from_pnl(pnl),
                exit_reason: Some(fill.reason),
                slippage_cost: Some(slippage_cost),
                commission_cost: Some(commission_cost),
            });
        }

        let metrics = self
            .metrics_engine
            .calculate_all_metrics(&modified, effective_capital)?;

        info!(
            input_trades = trades.len(),
            output_trades = modified.len(),
            "scenario applied"
        );

        Ok(ScenarioOutcome {
            trades: modified,
            metrics,
        })
    }

    /// Builds the baseline scenario over the recorded trade history.
    ///
    /// The baseline reports the trades exactly as recorded — original
    /// contracts, original pnl — and never passes through `apply_scenario`.
    pub fn create_baseline(
        &self,
        trades: &[Trade],
        starting_capital: Decimal,
    ) -> Result<Scenario, ScenarioError> {
        let metrics = self
            .metrics_engine
            .calculate_all_metrics(trades, starting_capital)?;
        Ok(Scenario {
            scenario_id: Uuid::new_v4(),
            name: "Baseline (Actual)".to_string(),
            is_baseline: true,
            params: ScenarioParameters::default(),
            trades: trades.to_vec(),
            metrics,
        })
    }

    /// Runs a full what-if simulation and bundles the result as a `Scenario`.
    pub fn create_scenario(
        &self,
        name: &str,
        params: &ScenarioParameters,
        trades: &[Trade],
        candles: &[Candle],
        starting_capital: Decimal,
    ) -> Result<Scenario, ScenarioError> {
        let outcome = self.apply_scenario(trades, candles, params, starting_capital)?;
        Ok(Scenario {
            scenario_id: Uuid::new_v4(),
            name: name.to_string(),
            is_baseline: false,
            params: params.clone(),
            trades: outcome.trades,
            metrics: outcome.metrics,
        })
    }
}

/// Walks the candle window and resolves where the trade would have exited.
///
/// First-touch, bar-granularity: the first candle touching either level
/// decides the exit, and the stop is checked before the target within a
/// candle, so a bar touching both resolves to the stop. Fills happen at the
/// configured level, not at the candle extreme. Intra-candle ordering of
/// high versus low is not modeled.
fn resolve_exit(
    trade: &Trade,
    series: Option<&[&Candle]>,
    stop_price: Option<Decimal>,
    target_price: Option<Decimal>,
    ceiling: DateTime<Utc>,
    truncated: bool,
) -> ExitFill {
    // Nothing to re-simulate: the recorded exit stands.
    if stop_price.is_none() && target_price.is_none() && !truncated {
        return ExitFill {
            price: trade.exit_price,
            time: trade.exit_time,
            reason: ExitReason::OriginalExit,
        };
    }

    let Some(series) = series.filter(|s| !s.is_empty()) else {
        warn!(
            trade_id = %trade.trade_id,
            instrument = %trade.instrument,
            "no market data for instrument, falling back to recorded exit"
        );
        return ExitFill {
            price: trade.exit_price,
            time: ceiling,
            reason: ExitReason::NoMarketData,
        };
    };

    let window: Vec<&&Candle> = series
        .iter()
        .filter(|c| c.timestamp >= trade.entry_time && c.timestamp <= ceiling)
        .collect();
    if window.is_empty() {
        warn!(
            trade_id = %trade.trade_id,
            instrument = %trade.instrument,
            "no candles inside the trade window, falling back to recorded exit"
        );
        return ExitFill {
            price: trade.exit_price,
            time: ceiling,
            reason: ExitReason::NoCandlesFound,
        };
    }

    for candle in &window {
        if let Some(stop) = stop_price {
            let touched = match trade.direction {
                Direction::Long => candle.low <= stop,
                Direction::Short => candle.high >= stop,
            };
            if touched {
                return ExitFill {
                    price: stop,
                    time: candle.timestamp,
                    reason: ExitReason::StopLoss,
                };
            }
        }
        if let Some(target) = target_price {
            let touched = match trade.direction {
                Direction::Long => candle.high >= target,
                Direction::Short => candle.low <= target,
            };
            if touched {
                return ExitFill {
                    price: target,
                    time: candle.timestamp,
                    reason: ExitReason::TakeProfit,
                };
            }
        }
    }

    if truncated {
        // The forced exit fills at the close of the last bar in the window.
        let last = window[window.len() - 1];
        return ExitFill {
            price: last.close,
            time: last.timestamp,
            reason: ExitReason::MaxHoldTime,
        };
    }

    ExitFill {
        price: trade.exit_price,
        time: trade.exit_time,
        reason: ExitReason::OriginalExit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, min, 0).unwrap()
    }

    fn mes_trade(
        direction: Direction,
        entry: DateTime<Utc>,
        exit: DateTime<Utc>,
        entry_price: Decimal,
        exit_price: Decimal,
    ) -> Trade {
        let points = match direction {
            Direction::Long => exit_price - entry_price,
            Direction::Short => entry_price - exit_price,
        };
        Trade {
            trade_id: Uuid::new_v4(),
            instrument: "MES".to_string(),
            direction,
            entry_time: entry,
            exit_time: exit,
            entry_price,
            exit_price,
            stop_price: None,
            contracts: 2,
            pnl: points * dec!(5) * dec!(2),
            initial_risk: Some(dec!(50)),
            r_multiple: dec!(0),
            outcome: TradeOutcome::from_pnl(points),
            exit_reason: None,
            slippage_cost: None,
            commission_cost: None,
        }
    }

    fn candle(
        timestamp: DateTime<Utc>,
        high: Decimal,
        low: Decimal,
        close: Decimal,
    ) -> Candle {
        Candle {
            instrument: "MES".to_string(),
            timestamp,
            open: close,
            high,
            low,
            close,
            volume: 1000,
        }
    }

    fn params() -> ScenarioParameters {
        ScenarioParameters::default()
    }

    // Default sizing: 50000 × 40% × 50% = 10000 of capital, MES margin 1300.
    const SIZED_CONTRACTS: u32 = 7;

    #[test]
    fn stop_fill_is_at_the_level_not_the_candle_low() {
        // March 10 2025 is a Monday.
        let trade = mes_trade(Direction::Long, ts(10, 9, 0), ts(10, 12, 0), dec!(100), dec!(105));
        let candles = vec![
            candle(ts(10, 9, 15), dec!(101), dec!(99), dec!(100)),
            candle(ts(10, 9, 30), dec!(100), dec!(97), dec!(98)),
            candle(ts(10, 9, 45), dec!(110), dec!(99), dec!(109)),
        ];
        let p = ScenarioParameters {
            stop_loss_pct: Some(dec!(2)),
            ..params()
        };

        let outcome = ScenarioSimulator::new()
            .apply_scenario(&[trade], &candles, &p, dec!(50000))
            .unwrap();

        assert_eq!(outcome.trades.len(), 1);
        let sim = &outcome.trades[0];
        assert_eq!(sim.exit_price, dec!(98));
        assert_eq!(sim.exit_time, ts(10, 9, 30));
        assert_eq!(sim.exit_reason, Some(ExitReason::StopLoss));
        assert_eq!(sim.contracts, SIZED_CONTRACTS);
        // (98 − 100) × $5/pt × 7 contracts.
        assert_eq!(sim.pnl, dec!(-70));
        assert_eq!(sim.outcome, TradeOutcome::Loss);
        assert_eq!(sim.r_multiple, dec!(-1.4));
    }

    #[test]
    fn stop_wins_over_target_in_the_same_candle() {
        let trade = mes_trade(Direction::Long, ts(10, 9, 0), ts(10, 12, 0), dec!(100), dec!(105));
        // One wide bar touches both the 98 stop and the 102 target.
        let candles = vec![candle(ts(10, 9, 15), dec!(103), dec!(97), dec!(100))];
        let p = ScenarioParameters {
            stop_loss_pct: Some(dec!(2)),
            take_profit_pct: Some(dec!(2)),
            ..params()
        };

        let outcome = ScenarioSimulator::new()
            .apply_scenario(&[trade], &candles, &p, dec!(50000))
            .unwrap();

        assert_eq!(outcome.trades[0].exit_reason, Some(ExitReason::StopLoss));
        assert_eq!(outcome.trades[0].exit_price, dec!(98));
    }

    #[test]
    fn take_profit_fills_when_touched_first() {
        let trade = mes_trade(Direction::Long, ts(10, 9, 0), ts(10, 12, 0), dec!(100), dec!(101));
        let candles = vec![
            candle(ts(10, 9, 15), dec!(101), dec!(99.5), dec!(100.5)),
            candle(ts(10, 9, 30), dec!(103), dec!(100), dec!(102.5)),
        ];
        let p = ScenarioParameters {
            stop_loss_pct: Some(dec!(2)),
            take_profit_pct: Some(dec!(2)),
            ..params()
        };

        let outcome = ScenarioSimulator::new()
            .apply_scenario(&[trade], &candles, &p, dec!(50000))
            .unwrap();

        let sim = &outcome.trades[0];
        assert_eq!(sim.exit_reason, Some(ExitReason::TakeProfit));
        assert_eq!(sim.exit_price, dec!(102));
        assert_eq!(sim.exit_time, ts(10, 9, 30));
        // (102 − 100) × $5/pt × 7 contracts.
        assert_eq!(sim.pnl, dec!(70));
    }

    #[test]
    fn short_stop_triggers_on_candle_high() {
        let trade = mes_trade(Direction::Short, ts(10, 9, 0), ts(10, 12, 0), dec!(100), dec!(99));
        let candles = vec![candle(ts(10, 9, 15), dec!(102.5), dec!(99.8), dec!(102))];
        let p = ScenarioParameters {
            stop_loss_pct: Some(dec!(2)),
            ..params()
        };

        let outcome = ScenarioSimulator::new()
            .apply_scenario(&[trade], &candles, &p, dec!(50000))
            .unwrap();

        let sim = &outcome.trades[0];
        assert_eq!(sim.exit_reason, Some(ExitReason::StopLoss));
        assert_eq!(sim.exit_price, dec!(102));
        // Short loses when bought back higher: (100 − 102) × 5 × 7.
        assert_eq!(sim.pnl, dec!(-70));
    }

    #[test]
    fn filters_remove_trades_entirely() {
        // Monday the 10th, Tuesday the 11th.
        let monday = mes_trade(Direction::Long, ts(10, 9, 0), ts(10, 12, 0), dec!(100), dec!(101));
        let tuesday = mes_trade(Direction::Long, ts(11, 9, 0), ts(11, 12, 0), dec!(100), dec!(101));
        let late = mes_trade(Direction::Long, ts(11, 20, 30), ts(11, 21, 0), dec!(100), dec!(101));
        let quick = mes_trade(Direction::Long, ts(11, 10, 0), ts(11, 10, 5), dec!(100), dec!(101));

        let p = ScenarioParameters {
            exclude_days: vec!["Monday".to_string()],
            trade_hours_start: Some(8.0),
            trade_hours_end: Some(16.0),
            min_hold_minutes: Some(30),
            ..params()
        };

        let outcome = ScenarioSimulator::new()
            .apply_scenario(&[monday, tuesday.clone(), late, quick], &[], &p, dec!(50000))
            .unwrap();

        assert_eq!(outcome.trades.len(), 1);
        assert_eq!(outcome.trades[0].trade_id, tuesday.trade_id);
        assert_eq!(outcome.metrics.total_trades, 1);
    }

    #[test]
    fn max_hold_truncates_at_last_candle_close() {
        // Held 10 hours; capped at one.
        let trade = mes_trade(Direction::Long, ts(10, 9, 0), ts(10, 19, 0), dec!(100), dec!(105));
        let candles = vec![
            candle(ts(10, 9, 15), dec!(101), dec!(99), dec!(100.5)),
            candle(ts(10, 9, 45), dec!(102), dec!(100), dec!(101.5)),
            candle(ts(10, 11, 0), dec!(106), dec!(101), dec!(105)),
        ];
        let p = ScenarioParameters {
            max_hold_minutes: Some(60),
            ..params()
        };

        let outcome = ScenarioSimulator::new()
            .apply_scenario(&[trade], &candles, &p, dec!(50000))
            .unwrap();

        let sim = &outcome.trades[0];
        assert_eq!(sim.exit_reason, Some(ExitReason::MaxHoldTime));
        assert_eq!(sim.exit_price, dec!(101.5));
        assert_eq!(sim.exit_time, ts(10, 9, 45));
        assert_eq!(sim.holding_minutes(), 45);
    }

    #[test]
    fn missing_market_data_degrades_to_recorded_exit() {
        let trade = mes_trade(Direction::Long, ts(10, 9, 0), ts(10, 12, 0), dec!(100), dec!(101));
        let p = ScenarioParameters {
            stop_loss_pct: Some(dec!(2)),
            ..params()
        };
        let simulator = ScenarioSimulator::new();

        // No candles at all for the instrument.
        let outcome = simulator
            .apply_scenario(std::slice::from_ref(&trade), &[], &p, dec!(50000))
            .unwrap();
        let sim = &outcome.trades[0];
        assert_eq!(sim.exit_reason, Some(ExitReason::NoMarketData));
        assert_eq!(sim.exit_price, dec!(101));
        assert_eq!(sim.exit_time, ts(10, 12, 0));

        // Candles exist, but none inside the trade window.
        let stale = vec![candle(ts(9, 9, 0), dec!(101), dec!(99), dec!(100))];
        let outcome = simulator
            .apply_scenario(&[trade], &stale, &p, dec!(50000))
            .unwrap();
        assert_eq!(
            outcome.trades[0].exit_reason,
            Some(ExitReason::NoCandlesFound)
        );
    }

    #[test]
    fn neutral_parameters_keep_the_recorded_exit() {
        let trade = mes_trade(Direction::Long, ts(10, 9, 0), ts(10, 12, 0), dec!(100), dec!(101));
        let candles = vec![candle(ts(10, 10, 0), dec!(102), dec!(99), dec!(101))];

        let outcome = ScenarioSimulator::new()
            .apply_scenario(&[trade.clone()], &candles, &params(), dec!(50000))
            .unwrap();

        let sim = &outcome.trades[0];
        assert_eq!(sim.exit_reason, Some(ExitReason::OriginalExit));
        assert_eq!(sim.exit_price, trade.exit_price);
        assert_eq!(sim.exit_time, trade.exit_time);
        // Only position re-sizing differs from the recorded trade: the same
        // one-point move now carries 7 contracts instead of 2.
        assert_eq!(sim.contracts, SIZED_CONTRACTS);
        assert_eq!(sim.pnl, dec!(35));
    }

    #[test]
    fn slippage_and_commission_reduce_pnl() {
        let trade = mes_trade(Direction::Long, ts(10, 9, 0), ts(10, 12, 0), dec!(100), dec!(101));
        let p = ScenarioParameters {
            slippage_ticks: Some(2),
            commission_per_contract: Some(dec!(0.62)),
            ..params()
        };

        let outcome = ScenarioSimulator::new()
            .apply_scenario(&[trade], &[], &p, dec!(50000))
            .unwrap();

        let sim = &outcome.trades[0];
        // Two ticks of 0.25 against each leg: 0.5 × 2 × $5/pt × 7 contracts.
        assert_eq!(sim.slippage_cost, Some(dec!(35)));
        assert_eq!(sim.commission_cost, Some(dec!(4.34)));
        // Gross 35 − 35 slippage − 4.34 commission.
        assert_eq!(sim.pnl, dec!(-4.34));
        assert_eq!(sim.outcome, TradeOutcome::Loss);
    }

    #[test]
    fn capital_multiplier_scales_sizing_and_metrics_base() {
        let trade = mes_trade(Direction::Long, ts(10, 9, 0), ts(10, 12, 0), dec!(100), dec!(101));
        let p = ScenarioParameters {
            capital_multiplier: dec!(2.0),
            ..params()
        };

        let outcome = ScenarioSimulator::new()
            .apply_scenario(&[trade], &[], &p, dec!(50000))
            .unwrap();

        // 100000 × 40% × 50% / 1300 = 15 contracts.
        assert_eq!(outcome.trades[0].contracts, 15);
    }

    #[test]
    fn runs_are_deterministic() {
        let trades = vec![
            mes_trade(Direction::Long, ts(10, 9, 0), ts(10, 12, 0), dec!(100), dec!(105)),
            mes_trade(Direction::Short, ts(11, 9, 0), ts(11, 12, 0), dec!(100), dec!(98)),
        ];
        let candles = vec![
            candle(ts(10, 9, 30), dec!(101), dec!(97), dec!(98)),
            candle(ts(11, 9, 30), dec!(103), dec!(99), dec!(102)),
        ];
        let p = ScenarioParameters {
            stop_loss_pct: Some(dec!(2)),
            take_profit_pct: Some(dec!(3)),
            ..params()
        };
        let simulator = ScenarioSimulator::new();

        let first = simulator
            .apply_scenario(&trades, &candles, &p, dec!(50000))
            .unwrap();
        let second = simulator
            .apply_scenario(&trades, &candles, &p, dec!(50000))
            .unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn empty_trade_set_yields_zeroed_metrics() {
        let outcome = ScenarioSimulator::new()
            .apply_scenario(&[], &[], &params(), dec!(50000))
            .unwrap();
        assert!(outcome.trades.is_empty());
        assert_eq!(outcome.metrics, PerformanceMetrics::empty());
    }

    #[test]
    fn baseline_reports_recorded_trades_unchanged() {
        let trades = vec![mes_trade(
            Direction::Long,
            ts(10, 9, 0),
            ts(10, 12, 0),
            dec!(100),
            dec!(101),
        )];
        let baseline = ScenarioSimulator::new()
            .create_baseline(&trades, dec!(50000))
            .unwrap();

        assert!(baseline.is_baseline);
        assert_eq!(baseline.trades, trades);
        // Recorded pnl: one point × $5 × 2 contracts.
        assert_eq!(baseline.metrics.total_pnl, dec!(10));
    }
}
