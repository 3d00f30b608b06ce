use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::error::ConfigError;

const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// The full parameter set for one what-if scenario.
///
/// This replaces the loosely-typed parameter maps of ad-hoc tooling with an
/// explicit structure: every knob has a defined type, default, and validated
/// range. Validation happens at the boundary, before the parameters reach
/// the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioParameters {
    /// Stop-loss distance from entry, as a percent of entry price.
    pub stop_loss_pct: Option<Decimal>,
    /// Take-profit distance from entry, as a percent of entry price.
    pub take_profit_pct: Option<Decimal>,
    /// Drop trades held for fewer minutes than this.
    pub min_hold_minutes: Option<i64>,
    /// Force an exit once a trade has been held this long.
    pub max_hold_minutes: Option<i64>,
    /// Weekday names whose trades are dropped entirely.
    pub exclude_days: Vec<String>,
    /// Start of the allowed entry window, as a decimal hour of day.
    pub trade_hours_start: Option<f64>,
    /// End of the allowed entry window; wraps past midnight when start > end.
    pub trade_hours_end: Option<f64>,
    /// Percent of capital deployed across all instruments.
    pub capital_allocation_pct: Decimal,
    /// Percent of the deployed capital assigned to each instrument.
    pub instrument_splits: HashMap<String, Decimal>,
    /// Slippage charged on entry and exit, in ticks.
    pub slippage_ticks: Option<u32>,
    /// Commission charged per contract, in account currency.
    pub commission_per_contract: Option<Decimal>,
    /// Scales the starting capital for sizing and metrics ("what if I had
    /// twice the account").
    pub capital_multiplier: Decimal,
    /// Collected for forward compatibility; not enforced by the simulator.
    pub max_concurrent_positions: Option<u32>,
}

impl Default for ScenarioParameters {
    fn default() -> Self {
        Self {
            stop_loss_pct: None,
            take_profit_pct: None,
            min_hold_minutes: None,
            max_hold_minutes: None,
            exclude_days: Vec::new(),
            trade_hours_start: None,
            trade_hours_end: None,
            capital_allocation_pct: dec!(40),
            instrument_splits: HashMap::from([
                ("MES".to_string(), dec!(50)),
                ("MNQ".to_string(), dec!(50)),
            ]),
            slippage_ticks: None,
            commission_per_contract: None,
            capital_multiplier: dec!(1.0),
            max_concurrent_positions: None,
        }
    }
}

impl ScenarioParameters {
    /// Validates every field against its documented range.
    ///
    /// Must be called at the boundary before a parameter set reaches the
    /// simulator; the simulator assumes validated input.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(pct) = self.stop_loss_pct {
            if pct <= Decimal::ZERO || pct > dec!(100) {
                return Err(ConfigError::ValidationError(format!(
                    "stop_loss_pct must be in (0, 100], got {pct}"
                )));
            }
        }
        if let Some(pct) = self.take_profit_pct {
            if pct <= Decimal::ZERO {
                return Err(ConfigError::ValidationError(format!(
                    "take_profit_pct must be positive, got {pct}"
                )));
            }
        }
        if let Some(minutes) = self.min_hold_minutes {
            if minutes < 0 {
                return Err(ConfigError::ValidationError(format!(
                    "min_hold_minutes must be non-negative, got {minutes}"
                )));
            }
        }
        if let Some(minutes) = self.max_hold_minutes {
            if minutes < 0 {
                return Err(ConfigError::ValidationError(format!(
                    "max_hold_minutes must be non-negative, got {minutes}"
                )));
            }
        }
        if let (Some(min), Some(max)) = (self.min_hold_minutes, self.max_hold_minutes) {
            if min > max {
                return Err(ConfigError::ValidationError(format!(
                    "min_hold_minutes ({min}) exceeds max_hold_minutes ({max})"
                )));
            }
        }
        for day in &self.exclude_days {
            if !WEEKDAY_NAMES.contains(&day.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "unknown weekday name in exclude_days: {day}"
                )));
            }
        }
        match (self.trade_hours_start, self.trade_hours_end) {
            (Some(start), Some(end)) => {
                for (name, value) in [("trade_hours_start", start), ("trade_hours_end", end)] {
                    if !(0.0..24.0).contains(&value) {
                        return Err(ConfigError::ValidationError(format!(
                            "{name} must be in [0, 24), got {value}"
                        )));
                    }
                }
            }
            (None, None) => {}
            _ => {
                return Err(ConfigError::ValidationError(
                    "trade_hours_start and trade_hours_end must be set together".to_string(),
                ));
            }
        }
        if self.capital_allocation_pct <= Decimal::ZERO || self.capital_allocation_pct > dec!(100) {
            return Err(ConfigError::ValidationError(format!(
                "capital_allocation_pct must be in (0, 100], got {}",
                self.capital_allocation_pct
            )));
        }
        for (symbol, pct) in &self.instrument_splits {
            if *pct < Decimal::ZERO || *pct > dec!(100) {
                return Err(ConfigError::ValidationError(format!(
                    "instrument split for {symbol} must be in [0, 100], got {pct}"
                )));
            }
        }
        if let Some(commission) = self.commission_per_contract {
            if commission < Decimal::ZERO {
                return Err(ConfigError::ValidationError(format!(
                    "commission_per_contract must be non-negative, got {commission}"
                )));
            }
        }
        if self.capital_multiplier <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(format!(
                "capital_multiplier must be positive, got {}",
                self.capital_multiplier
            )));
        }
        if let Some(limit) = self.max_concurrent_positions {
            if limit == 0 {
                return Err(ConfigError::ValidationError(
                    "max_concurrent_positions must be at least 1".to_string(),
                ));
            }
            warn!(
                max_concurrent_positions = limit,
                "max_concurrent_positions is informational and not enforced by the simulator"
            );
        }
        Ok(())
    }

    /// The fraction of deployed capital assigned to an instrument.
    ///
    /// Instruments absent from the split table receive the full deployed
    /// allocation.
    pub fn allocation_share(&self, instrument: &str) -> Decimal {
        self.instrument_splits
            .get(instrument)
            .map(|pct| *pct / dec!(100))
            .unwrap_or(Decimal::ONE)
    }

    /// Whether a decimal hour of day falls inside the entry window.
    ///
    /// The window is inclusive on both ends and wraps past midnight when
    /// start > end (e.g. 22 → 4 admits 23.5 and 2.0). With no window
    /// configured, every hour passes.
    pub fn hours_window_contains(&self, decimal_hour: f64) -> bool {
        match (self.trade_hours_start, self.trade_hours_end) {
            (Some(start), Some(end)) => {
                if start <= end {
                    decimal_hour >= start && decimal_hour <= end
                } else {
                    decimal_hour >= start || decimal_hour <= end
                }
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let params = ScenarioParameters::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.capital_allocation_pct, dec!(40));
        assert_eq!(params.capital_multiplier, dec!(1.0));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut params = ScenarioParameters {
            stop_loss_pct: Some(dec!(-2)),
            ..Default::default()
        };
        assert!(params.validate().is_err());

        params.stop_loss_pct = None;
        params.exclude_days = vec!["Funday".to_string()];
        assert!(params.validate().is_err());

        params.exclude_days = vec!["Monday".to_string()];
        params.trade_hours_start = Some(25.0);
        params.trade_hours_end = Some(4.0);
        assert!(params.validate().is_err());

        params.trade_hours_start = Some(22.0);
        assert!(params.validate().is_ok());

        params.trade_hours_end = None;
        assert!(params.validate().is_err());
    }

    #[test]
    fn rejects_inverted_hold_bounds() {
        let params = ScenarioParameters {
            min_hold_minutes: Some(120),
            max_hold_minutes: Some(60),
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn allocation_share_defaults_to_full() {
        let params = ScenarioParameters::default();
        assert_eq!(params.allocation_share("MES"), dec!(0.5));
        assert_eq!(params.allocation_share("GC"), Decimal::ONE);
    }

    #[test]
    fn hours_window_wraps_past_midnight() {
        let params = ScenarioParameters {
            trade_hours_start: Some(22.0),
            trade_hours_end: Some(4.0),
            ..Default::default()
        };
        assert!(params.hours_window_contains(23.5));
        assert!(params.hours_window_contains(2.0));
        assert!(params.hours_window_contains(22.0));
        assert!(params.hours_window_contains(4.0));
        assert!(!params.hours_window_contains(12.0));

        let day = ScenarioParameters {
            trade_hours_start: Some(9.5),
            trade_hours_end: Some(16.0),
            ..Default::default()
        };
        assert!(day.hours_window_contains(9.5));
        assert!(!day.hours_window_contains(9.0));
    }
}
