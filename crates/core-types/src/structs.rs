use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::{Direction, ExitReason, TradeOutcome};

/// A single closed futures position.
///
/// Trades arrive from the persistence layer already closed; the scenario
/// simulator produces modified copies of them, never mutating the source.
/// The provenance fields (`exit_reason`, `slippage_cost`, `commission_cost`)
/// are only populated on simulated trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: Uuid,
    pub instrument: String,
    pub direction: Direction,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    /// The stop level recorded with the original trade, if any.
    pub stop_price: Option<Decimal>,
    pub contracts: u32,
    /// Signed realized pnl in account currency.
    pub pnl: Decimal,
    /// Positive currency amount used as the R-multiple denominator.
    pub initial_risk: Option<Decimal>,
    /// pnl / |initial_risk|; zero when initial_risk is absent or zero.
    pub r_multiple: Decimal,
    pub outcome: TradeOutcome,
    pub exit_reason: Option<ExitReason>,
    pub slippage_cost: Option<Decimal>,
    pub commission_cost: Option<Decimal>,
}

impl Trade {
    /// Time the position was held, in whole minutes.
    pub fn holding_minutes(&self) -> i64 {
        (self.exit_time - self.entry_time).num_minutes()
    }
}

/// One OHLCV bar for a single instrument.
///
/// Candle series are used only for path-dependent exit simulation; they are
/// never used to invent trades that did not exist in the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub instrument: String,
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn holding_minutes_from_timestamps() {
        let entry = Utc.with_ymd_and_hms(2025, 3, 10, 9, 30, 0).unwrap();
        let trade = Trade {
            trade_id: Uuid::new_v4(),
            instrument: "MES".to_string(),
            direction: Direction::Long,
            entry_time: entry,
            exit_time: entry + chrono::Duration::minutes(95),
            entry_price: dec!(5000),
            exit_price: dec!(5010),
            stop_price: None,
            contracts: 1,
            pnl: dec!(50),
            initial_risk: Some(dec!(25)),
            r_multiple: dec!(2),
            outcome: TradeOutcome::Win,
            exit_reason: None,
            slippage_cost: None,
            commission_cost: None,
        };
        assert_eq!(trade.holding_minutes(), 95);
    }
}
