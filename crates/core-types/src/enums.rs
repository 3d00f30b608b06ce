use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// The side of a futures position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Returns the opposite side of the position.
    pub fn opposite(&self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "Long"),
            Direction::Short => write!(f, "Short"),
        }
    }
}

impl FromStr for Direction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Long" | "long" => Ok(Direction::Long),
            "Short" | "short" => Ok(Direction::Short),
            other => Err(CoreError::InvalidInput(
                "direction".to_string(),
                other.to_string(),
            )),
        }
    }
}

/// The realized result of a closed trade, derived from the sign of its pnl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeOutcome {
    Win,
    Loss,
    Breakeven,
}

impl TradeOutcome {
    /// Classifies a pnl amount. Breakeven only at exactly zero.
    pub fn from_pnl(pnl: Decimal) -> Self {
        if pnl > Decimal::ZERO {
            TradeOutcome::Win
        } else if pnl < Decimal::ZERO {
            TradeOutcome::Loss
        } else {
            TradeOutcome::Breakeven
        }
    }
}

impl fmt::Display for TradeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeOutcome::Win => write!(f, "Win"),
            TradeOutcome::Loss => write!(f, "Loss"),
            TradeOutcome::Breakeven => write!(f, "Breakeven"),
        }
    }
}

impl FromStr for TradeOutcome {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Win" => Ok(TradeOutcome::Win),
            "Loss" => Ok(TradeOutcome::Loss),
            "Breakeven" => Ok(TradeOutcome::Breakeven),
            other => Err(CoreError::InvalidInput(
                "outcome".to_string(),
                other.to_string(),
            )),
        }
    }
}

/// How a simulated trade was closed.
///
/// `NoMarketData` and `NoCandlesFound` tag trades whose exit could not be
/// re-simulated and fell back to the recorded exit, so downstream consumers
/// can detect degraded simulation fidelity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    OriginalExit,
    StopLoss,
    TakeProfit,
    MaxHoldTime,
    NoMarketData,
    NoCandlesFound,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExitReason::OriginalExit => "Original Exit",
            ExitReason::StopLoss => "Stop Loss",
            ExitReason::TakeProfit => "Take Profit",
            ExitReason::MaxHoldTime => "Max Hold Time",
            ExitReason::NoMarketData => "No Market Data",
            ExitReason::NoCandlesFound => "No Candles Found",
        };
        write!(f, "{}", label)
    }
}

impl FromStr for ExitReason {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Original Exit" => Ok(ExitReason::OriginalExit),
            "Stop Loss" => Ok(ExitReason::StopLoss),
            "Take Profit" => Ok(ExitReason::TakeProfit),
            "Max Hold Time" => Ok(ExitReason::MaxHoldTime),
            "No Market Data" => Ok(ExitReason::NoMarketData),
            "No Candles Found" => Ok(ExitReason::NoCandlesFound),
            other => Err(CoreError::InvalidInput(
                "exit_reason".to_string(),
                other.to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn outcome_follows_pnl_sign() {
        assert_eq!(TradeOutcome::from_pnl(dec!(0.01)), TradeOutcome::Win);
        assert_eq!(TradeOutcome::from_pnl(dec!(-0.01)), TradeOutcome::Loss);
        assert_eq!(TradeOutcome::from_pnl(dec!(0)), TradeOutcome::Breakeven);
    }

    #[test]
    fn exit_reason_round_trips_through_display() {
        for reason in [
            ExitReason::OriginalExit,
            ExitReason::StopLoss,
            ExitReason::TakeProfit,
            ExitReason::MaxHoldTime,
            ExitReason::NoMarketData,
            ExitReason::NoCandlesFound,
        ] {
            assert_eq!(reason.to_string().parse::<ExitReason>().unwrap(), reason);
        }
    }
}
