//! Peripheral grouping views over closed trades: time-of-day performance,
//! weekly pnl pivot data, and monthly returns. Pure aggregations, consumed
//! by charting layers.

use chrono::{Datelike, NaiveDate, Timelike};
use core_types::Trade;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate performance for one hour of the day, keyed by entry time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPerformance {
    pub hour: u32,
    pub avg_pnl: Decimal,
    pub total_pnl: Decimal,
    pub num_trades: usize,
    pub win_rate: f64,
}

/// Performance grouped by hour of entry_time, ascending.
pub fn time_of_day_performance(trades: &[Trade]) -> Vec<HourlyPerformance> {
    let mut buckets: BTreeMap<u32, (Decimal, usize, usize)> = BTreeMap::new();
    for trade in trades {
        let entry = buckets.entry(trade.entry_time.hour()).or_default();
        entry.0 += trade.pnl;
        entry.1 += 1;
        if trade.pnl > Decimal::ZERO {
            entry.2 += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(hour, (total_pnl, num_trades, wins))| HourlyPerformance {
            hour,
            avg_pnl: (total_pnl / Decimal::from(num_trades as u64)).round_dp(2),
            total_pnl: total_pnl.round_dp(2),
            num_trades,
            win_rate: wins as f64 / num_trades as f64 * 100.0,
        })
        .collect()
}

/// Daily pnl sum with its week/weekday grouping keys, for heatmap rendering.
///
/// `year` is the calendar year of the exit and `iso_week` the ISO week
/// number, matching how the pivot is keyed downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPnl {
    pub year: i32,
    pub iso_week: u32,
    pub weekday: String,
    pub date: NaiveDate,
    pub pnl: Decimal,
}

/// Pnl summed per exit date, ordered by date.
pub fn weekly_pnl(trades: &[Trade]) -> Vec<DailyPnl> {
    let mut buckets: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for trade in trades {
        *buckets.entry(trade.exit_time.date_naive()).or_default() += trade.pnl;
    }

    buckets
        .into_iter()
        .map(|(date, pnl)| DailyPnl {
            year: date.year(),
            iso_week: date.iso_week().week(),
            weekday: date.format("%A").to_string(),
            date,
            pnl: pnl.round_dp(2),
        })
        .collect()
}

/// Pnl summed per calendar month of exit_time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPnl {
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    pub pnl: Decimal,
}

/// Monthly returns grid, ordered by (year, month).
pub fn monthly_returns(trades: &[Trade]) -> Vec<MonthlyPnl> {
    let mut buckets: BTreeMap<(i32, u32), Decimal> = BTreeMap::new();
    for trade in trades {
        let key = (trade.exit_time.year(), trade.exit_time.month());
        *buckets.entry(key).or_default() += trade.pnl;
    }

    buckets
        .into_iter()
        .map(|((year, month), pnl)| MonthlyPnl {
            year,
            month,
            month_name: month_abbrev(month).to_string(),
            pnl: pnl.round_dp(2),
        })
        .collect()
}

/// R-multiples in input order, for histogram rendering.
pub fn r_multiple_distribution(trades: &[Trade]) -> Vec<Decimal> {
    trades.iter().map(|t| t.r_multiple).collect()
}

fn month_abbrev(month: u32) -> &'static str {
    match month {
        1 => "Jan",
        2 => "Feb",
        3 => "Mar",
        4 => "Apr",
        5 => "May",
        6 => "Jun",
        7 => "Jul",
        8 => "Aug",
        9 => "Sep",
        10 => "Oct",
        11 => "Nov",
        _ => "Dec",
    }
}
