use analytics::PerformanceMetrics;
use configuration::ScenarioParameters;
use core_types::Trade;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ScenarioError;

/// One named simulation run: the parameters that produced it, the resulting
/// trade set, and its metrics. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub scenario_id: Uuid,
    pub name: String,
    pub is_baseline: bool,
    pub params: ScenarioParameters,
    pub trades: Vec<Trade>,
    pub metrics: PerformanceMetrics,
}

impl Scenario {
    /// A human-readable digest of the parameters that differ from their
    /// defaults, e.g. "Stop Loss: 2%, Exclude: Monday".
    pub fn parameter_summary(&self) -> String {
        let p = &self.params;
        let mut parts = Vec::new();
        if let Some(v) = p.stop_loss_pct {
            parts.push(format!("Stop Loss: {v}%"));
        }
        if let Some(v) = p.take_profit_pct {
            parts.push(format!("Take Profit: {v}%"));
        }
        if let Some(v) = p.min_hold_minutes {
            parts.push(format!("Min Hold: {v} min"));
        }
        if let Some(v) = p.max_hold_minutes {
            parts.push(format!("Max Hold: {v} min"));
        }
        if !p.exclude_days.is_empty() {
            parts.push(format!("Exclude: {}", p.exclude_days.join(", ")));
        }
        if let (Some(start), Some(end)) = (p.trade_hours_start, p.trade_hours_end) {
            parts.push(format!("Hours: {start}-{end}"));
        }
        if p.capital_allocation_pct != dec!(40) {
            parts.push(format!("Capital: {}%", p.capital_allocation_pct));
        }
        if let Some(v) = p.slippage_ticks {
            if v > 0 {
                parts.push(format!("Slippage: {v} ticks"));
            }
        }
        if let Some(v) = p.commission_per_contract {
            parts.push(format!("Commission: ${v}/contract"));
        }
        if p.capital_multiplier != dec!(1) {
            parts.push(format!("Capital x{}", p.capital_multiplier));
        }
        if parts.is_empty() {
            "Baseline".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// The bounded per-portfolio collection of scenarios.
///
/// Holds at most one baseline (adding another replaces it) and at most
/// `MAX_WHAT_IF_SCENARIOS` what-if runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioSet {
    scenarios: Vec<Scenario>,
}

impl ScenarioSet {
    pub const MAX_WHAT_IF_SCENARIOS: usize = 10;

    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a scenario, enforcing the collection bounds.
    pub fn add(&mut self, scenario: Scenario) -> Result<(), ScenarioError> {
        if scenario.is_baseline {
            self.scenarios.retain(|s| !s.is_baseline);
            self.scenarios.insert(0, scenario);
            return Ok(());
        }
        if self.what_if_count() >= Self::MAX_WHAT_IF_SCENARIOS {
            return Err(ScenarioError::ScenarioLimitReached(
                Self::MAX_WHAT_IF_SCENARIOS,
            ));
        }
        self.scenarios.push(scenario);
        Ok(())
    }

    pub fn baseline(&self) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.is_baseline)
    }

    /// All scenarios, baseline first.
    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter()
    }

    pub fn as_slice(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    fn what_if_count(&self) -> usize {
        self.scenarios.iter().filter(|s| !s.is_baseline).count()
    }
}
