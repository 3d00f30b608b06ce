use analytics::METRIC_KEYS;
use serde::{Deserialize, Serialize};

use crate::scenario::Scenario;

/// One metric value for one scenario, with its distance from the baseline
/// when a baseline is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonCell {
    pub value: f64,
    pub delta: Option<f64>,
    /// delta as a percentage of the baseline magnitude; zero when the
    /// baseline value is zero.
    pub delta_pct: Option<f64>,
}

/// One scenario's row in the comparison matrix; cells align with
/// `ComparisonMatrix::metric_keys`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub scenario_name: String,
    pub is_baseline: bool,
    pub cells: Vec<ComparisonCell>,
}

/// Tabulates scenario metrics side by side against the designated baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonMatrix {
    pub metric_keys: Vec<String>,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonMatrix {
    /// Builds the matrix over the given scenarios.
    ///
    /// `metric_keys` defaults to the standard comparison selection. Deltas
    /// are only computed when there is more than one scenario and one of
    /// them is the baseline.
    pub fn build(scenarios: &[Scenario], metric_keys: Option<&[&str]>) -> Self {
        let keys: Vec<String> = metric_keys
            .unwrap_or(&METRIC_KEYS)
            .iter()
            .map(|k| k.to_string())
            .collect();

        let baseline = scenarios.iter().find(|s| s.is_baseline);
        let with_deltas = scenarios.len() > 1 && baseline.is_some();

        let rows = scenarios
            .iter()
            .map(|scenario| {
                let cells = keys
                    .iter()
                    .map(|key| {
                        let value = scenario.metrics.value(key).unwrap_or(0.0);
                        let (delta, delta_pct) = match (with_deltas, baseline) {
                            (true, Some(base)) => {
                                let base_value = base.metrics.value(key).unwrap_or(0.0);
                                let delta = value - base_value;
                                let delta_pct = if base_value != 0.0 {
                                    delta / base_value.abs() * 100.0
                                } else {
                                    0.0
                                };
                                (Some(delta), Some(delta_pct))
                            }
                            _ => (None, None),
                        };
                        ComparisonCell {
                            value,
                            delta,
                            delta_pct,
                        }
                    })
                    .collect();
                ComparisonRow {
                    scenario_name: scenario.name.clone(),
                    is_baseline: scenario.is_baseline,
                    cells,
                }
            })
            .collect();

        Self {
            metric_keys: keys,
            rows,
        }
    }
}
