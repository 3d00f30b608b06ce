use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Invalid scenario parameters: {0}")]
    InvalidParameters(#[from] configuration::ConfigError),

    #[error("Metrics calculation failed: {0}")]
    Analytics(#[from] analytics::AnalyticsError),

    #[error("Scenario limit reached: at most {0} what-if scenarios are kept per portfolio")]
    ScenarioLimitReached(usize),
}
