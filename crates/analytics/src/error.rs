use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Starting capital must be positive, got {0}")]
    InvalidCapital(Decimal),

    #[error("Not enough data to perform calculation: {0}")]
    NotEnoughData(String),

    #[error("An unexpected error occurred during analytics calculation: {0}")]
    InternalError(String),
}
