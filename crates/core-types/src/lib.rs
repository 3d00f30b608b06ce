pub mod enums;
pub mod error;
pub mod specs;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{Direction, ExitReason, TradeOutcome};
pub use error::CoreError;
pub use specs::ContractSpec;
pub use structs::{Candle, Trade};
