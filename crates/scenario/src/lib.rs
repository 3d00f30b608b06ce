//! # Hindsight Scenario Engine
//!
//! This crate answers "what would my results have been under different
//! rules?". Given a set of closed trades, raw candle data, and a validated
//! parameter set, the `ScenarioSimulator` produces a modified trade sequence
//! by re-simulating exits against the candle series, then hands the result to
//! the analytics engine for scoring.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** Pure in-memory transformation. No knowledge of
//!   storage or presentation; callers fetch data before invoking and persist
//!   results after.
//! - **Stateless Runs:** Each `apply_scenario` call is a deterministic pass
//!   over its inputs. Nothing is retained between calls, so scenario runs
//!   for different parameter sets may proceed in parallel on copies of the
//!   input.
//!
//! ## Public API
//!
//! - `ScenarioSimulator`: exit re-simulation and the full scenario pipeline.
//! - `Scenario` / `ScenarioSet`: one named run and the bounded per-portfolio
//!   collection of runs.
//! - `ComparisonMatrix`: tabulates scenarios against the baseline.
//! - `ScenarioError`: the specific error types returned from this crate.

// Declare the modules that constitute this crate.
pub mod comparison;
pub mod error;
pub mod scenario;
pub mod simulator;

// Re-export the key components to create a clean, public-facing API.
pub use comparison::{ComparisonCell, ComparisonMatrix, ComparisonRow};
pub use error::ScenarioError;
pub use scenario::{Scenario, ScenarioSet};
pub use simulator::{ScenarioOutcome, ScenarioSimulator};
