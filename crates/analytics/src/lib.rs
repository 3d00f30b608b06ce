//! # Hindsight Analytics Engine
//!
//! This crate computes the fixed battery of performance metrics over a set of
//! closed trades. It acts as the "unbiased judge" of the system.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of
//!   external systems. It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** The `MetricsEngine` is a stateless calculator.
//!   It takes closed trades and a starting capital as input and produces a
//!   `PerformanceMetrics` record as output, which makes it highly reliable
//!   and easy to test.
//!
//! ## Public API
//!
//! - `MetricsEngine`: The main struct that contains the calculation logic.
//! - `PerformanceMetrics`: The standardized record of all 24 metrics.
//! - `views`: Peripheral grouping aggregations (time-of-day, weekly, monthly).
//! - `AnalyticsError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod metrics;
pub mod views;

// Re-export the key components to create a clean, public-facing API.
pub use engine::MetricsEngine;
pub use error::AnalyticsError;
pub use metrics::{EquityPoint, PerformanceMetrics, METRIC_KEYS};
