//! # Hindsight Database Crate
//!
//! This crate acts as a high-level, application-specific interface to the
//! PostgreSQL database. It is the system's "permanent archive."
//!
//! ## Architectural Principles
//!
//! - **Layer 3 Adapter:** This crate encapsulates all database-specific
//!   logic behind a clean API, hiding the underlying SQL from the rest of
//!   the application. The engines (`analytics`, `scenario`) never import it;
//!   the binary fetches data here before invoking them and persists the
//!   results afterwards.
//! - **Asynchronous & Pooled:** All operations are asynchronous over a
//!   shared connection pool (`PgPool`).
//!
//! ## Public API
//!
//! - `connect`: The async function to establish the database connection pool.
//! - `run_migrations`: A utility to apply database migrations.
//! - `DbRepository`: The data access methods (fetch trades/candles, persist
//!   and list scenarios).
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use repository::{DbRepository, StoredScenario};
