//! Service infrastructure for the lottery.
//!
//! This crate provides the components the `lottery` binary runs on:
//! - Database (SQLite with a DrawStore implementation)
//! - Config (where the database lives, settlement tuning)
//! - State management (the lottery wired to its database)

pub mod config;
pub mod database;
pub mod state;

// Re-export key types for convenience
pub use config::Config;
pub use database::{Database, DatabaseSetupError};
pub use state::{State as ServiceState, StateSetupError};

/// Lottery operation errors over the SQLite store
pub type LotteryError = common::lottery::LotteryError<sqlx::Error>;
/// Round lifecycle errors over the SQLite store
pub type RoundError = common::round::RoundError<sqlx::Error>;
