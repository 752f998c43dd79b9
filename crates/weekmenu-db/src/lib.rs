//! SQLite persistence layer for weekmenu.
//!
//! Provides the connection pool, embedded migrations, row models, and
//! per-table query functions. The store is the source of truth: every
//! mutating query returns the resulting list state so callers can replace
//! their local copy wholesale.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
