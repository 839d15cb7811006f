//! Local product catalog stored in SQLite.
//!
//! - `model`: row types mapped from queries.
//! - `repo`: pool setup, migrations and SQL-only catalog functions.
//!
//! Callers import from `stock_watch::db`; the repository API is re-exported.

pub mod model;
pub mod repo;

pub use repo::*;
