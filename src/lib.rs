//! Stock level alerting for an inventory catalog.
//!
//! A scheduler periodically pulls product snapshots from a `ProductSource`,
//! classifies them into notifications and folds those into a bounded,
//! deduplicated log that a Telegram bot exposes as a notification center.

pub mod alerts;
pub mod analysis;
pub mod config;
pub mod db;
pub mod handlers;
pub mod model;
pub mod scheduler;
pub mod source;
