//! Telegram AI News Bot analytics dashboard
//!
//! This library provides tools to:
//! - Read the bot's `interactions` and `alerts` tables from its SQLite file
//! - Filter interactions by chat id
//! - Compute overview counters, top topics and daily activity
//! - Render the dashboard as an HTML page or a Markdown report
//! - Serve the page over HTTP with a time-to-live dataset cache

pub mod analytics;
pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod report;
pub mod server;
pub mod store;

// Re-export common types
pub use analytics::ChatFilter;
pub use config::{Config, ViewSettings};
pub use error::{Error, Result};
pub use server::Dashboard;
pub use store::{load_dataset, ChatId, Dataset, Interaction, Table};
