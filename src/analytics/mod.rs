//! Dashboard analytics
//!
//! Provides:
//! - Chat-id filtering and selector options
//! - Overview counters, top topics, daily activity
//! - Recent summaries projection

pub mod aggregate;
pub mod filter;

pub use aggregate::{
    daily_activity, overview, parse_timestamp, recent_interactions, top_topics, DailyCount,
    OverviewMetrics, RecentInteraction, TopicCount, RECENT_LIMIT, TOP_TOPICS_LIMIT,
};
pub use filter::{chat_options, filter_interactions, ChatFilter, ALL_CHATS};
