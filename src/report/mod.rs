//! Dashboard view assembly and renderers.
//!
//! `build_view` runs the filter and every aggregate once; the HTML and
//! Markdown renderers only format what it produced.

pub mod html;
pub mod markdown;

use crate::analytics::{
    chat_options, daily_activity, filter_interactions, overview, recent_interactions, top_topics,
    ChatFilter, DailyCount, OverviewMetrics, RecentInteraction, TopicCount,
};
use crate::config::ViewSettings;
use crate::store::{ChatId, Dataset, Table};
use crate::Result;

pub const PAGE_TITLE: &str = "AI News Telegram Bot - Analytics Dashboard";
pub const PAGE_INTRO: &str =
    "This dashboard visualizes user interactions and topic trends from the Telegram AI News Bot.";

/// Everything a renderer needs, in section order.
#[derive(Debug, Clone)]
pub struct DashboardView<'a> {
    pub selection: ChatFilter,
    pub chat_options: Vec<ChatId>,
    pub overview: OverviewMetrics,
    pub top_topics: Vec<TopicCount>,
    pub daily_activity: Vec<DailyCount>,
    pub alerts: &'a Table,
    pub recent: Vec<RecentInteraction>,
}

/// Filter the dataset and compute every section.
///
/// Fails if any filtered timestamp is malformed.
pub fn build_view<'a>(
    dataset: &'a Dataset,
    selection: &ChatFilter,
    settings: &ViewSettings,
) -> Result<DashboardView<'a>> {
    let filtered = filter_interactions(&dataset.interactions, selection);

    Ok(DashboardView {
        selection: selection.clone(),
        chat_options: chat_options(&dataset.interactions),
        overview: overview(dataset),
        top_topics: top_topics(&filtered, settings.top_topics_limit),
        daily_activity: daily_activity(&filtered)?,
        alerts: &dataset.alerts,
        recent: recent_interactions(&filtered, settings.recent_limit)?,
    })
}
