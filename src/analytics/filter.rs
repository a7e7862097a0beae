//! Chat-id selection applied before every aggregate.

use std::collections::BTreeSet;
use std::fmt;

use crate::store::{ChatId, Interaction};

/// Selector label meaning "no filter".
pub const ALL_CHATS: &str = "All";

/// The single equality predicate on `chat_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ChatFilter {
    #[default]
    All,
    Chat(ChatId),
}

impl ChatFilter {
    /// Interpret a selector value. Absent, empty or `"All"` disables filtering.
    ///
    /// Other values are taken verbatim, so a text id matches only the exact
    /// stored string.
    pub fn parse(selection: Option<&str>) -> Self {
        match selection {
            None | Some("") | Some(ALL_CHATS) => ChatFilter::All,
            Some(raw) => ChatFilter::Chat(ChatId::parse(raw)),
        }
    }

    pub fn matches(&self, chat_id: &ChatId) -> bool {
        match self {
            ChatFilter::All => true,
            ChatFilter::Chat(selected) => selected == chat_id,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, ChatFilter::All)
    }
}

impl fmt::Display for ChatFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatFilter::All => f.write_str(ALL_CHATS),
            ChatFilter::Chat(id) => write!(f, "{}", id),
        }
    }
}

/// Rows visible under `filter`, in table order.
pub fn filter_interactions<'a>(
    rows: &'a [Interaction],
    filter: &ChatFilter,
) -> Vec<&'a Interaction> {
    rows.iter().filter(|r| filter.matches(&r.chat_id)).collect()
}

/// Distinct chat ids of the unfiltered table, ascending.
pub fn chat_options(rows: &[Interaction]) -> Vec<ChatId> {
    rows.iter()
        .map(|r| r.chat_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
