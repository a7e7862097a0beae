//! Counting views over the (filtered) interactions table.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::store::{Dataset, Interaction};
use crate::{Error, Result};

pub const TOP_TOPICS_LIMIT: usize = 10;
pub const RECENT_LIMIT: usize = 10;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Headline counters. Always computed over the unfiltered data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OverviewMetrics {
    pub total_users: usize,
    pub total_interactions: usize,
    pub total_alerts: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicCount {
    pub topic: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u32,
}

/// Projection used by the "recent summaries" table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentInteraction {
    pub timestamp: Option<NaiveDateTime>,
    pub topic: Option<String>,
    pub summary: Option<String>,
}

pub fn overview(dataset: &Dataset) -> OverviewMetrics {
    let users: HashSet<_> = dataset.interactions.iter().map(|r| &r.chat_id).collect();
    OverviewMetrics {
        total_users: users.len(),
        total_interactions: dataset.interactions.len(),
        total_alerts: dataset.alerts.len(),
    }
}

/// Most requested topics, highest count first.
///
/// Equal counts keep the order in which the topic first appears. NULL topics
/// are not counted.
pub fn top_topics(rows: &[&Interaction], limit: usize) -> Vec<TopicCount> {
    let mut counts: HashMap<&str, (u32, usize)> = HashMap::new();
    for (idx, topic) in rows
        .iter()
        .filter_map(|r| r.input_topic.as_deref())
        .enumerate()
    {
        counts.entry(topic).or_insert((0, idx)).0 += 1;
    }

    let mut ranked: Vec<_> = counts.into_iter().collect();
    ranked.sort_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
        count_b.cmp(count_a).then(first_a.cmp(first_b))
    });

    ranked
        .into_iter()
        .take(limit)
        .map(|(topic, (count, _))| TopicCount {
            topic: topic.to_string(),
            count,
        })
        .collect()
}

/// Parse a bot-written timestamp.
///
/// Offset-bearing stamps keep their own wall-clock time; date-only values
/// map to midnight.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let value = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_local());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Ok(dt.naive_local());
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN));
    }

    Err(Error::TimestampParse(raw.to_string()))
}

fn parse_optional(raw: Option<&str>) -> Result<Option<NaiveDateTime>> {
    raw.map(parse_timestamp).transpose()
}

/// Rows per calendar day, ascending by date.
///
/// Any malformed timestamp fails the whole series; NULL timestamps are
/// skipped.
pub fn daily_activity(rows: &[&Interaction]) -> Result<Vec<DailyCount>> {
    let mut per_day: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for row in rows {
        if let Some(ts) = parse_optional(row.timestamp.as_deref())? {
            *per_day.entry(ts.date()).or_insert(0) += 1;
        }
    }

    Ok(per_day
        .into_iter()
        .map(|(date, count)| DailyCount { date, count })
        .collect())
}

/// The last `limit` rows in table order.
pub fn recent_interactions(rows: &[&Interaction], limit: usize) -> Result<Vec<RecentInteraction>> {
    let skip = rows.len().saturating_sub(limit);
    rows[skip..]
        .iter()
        .map(|row| {
            Ok(RecentInteraction {
                timestamp: parse_optional(row.timestamp.as_deref())?,
                topic: row.input_topic.clone(),
                summary: row.summary.clone(),
            })
        })
        .collect()
}
