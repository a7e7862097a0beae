//! Markdown rendition of the dashboard, written by the `report` command.

use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use super::html::format_timestamp;
use super::{build_view, DashboardView, PAGE_INTRO, PAGE_TITLE};
use crate::analytics::ChatFilter;
use crate::config::Config;
use crate::store::{load_dataset, Table};
use crate::Result;

/// Directory the `report` command writes to when no output is given.
pub const REPORT_DIR: &str = "analysis_results";

/// Render the view as a Markdown document.
pub fn render_markdown(view: &DashboardView<'_>) -> String {
    let mut lines = Vec::new();

    lines.push(format!("# {}", PAGE_TITLE));
    lines.push(String::new());
    lines.push(PAGE_INTRO.to_string());
    lines.push(String::new());
    lines.push(format!("- Chat filter: {}", view.selection));
    lines.push(format!(
        "- Generated: {} UTC",
        Utc::now().format("%Y-%m-%d %H:%M:%S")
    ));
    lines.push(String::new());

    lines.push("## Overview Metrics".to_string());
    lines.push(format!(
        "- Total Users: {} | Total Topics Requested: {} | Total Alerts: {}",
        view.overview.total_users, view.overview.total_interactions, view.overview.total_alerts
    ));
    lines.push(String::new());

    lines.push("## Top Requested Topics".to_string());
    if view.top_topics.is_empty() {
        lines.push("_No data_".to_string());
    } else {
        lines.push("| Topic | Requests |".to_string());
        lines.push("| --- | --- |".to_string());
        for t in &view.top_topics {
            lines.push(format!("| {} | {} |", md_cell(&t.topic), t.count));
        }
    }
    lines.push(String::new());

    lines.push("## User Activity Over Time".to_string());
    if view.daily_activity.is_empty() {
        lines.push("_No data_".to_string());
    } else {
        lines.push("| Date | Requests |".to_string());
        lines.push("| --- | --- |".to_string());
        for d in &view.daily_activity {
            lines.push(format!("| {} | {} |", d.date, d.count));
        }
    }
    lines.push(String::new());

    lines.push("## Active Alerts Overview".to_string());
    lines.extend(table_lines(view.alerts));
    lines.push(String::new());

    lines.push("## Recent AI Summaries".to_string());
    lines.push("| timestamp | input_topic | summary |".to_string());
    lines.push("| --- | --- | --- |".to_string());
    for r in &view.recent {
        lines.push(format!(
            "| {} | {} | {} |",
            r.timestamp.as_ref().map(format_timestamp).unwrap_or_default(),
            md_cell(r.topic.as_deref().unwrap_or_default()),
            md_cell(r.summary.as_deref().unwrap_or_default()),
        ));
    }
    lines.push(String::new());

    lines.join("\n")
}

/// Render and save the report, creating parent directories as needed.
pub async fn write_markdown(view: &DashboardView<'_>, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    fs::write(output_path, render_markdown(view)).await?;
    info!("Saved dashboard report to {}", output_path.display());

    Ok(())
}

/// Load the database once, build the view and save it as Markdown.
///
/// Without `output` the report goes to
/// `analysis_results/dashboard_<YYYYmmdd_HHMMSS>.md`.
pub async fn write_report(
    config: &Config,
    selection: &ChatFilter,
    output: Option<PathBuf>,
) -> Result<PathBuf> {
    let dataset = load_dataset(&config.db_path)?;
    let view = build_view(&dataset, selection, &config.view)?;

    let output_path = output.unwrap_or_else(|| {
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        PathBuf::from(REPORT_DIR).join(format!("dashboard_{}.md", timestamp))
    });

    write_markdown(&view, &output_path).await?;
    Ok(output_path)
}

fn table_lines(table: &Table) -> Vec<String> {
    if table.columns.is_empty() {
        return vec!["_No columns_".to_string()];
    }

    let mut lines = Vec::with_capacity(table.len() + 2);
    let header: Vec<_> = table.columns.iter().map(|c| md_cell(c)).collect();
    lines.push(format!("| {} |", header.join(" | ")));
    lines.push(format!("|{}", " --- |".repeat(table.columns.len())));
    for row in &table.rows {
        let cells: Vec<_> = row.iter().map(|c| md_cell(&c.to_string())).collect();
        lines.push(format!("| {} |", cells.join(" | ")));
    }
    lines
}

fn md_cell(value: &str) -> String {
    value.replace('|', "\\|").replace(['\r', '\n'], " ")
}
