//! HTML dashboard page
//!
//! Self-contained page with inline CSS and server-side SVG charts; no
//! JavaScript beyond auto-submitting the chat selector.

use std::fmt::Write as _;

use chrono::NaiveDateTime;

use super::{DashboardView, PAGE_INTRO, PAGE_TITLE};
use crate::analytics::{DailyCount, RecentInteraction, TopicCount, ALL_CHATS};
use crate::store::Table;

const CHART_WIDTH: f64 = 720.0;
const BAR_ROW_HEIGHT: f64 = 28.0;
const BAR_LABEL_WIDTH: f64 = 200.0;
const LINE_HEIGHT: f64 = 240.0;
const LINE_PAD: f64 = 40.0;

/// Render the full dashboard page.
pub fn render_dashboard(view: &DashboardView<'_>) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{css}</style>
</head>
<body>
    <div class="layout">
        {sidebar}
        <main class="container">
            <header>
                <h1>{title}</h1>
                <p class="meta">{intro}</p>
            </header>
            {overview}
            {topics}
            {activity}
            {alerts}
            {recent}
            {footer}
        </main>
    </div>
</body>
</html>"#,
        title = html_escape(PAGE_TITLE),
        intro = html_escape(PAGE_INTRO),
        css = inline_css(),
        sidebar = render_sidebar(view),
        overview = render_overview(view),
        topics = section("Top Requested Topics", &render_bar_chart(&view.top_topics)),
        activity = section(
            "User Activity Over Time",
            &render_line_chart(&view.daily_activity)
        ),
        alerts = section("Active Alerts Overview", &render_table(view.alerts)),
        recent = section("Recent AI Summaries", &render_recent(&view.recent)),
        footer = render_footer(),
    )
}

/// Page shown instead of the dashboard when loading or rendering fails.
/// Contains no chart or table.
pub fn render_error(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>{css}</style>
</head>
<body>
    <main class="container">
        <header><h1>{title}</h1></header>
        <div class="error" role="alert">{message}</div>
    </main>
</body>
</html>"#,
        title = html_escape(PAGE_TITLE),
        css = inline_css(),
        message = html_escape(message),
    )
}

fn section(heading: &str, body: &str) -> String {
    format!(
        r#"<section class="section">
                <h2>{}</h2>
                {}
            </section>"#,
        html_escape(heading),
        body
    )
}

fn render_sidebar(view: &DashboardView<'_>) -> String {
    let selected = view.selection.to_string();
    let mut options = String::new();
    let labels = std::iter::once(ALL_CHATS.to_string())
        .chain(view.chat_options.iter().map(|id| id.to_string()));
    for label in labels {
        let _ = write!(
            options,
            r#"<option value="{value}"{sel}>{value}</option>"#,
            value = html_escape(&label),
            sel = if label == selected { " selected" } else { "" },
        );
    }

    format!(
        r#"<aside class="sidebar">
            <h3>Filter Options</h3>
            <form method="get" action="/">
                <label for="chat_id">Filter by Chat ID (optional):</label>
                <select id="chat_id" name="chat_id" onchange="this.form.submit()">{options}</select>
                <button type="submit">Apply</button>
            </form>
            <h3>Controls</h3>
            <form method="post" action="/refresh">
                <input type="hidden" name="chat_id" value="{selected}">
                <button type="submit">Refresh Data</button>
            </form>
        </aside>"#,
        options = options,
        selected = html_escape(&selected),
    )
}

fn render_overview(view: &DashboardView<'_>) -> String {
    let card = |label: &str, value: usize| {
        format!(
            r#"<div class="summary-card"><h3>{}</h3><div class="value">{}</div></div>"#,
            label, value
        )
    };

    format!(
        r#"<section class="section">
                <h2>Overview Metrics</h2>
                <div class="summary">{}{}{}</div>
            </section>"#,
        card("Total Users", view.overview.total_users),
        card("Total Topics Requested", view.overview.total_interactions),
        card("Total Alerts", view.overview.total_alerts),
    )
}

/// Horizontal bar chart, one bar per topic.
pub fn render_bar_chart(topics: &[TopicCount]) -> String {
    if topics.is_empty() {
        return empty_notice();
    }

    let max = topics.iter().map(|t| t.count).max().unwrap_or(1).max(1) as f64;
    let bar_span = CHART_WIDTH - BAR_LABEL_WIDTH - 60.0;
    let height = BAR_ROW_HEIGHT * topics.len() as f64;

    let mut svg = format!(
        r#"<svg class="chart bar-chart" viewBox="0 0 {w} {h}" role="img" aria-label="Top requested topics">"#,
        w = CHART_WIDTH,
        h = height
    );
    for (i, topic) in topics.iter().enumerate() {
        let y = i as f64 * BAR_ROW_HEIGHT;
        let width = topic.count as f64 / max * bar_span;
        let _ = write!(
            svg,
            r#"<g class="bar"><text x="{lx}" y="{ty:.1}" text-anchor="end">{label}</text><rect x="{bx}" y="{ry:.1}" width="{bw:.1}" height="{bh:.1}" rx="3"/><text class="count" x="{cx:.1}" y="{ty:.1}">{count}</text></g>"#,
            lx = BAR_LABEL_WIDTH - 8.0,
            ty = y + BAR_ROW_HEIGHT * 0.65,
            label = html_escape(&topic.topic),
            bx = BAR_LABEL_WIDTH,
            ry = y + 4.0,
            bw = width,
            bh = BAR_ROW_HEIGHT - 8.0,
            cx = BAR_LABEL_WIDTH + width + 6.0,
            count = topic.count,
        );
    }
    svg.push_str("</svg>");
    svg
}

/// Line chart of rows per day.
pub fn render_line_chart(daily: &[DailyCount]) -> String {
    if daily.is_empty() {
        return empty_notice();
    }

    let max = daily.iter().map(|d| d.count).max().unwrap_or(1).max(1) as f64;
    let span_x = CHART_WIDTH - 2.0 * LINE_PAD;
    let span_y = LINE_HEIGHT - 2.0 * LINE_PAD;
    let points = chart_points(daily, max, span_x, span_y);

    let mut svg = format!(
        r#"<svg class="chart line-chart" viewBox="0 0 {w} {h}" role="img" aria-label="Daily activity">"#,
        w = CHART_WIDTH,
        h = LINE_HEIGHT
    );
    let _ = write!(
        svg,
        r#"<line class="axis" x1="{p}" y1="{b}" x2="{r}" y2="{b}"/><text class="tick" x="{lp}" y="{ty}" text-anchor="end">{max}</text>"#,
        p = LINE_PAD,
        b = LINE_HEIGHT - LINE_PAD,
        r = CHART_WIDTH - LINE_PAD,
        lp = LINE_PAD - 6.0,
        ty = LINE_PAD + 4.0,
        max = max as u32,
    );

    if points.len() > 1 {
        let path = points
            .iter()
            .map(|(x, y)| format!("{:.1},{:.1}", x, y))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = write!(svg, r#"<polyline points="{}"/>"#, path);
    }
    for ((x, y), d) in points.iter().zip(daily) {
        let _ = write!(
            svg,
            r#"<circle cx="{:.1}" cy="{:.1}" r="3"><title>{}: {}</title></circle>"#,
            x, y, d.date, d.count
        );
    }

    let label_y = LINE_HEIGHT - LINE_PAD + 18.0;
    if let (Some(first), Some(last)) = (daily.first(), daily.last()) {
        let _ = write!(
            svg,
            r#"<text class="tick" x="{:.1}" y="{}" text-anchor="start">{}</text>"#,
            points[0].0, label_y, first.date
        );
        if daily.len() > 1 {
            let _ = write!(
                svg,
                r#"<text class="tick" x="{:.1}" y="{}" text-anchor="end">{}</text>"#,
                points[points.len() - 1].0,
                label_y,
                last.date
            );
        }
    }
    svg.push_str("</svg>");
    svg
}

/// Plot coordinates; x is proportional to days since the first date.
fn chart_points(daily: &[DailyCount], max: f64, span_x: f64, span_y: f64) -> Vec<(f64, f64)> {
    let (first, last) = match (daily.first(), daily.last()) {
        (Some(first), Some(last)) => (first.date, last.date),
        _ => return Vec::new(),
    };
    let total_days = (last - first).num_days();

    daily
        .iter()
        .map(|d| {
            let x = if total_days == 0 {
                CHART_WIDTH / 2.0
            } else {
                LINE_PAD + (d.date - first).num_days() as f64 / total_days as f64 * span_x
            };
            let y = LINE_HEIGHT - LINE_PAD - d.count as f64 / max * span_y;
            (x, y)
        })
        .collect()
}

/// Arbitrary table, every column shown verbatim.
pub fn render_table(table: &Table) -> String {
    let mut html = String::from("<div class=\"table-wrap\"><table><thead><tr>");
    for column in &table.columns {
        let _ = write!(html, "<th>{}</th>", html_escape(column));
    }
    html.push_str("</tr></thead><tbody>");
    if table.is_empty() {
        let _ = write!(
            html,
            r#"<tr><td class="empty" colspan="{}">No rows</td></tr>"#,
            table.columns.len().max(1)
        );
    }
    for row in &table.rows {
        html.push_str("<tr>");
        for cell in row {
            let _ = write!(html, "<td>{}</td>", html_escape(&cell.to_string()));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table></div>");
    html
}

fn render_recent(recent: &[RecentInteraction]) -> String {
    let mut html = String::from(
        "<div class=\"table-wrap\"><table><thead><tr><th>timestamp</th><th>input_topic</th><th>summary</th></tr></thead><tbody>",
    );
    if recent.is_empty() {
        html.push_str(r#"<tr><td class="empty" colspan="3">No rows</td></tr>"#);
    }
    for row in recent {
        let _ = write!(
            html,
            "<tr><td class=\"nowrap\">{}</td><td>{}</td><td>{}</td></tr>",
            row.timestamp.as_ref().map(format_timestamp).unwrap_or_default(),
            html_escape(row.topic.as_deref().unwrap_or_default()),
            html_escape(row.summary.as_deref().unwrap_or_default()),
        );
    }
    html.push_str("</tbody></table></div>");
    html
}

fn render_footer() -> String {
    r#"<footer><hr><p class="meta">Telegram AI News Bot analytics</p></footer>"#.to_string()
}

fn empty_notice() -> String {
    r#"<p class="empty">No data for the current selection.</p>"#.to_string()
}

pub(crate) fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Inline CSS styles
fn inline_css() -> &'static str {
    r#"
* { box-sizing: border-box; margin: 0; padding: 0; }
body {
    font-family: system-ui, -apple-system, 'Segoe UI', sans-serif;
    line-height: 1.6;
    color: #111827;
    background: #ffffff;
}
.layout { display: flex; min-height: 100vh; }
.sidebar {
    width: 260px;
    flex-shrink: 0;
    padding: 1.5rem 1rem;
    background: #f3f4f6;
    border-right: 1px solid #e5e7eb;
}
.sidebar h3 { font-size: 1rem; margin: 1rem 0 0.5rem; }
.sidebar label { display: block; font-size: 0.875rem; margin-bottom: 0.25rem; }
.sidebar select, .sidebar button { width: 100%; padding: 0.4rem; margin-bottom: 0.5rem; }
.container { flex: 1; max-width: 1200px; padding: 2rem; }
header { margin-bottom: 2rem; padding-bottom: 1rem; border-bottom: 2px solid #e5e7eb; }
header h1 { font-size: 2rem; font-weight: 700; margin-bottom: 0.5rem; }
.meta { color: #6b7280; font-size: 0.875rem; }
.summary {
    display: grid;
    grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
    gap: 1rem;
}
.summary-card {
    background: #f9fafb;
    padding: 1rem;
    border-radius: 0.5rem;
    border-left: 4px solid #3b82f6;
}
.summary-card h3 { font-size: 0.875rem; font-weight: 600; color: #6b7280; }
.summary-card .value { font-size: 1.5rem; font-weight: 700; }
.section { margin-bottom: 2rem; }
.section h2 { font-size: 1.5rem; font-weight: 700; margin-bottom: 1rem; }
.chart { width: 100%; max-width: 720px; font-size: 12px; }
.bar rect { fill: #3b82f6; }
.bar text { fill: #374151; }
.line-chart polyline { fill: none; stroke: #3b82f6; stroke-width: 2; }
.line-chart circle { fill: #3b82f6; }
.line-chart .axis { stroke: #d1d5db; }
.tick { fill: #6b7280; }
.table-wrap { overflow-x: auto; }
table { width: 100%; border-collapse: collapse; }
thead { background: #f9fafb; }
th {
    padding: 0.75rem;
    text-align: left;
    font-weight: 600;
    font-size: 0.875rem;
    color: #374151;
    border-bottom: 2px solid #e5e7eb;
}
td { padding: 0.75rem; border-bottom: 1px solid #e5e7eb; font-size: 0.875rem; vertical-align: top; }
.nowrap { white-space: nowrap; }
.empty { color: #9ca3af; font-style: italic; }
.error {
    padding: 1rem;
    border-radius: 0.5rem;
    background: #fef2f2;
    border-left: 4px solid #ef4444;
    color: #991b1b;
}
footer { margin-top: 2rem; }
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{ChatFilter, OverviewMetrics};
    use crate::store::{CellValue, ChatId};
    use chrono::NaiveDate;

    fn view(alerts: &Table) -> DashboardView<'_> {
        let date = |d| NaiveDate::from_ymd_opt(2024, 5, d).unwrap();
        DashboardView {
            selection: ChatFilter::Chat(ChatId::Int(1)),
            chat_options: vec![ChatId::Int(1), ChatId::Int(2)],
            overview: OverviewMetrics {
                total_users: 2,
                total_interactions: 6,
                total_alerts: 1,
            },
            top_topics: vec![
                TopicCount {
                    topic: "LLMs".into(),
                    count: 3,
                },
                TopicCount {
                    topic: "<script>".into(),
                    count: 1,
                },
            ],
            daily_activity: vec![
                DailyCount {
                    date: date(1),
                    count: 1,
                },
                DailyCount {
                    date: date(2),
                    count: 3,
                },
            ],
            alerts,
            recent: vec![RecentInteraction {
                timestamp: date(2).and_hms_opt(9, 30, 0),
                topic: Some("LLMs".into()),
                summary: Some("Bigger & better".into()),
            }],
        }
    }

    fn alerts() -> Table {
        Table {
            columns: vec!["id".into(), "topic".into()],
            rows: vec![vec![CellValue::Integer(9), CellValue::Text("Robotics".into())]],
        }
    }

    #[test]
    fn test_sections_in_fixed_order() {
        let alerts = alerts();
        let page = render_dashboard(&view(&alerts));

        let order = [
            "Overview Metrics",
            "Top Requested Topics",
            "User Activity Over Time",
            "Active Alerts Overview",
            "Recent AI Summaries",
        ];
        let positions: Vec<usize> = order
            .iter()
            .map(|h| page.find(h).unwrap_or_else(|| panic!("missing {}", h)))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_overview_counters() {
        let alerts = alerts();
        let page = render_dashboard(&view(&alerts));
        assert!(page.contains("Total Users</h3><div class=\"value\">2</div>"));
        assert!(page.contains("Total Topics Requested</h3><div class=\"value\">6</div>"));
        assert!(page.contains("Total Alerts</h3><div class=\"value\">1</div>"));
    }

    #[test]
    fn test_selector_marks_current_chat() {
        let alerts = alerts();
        let page = render_dashboard(&view(&alerts));
        assert!(page.contains(r#"<option value="All">All</option>"#));
        assert!(page.contains(r#"<option value="1" selected>1</option>"#));
        assert!(page.contains(r#"<option value="2">2</option>"#));
        assert!(page.contains(r#"<input type="hidden" name="chat_id" value="1">"#));
    }

    #[test]
    fn test_content_is_escaped() {
        let alerts = alerts();
        let page = render_dashboard(&view(&alerts));
        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;"));
        assert!(page.contains("Bigger &amp; better"));
        assert!(page.contains("2024-05-02 09:30:00"));
    }

    #[test]
    fn test_alerts_table_verbatim() {
        let html = render_table(&alerts());
        assert!(html.contains("<th>id</th><th>topic</th>"));
        assert!(html.contains("<td>9</td><td>Robotics</td>"));
    }

    #[test]
    fn test_empty_table_renders_placeholder() {
        let html = render_table(&Table::new(vec!["id".into()]));
        assert!(html.contains("No rows"));
    }

    #[test]
    fn test_bar_chart_one_bar_per_topic() {
        let topics = vec![
            TopicCount {
                topic: "a".into(),
                count: 4,
            },
            TopicCount {
                topic: "b".into(),
                count: 2,
            },
        ];
        let svg = render_bar_chart(&topics);
        assert_eq!(svg.matches("<rect").count(), 2);
        assert!(svg.contains(">4</text>"));
        assert!(render_bar_chart(&[]).contains("No data"));
    }

    #[test]
    fn test_line_chart_points() {
        let date = |d| NaiveDate::from_ymd_opt(2024, 5, d).unwrap();
        let daily = vec![
            DailyCount {
                date: date(1),
                count: 2,
            },
            DailyCount {
                date: date(3),
                count: 5,
            },
        ];
        let svg = render_line_chart(&daily);
        assert!(svg.contains("<polyline"));
        assert_eq!(svg.matches("<circle").count(), 2);
        assert!(svg.contains("2024-05-01"));
        assert!(svg.contains("2024-05-03"));

        let single = render_line_chart(&daily[..1]);
        assert!(!single.contains("<polyline"));
        assert_eq!(single.matches("<circle").count(), 1);
    }

    #[test]
    fn test_line_chart_spaces_points_by_date() {
        let day = |d| DailyCount {
            date: NaiveDate::from_ymd_opt(2024, 5, d).unwrap(),
            count: 1,
        };
        let daily = vec![day(1), day(2), day(30)];
        let span_x = CHART_WIDTH - 2.0 * LINE_PAD;

        let points = chart_points(&daily, 1.0, span_x, LINE_HEIGHT - 2.0 * LINE_PAD);
        let xs: Vec<f64> = points.iter().map(|(x, _)| *x).collect();

        assert!((xs[0] - LINE_PAD).abs() < 1e-9);
        assert!((xs[1] - (LINE_PAD + span_x / 29.0)).abs() < 1e-9);
        assert!((xs[2] - (CHART_WIDTH - LINE_PAD)).abs() < 1e-9);
        assert!(xs[1] - xs[0] < xs[2] - xs[1]);

        let svg = render_line_chart(&daily);
        assert!(svg.contains(&format!(r#"<circle cx="{:.1}""#, xs[1])));
    }

    #[test]
    fn test_error_page_has_no_sections() {
        let page = render_error("Failed to load database: missing <file>");
        assert!(page.contains("Failed to load database: missing &lt;file&gt;"));
        assert!(!page.contains("<svg"));
        assert!(!page.contains("<table"));
        assert!(!page.contains("Overview Metrics"));
    }
}
