//! Rendering: the per-task summary table, three terminal charts, and an HTML
//! report mirroring the same views. All renderers degrade to an explicit
//! "no data" message when no outcomes have been recorded yet.

use gaiabench_types::{Outcome, StatusCounts};
use tabled::Table;

use crate::catalog::Catalog;
use crate::session::Session;
use crate::summary;

pub const NO_HISTOGRAM_DATA: &str = "No data available to display histogram.";
pub const NO_PIE_DATA: &str = "No data available to display the pie chart.";
pub const NO_LEVEL_DATA: &str = "No data available to display bar chart.";

const CHART_COLORS: [&str; 3] = ["#28a745", "#fd7e14", "#dc3545"];

fn fill_char(outcome: Outcome) -> char {
    match outcome {
        Outcome::AsIs => '█',
        Outcome::WithSteps => '▓',
        Outcome::Inconclusive => '░',
    }
}

/// Per-task summary table, rendered with tabled.
pub fn summary_table(catalog: &Catalog, session: &Session) -> String {
    Table::new(summary::table_rows(catalog, session)).to_string()
}

/// Histogram of outcome counts, one bar per assignable category.
pub fn render_histogram(counts: &StatusCounts) -> String {
    if counts.is_empty() {
        return NO_HISTOGRAM_DATA.to_string();
    }
    let mut out = String::new();
    for outcome in Outcome::ALL {
        let n = counts.get(outcome);
        out.push_str(&format!(
            "{:<13} {} {}\n",
            outcome.label(),
            fill_char(outcome).to_string().repeat(n),
            n
        ));
    }
    out
}

/// Share of each outcome category as a percentage of recorded outcomes (the
/// terminal stand-in for the pie chart).
pub fn render_shares(counts: &StatusCounts) -> String {
    if counts.is_empty() {
        return NO_PIE_DATA.to_string();
    }
    let total = counts.total() as f64;
    let mut out = String::new();
    for outcome in Outcome::ALL {
        let pct = counts.get(outcome) as f64 / total * 100.0;
        out.push_str(&format!("{:<13} {:>5.1}%\n", outcome.label(), pct));
    }
    out
}

/// Stacked bar per difficulty level, one segment per outcome category.
pub fn render_level_chart(by_level: &[(String, StatusCounts)]) -> String {
    if by_level.iter().all(|(_, counts)| counts.is_empty()) {
        return NO_LEVEL_DATA.to_string();
    }
    let mut out = String::new();
    for outcome in Outcome::ALL {
        out.push_str(&format!("{} {}  ", fill_char(outcome), outcome.label()));
    }
    out.push('\n');
    for (level, counts) in by_level {
        let mut bar = String::new();
        for outcome in Outcome::ALL {
            bar.push_str(&fill_char(outcome).to_string().repeat(counts.get(outcome)));
        }
        out.push_str(&format!("Level {:<7} {} ({})\n", level, bar, counts.total()));
    }
    out
}

/// Full three-chart summary plus the table, for the `summary` command.
pub fn render_summary(catalog: &Catalog, session: &Session) -> String {
    let counts = summary::status_counts(session);
    let by_level = summary::counts_by_level(catalog, session);
    format!(
        "Test Case Summary Table\n{}\n\nHistogram of test cases:\n{}\nTest case status shares:\n{}\nTest case status by level:\n{}",
        summary_table(catalog, session),
        render_histogram(&counts),
        render_shares(&counts),
        render_level_chart(&by_level),
    )
}

/// HTML report with the summary table and the three charts drawn in CSS.
pub fn generate_html_report(catalog: &Catalog, session: &Session) -> String {
    let counts = summary::status_counts(session);
    let by_level = summary::counts_by_level(catalog, session);

    let mut rows = String::new();
    for row in summary::table_rows(catalog, session) {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            row.index,
            html_escape(&row.task_id),
            html_escape(&row.prompt),
            row.file_attached,
            html_escape(&row.level),
            html_escape(&row.status),
            html_escape(&row.feedback),
        ));
    }

    let histogram = if counts.is_empty() {
        format!("<p class=\"nodata\">{NO_HISTOGRAM_DATA}</p>")
    } else {
        let max = Outcome::ALL.iter().map(|o| counts.get(*o)).max().unwrap_or(1).max(1);
        let mut bars = String::new();
        for (outcome, color) in Outcome::ALL.into_iter().zip(CHART_COLORS) {
            let n = counts.get(outcome);
            bars.push_str(&format!(
                "<div class=\"bar-row\"><span class=\"bar-label\">{}</span>\
                 <span class=\"bar\" style=\"width:{}%;background:{}\"></span>\
                 <span class=\"bar-count\">{}</span></div>\n",
                outcome.label(),
                n * 100 / max,
                color,
                n
            ));
        }
        bars
    };

    let pie = if counts.is_empty() {
        format!("<p class=\"nodata\">{NO_PIE_DATA}</p>")
    } else {
        let total = counts.total() as f64;
        let mut stops = Vec::new();
        let mut acc = 0.0;
        for (outcome, color) in Outcome::ALL.into_iter().zip(CHART_COLORS) {
            let share = counts.get(outcome) as f64 / total * 100.0;
            stops.push(format!("{color} {acc:.1}% {:.1}%", acc + share));
            acc += share;
        }
        format!(
            "<div class=\"pie\" style=\"background:conic-gradient({})\"></div>",
            stops.join(", ")
        )
    };

    let levels = if by_level.iter().all(|(_, c)| c.is_empty()) {
        format!("<p class=\"nodata\">{NO_LEVEL_DATA}</p>")
    } else {
        let max = by_level.iter().map(|(_, c)| c.total()).max().unwrap_or(1).max(1);
        let mut bars = String::new();
        for (level, level_counts) in &by_level {
            let mut segments = String::new();
            for (outcome, color) in Outcome::ALL.into_iter().zip(CHART_COLORS) {
                let n = level_counts.get(outcome);
                if n == 0 {
                    continue;
                }
                segments.push_str(&format!(
                    "<span class=\"bar\" style=\"width:{}%;background:{}\"></span>",
                    n * 100 / max,
                    color
                ));
            }
            bars.push_str(&format!(
                "<div class=\"bar-row\"><span class=\"bar-label\">Level {}</span>{}\
                 <span class=\"bar-count\">{}</span></div>\n",
                html_escape(level),
                segments,
                level_counts.total()
            ));
        }
        bars
    };

    let mut legend = String::new();
    for (outcome, color) in Outcome::ALL.into_iter().zip(CHART_COLORS) {
        legend.push_str(&format!(
            "<span class=\"legend-item\"><span class=\"swatch\" style=\"background:{}\"></span>{}</span>\n",
            color,
            outcome.label()
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>GAIA Evaluation Report</title>
    <style>
        body {{ font-family: -apple-system, 'Segoe UI', Roboto, Arial, sans-serif; margin: 0; padding: 20px; background: #f5f5f5; }}
        .container {{ max-width: 1200px; margin: 0 auto; background: white; padding: 30px; border-radius: 8px; }}
        h1 {{ margin: 0 0 10px 0; color: #333; }}
        h2 {{ margin-top: 30px; color: #333; }}
        .timestamp {{ color: #6c757d; font-size: 14px; margin-bottom: 20px; }}
        table {{ width: 100%; border-collapse: collapse; margin-top: 10px; }}
        th {{ background: #343a40; color: white; padding: 10px; text-align: left; font-size: 13px; }}
        td {{ padding: 10px; border-bottom: 1px solid #dee2e6; vertical-align: top; font-size: 13px; }}
        .bar-row {{ display: flex; align-items: center; margin: 6px 0; }}
        .bar-label {{ width: 110px; font-size: 13px; }}
        .bar {{ display: inline-block; height: 18px; border-radius: 2px; }}
        .bar-count {{ margin-left: 8px; font-size: 13px; color: #495057; }}
        .pie {{ width: 160px; height: 160px; border-radius: 50%; }}
        .legend-item {{ margin-right: 16px; font-size: 13px; }}
        .swatch {{ display: inline-block; width: 12px; height: 12px; margin-right: 4px; border-radius: 2px; }}
        .nodata {{ color: #6c757d; }}
    </style>
</head>
<body>
    <div class="container">
        <h1>GAIA Dataset Model Evaluation</h1>
        <div class="timestamp">Generated: {}</div>
        <div class="legend">{}</div>

        <h2>Test Case Summary</h2>
        <table>
            <thead><tr><th>#</th><th>Test Case</th><th>Prompt</th><th>File Attached</th><th>Level</th><th>Status</th><th>User Feedback</th></tr></thead>
            <tbody>
{}            </tbody>
        </table>

        <h2>Status Histogram</h2>
        {}

        <h2>Status Shares</h2>
        {}

        <h2>Status by Level</h2>
        {}
    </div>
</body>
</html>"#,
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        legend,
        rows,
        histogram,
        pie,
        levels
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
