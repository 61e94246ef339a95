//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::Result;
use std::path::Path;

use perceptor_core::report::{EvaluationReport, ModelScore};
use perceptor_core::statistics::ScoreBand;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn pct(score: f64) -> String {
    format!("{:.0}%", score * 100.0)
}

/// Generate an HTML report from an evaluation report.
pub fn generate_html(report: &EvaluationReport) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>Perception audit: {} (iteration {})</title>\n",
        html_escape(&report.project_name),
        report.iteration
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    let band = ScoreBand::of(report.overall_score);
    html.push_str("<header>\n");
    html.push_str(&format!(
        "<h1>Perception audit: {}</h1>\n",
        html_escape(&report.project_name)
    ));
    html.push_str(&format!(
        "<p class=\"meta\">Iteration {} | {} questions | {} models | {}</p>\n",
        report.iteration,
        report.question_results.len(),
        report.model_scores.len(),
        report.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str(&format!(
        "<p class=\"overall {band}\">Overall score: <strong>{}</strong> ({band})</p>\n",
        pct(report.overall_score)
    ));
    html.push_str("</header>\n");

    // Summary dashboard
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str(&format!("<p>{}</p>\n", html_escape(&report.summary)));
    if !report.model_scores.is_empty() {
        html.push_str(&generate_bar_chart(&report.model_scores));
    }
    let failed = report.failed_responses();
    if failed > 0 {
        html.push_str(&format!(
            "<p class=\"warning\">{failed} response(s) failed and were scored 0.</p>\n"
        ));
    }
    html.push_str("</section>\n");

    // Per-question results
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Responses</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Theme</th><th onclick=\"sortTable(1)\">Model</th><th onclick=\"sortTable(2)\">Score</th><th onclick=\"sortTable(3)\">Accuracy</th><th onclick=\"sortTable(4)\">Coverage</th><th onclick=\"sortTable(5)\">Clarity</th><th>Response</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    for question in &report.question_results {
        for r in &question.model_responses {
            let class = if r.is_placeholder() {
                "failed".to_string()
            } else {
                ScoreBand::of(r.score).to_string()
            };
            html.push_str(&format!(
                "<tr class=\"{}\"><td title=\"{}\">{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><details><summary>{}</summary><pre>{}</pre></details></td></tr>\n",
                class,
                html_escape(&question.question),
                html_escape(&question.theme),
                html_escape(&r.model_name),
                pct(r.score),
                pct(r.scores.accuracy),
                pct(r.scores.feature_coverage),
                pct(r.scores.differentiation_clarity),
                html_escape(&r.rubric_details),
                html_escape(&r.response),
            ));
        }
    }

    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Gaps
    html.push_str("<section class=\"gaps\">\n<h2>Gaps</h2>\n");
    if report.gaps.is_empty() {
        html.push_str("<p>No gaps detected.</p>\n");
    } else {
        html.push_str("<table>\n<thead><tr><th>Severity</th><th>Type</th><th>Gap</th><th>Business impact</th></tr></thead>\n<tbody>\n");
        for gap in &report.gaps {
            html.push_str(&format!(
                "<tr><td class=\"sev-{sev}\">{sev}</td><td>{}</td><td><strong>{}</strong><br>{}</td><td>{}</td></tr>\n",
                gap.gap_type,
                html_escape(&gap.title),
                html_escape(&gap.description),
                html_escape(&gap.business_impact),
                sev = gap.severity,
            ));
        }
        html.push_str("</tbody></table>\n");
    }
    html.push_str("</section>\n");

    // Fixes
    html.push_str("<section class=\"fixes\">\n<h2>Fixes</h2>\n");
    if report.fixes.is_empty() {
        html.push_str("<p>No fixes recommended.</p>\n");
    } else {
        html.push_str("<table>\n<thead><tr><th>Priority</th><th>Category</th><th>Fix</th><th>Related gaps</th></tr></thead>\n<tbody>\n");
        for fix in &report.fixes {
            html.push_str(&format!(
                "<tr><td class=\"sev-{prio}\">{prio}</td><td>{}</td><td><strong>{}</strong><br>{}</td><td>{}</td></tr>\n",
                fix.category,
                html_escape(&fix.title),
                html_escape(&fix.description),
                html_escape(&fix.related_gaps.join(", ")),
                prio = fix.priority,
            ));
        }
        html.push_str("</tbody></table>\n");
    }
    html.push_str("</section>\n");

    // Trace
    html.push_str("<section class=\"trace\">\n");
    html.push_str("<details>\n<summary>Trace log</summary>\n<ol>\n");
    for log in &report.trace_logs {
        let model = log
            .model
            .as_deref()
            .map(|m| format!(" [{}]", html_escape(m)))
            .unwrap_or_default();
        html.push_str(&format!(
            "<li><code>{}</code> <em>{}</em>{} <strong>{}</strong>: {}</li>\n",
            log.timestamp.format("%H:%M:%S"),
            log.kind,
            model,
            html_escape(&log.title),
            html_escape(&log.details),
        ));
    }
    html.push_str("</ol>\n</details>\n</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &EvaluationReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

fn band_color(score: f64) -> &'static str {
    match ScoreBand::of(score) {
        ScoreBand::Excellent => "#22c55e",
        ScoreBand::Good => "#84cc16",
        ScoreBand::Warning => "#eab308",
        ScoreBand::Danger => "#ef4444",
    }
}

fn generate_bar_chart(model_scores: &[ModelScore]) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 200;

    let total_height = model_scores.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, model) in model_scores.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = (model.score * max_width as f64) as usize;

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&model.model_name)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width,
            y,
            width,
            bar_height,
            band_color(model.score)
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.1}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            model.score * 100.0
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --excellent: #dcfce7; --good: #ecfccb; --warning: #fef9c3; --danger: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --excellent: #064e3b; --good: #365314; --warning: #713f12; --danger: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.overall { font-size: 1.25rem; padding: 0.5rem 1rem; border-radius: 8px; display: inline-block; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; vertical-align: top; }
th { background: var(--border); cursor: pointer; }
.excellent { background: var(--excellent); }
.good { background: var(--good); }
.warning { background: var(--warning); }
.danger, .failed { background: var(--danger); }
.sev-high { color: #dc2626; font-weight: bold; }
.sev-medium { color: #d97706; }
.sev-low { color: #6b7280; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; white-space: pre-wrap; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 0.5rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    const na = parseFloat(va), nb = parseFloat(vb);
    const cmp = !isNaN(na) && !isNaN(nb) ? na - nb : va.localeCompare(vb);
    return asc ? cmp : -cmp;
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
