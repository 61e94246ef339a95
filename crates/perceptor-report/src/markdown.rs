//! Markdown report generator, for pasting into docs and PR descriptions.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;

use perceptor_core::report::EvaluationReport;
use perceptor_core::statistics::ScoreBand;

fn cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

/// Render a report as GitHub-flavored Markdown.
pub fn generate_markdown(report: &EvaluationReport) -> String {
    let mut md = String::new();

    let _ = writeln!(md, "# Perception audit: {}\n", report.project_name);
    let _ = writeln!(
        md,
        "Iteration {} | {} | overall **{:.0}%** ({})\n",
        report.iteration,
        report.timestamp.format("%Y-%m-%d %H:%M UTC"),
        report.overall_score * 100.0,
        ScoreBand::of(report.overall_score)
    );
    let _ = writeln!(md, "## Summary\n\n{}\n", report.summary);

    if !report.model_scores.is_empty() {
        md.push_str("## Models\n\n| Model | Score |\n|-------|-------|\n");
        for m in &report.model_scores {
            let _ = writeln!(md, "| {} | {:.0}% |", cell(&m.model_name), m.score * 100.0);
        }
        md.push('\n');
    }

    md.push_str("## Responses\n\n| Theme | Model | Score | Details |\n|-------|-------|-------|---------|\n");
    for q in &report.question_results {
        for r in &q.model_responses {
            let details = match &r.error {
                Some(err) => format!("failed: {}", cell(err)),
                None => cell(&r.rubric_details),
            };
            let _ = writeln!(
                md,
                "| {} | {} | {:.0}% | {} |",
                cell(&q.theme),
                cell(&r.model_name),
                r.score * 100.0,
                details
            );
        }
    }
    md.push('\n');

    if !report.gaps.is_empty() {
        md.push_str("## Gaps\n\n");
        for gap in &report.gaps {
            let _ = writeln!(
                md,
                "- **{}** ({}, {} severity): {}",
                gap.title, gap.gap_type, gap.severity, gap.business_impact
            );
        }
        md.push('\n');
    }

    if !report.fixes.is_empty() {
        md.push_str("## Fixes\n\n");
        for fix in &report.fixes {
            let _ = writeln!(
                md,
                "- [{}] **{}** ({}): {}",
                fix.priority, fix.title, fix.category, fix.description
            );
        }
        md.push('\n');
    }

    md
}

/// Write a Markdown report to a file.
pub fn write_markdown_report(report: &EvaluationReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, generate_markdown(report))?;
    Ok(())
}
