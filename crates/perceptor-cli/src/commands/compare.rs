//! The `perceptor compare` command.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;

use perceptor_core::report::{ComparisonReport, EvaluationReport};
use perceptor_core::store::AuditStore;

use super::Context;

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Baseline report JSON
    #[arg(long, requires = "current", conflicts_with = "project")]
    pub baseline: Option<PathBuf>,

    /// Current report JSON
    #[arg(long, requires = "baseline")]
    pub current: Option<PathBuf>,

    /// Compare the two latest stored reports of this project
    #[arg(long, required_unless_present = "baseline")]
    pub project: Option<String>,

    /// Minimum score change treated as significant
    #[arg(long, default_value_t = 0.05)]
    pub threshold: f64,

    /// Exit with status 1 when any pair regressed
    #[arg(long)]
    pub fail_on_regression: bool,

    /// text, json, markdown
    #[arg(long, default_value = "text")]
    pub format: String,
}

fn load_pair(ctx: &Context, args: &CompareArgs) -> Result<(EvaluationReport, EvaluationReport)> {
    if let (Some(baseline), Some(current)) = (&args.baseline, &args.current) {
        return Ok((
            EvaluationReport::load_json(baseline)?,
            EvaluationReport::load_json(current)?,
        ));
    }

    let project = args.project.as_deref().context("--project or --baseline/--current is required")?;
    let config = ctx.config()?;
    let store = ctx.store(&config)?;
    let mut reports = store.project_reports(project)?;
    anyhow::ensure!(
        reports.len() >= 2,
        "project {project} has {} report(s); at least 2 are needed to compare",
        reports.len()
    );
    let current = reports.pop().context("no current report")?;
    let baseline = reports.pop().context("no baseline report")?;
    Ok((baseline, current))
}

fn render_text(report: &ComparisonReport) -> String {
    let mut out = format!(
        "Iteration {} -> {}: overall {:+.1}%\n{} regressions, {} improvements, {} unchanged\n",
        report.baseline_iteration,
        report.current_iteration,
        report.overall_delta * 100.0,
        report.regressions.len(),
        report.improvements.len(),
        report.unchanged
    );

    for (heading, changes) in [
        ("Regressions", &report.regressions),
        ("Improvements", &report.improvements),
    ] {
        if changes.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{heading}:\n"));
        for c in changes {
            out.push_str(&format!(
                "  {}: {} ({}) {:.1}% -> {:.1}% ({:+.1}%)\n",
                c.theme,
                c.question,
                c.model,
                c.baseline_score * 100.0,
                c.current_score * 100.0,
                c.delta * 100.0
            ));
        }
    }

    if report.new_pairs > 0 {
        out.push_str(&format!("\n{} new pair(s)\n", report.new_pairs));
    }
    if report.removed_pairs > 0 {
        out.push_str(&format!("{} removed pair(s)\n", report.removed_pairs));
    }
    out
}

pub fn execute(ctx: &Context, args: CompareArgs) -> Result<()> {
    let (baseline, current) = load_pair(ctx, &args)?;
    let report = current.compare(&baseline, args.threshold);

    match args.format.as_str() {
        "markdown" | "md" => println!("{}", report.to_markdown()),
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print!("{}", render_text(&report)),
    }

    if args.fail_on_regression && report.has_regressions() {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use perceptor_core::report::ScoreChange;

    #[test]
    fn text_lists_regressions_and_pair_counts() {
        let report = ComparisonReport {
            baseline_iteration: 1,
            current_iteration: 2,
            overall_delta: -0.1,
            regressions: vec![ScoreChange {
                theme: "Pricing".into(),
                question: "What is the pricing model?".into(),
                model: "gpt5-mini".into(),
                baseline_score: 0.8,
                current_score: 0.5,
                delta: -0.3,
            }],
            improvements: vec![],
            unchanged: 3,
            new_pairs: 1,
            removed_pairs: 0,
        };
        let text = render_text(&report);
        assert!(text.starts_with("Iteration 1 -> 2: overall -10.0%"));
        assert!(text.contains("Regressions:\n  Pricing: What is the pricing model? (gpt5-mini) 80.0% -> 50.0% (-30.0%)"));
        assert!(text.contains("1 new pair(s)"));
        assert!(!text.contains("removed"));
    }
}
