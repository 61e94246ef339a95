//! The `perceptor reports` command.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Subcommand;
use comfy_table::Table;
use uuid::Uuid;

use perceptor_core::statistics::{score_trend, ScoreBand};
use perceptor_core::store::AuditStore;

use super::audit::write_outputs;
use super::{pct, Context};

#[derive(Subcommand, Debug)]
pub enum ReportsAction {
    /// List stored reports, newest iteration last
    List {
        /// Only reports of this project id
        #[arg(long)]
        project: Option<String>,
    },
    /// Overall-score trend across a project's iterations
    Trend {
        #[arg(long)]
        project: String,
    },
    /// Render a stored report to files
    Export {
        id: Uuid,
        /// json, html, md, all (comma-separated)
        #[arg(long, default_value = "html")]
        format: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Delete one report
    Delete { id: Uuid },
}

pub fn execute(ctx: &Context, action: ReportsAction) -> Result<()> {
    let config = ctx.config()?;
    let store = ctx.store(&config)?;

    match action {
        ReportsAction::List { project } => {
            let reports = match &project {
                Some(id) => store.project_reports(id)?,
                None => store.list_reports()?,
            };
            if reports.is_empty() {
                println!("No reports found.");
                return Ok(());
            }
            let mut table = Table::new();
            table.set_header(vec!["Id", "Project", "Iteration", "Date", "Score", "Failed"]);
            for r in &reports {
                table.add_row(vec![
                    r.id.to_string(),
                    r.project_name.clone(),
                    r.iteration.to_string(),
                    r.timestamp.format("%Y-%m-%d %H:%M").to_string(),
                    pct(r.overall_score),
                    r.failed_responses().to_string(),
                ]);
            }
            println!("{table}");
        }
        ReportsAction::Trend { project } => {
            let name = store
                .get_project(&project)?
                .map(|p| p.name)
                .with_context(|| format!("project not found: {project}"))?;
            let trend = score_trend(&store.project_reports(&project)?);
            println!("{name}: {} iteration(s)", trend.len());

            let mut table = Table::new();
            table.set_header(vec!["Iteration", "Score", "Band", "Change"]);
            for point in &trend {
                table.add_row(vec![
                    point.iteration.to_string(),
                    pct(point.overall_score),
                    ScoreBand::of(point.overall_score).to_string(),
                    point
                        .delta
                        .map(|d| format!("{:+.1}%", d * 100.0))
                        .unwrap_or_else(|| "-".into()),
                ]);
            }
            println!("{table}");
        }
        ReportsAction::Export { id, format, output } => {
            let report = store
                .get_report(&id)?
                .with_context(|| format!("report not found: {id}"))?;
            let output = output.unwrap_or_else(|| config.output_dir.clone());
            write_outputs(&report, &output, &format)?;
        }
        ReportsAction::Delete { id } => {
            store.delete_report(&id)?;
            println!("Deleted report {id}");
        }
    }
    Ok(())
}
