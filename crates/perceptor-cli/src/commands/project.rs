//! The `perceptor project` command.

use anyhow::Result;
use clap::Subcommand;
use comfy_table::Table;

use perceptor_core::store::AuditStore;

use super::{pct, Context};

#[derive(Subcommand, Debug)]
pub enum ProjectAction {
    /// List stored projects
    List,
    /// Show one project
    Show { id: String },
    /// Delete a project and all of its reports
    Delete { id: String },
}

pub fn execute(ctx: &Context, action: ProjectAction) -> Result<()> {
    let config = ctx.config()?;
    let store = ctx.store(&config)?;

    match action {
        ProjectAction::List => {
            let projects = store.list_projects()?;
            if projects.is_empty() {
                println!("No projects yet. Run `perceptor audit --name ... --url ...` to create one.");
                return Ok(());
            }
            let mut table = Table::new();
            table.set_header(vec!["Id", "Name", "Website", "Evaluations", "Last score"]);
            for p in &projects {
                table.add_row(vec![
                    p.id.clone(),
                    p.name.clone(),
                    p.website_url.clone(),
                    p.evaluation_count.to_string(),
                    p.last_score.map(pct).unwrap_or_else(|| "-".into()),
                ]);
            }
            println!("{table}");
        }
        ProjectAction::Show { id } => {
            let project = store
                .get_project(&id)?
                .ok_or_else(|| anyhow::anyhow!("project not found: {id}"))?;
            println!("{}", serde_json::to_string_pretty(&project)?);
        }
        ProjectAction::Delete { id } => {
            let reports = store.project_reports(&id)?.len();
            store.delete_project(&id)?;
            println!("Deleted project {id} and {reports} report(s)");
        }
    }
    Ok(())
}
