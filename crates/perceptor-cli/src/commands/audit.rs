//! The `perceptor audit` command.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Args;

use perceptor_core::defaults::{default_golden_prompts, default_scoring_metrics};
use perceptor_core::engine::{AuditEngine, AuditEngineConfig, AuditPlan, ProgressReporter};
use perceptor_core::model::{parse_competitors, GoldenPrompt, ModelConfig, Project, TargetPersona};
use perceptor_core::parser;
use perceptor_core::report::{EvaluationReport, ModelResponse};
use perceptor_core::store::AuditStore;
use perceptor_report::{write_html_report, write_markdown_report};

use super::{pct, Context};

#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Existing project id to audit again
    #[arg(long, conflicts_with_all = ["name", "url"])]
    pub project: Option<String>,

    /// Product name (creates or reuses a project with this name)
    #[arg(long, required_unless_present = "project")]
    pub name: Option<String>,

    /// Product website URL
    #[arg(long, required_unless_present = "project")]
    pub url: Option<String>,

    /// Product description
    #[arg(long)]
    pub description: Option<String>,

    /// Competitors, comma-separated
    #[arg(long)]
    pub competitors: Option<String>,

    /// Target persona, e.g. "Engineering manager at a startup"
    #[arg(long)]
    pub persona: Option<String>,

    #[arg(long)]
    pub docs_url: Option<String>,

    #[arg(long)]
    pub pricing_url: Option<String>,

    /// Prompt set TOML file or directory (default: built-in golden prompts)
    #[arg(long)]
    pub prompts: Option<PathBuf>,

    /// Model ids to use, comma-separated (default: enabled models in config)
    #[arg(long)]
    pub models: Option<String>,

    /// Output directory for rendered reports
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Output format: json, html, md, all (comma-separated)
    #[arg(long, default_value = "json")]
    pub format: String,

    /// Do not persist the project or report
    #[arg(long)]
    pub no_save: bool,
}

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_question_start(&self, index: usize, total: usize, prompt: &GoldenPrompt) {
        eprintln!("[{}/{}] {}", index + 1, total, prompt.theme);
    }

    fn on_response(&self, _question_id: &str, response: &ModelResponse) {
        eprintln!(
            "  {}: {} ({})",
            response.model_name,
            pct(response.score),
            response.rubric_details
        );
    }

    fn on_response_error(&self, _question_id: &str, model: &str, error: &str) {
        eprintln!("  ERROR: {model}: {error}");
    }

    fn on_audit_complete(&self, report: &EvaluationReport, elapsed: Duration) {
        eprintln!(
            "\nComplete: overall {} ({} failed responses, {:.1}s)",
            pct(report.overall_score),
            report.failed_responses(),
            elapsed.as_secs_f64()
        );
    }
}

fn load_prompts(path: Option<&Path>) -> Result<(Vec<GoldenPrompt>, Vec<perceptor_core::model::ScoringMetric>)> {
    let Some(path) = path else {
        return Ok((default_golden_prompts(), default_scoring_metrics()));
    };

    let sets = if path.is_dir() {
        parser::load_prompt_directory(path)?
    } else {
        vec![parser::parse_prompt_set(path)?]
    };
    anyhow::ensure!(!sets.is_empty(), "no prompt sets found in {}", path.display());

    for set in &sets {
        for w in parser::validate_prompt_set(set) {
            tracing::warn!(set = %set.id, "{}", w.message);
        }
    }

    let metrics = sets[0].metrics.clone();
    let prompts = sets.into_iter().flat_map(|s| s.prompts).collect();
    Ok((prompts, metrics))
}

fn select_models(all: &[ModelConfig], filter: Option<&str>) -> Result<Vec<ModelConfig>> {
    let Some(filter) = filter else {
        return Ok(all.iter().filter(|m| m.enabled).cloned().collect());
    };

    filter
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            all.iter()
                .find(|m| m.id == id)
                .map(|m| ModelConfig {
                    enabled: true,
                    ..m.clone()
                })
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "unknown model '{id}'. Available: {}",
                        all.iter().map(|m| m.id.as_str()).collect::<Vec<_>>().join(", ")
                    )
                })
        })
        .collect()
}

fn resolve_project(args: &AuditArgs, store: Option<&dyn AuditStore>) -> Result<Project> {
    if let Some(id) = &args.project {
        let store = store.context("--project requires a data store; drop --no-save")?;
        return store
            .get_project(id)?
            .with_context(|| format!("project not found: {id}"));
    }

    let name = args.name.as_deref().context("--name is required")?;
    let url = args.url.as_deref().context("--url is required")?;

    let existing = match store {
        Some(store) => store.list_projects()?.into_iter().find(|p| p.name == name),
        None => None,
    };
    let mut project = existing.unwrap_or_else(|| Project::new(name, url));

    project.website_url = url.to_string();
    if let Some(description) = &args.description {
        project.description = description.clone();
    }
    if let Some(competitors) = &args.competitors {
        project.competitors = parse_competitors(competitors);
    }
    if let Some(persona) = &args.persona {
        project.target_persona = TargetPersona::from_description(persona);
    }
    if args.docs_url.is_some() {
        project.docs_url = args.docs_url.clone();
    }
    if args.pricing_url.is_some() {
        project.pricing_url = args.pricing_url.clone();
    }
    Ok(project)
}

pub async fn execute(ctx: &Context, args: AuditArgs) -> Result<()> {
    let config = ctx.config()?;
    let store = if args.no_save {
        None
    } else {
        Some(ctx.store(&config)?)
    };
    let store_ref = store.as_ref().map(|s| s as &dyn AuditStore);

    let project = resolve_project(&args, store_ref)?;
    let (prompts, metrics) = load_prompts(args.prompts.as_deref())?;
    let models = select_models(&config.models, args.models.as_deref())?;
    anyhow::ensure!(!models.is_empty(), "no models selected");

    let iteration = match store_ref {
        Some(store) => {
            store.save_project(&project)?;
            store.next_iteration(&project.id)?
        }
        None => project.evaluation_count + 1,
    };

    let synthesis_model = config.synthesis_model();
    let mut wanted = models.clone();
    wanted.extend(synthesis_model.clone());
    let providers = config.providers_for(&wanted)?;
    let engine = AuditEngine::new(
        providers,
        AuditEngineConfig {
            max_tokens: config.max_tokens,
            synthesis_max_tokens: config.synthesis_max_tokens,
            synthesis_model,
        },
    );

    eprintln!(
        "perceptor v{}: auditing {} ({} questions x {} models, iteration {})\n",
        env!("CARGO_PKG_VERSION"),
        project.name,
        prompts.iter().filter(|p| p.enabled).count(),
        models.len(),
        iteration
    );

    let plan = AuditPlan {
        project,
        prompts,
        metrics,
        models,
        iteration,
    };
    let mut report = engine.run(&plan, &ConsoleReporter).await?;

    if let Some(store) = store_ref {
        report = store.save_report(report)?;
        eprintln!("Saved report {} (iteration {})", report.id, report.iteration);
    }

    print_summary(&report);

    let output = args.output.unwrap_or_else(|| config.output_dir.clone());
    write_outputs(&report, &output, &args.format)?;

    Ok(())
}

pub(crate) fn write_outputs(report: &EvaluationReport, output: &Path, format: &str) -> Result<()> {
    std::fs::create_dir_all(output)
        .with_context(|| format!("failed to create output directory {}", output.display()))?;
    let stem = format!(
        "{}-iter{}",
        slug(&report.project_name),
        report.iteration
    );

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "html", "md"]
    } else {
        format.split(',').map(str::trim).collect()
    };

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("{stem}.json"));
                report.save_json(&path)?;
                eprintln!("Report saved to: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("{stem}.html"));
                write_html_report(report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            "md" | "markdown" => {
                let path = output.join(format!("{stem}.md"));
                write_markdown_report(report, &path)?;
                eprintln!("Markdown report: {}", path.display());
            }
            other => eprintln!("Unknown format: {other}"),
        }
    }
    Ok(())
}

fn slug(name: &str) -> String {
    let slug: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "report".to_string()
    } else {
        slug
    }
}

fn print_summary(report: &EvaluationReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Model", "Score", "Failed"]);

    for model in &report.model_scores {
        let failed = report
            .question_results
            .iter()
            .flat_map(|q| &q.model_responses)
            .filter(|r| r.model_id == model.model_id && r.is_placeholder())
            .count();
        table.add_row(vec![
            Cell::new(&model.model_name),
            Cell::new(pct(model.score)),
            Cell::new(failed),
        ]);
    }

    eprintln!("\n{table}");
    eprintln!("Overall: {}", pct(report.overall_score));
    eprintln!("\n{}", report.summary);

    if !report.gaps.is_empty() {
        eprintln!("\nGaps:");
        for gap in &report.gaps {
            eprintln!("  [{}] {} ({})", gap.severity, gap.title, gap.gap_type);
        }
    }
    if !report.fixes.is_empty() {
        eprintln!("\nFixes:");
        for fix in &report.fixes {
            eprintln!("  [{}] {} ({})", fix.priority, fix.title, fix.category);
        }
    }
}
