//! The `perceptor quick` command.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;

use perceptor_core::quick::{run_quick_audit, select_model, QuickAuditInput};
use perceptor_providers::create_provider;

use super::{pct, Context};

#[derive(Args, Debug)]
pub struct QuickArgs {
    /// JSON request body ({productName, productUrl, competitors, targetPersona, model})
    #[arg(long, conflicts_with_all = ["name", "url"])]
    pub input: Option<PathBuf>,

    #[arg(long, required_unless_present = "input")]
    pub name: Option<String>,

    #[arg(long, required_unless_present = "input")]
    pub url: Option<String>,

    /// Competitors, comma-separated
    #[arg(long, default_value = "")]
    pub competitors: String,

    #[arg(long, default_value = "")]
    pub persona: String,

    /// gpt-4o-mini or gpt-5-mini
    #[arg(long)]
    pub model: Option<String>,

    /// Provider key from the config (default: `quick_provider`)
    #[arg(long)]
    pub provider: Option<String>,

    /// Write the JSON summary here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

fn read_input(args: &QuickArgs) -> Result<QuickAuditInput> {
    if let Some(path) = &args.input {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        return serde_json::from_str(&content)
            .with_context(|| format!("invalid quick audit request in {}", path.display()));
    }

    Ok(QuickAuditInput {
        product_name: args.name.clone().context("--name is required")?,
        product_url: args.url.clone().context("--url is required")?,
        competitors: args.competitors.clone(),
        target_persona: args.persona.clone(),
        model: args.model.clone(),
    })
}

pub async fn execute(ctx: &Context, args: QuickArgs) -> Result<()> {
    let config = ctx.config()?;
    let input = read_input(&args)?;

    let provider_name = args.provider.as_deref().unwrap_or(&config.quick_provider);
    let provider_config = config.providers.get(provider_name).with_context(|| {
        format!("provider '{provider_name}' is not configured. Run `perceptor init` to create a config file.")
    })?;
    let provider = create_provider(provider_name, provider_config)?;

    eprintln!(
        "Quick audit of {} with {} via {}",
        input.product_name,
        select_model(input.model.as_deref()),
        provider_name
    );

    let summary = run_quick_audit(provider.as_ref(), &input).await?;
    eprintln!("Overall: {}", pct(summary.overall_score));

    let json = serde_json::to_string_pretty(&summary)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Summary saved to: {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
