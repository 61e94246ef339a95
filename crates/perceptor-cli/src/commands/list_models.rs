//! The `perceptor list-models` command.

use anyhow::Result;
use comfy_table::Table;

use perceptor_providers::create_provider;

use super::Context;

pub fn execute(ctx: &Context, provider_filter: Option<String>) -> Result<()> {
    let config = ctx.config()?;
    let wanted = |name: &str| provider_filter.as_deref().is_none_or(|f| f == name);

    let mut roster = Table::new();
    roster.set_header(vec!["Id", "Name", "Provider", "Wire model", "Enabled", "Configured"]);
    for model in config.models.iter().filter(|m| wanted(&m.provider)) {
        roster.add_row(vec![
            model.id.clone(),
            model.name.clone(),
            model.provider.clone(),
            model.wire_model().to_string(),
            if model.enabled { "yes" } else { "no" }.to_string(),
            if config.providers.contains_key(&model.provider) { "yes" } else { "no" }.to_string(),
        ]);
    }
    println!("Model roster:\n{roster}\n");

    let mut names: Vec<&String> = config.providers.keys().filter(|n| wanted(n)).collect();
    names.sort();

    if names.is_empty() {
        println!("No providers configured. Run `perceptor init` to create a config file.");
        return Ok(());
    }

    for name in names {
        let provider = match create_provider(name, &config.providers[name]) {
            Ok(provider) => provider,
            Err(e) => {
                println!("Provider: {name} (unavailable: {e})\n");
                continue;
            }
        };
        println!("Provider: {name}");
        for model in provider.available_models() {
            println!(
                "  {}: {} ({}K context)",
                model.id,
                model.name,
                model.max_context / 1000
            );
        }
        println!();
    }

    Ok(())
}
