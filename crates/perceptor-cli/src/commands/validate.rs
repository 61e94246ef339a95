//! The `perceptor validate` command.

use std::path::PathBuf;

use anyhow::Result;

use perceptor_core::parser;

pub fn execute(prompts_path: PathBuf) -> Result<()> {
    let sets = if prompts_path.is_dir() {
        parser::load_prompt_directory(&prompts_path)?
    } else {
        vec![parser::parse_prompt_set(&prompts_path)?]
    };
    anyhow::ensure!(!sets.is_empty(), "no prompt sets found in {}", prompts_path.display());

    let mut total_warnings = 0;

    for set in &sets {
        println!(
            "Prompt set: {} ({} prompts, {} enabled, {} metrics)",
            set.name,
            set.prompts.len(),
            set.enabled_prompts().count(),
            set.metrics.len()
        );

        let warnings = parser::validate_prompt_set(set);
        for w in &warnings {
            let prefix = w
                .prompt_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All prompt sets valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
