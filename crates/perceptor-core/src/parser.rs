//! TOML prompt set parser.
//!
//! Loads golden prompt sets (and optional scoring metrics) from TOML files
//! and directories, and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::defaults::default_scoring_metrics;
use crate::model::{default_rubric, GoldenPrompt, RubricCell, ScoringMetric};

/// A named collection of golden prompts with the metrics to score them by.
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub id: String,
    pub name: String,
    pub description: String,
    pub prompts: Vec<GoldenPrompt>,
    /// Falls back to the default metrics when the file declares none.
    pub metrics: Vec<ScoringMetric>,
}

impl PromptSet {
    pub fn enabled_prompts(&self) -> impl Iterator<Item = &GoldenPrompt> {
        self.prompts.iter().filter(|p| p.enabled)
    }
}

#[derive(Debug, Deserialize)]
struct TomlPromptFile {
    prompt_set: TomlPromptSetHeader,
    #[serde(default)]
    prompts: Vec<TomlPrompt>,
    #[serde(default)]
    metrics: Vec<TomlMetric>,
}

#[derive(Debug, Deserialize)]
struct TomlPromptSetHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlPrompt {
    #[serde(default)]
    id: Option<String>,
    question: String,
    #[serde(default)]
    theme: String,
    #[serde(default = "default_true")]
    enabled: bool,
}

#[derive(Debug, Deserialize)]
struct TomlMetric {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    weight: f64,
    #[serde(default)]
    rubric: Vec<RubricCell>,
}

fn default_true() -> bool {
    true
}

/// Parse a single TOML file into a `PromptSet`.
pub fn parse_prompt_set(path: &Path) -> Result<PromptSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read prompt set file: {}", path.display()))?;

    parse_prompt_set_str(&content, path)
}

/// Parse a TOML string into a `PromptSet`.
pub fn parse_prompt_set_str(content: &str, source_path: &Path) -> Result<PromptSet> {
    let parsed: TomlPromptFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let prompts = parsed
        .prompts
        .into_iter()
        .enumerate()
        .map(|(i, p)| GoldenPrompt {
            id: p.id.unwrap_or_else(|| (i + 1).to_string()),
            question: p.question,
            theme: p.theme,
            enabled: p.enabled,
        })
        .collect();

    let metrics = if parsed.metrics.is_empty() {
        default_scoring_metrics()
    } else {
        parsed
            .metrics
            .into_iter()
            .map(|m| ScoringMetric {
                id: m.id,
                name: m.name,
                description: m.description,
                weight: m.weight,
                rubric: if m.rubric.is_empty() {
                    default_rubric()
                } else {
                    m.rubric
                },
            })
            .collect()
    };

    Ok(PromptSet {
        id: parsed.prompt_set.id,
        name: parsed.prompt_set.name,
        description: parsed.prompt_set.description,
        prompts,
        metrics,
    })
}

/// Recursively load all `.toml` prompt set files from a directory.
pub fn load_prompt_directory(dir: &Path) -> Result<Vec<PromptSet>> {
    let mut sets = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();

        if path.is_dir() {
            sets.extend(load_prompt_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_prompt_set(&path) {
                Ok(set) => sets.push(set),
                Err(e) => tracing::warn!("skipping {}: {:#}", path.display(), e),
            }
        }
    }

    sets.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(sets)
}

/// A warning from prompt set validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The prompt ID (if applicable).
    pub prompt_id: Option<String>,
    pub message: String,
}

/// Validate a prompt set for common issues.
pub fn validate_prompt_set(set: &PromptSet) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_ids = HashSet::new();
    for prompt in &set.prompts {
        if !seen_ids.insert(&prompt.id) {
            warnings.push(ValidationWarning {
                prompt_id: Some(prompt.id.clone()),
                message: format!("duplicate prompt ID: {}", prompt.id),
            });
        }
        if prompt.question.trim().is_empty() {
            warnings.push(ValidationWarning {
                prompt_id: Some(prompt.id.clone()),
                message: "question is empty".into(),
            });
        }
    }

    if set.enabled_prompts().next().is_none() {
        warnings.push(ValidationWarning {
            prompt_id: None,
            message: "no prompts are enabled".into(),
        });
    }

    for metric in &set.metrics {
        if !(0.0..=1.0).contains(&metric.weight) {
            warnings.push(ValidationWarning {
                prompt_id: None,
                message: format!("metric {} has weight outside [0, 1]: {}", metric.id, metric.weight),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[prompt_set]
id = "buyer-basics"
name = "Buyer Basics"
description = "Questions a first-time buyer asks"

[[prompts]]
id = "core"
question = "What is this product and what does it do?"
theme = "Core Positioning"

[[prompts]]
question = "What is the pricing model for this product?"
theme = "Pricing"
enabled = false

[[metrics]]
id = "1"
name = "Accuracy"
weight = 0.6

[[metrics]]
id = "2"
name = "Feature Coverage"
weight = 0.4
rubric = [
  { score = 0, description = "Nothing" },
  { score = 3, description = "Everything" },
]
"#;

    #[test]
    fn parse_valid_toml() {
        let set = parse_prompt_set_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(set.id, "buyer-basics");
        assert_eq!(set.prompts.len(), 2);
        assert_eq!(set.prompts[0].id, "core");
        assert_eq!(set.prompts[1].id, "2");
        assert!(!set.prompts[1].enabled);
        assert_eq!(set.enabled_prompts().count(), 1);
        assert_eq!(set.metrics.len(), 2);
        assert_eq!(set.metrics[0].rubric.len(), 4);
        assert_eq!(set.metrics[1].rubric[1].description, "Everything");
    }

    #[test]
    fn missing_metrics_use_defaults() {
        let toml = r#"
[prompt_set]
id = "minimal"
name = "Minimal"

[[prompts]]
question = "Who is this for?"
"#;
        let set = parse_prompt_set_str(toml, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(set.metrics.len(), 4);
        assert!(set.prompts[0].enabled);
        assert!(validate_prompt_set(&set).is_empty());
    }

    #[test]
    fn validate_flags_duplicates_and_empty_questions() {
        let toml = r#"
[prompt_set]
id = "dupes"
name = "Dupes"

[[prompts]]
id = "same"
question = "First?"

[[prompts]]
id = "same"
question = "   "
"#;
        let set = parse_prompt_set_str(toml, &PathBuf::from("test.toml")).unwrap();
        let warnings = validate_prompt_set(&set);
        assert!(warnings.iter().any(|w| w.message.contains("duplicate")));
        assert!(warnings.iter().any(|w| w.message == "question is empty"));
    }

    #[test]
    fn validate_flags_nothing_enabled() {
        let toml = r#"
[prompt_set]
id = "off"
name = "Off"

[[prompts]]
question = "Anything?"
enabled = false
"#;
        let set = parse_prompt_set_str(toml, &PathBuf::from("test.toml")).unwrap();
        let warnings = validate_prompt_set(&set);
        assert!(warnings.iter().any(|w| w.message.contains("no prompts are enabled")));
    }

    #[test]
    fn parse_malformed_toml() {
        let result = parse_prompt_set_str("this is not [valid toml }{", &PathBuf::from("bad.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn load_directory_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("bad.toml"), "nope = [").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let sets = load_prompt_directory(dir.path()).unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].id, "buyer-basics");
    }
}
