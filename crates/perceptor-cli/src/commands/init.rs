//! The `perceptor init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("perceptor.toml").exists() {
        println!("perceptor.toml already exists, skipping.");
    } else {
        std::fs::write("perceptor.toml", SAMPLE_CONFIG)?;
        println!("Created perceptor.toml");
    }

    std::fs::create_dir_all("prompts")?;
    let example_path = Path::new("prompts/golden.toml");
    if example_path.exists() {
        println!("prompts/golden.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_PROMPT_SET)?;
        println!("Created prompts/golden.toml");
    }

    println!("\nNext steps:");
    println!("  1. Export OPENAI_API_KEY and GEMINI_API_KEY (or edit perceptor.toml)");
    println!("  2. Run: perceptor validate --prompts prompts/golden.toml");
    println!("  3. Run: perceptor audit --name \"My Product\" --url https://example.com --prompts prompts/golden.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# perceptor configuration

synthesis_model = "gpt5-mini"
quick_provider = "openai"
max_tokens = 1024
data_dir = "./perceptor-data"
output_dir = "./perceptor-reports"

[providers.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"

[providers.google]
type = "google"
api_key = "${GEMINI_API_KEY}"

# [providers.deepseek]
# type = "deepseek"
# api_key = "${DEEPSEEK_API_KEY}"

[[models]]
id = "gemini-flash"
name = "Gemini 2.5 Flash"
provider = "google"
model = "gemini-2.5-flash"

[[models]]
id = "gpt5-mini"
name = "GPT-5 Mini"
provider = "openai"
model = "gpt-5-mini"

[[models]]
id = "gpt5"
name = "GPT-5"
provider = "openai"
model = "gpt-5"
enabled = false
"#;

const EXAMPLE_PROMPT_SET: &str = r#"[prompt_set]
id = "golden"
name = "Golden buyer questions"
description = "What a buyer asks an assistant before shortlisting a product"

[[prompts]]
id = "positioning"
question = "What is this product and what does it do?"
theme = "Core Positioning"

[[prompts]]
id = "audience"
question = "Who is the primary target user for this product?"
theme = "Target Audience"

[[prompts]]
id = "differentiation"
question = "What makes this product different from competitors?"
theme = "Differentiation"

[[prompts]]
id = "pricing"
question = "What is the pricing model for this product?"
theme = "Pricing"

[[prompts]]
id = "anti-use"
question = "When should someone NOT use this product?"
theme = "Anti-use Cases"
enabled = false

[[metrics]]
id = "1"
name = "Accuracy"
description = "Does the answer describe the product correctly?"
weight = 0.4

[[metrics]]
id = "2"
name = "Feature coverage"
description = "Does the answer mention the features that matter?"
weight = 0.3

[[metrics]]
id = "3"
name = "Differentiation"
description = "Does the answer say how it differs from competitors?"
weight = 0.3
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use perceptor_core::parser::{parse_prompt_set_str, validate_prompt_set};
    use perceptor_providers::PerceptorConfig;

    #[test]
    fn sample_config_parses() {
        let config: PerceptorConfig = toml::from_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.models.len(), 3);
        assert_eq!(config.enabled_models().count(), 2);
        assert!(config.providers.contains_key("google"));
        assert_eq!(config.synthesis_model().unwrap().id, "gpt5-mini");
    }

    #[test]
    fn example_prompt_set_is_valid() {
        let set = parse_prompt_set_str(EXAMPLE_PROMPT_SET, Path::new("golden.toml")).unwrap();
        assert_eq!(set.prompts.len(), 5);
        assert_eq!(set.enabled_prompts().count(), 4);
        assert_eq!(set.metrics.len(), 3);
        assert!(validate_prompt_set(&set).is_empty());
    }
}
