//! Built-in golden questions, scoring metrics, and model roster.

use crate::model::{default_rubric, GoldenPrompt, ModelConfig, ScoringMetric};

/// The default set of buyer-style questions.
pub fn default_golden_prompts() -> Vec<GoldenPrompt> {
    [
        ("What is this product and what does it do?", "Core Positioning"),
        ("Who is the primary target user for this product?", "Target Audience"),
        ("What are the main use cases for this product?", "Use Cases"),
        ("What constraints or limitations does this product have?", "Constraints"),
        ("How does this product scale for different team sizes?", "Scalability"),
        ("What makes this product different from competitors?", "Differentiation"),
        ("What is the pricing model for this product?", "Pricing"),
        ("When should someone NOT use this product?", "Anti-use Cases"),
    ]
    .iter()
    .enumerate()
    .map(|(i, (question, theme))| GoldenPrompt {
        id: (i + 1).to_string(),
        question: (*question).to_string(),
        theme: (*theme).to_string(),
        enabled: true,
    })
    .collect()
}

/// Metric ids that the heuristic scorer produces values for.
pub const ACCURACY_METRIC: &str = "1";
pub const FEATURE_COVERAGE_METRIC: &str = "2";
pub const DIFFERENTIATION_METRIC: &str = "3";

/// The default scoring rubric.
pub fn default_scoring_metrics() -> Vec<ScoringMetric> {
    [
        (
            ACCURACY_METRIC,
            "Accuracy",
            "How factually correct is the response compared to official product information?",
            0.35,
        ),
        (
            FEATURE_COVERAGE_METRIC,
            "Feature Coverage",
            "Does the response mention key features and capabilities correctly?",
            0.30,
        ),
        (
            DIFFERENTIATION_METRIC,
            "Differentiation Clarity",
            "How clearly does the response distinguish this product from alternatives?",
            0.20,
        ),
        (
            "4",
            "Recency",
            "Is the information current or does it reference outdated features/pricing?",
            0.15,
        ),
    ]
    .iter()
    .map(|(id, name, description, weight)| ScoringMetric {
        id: (*id).to_string(),
        name: (*name).to_string(),
        description: (*description).to_string(),
        weight: *weight,
        rubric: default_rubric(),
    })
    .collect()
}

/// The default model roster. Provider keys refer to `[providers.*]` config entries.
pub fn default_models() -> Vec<ModelConfig> {
    vec![
        ModelConfig {
            id: "gemini-flash".into(),
            name: "Gemini 2.5 Flash".into(),
            provider: "google".into(),
            model: Some("gemini-2.5-flash".into()),
            enabled: true,
            temperature: 0.7,
        },
        ModelConfig {
            id: "gemini-pro".into(),
            name: "Gemini 2.5 Pro".into(),
            provider: "google".into(),
            model: Some("gemini-2.5-pro".into()),
            enabled: false,
            temperature: 0.7,
        },
        ModelConfig {
            id: "gpt5-mini".into(),
            name: "GPT-5 Mini".into(),
            provider: "openai".into(),
            model: Some("gpt-5-mini".into()),
            enabled: true,
            temperature: 0.7,
        },
        ModelConfig {
            id: "gpt5".into(),
            name: "GPT-5".into(),
            provider: "openai".into(),
            model: Some("gpt-5".into()),
            enabled: false,
            temperature: 0.7,
        },
    ]
}
