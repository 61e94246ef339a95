//! Single-call quick audit.
//!
//! Seven fixed questions go to one model, then one judge call scores every
//! answer and writes the summary. Unlike the full audit, failures here are
//! errors: there is no placeholder or fallback content.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::scoring::clamp_unit;
use crate::synthesis::{extract_json_object, Recommendation};
use crate::traits::{CompletionRequest, LlmProvider};

pub const SUPPORTED_QUICK_MODELS: [&str; 2] = ["gpt-4o-mini", "gpt-5-mini"];
pub const DEFAULT_QUICK_MODEL: &str = "gpt-5-mini";

const BUYER_SYSTEM_PROMPT: &str = "You are a potential buyer researching products. Answer \
                                   questions based on your general knowledge. Be concise and direct.";
const EMPTY_ANSWER: &str = "No response generated";
const ANSWER_MAX_TOKENS: u32 = 1024;
const JUDGE_MAX_TOKENS: u32 = 4096;
const QUICK_TEMPERATURE: f64 = 0.7;

/// Fixed question set: (question, question type).
pub const QUICK_QUESTIONS: [(&str, &str); 7] = [
    ("What does this product do?", "Core Function"),
    ("Who is this product for?", "Target Audience"),
    ("What problem does it solve?", "Value Proposition"),
    ("What are its top 3 features?", "Feature Highlights"),
    ("How is it different from competitors?", "Differentiation"),
    ("What is the pricing model?", "Pricing"),
    ("When should someone NOT use this product?", "Limitations"),
];

/// Request body of a quick audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickAuditInput {
    pub product_name: String,
    pub product_url: String,
    /// Comma-separated competitor names.
    #[serde(default)]
    pub competitors: String,
    #[serde(default)]
    pub target_persona: String,
    #[serde(default)]
    pub model: Option<String>,
}

/// Judge sub-scores for one answer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionScores {
    #[serde(default = "neutral_score")]
    pub accuracy: f64,
    #[serde(default = "neutral_score")]
    pub feature_coverage: f64,
    #[serde(default = "neutral_score")]
    pub differentiation_clarity: f64,
}

fn neutral_score() -> f64 {
    0.5
}

impl QuestionScores {
    /// Scores used when the judge skipped an answer.
    pub fn neutral() -> Self {
        Self {
            accuracy: neutral_score(),
            feature_coverage: neutral_score(),
            differentiation_clarity: neutral_score(),
        }
    }

    fn clamped(self) -> Self {
        Self {
            accuracy: clamp_unit(self.accuracy),
            feature_coverage: clamp_unit(self.feature_coverage),
            differentiation_clarity: clamp_unit(self.differentiation_clarity),
        }
    }
}

/// One answered question in the quick audit output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickQuestionResponse {
    pub question: String,
    pub question_type: String,
    pub response: String,
    pub scores: QuestionScores,
    pub risks: Vec<String>,
}

/// Result of a quick audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    pub run_id: String,
    pub product_name: String,
    pub summary: String,
    pub overall_score: f64,
    pub question_responses: Vec<QuickQuestionResponse>,
    pub detected_gaps: Vec<String>,
    pub recommendations: Vec<Recommendation>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JudgeAnalysis {
    #[serde(default)]
    question_analysis: Vec<QuestionAnalysis>,
    #[serde(default)]
    overall_score: f64,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    detected_gaps: Vec<String>,
    #[serde(default)]
    recommendations: Vec<Recommendation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionAnalysis {
    #[serde(default)]
    question_index: Option<usize>,
    #[serde(default)]
    scores: Option<QuestionScores>,
    #[serde(default)]
    risks: Vec<String>,
}

impl JudgeAnalysis {
    /// Analysis entry for the answer at `index`; entries without an
    /// explicit index match by position.
    fn entry(&self, index: usize) -> Option<&QuestionAnalysis> {
        self.question_analysis
            .iter()
            .enumerate()
            .find(|(pos, a)| a.question_index.unwrap_or(*pos) == index)
            .map(|(_, a)| a)
    }
}

/// Pick a supported model, falling back to the default.
pub fn select_model(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|m| SUPPORTED_QUICK_MODELS.iter().copied().find(|s| *s == m))
        .unwrap_or(DEFAULT_QUICK_MODEL)
}

pub fn question_prompt(product_name: &str, product_url: &str, question: &str) -> String {
    format!("As someone researching \"{product_name}\" (website: {product_url}), {question}")
}

struct Answer {
    question: &'static str,
    question_type: &'static str,
    response: String,
}

fn build_judge_prompt(input: &QuickAuditInput, answers: &[Answer]) -> String {
    let competitors = if input.competitors.trim().is_empty() {
        String::new()
    } else {
        format!("Competitors: {}", input.competitors)
    };
    let listing = answers
        .iter()
        .enumerate()
        .map(|(i, a)| {
            format!(
                "{}. {}: \"{}\"\nResponse: {}",
                i + 1,
                a.question_type,
                a.question,
                a.response
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"You are an expert product marketing analyst. Analyze these AI-generated responses about "{name}" ({url}).

Target Persona: {persona}
{competitors}

AI Responses:
{listing}

Provide a JSON analysis with:
1. For each response, score (0-1) for: accuracy, featureCoverage, differentiationClarity
2. Identify risks per response: "incorrect pricing", "missing features", "competitor confusion", "outdated info"
3. Overall perception score (0-1)
4. Summary of how AI perceives this product (2-3 sentences)
5. Detected gaps across all responses
6. 5 specific recommendations with: title, description, priority (high/medium/low), category (faq/homepage/pricing/comparison/messaging)

Return ONLY valid JSON in this exact structure:
{{
  "questionAnalysis": [
    {{
      "questionIndex": 0,
      "scores": {{ "accuracy": 0.8, "featureCoverage": 0.7, "differentiationClarity": 0.6 }},
      "risks": ["missing features"]
    }}
  ],
  "overallScore": 0.72,
  "summary": "AI systems describe the product as...",
  "detectedGaps": ["Missing key feature X", "Unclear pricing"],
  "recommendations": [
    {{
      "title": "Add FAQ about pricing",
      "description": "AI responses show confusion about pricing tiers. Add a clear FAQ entry explaining your pricing model.",
      "priority": "high",
      "category": "faq"
    }}
  ]
}}"#,
        name = input.product_name,
        url = input.product_url,
        persona = input.target_persona,
    )
}

async fn ask(
    provider: &dyn LlmProvider,
    model: &str,
    prompt: String,
    max_tokens: u32,
    json_response: bool,
) -> Result<String> {
    let request = CompletionRequest {
        model: model.to_string(),
        system_prompt: Some(BUYER_SYSTEM_PROMPT.to_string()),
        prompt,
        max_tokens,
        temperature: QUICK_TEMPERATURE,
        json_response,
    };
    let response = provider.complete(&request).await?;
    if response.content.trim().is_empty() {
        Ok(EMPTY_ANSWER.to_string())
    } else {
        Ok(response.content)
    }
}

/// Run a quick audit against one provider.
#[tracing::instrument(skip_all, fields(product = %input.product_name))]
pub async fn run_quick_audit(provider: &dyn LlmProvider, input: &QuickAuditInput) -> Result<AuditSummary> {
    let model = select_model(input.model.as_deref());
    tracing::info!(model, "starting quick audit");

    let mut answers = Vec::with_capacity(QUICK_QUESTIONS.len());
    for (question, question_type) in QUICK_QUESTIONS {
        tracing::debug!(question_type, "querying");
        let prompt = question_prompt(&input.product_name, &input.product_url, question);
        let response = ask(provider, model, prompt, ANSWER_MAX_TOKENS, false)
            .await
            .with_context(|| format!("quick audit question failed: {question_type}"))?;
        answers.push(Answer {
            question,
            question_type,
            response,
        });
    }

    let raw = ask(
        provider,
        model,
        build_judge_prompt(input, &answers),
        JUDGE_MAX_TOKENS,
        true,
    )
    .await
    .context("quick audit analysis call failed")?;
    let json = extract_json_object(&raw).context("failed to parse analysis response")?;
    let analysis: JudgeAnalysis =
        serde_json::from_str(json).context("failed to parse analysis response")?;

    let question_responses = answers
        .into_iter()
        .enumerate()
        .map(|(i, answer)| {
            let entry = analysis.entry(i);
            QuickQuestionResponse {
                question: answer.question.to_string(),
                question_type: answer.question_type.to_string(),
                response: answer.response,
                scores: entry
                    .and_then(|a| a.scores)
                    .map(QuestionScores::clamped)
                    .unwrap_or_else(QuestionScores::neutral),
                risks: entry.map(|a| a.risks.clone()).unwrap_or_default(),
            }
        })
        .collect();

    let mut run_id = uuid::Uuid::new_v4().simple().to_string();
    run_id.truncate(8);

    let summary = AuditSummary {
        run_id,
        product_name: input.product_name.clone(),
        summary: analysis.summary,
        overall_score: clamp_unit(analysis.overall_score),
        question_responses,
        detected_gaps: analysis.detected_gaps,
        recommendations: analysis.recommendations,
        timestamp: chrono::Utc::now(),
    };
    tracing::info!(run_id = %summary.run_id, "quick audit complete");
    Ok(summary)
}
