//! Report synthesis: one extra LLM call that turns every Q&A pair into a
//! summary, gap list, and recommendations, with a static fallback.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SynthesisError;
use crate::model::{ModelConfig, Priority, Project};
use crate::prompt::build_synthesis_prompt;
use crate::report::{Fix, FixCategory, Gap, GapType, QuestionResult};
use crate::traits::{CompletionRequest, LlmProvider};

/// Category a recommendation targets, as named by the synthesis model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationCategory {
    Faq,
    Homepage,
    Pricing,
    Comparison,
    Messaging,
    #[serde(other)]
    Other,
}

impl RecommendationCategory {
    /// The fix category a recommendation lands in.
    pub fn fix_category(self) -> FixCategory {
        match self {
            RecommendationCategory::Faq | RecommendationCategory::Homepage => {
                FixCategory::Explainability
            }
            RecommendationCategory::Pricing => FixCategory::Context,
            RecommendationCategory::Comparison => FixCategory::Positioning,
            RecommendationCategory::Messaging | RecommendationCategory::Other => {
                FixCategory::Roadmap
            }
        }
    }
}

/// A recommendation as returned by the synthesis model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: RecommendationCategory,
}

/// Summary, gaps, and recommendations for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synthesis {
    pub summary: String,
    pub detected_gaps: Vec<String>,
    pub recommendations: Vec<Recommendation>,
    /// True when nothing from the model output was used.
    #[serde(default)]
    pub is_fallback: bool,
}

impl Synthesis {
    /// The static content used when the synthesis call fails.
    pub fn fallback(product_name: &str, persona: &str) -> Self {
        Self {
            summary: format!(
                "The evaluation of {product_name} reveals a solid foundation but highlights key \
                 areas for improvement in clarity and differentiation. The AI persona ({persona}) \
                 found the core features promising but struggled to understand the unique selling \
                 points immediately."
            ),
            detected_gaps: vec![
                "Value proposition is not immediately clear on the landing page".into(),
                "Pricing transparency is lacking compared to competitors".into(),
                "Technical documentation is difficult to navigate for new users".into(),
                "Differentiation from major competitors is weak in the messaging".into(),
            ],
            recommendations: vec![
                Recommendation {
                    title: "Clarify Value Proposition".into(),
                    description: "Rewrite the hero section to clearly state what the product \
                                  does in 5 seconds."
                        .into(),
                    priority: Priority::High,
                    category: RecommendationCategory::Homepage,
                },
                Recommendation {
                    title: "Add Pricing Examples".into(),
                    description: "Show concrete examples of pricing tiers to reduce friction."
                        .into(),
                    priority: Priority::Medium,
                    category: RecommendationCategory::Pricing,
                },
                Recommendation {
                    title: "Create Comparison Page".into(),
                    description: "Directly address how you compare to the listed competitors."
                        .into(),
                    priority: Priority::High,
                    category: RecommendationCategory::Comparison,
                },
            ],
            is_fallback: true,
        }
    }

    /// Overlay whichever fields of the model output are present and well-typed.
    ///
    /// A missing or malformed field keeps the current value.
    pub fn apply_response(&mut self, text: &str) -> Result<(), SynthesisError> {
        let json = extract_json_object(text).ok_or(SynthesisError::NoJsonObject)?;
        let value: Value = serde_json::from_str(json)?;

        if let Some(summary) = value.get("summary").and_then(Value::as_str) {
            if !summary.trim().is_empty() {
                self.summary = summary.to_string();
                self.is_fallback = false;
            }
        }

        if let Some(gaps) = value.get("detectedGaps").and_then(Value::as_array) {
            let strings: Option<Vec<String>> = gaps
                .iter()
                .map(|g| g.as_str().map(str::to_string))
                .collect();
            match strings {
                Some(gaps) => {
                    self.detected_gaps = gaps;
                    self.is_fallback = false;
                }
                None => tracing::warn!("synthesis detectedGaps contains non-string entries"),
            }
        }

        if let Some(recs) = value.get("recommendations").filter(|v| v.is_array()) {
            match serde_json::from_value::<Vec<Recommendation>>(recs.clone()) {
                Ok(recs) => {
                    self.recommendations = recs;
                    self.is_fallback = false;
                }
                Err(e) => tracing::warn!("synthesis recommendations malformed: {e}"),
            }
        }

        Ok(())
    }
}

/// Find the outermost `{ ... }` span in model output.
///
/// Tolerates prose and markdown fences around the object.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Run the synthesis call. Never fails: any error yields the fallback.
pub async fn synthesize(
    provider: &dyn LlmProvider,
    model: &ModelConfig,
    max_tokens: u32,
    project: &Project,
    results: &[QuestionResult],
) -> Synthesis {
    let mut synthesis =
        Synthesis::fallback(&project.name, &project.target_persona.to_string());

    let request = CompletionRequest {
        model: model.wire_model().to_string(),
        system_prompt: Some(build_synthesis_prompt(project, results)),
        prompt: "Return the JSON analysis now.".to_string(),
        max_tokens,
        temperature: model.temperature,
        json_response: true,
    };

    match provider.complete(&request).await {
        Ok(response) => {
            if let Err(e) = synthesis.apply_response(&response.content) {
                tracing::warn!("synthesis output unusable, using fallback: {e}");
            }
        }
        Err(e) => tracing::warn!("synthesis call failed, using fallback: {e:#}"),
    }

    synthesis
}

const GAP_DESCRIPTION: &str = "This issue was detected across multiple AI responses and may \
                               affect how buyers perceive your product.";

fn gap_type_for(index: usize) -> GapType {
    match index % 4 {
        0 => GapType::Missing,
        1 => GapType::Incorrect,
        2 => GapType::Weak,
        _ => GapType::Hallucinated,
    }
}

fn business_impact(gap_type: GapType) -> &'static str {
    match gap_type {
        GapType::Missing => "Buyers researching with AI assistants may never hear about this.",
        GapType::Incorrect => "Buyers may rule the product out based on wrong information.",
        GapType::Weak => "Buyers may not find the product compelling against alternatives.",
        GapType::Hallucinated => "Buyers may expect capabilities or terms that do not exist.",
    }
}

/// Turn gap strings into categorized gaps.
///
/// Types cycle missing, incorrect, weak, hallucinated; the first two gaps
/// are high severity, the next two medium, the rest low. Each gap points at
/// the first three questions.
pub fn categorize_gaps(gaps: &[String], question_ids: &[String]) -> Vec<Gap> {
    let affected: Vec<String> = question_ids.iter().take(3).cloned().collect();

    gaps.iter()
        .enumerate()
        .map(|(i, title)| {
            let gap_type = gap_type_for(i);
            Gap {
                id: format!("gap-{i}"),
                gap_type,
                title: title.clone(),
                description: GAP_DESCRIPTION.to_string(),
                business_impact: business_impact(gap_type).to_string(),
                severity: match i {
                    0 | 1 => Priority::High,
                    2 | 3 => Priority::Medium,
                    _ => Priority::Low,
                },
                affected_questions: affected.clone(),
            }
        })
        .collect()
}

/// Turn recommendations into fixes linked to the first two gaps.
pub fn categorize_fixes(recommendations: &[Recommendation], gaps: &[Gap]) -> Vec<Fix> {
    let related: Vec<String> = gaps.iter().take(2).map(|g| g.id.clone()).collect();

    recommendations
        .iter()
        .enumerate()
        .map(|(i, rec)| Fix {
            id: format!("fix-{i}"),
            category: rec.category.fix_category(),
            title: rec.title.clone(),
            description: rec.description.clone(),
            priority: rec.priority,
            related_gaps: related.clone(),
        })
        .collect()
}
