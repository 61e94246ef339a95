//! Prompt construction.
//!
//! Each golden question becomes a system+user message pair: the system
//! message casts the model as an uninformed buyer, the user message is the
//! question itself.

use serde::Serialize;

use crate::model::{GoldenPrompt, Project};
use crate::report::QuestionResult;

/// A system+user message pair ready to send to a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptMessages {
    pub system: String,
    pub user: String,
}

/// Build the buyer-persona messages for one golden question.
pub fn build_question_messages(project: &Project, prompt: &GoldenPrompt) -> PromptMessages {
    let competitors = if project.competitors.is_empty() {
        "none specified".to_string()
    } else {
        project.competitors_csv()
    };

    let system = format!(
        "You are a potential buyer evaluating {name}. You are an uninformed buyer with no prior \
         product exposure. Your target persona is: {persona}. You are looking at the product \
         website: {url}. Competitors you might know: {competitors}. Answer the following question \
         based ONLY on what a first-time visitor would perceive from the public website \
         (simulated). Be critical and honest.",
        name = project.name,
        persona = project.target_persona,
        url = project.website_url,
    );

    PromptMessages {
        system,
        user: prompt.question.clone(),
    }
}

#[derive(Serialize)]
struct QaPair<'a> {
    q: &'a str,
    a: &'a str,
}

/// Build the single synthesis prompt covering every question/answer pair.
pub fn build_synthesis_prompt(project: &Project, results: &[QuestionResult]) -> String {
    let pairs: Vec<QaPair<'_>> = results
        .iter()
        .flat_map(|r| {
            r.model_responses.iter().map(move |m| QaPair {
                q: &r.question,
                a: &m.response,
            })
        })
        .collect();
    let qa_json = serde_json::to_string(&pairs).unwrap_or_else(|_| "[]".to_string());

    format!(
        "You are a product strategy consultant. Analyze the following Q&A about {name} and \
         generate a summary, 4 key gaps, and 3 recommendations.\n\n\
         Q&A Data:\n{qa_json}\n\n\
         Return valid JSON with keys: summary (string), detectedGaps (array of strings), \
         recommendations (array of objects with title, description, priority, category).\n\
         Categories: faq, homepage, pricing, comparison, messaging.\n\
         Priorities: high, medium, low.",
        name = project.name,
    )
}
