//! Central audit engine.
//!
//! Asks every enabled golden question of every enabled model, scores the
//! answers, synthesizes gaps and fixes, and assembles the report.
//! Questions run one after another; within a question all models are
//! queried concurrently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use futures::future::join_all;
use uuid::Uuid;

use crate::model::{GoldenPrompt, ModelConfig, Project, ScoringMetric};
use crate::prompt::build_question_messages;
use crate::report::{EvaluationReport, ModelResponse, QuestionResult, TraceKind, TraceRecorder};
use crate::scoring::{rubric_scores, score_response};
use crate::statistics::{model_scores, overall_score};
use crate::synthesis::{categorize_fixes, categorize_gaps, synthesize, Synthesis};
use crate::traits::{CompletionRequest, LlmProvider};

/// Configuration for the audit engine.
#[derive(Debug, Clone)]
pub struct AuditEngineConfig {
    /// Max tokens per answer.
    pub max_tokens: u32,
    /// Max tokens for the synthesis call.
    pub synthesis_max_tokens: u32,
    /// Model used for synthesis. Defaults to the first enabled model.
    pub synthesis_model: Option<ModelConfig>,
}

impl Default for AuditEngineConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            synthesis_max_tokens: 2048,
            synthesis_model: None,
        }
    }
}

/// Everything one evaluation run needs.
#[derive(Debug, Clone)]
pub struct AuditPlan {
    pub project: Project,
    pub prompts: Vec<GoldenPrompt>,
    pub metrics: Vec<ScoringMetric>,
    pub models: Vec<ModelConfig>,
    /// Iteration number stamped on the report.
    pub iteration: u32,
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_question_start(&self, index: usize, total: usize, prompt: &GoldenPrompt);
    fn on_response(&self, question_id: &str, response: &ModelResponse);
    fn on_response_error(&self, question_id: &str, model: &str, error: &str);
    fn on_audit_complete(&self, report: &EvaluationReport, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_question_start(&self, _: usize, _: usize, _: &GoldenPrompt) {}
    fn on_response(&self, _: &str, _: &ModelResponse) {}
    fn on_response_error(&self, _: &str, _: &str, _: &str) {}
    fn on_audit_complete(&self, _: &EvaluationReport, _: Duration) {}
}

/// The central audit engine.
pub struct AuditEngine {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
    config: AuditEngineConfig,
}

impl AuditEngine {
    pub fn new(providers: HashMap<String, Arc<dyn LlmProvider>>, config: AuditEngineConfig) -> Self {
        Self { providers, config }
    }

    /// Run one evaluation.
    ///
    /// Provider failures never abort the run: a failed slot gets a
    /// zero-score placeholder and a failed synthesis call falls back to
    /// static content.
    pub async fn run(&self, plan: &AuditPlan, progress: &dyn ProgressReporter) -> Result<EvaluationReport> {
        let start = Instant::now();
        let prompts: Vec<&GoldenPrompt> = plan.prompts.iter().filter(|p| p.enabled).collect();
        let models: Vec<ModelConfig> = plan.models.iter().filter(|m| m.enabled).cloned().collect();
        anyhow::ensure!(!prompts.is_empty(), "no enabled golden prompts");
        anyhow::ensure!(!models.is_empty(), "no enabled models");

        let project = &plan.project;
        let competitors = project.competitors_csv();
        let mut trace = TraceRecorder::new();

        trace.record(
            TraceKind::Fetch,
            "Starting Evaluation",
            format!(
                "Evaluating {} with {} questions across {} model(s)",
                project.name,
                prompts.len(),
                models.len()
            ),
        );

        let mut results = Vec::with_capacity(prompts.len());

        for (idx, prompt) in prompts.iter().enumerate() {
            let question_id = format!("q-{idx}");
            progress.on_question_start(idx, prompts.len(), prompt);
            trace.record(
                TraceKind::Prompt,
                format!("Question {}: {}", idx + 1, prompt.theme),
                prompt.question.clone(),
            );

            let messages = build_question_messages(project, prompt);
            let requests = models.iter().map(|model| {
                let request = CompletionRequest {
                    model: model.wire_model().to_string(),
                    system_prompt: Some(messages.system.clone()),
                    prompt: messages.user.clone(),
                    max_tokens: self.config.max_tokens,
                    temperature: model.temperature,
                    json_response: false,
                };
                async move {
                    let outcome = match self.providers.get(&model.provider) {
                        Some(provider) => provider.complete(&request).await,
                        None => Err(anyhow::anyhow!("provider '{}' not configured", model.provider)),
                    };
                    (model, outcome)
                }
            });

            let mut responses = Vec::with_capacity(models.len());
            for (model, outcome) in join_all(requests).await {
                let response = match outcome {
                    Ok(completion) => {
                        let scores = score_response(&completion.content, &project.name, &competitors);
                        let mut response = ModelResponse::scored(
                            &model.id,
                            &model.name,
                            &completion.content,
                            scores,
                            rubric_scores(&scores, &plan.metrics),
                        );
                        response.latency_ms = Some(completion.latency_ms);
                        trace.record_model(
                            TraceKind::Response,
                            "Response received",
                            format!("Model answered question about {}", prompt.theme),
                            &model.name,
                            Some(completion.latency_ms),
                        );
                        progress.on_response(&question_id, &response);
                        response
                    }
                    Err(e) => {
                        let message = format!("{e:#}");
                        tracing::warn!(
                            question = %question_id,
                            model = %model.id,
                            "provider call failed: {message}"
                        );
                        trace.record_model(
                            TraceKind::Uncertainty,
                            "Response failed",
                            message.clone(),
                            &model.name,
                            None,
                        );
                        progress.on_response_error(&question_id, &model.name, &message);
                        ModelResponse::failed(&model.id, &model.name, &message)
                    }
                };
                responses.push(response);
            }

            trace.record(
                TraceKind::Score,
                format!("Scored: {}", prompt.theme),
                "Applied scoring rubric to evaluate response quality",
            );

            results.push(QuestionResult {
                question_id,
                question: prompt.question.clone(),
                theme: prompt.theme.clone(),
                model_responses: responses,
            });
        }

        let synthesis = self.synthesize(project, &models, &results).await;
        if synthesis.is_fallback {
            trace.record(
                TraceKind::Uncertainty,
                "Synthesis fallback",
                "Summary, gaps, and recommendations use default content",
            );
        }

        let question_ids: Vec<String> = results.iter().map(|r| r.question_id.clone()).collect();
        let gaps = categorize_gaps(&synthesis.detected_gaps, &question_ids);
        let fixes = categorize_fixes(&synthesis.recommendations, &gaps);
        let overall = overall_score(&results);

        trace.record(
            TraceKind::Complete,
            "Evaluation Complete",
            format!("Overall score: {}%", (overall * 100.0).round()),
        );

        let report = EvaluationReport {
            id: Uuid::new_v4(),
            project_id: project.id.clone(),
            project_name: project.name.clone(),
            iteration: plan.iteration,
            timestamp: chrono::Utc::now(),
            overall_score: overall,
            model_scores: model_scores(&results, &models),
            question_results: results,
            gaps,
            fixes,
            summary: synthesis.summary,
            trace_logs: trace.into_logs(),
        };

        progress.on_audit_complete(&report, start.elapsed());
        Ok(report)
    }

    async fn synthesize(
        &self,
        project: &Project,
        models: &[ModelConfig],
        results: &[QuestionResult],
    ) -> Synthesis {
        let fallback = || Synthesis::fallback(&project.name, &project.target_persona.to_string());

        let Some(model) = self.config.synthesis_model.as_ref().or(models.first()) else {
            return fallback();
        };
        let Some(provider) = self.providers.get(&model.provider) else {
            tracing::warn!("synthesis provider '{}' not configured, using fallback", model.provider);
            return fallback();
        };

        synthesize(
            provider.as_ref(),
            model,
            self.config.synthesis_max_tokens,
            project,
            results,
        )
        .await
    }
}
