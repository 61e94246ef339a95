//! End-to-end pipeline tests: engine, mock provider, store and renderers.
//!
//! These tests run a whole audit without network access and check that
//! what lands in the store and in rendered reports is consistent.

use std::collections::HashMap;
use std::sync::Arc;

use perceptor_core::defaults::{default_golden_prompts, default_scoring_metrics};
use perceptor_core::engine::{AuditEngine, AuditEngineConfig, AuditPlan, NoopReporter};
use perceptor_core::model::{ModelConfig, Project};
use perceptor_core::report::{EvaluationReport, FAILED_RESPONSE_TEXT};
use perceptor_core::store::{AuditStore, JsonFileStore};
use perceptor_core::traits::LlmProvider;
use perceptor_providers::mock::MockProvider;
use perceptor_report::{generate_html, generate_markdown};

const ANSWER: &str = "Acme is a tool that allows users to manage tasks.\n- feature one\n- feature two";

const SYNTHESIS: &str = r#"{
  "summary": "Assistants describe Acme as a task manager for small teams.",
  "detectedGaps": ["Pricing is unclear", "No comparison with Trello", "Integrations are unknown"],
  "recommendations": [
    {"title": "Publish pricing", "description": "Add a pricing page.", "priority": "high", "category": "pricing"},
    {"title": "Write a Trello comparison", "description": "Explain the differences.", "priority": "medium", "category": "comparison"}
  ]
}"#;

fn model(id: &str) -> ModelConfig {
    ModelConfig {
        id: id.into(),
        name: id.to_uppercase(),
        provider: "mock".into(),
        model: None,
        enabled: true,
        temperature: 0.7,
    }
}

fn project() -> Project {
    let mut project = Project::new("Acme", "https://acme.dev");
    project.description = "Task management for small teams".into();
    project
}

fn engine(provider: MockProvider) -> AuditEngine {
    let mut providers: HashMap<String, Arc<dyn LlmProvider>> = HashMap::new();
    providers.insert("mock".into(), Arc::new(provider));
    AuditEngine::new(providers, AuditEngineConfig::default())
}

fn plan(project: Project, models: Vec<ModelConfig>, iteration: u32) -> AuditPlan {
    AuditPlan {
        project,
        prompts: default_golden_prompts(),
        metrics: default_scoring_metrics(),
        models,
        iteration,
    }
}

#[tokio::test]
async fn e2e_audit_scores_every_slot() {
    let provider = MockProvider::with_fixed_response(ANSWER).with_json_response(SYNTHESIS);
    let report = engine(provider)
        .run(&plan(project(), vec![model("alpha"), model("beta")], 1), &NoopReporter)
        .await
        .unwrap();

    assert_eq!(report.question_results.len(), 8);
    for q in &report.question_results {
        assert_eq!(q.model_responses.len(), 2);
        for r in &q.model_responses {
            assert!(r.error.is_none());
            assert!((r.scores.feature_coverage - 0.8).abs() < 1e-9);
            assert!((r.scores.accuracy - 0.9).abs() < 1e-9);
        }
    }
    assert_eq!(report.model_scores.len(), 2);
    assert_eq!(report.summary, "Assistants describe Acme as a task manager for small teams.");
    assert_eq!(report.gaps.len(), 3);
    assert_eq!(report.fixes.len(), 2);
    assert!(report.overall_score > 0.0 && report.overall_score <= 1.0);
}

#[tokio::test]
async fn e2e_failing_model_gets_placeholders() {
    let provider = MockProvider::with_fixed_response(ANSWER)
        .with_json_response(SYNTHESIS)
        .failing_for("beta");
    let report = engine(provider)
        .run(&plan(project(), vec![model("alpha"), model("beta")], 1), &NoopReporter)
        .await
        .unwrap();

    assert_eq!(report.failed_responses(), 8);
    for q in &report.question_results {
        let alpha = q.model_responses.iter().find(|r| r.model_id == "alpha").unwrap();
        let beta = q.model_responses.iter().find(|r| r.model_id == "beta").unwrap();
        assert!(alpha.score > 0.0);
        assert_eq!(beta.score, 0.0);
        assert_eq!(beta.response, FAILED_RESPONSE_TEXT);
    }

    let beta_score = report.model_scores.iter().find(|m| m.model_id == "beta").unwrap();
    assert_eq!(beta_score.score, 0.0);
}

#[tokio::test]
async fn e2e_unparseable_synthesis_uses_fallback() {
    let provider = MockProvider::with_fixed_response(ANSWER).with_json_response("not json at all");
    let report = engine(provider)
        .run(&plan(project(), vec![model("alpha")], 1), &NoopReporter)
        .await
        .unwrap();

    assert_eq!(report.gaps.len(), 4);
    assert_eq!(report.fixes.len(), 3);
    assert!(report.summary.starts_with("The evaluation of Acme"));
}

#[tokio::test]
async fn e2e_store_round_trip_and_rendering() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::open(dir.path()).unwrap();
    let project = project();
    store.save_project(&project).unwrap();

    let engine = engine(MockProvider::with_fixed_response(ANSWER).with_json_response(SYNTHESIS));

    for expected in 1..=2 {
        let iteration = store.next_iteration(&project.id).unwrap();
        assert_eq!(iteration, expected);
        let report = engine
            .run(&plan(project.clone(), vec![model("alpha")], iteration), &NoopReporter)
            .await
            .unwrap();
        let saved = store.save_report(report).unwrap();
        assert_eq!(saved.iteration, expected);
    }

    let reports = store.project_reports(&project.id).unwrap();
    assert_eq!(reports.len(), 2);
    let stored_project = store.get_project(&project.id).unwrap().unwrap();
    assert_eq!(stored_project.evaluation_count, 2);
    assert_eq!(stored_project.last_score, Some(reports[1].overall_score));

    // Reopening reads the same data back.
    let reopened = JsonFileStore::open(dir.path()).unwrap();
    let latest: EvaluationReport = reopened.get_report(&reports[1].id).unwrap().unwrap();
    assert_eq!(latest, reports[1]);

    let html = generate_html(&latest);
    assert!(html.contains("Acme"));
    assert!(html.contains("Publish pricing"));

    let md = generate_markdown(&latest);
    assert!(md.contains("# Perception audit: Acme"));
    assert!(md.contains("Pricing is unclear"));
}
