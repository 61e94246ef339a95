//! Evaluation report types with JSON persistence and iteration comparison.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Priority, Severity};
use crate::scoring::{MetricScore, SubScores};

/// Text stored in place of a response when the provider call failed.
pub const FAILED_RESPONSE_TEXT: &str = "Failed to generate response due to API error.";

/// One model's answer to one golden question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub model_id: String,
    pub model_name: String,
    /// Raw response text.
    pub response: String,
    /// Mean of the sub-scores, in [0, 1].
    pub score: f64,
    pub scores: SubScores,
    /// Rubric levels for metrics that have a heuristic counterpart.
    #[serde(default)]
    pub metric_scores: Vec<MetricScore>,
    #[serde(default)]
    pub rubric_details: String,
    #[serde(default)]
    pub latency_ms: Option<u64>,
    /// Provider error, when this slot is a placeholder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModelResponse {
    pub fn scored(
        model_id: &str,
        model_name: &str,
        response: &str,
        scores: SubScores,
        metric_scores: Vec<MetricScore>,
    ) -> Self {
        Self {
            model_id: model_id.to_string(),
            model_name: model_name.to_string(),
            response: response.to_string(),
            score: scores.mean(),
            rubric_details: scores.rubric_details(),
            scores,
            metric_scores,
            latency_ms: None,
            error: None,
        }
    }

    /// Zero-score placeholder for a failed provider call.
    pub fn failed(model_id: &str, model_name: &str, error: &str) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::scored(model_id, model_name, FAILED_RESPONSE_TEXT, SubScores::zero(), vec![])
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.error.is_some()
    }
}

/// Every model's answer to one golden question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_id: String,
    pub question: String,
    pub theme: String,
    pub model_responses: Vec<ModelResponse>,
}

/// Kind of deficiency detected in aggregate responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapType {
    Missing,
    Incorrect,
    Weak,
    Hallucinated,
}

impl fmt::Display for GapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GapType::Missing => write!(f, "missing"),
            GapType::Incorrect => write!(f, "incorrect"),
            GapType::Weak => write!(f, "weak"),
            GapType::Hallucinated => write!(f, "hallucinated"),
        }
    }
}

/// A categorized deficiency in how the models describe the product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    pub id: String,
    #[serde(rename = "type")]
    pub gap_type: GapType,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub business_impact: String,
    pub severity: Severity,
    pub affected_questions: Vec<String>,
}

/// Area a fix belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixCategory {
    Context,
    Explainability,
    Positioning,
    Roadmap,
}

impl fmt::Display for FixCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixCategory::Context => write!(f, "context"),
            FixCategory::Explainability => write!(f, "explainability"),
            FixCategory::Positioning => write!(f, "positioning"),
            FixCategory::Roadmap => write!(f, "roadmap"),
        }
    }
}

/// A recommended corrective action tied to one or more gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub id: String,
    pub category: FixCategory,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub related_gaps: Vec<String>,
}

/// Mean score of one model across all questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelScore {
    pub model_id: String,
    pub model_name: String,
    pub score: f64,
}

/// Kind of a trace log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    Fetch,
    Extract,
    Prompt,
    Response,
    Score,
    Complete,
    Uncertainty,
}

impl fmt::Display for TraceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TraceKind::Fetch => "fetch",
            TraceKind::Extract => "extract",
            TraceKind::Prompt => "prompt",
            TraceKind::Response => "response",
            TraceKind::Score => "score",
            TraceKind::Complete => "complete",
            TraceKind::Uncertainty => "uncertainty",
        };
        f.write_str(label)
    }
}

/// A timestamped step of an evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceLog {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub kind: TraceKind,
    pub title: String,
    pub details: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

/// Accumulates trace logs during a run.
#[derive(Debug, Default)]
pub struct TraceRecorder {
    logs: Vec<TraceLog>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: TraceKind, title: impl Into<String>, details: impl Into<String>) {
        self.push(kind, title.into(), details.into(), None, None);
    }

    pub fn record_model(
        &mut self,
        kind: TraceKind,
        title: impl Into<String>,
        details: impl Into<String>,
        model: &str,
        duration_ms: Option<u64>,
    ) {
        self.push(kind, title.into(), details.into(), Some(model.to_string()), duration_ms);
    }

    fn push(
        &mut self,
        kind: TraceKind,
        title: String,
        details: String,
        model: Option<String>,
        duration_ms: Option<u64>,
    ) {
        tracing::debug!(?kind, %title, %details, "trace");
        self.logs.push(TraceLog {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind,
            title,
            details,
            model,
            duration_ms,
        });
    }

    pub fn logs(&self) -> &[TraceLog] {
        &self.logs
    }

    pub fn into_logs(self) -> Vec<TraceLog> {
        self.logs
    }
}

/// A complete evaluation report for one run of one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Unique report identifier.
    pub id: Uuid,
    pub project_id: String,
    pub project_name: String,
    /// 1-based run number within the project.
    pub iteration: u32,
    pub timestamp: DateTime<Utc>,
    /// Mean response score across every model and question.
    pub overall_score: f64,
    pub model_scores: Vec<ModelScore>,
    pub question_results: Vec<QuestionResult>,
    pub gaps: Vec<Gap>,
    pub fixes: Vec<Fix>,
    pub summary: String,
    #[serde(default)]
    pub trace_logs: Vec<TraceLog>,
}

impl EvaluationReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: EvaluationReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Number of response slots that hold a failure placeholder.
    pub fn failed_responses(&self) -> usize {
        self.question_results
            .iter()
            .flat_map(|q| &q.model_responses)
            .filter(|r| r.is_placeholder())
            .count()
    }

    /// Compare this report against a baseline, keyed by (theme, question, model).
    pub fn compare(&self, baseline: &EvaluationReport, threshold: f64) -> ComparisonReport {
        // Themes repeat across prompt sets; the question text tells them apart.
        let score_map = |report: &EvaluationReport| -> HashMap<(String, String, String), f64> {
            let mut map = HashMap::new();
            for q in &report.question_results {
                for r in &q.model_responses {
                    map.insert(
                        (q.theme.clone(), q.question.clone(), r.model_id.clone()),
                        r.score,
                    );
                }
            }
            map
        };

        let baseline_scores = score_map(baseline);
        let current_scores = score_map(self);

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_pairs = 0usize;

        for (key, &current) in &current_scores {
            let Some(&baseline_val) = baseline_scores.get(key) else {
                new_pairs += 1;
                continue;
            };
            let delta = current - baseline_val;
            let change = ScoreChange {
                theme: key.0.clone(),
                question: key.1.clone(),
                model: key.2.clone(),
                baseline_score: baseline_val,
                current_score: current,
                delta,
            };
            if delta < -threshold {
                regressions.push(change);
            } else if delta > threshold {
                improvements.push(change);
            } else {
                unchanged += 1;
            }
        }

        let removed_pairs = baseline_scores
            .keys()
            .filter(|k| !current_scores.contains_key(k))
            .count();

        regressions.sort_by(|a, b| a.delta.total_cmp(&b.delta));
        improvements.sort_by(|a, b| b.delta.total_cmp(&a.delta));

        ComparisonReport {
            baseline_iteration: baseline.iteration,
            current_iteration: self.iteration,
            overall_delta: self.overall_score - baseline.overall_score,
            regressions,
            improvements,
            unchanged,
            new_pairs,
            removed_pairs,
        }
    }
}

/// Result of comparing two reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub baseline_iteration: u32,
    pub current_iteration: u32,
    pub overall_delta: f64,
    /// Pairs whose score went down.
    pub regressions: Vec<ScoreChange>,
    /// Pairs whose score went up.
    pub improvements: Vec<ScoreChange>,
    /// Pairs with no significant change.
    pub unchanged: usize,
    /// Pairs in current but not baseline.
    pub new_pairs: usize,
    /// Pairs in baseline but not current.
    pub removed_pairs: usize,
}

/// Score movement of one (theme, model) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreChange {
    pub theme: String,
    #[serde(default)]
    pub question: String,
    pub model: String,
    pub baseline_score: f64,
    pub current_score: f64,
    pub delta: f64,
}

impl ComparisonReport {
    /// Format the comparison as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Iteration {} → {}:** overall {:+.1}%, {} regressions, {} improvements, {} unchanged\n\n",
            self.baseline_iteration,
            self.current_iteration,
            self.overall_delta * 100.0,
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged
        ));

        for (heading, changes) in [
            ("Regressions", &self.regressions),
            ("Improvements", &self.improvements),
        ] {
            if changes.is_empty() {
                continue;
            }
            md.push_str(&format!("### {heading}\n\n"));
            md.push_str("| Theme | Model | Baseline | Current | Delta |\n");
            md.push_str("|-------|-------|----------|---------|-------|\n");
            for c in changes {
                md.push_str(&format!(
                    "| {} | {} | {:.1}% | {:.1}% | {:+.1}% |\n",
                    c.theme,
                    c.model,
                    c.baseline_score * 100.0,
                    c.current_score * 100.0,
                    c.delta * 100.0
                ));
            }
            md.push('\n');
        }

        md
    }

    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_response(model: &str, score: f64) -> ModelResponse {
        let scores = SubScores {
            accuracy: score,
            feature_coverage: score,
            differentiation_clarity: score,
        };
        ModelResponse::scored(model, model, "answer", scores, vec![])
    }

    pub(crate) fn make_report(iteration: u32, entries: &[(&str, &str, f64)]) -> EvaluationReport {
        let mut by_theme: Vec<QuestionResult> = Vec::new();
        for (theme, model, score) in entries {
            let idx = match by_theme.iter().position(|q| q.theme == *theme) {
                Some(idx) => idx,
                None => {
                    by_theme.push(QuestionResult {
                        question_id: format!("q-{}", by_theme.len()),
                        question: format!("About {theme}?"),
                        theme: theme.to_string(),
                        model_responses: vec![],
                    });
                    by_theme.len() - 1
                }
            };
            by_theme[idx].model_responses.push(make_response(model, *score));
        }

        EvaluationReport {
            id: Uuid::nil(),
            project_id: "p1".into(),
            project_name: "Acme".into(),
            iteration,
            timestamp: Utc::now(),
            overall_score: crate::statistics::overall_score(&by_theme),
            model_scores: vec![],
            question_results: by_theme,
            gaps: vec![],
            fixes: vec![],
            summary: "summary".into(),
            trace_logs: vec![],
        }
    }

    #[test]
    fn failed_placeholder_has_zero_score() {
        let r = ModelResponse::failed("m", "M", "HTTP 500");
        assert_eq!(r.score, 0.0);
        assert_eq!(r.response, FAILED_RESPONSE_TEXT);
        assert!(r.is_placeholder());
    }

    #[test]
    fn compare_identical_reports() {
        let baseline = make_report(1, &[("Pricing", "m1", 0.7)]);
        let current = make_report(2, &[("Pricing", "m1", 0.7)]);
        let cmp = current.compare(&baseline, 0.05);
        assert!(cmp.regressions.is_empty());
        assert!(cmp.improvements.is_empty());
        assert_eq!(cmp.unchanged, 1);
        assert_eq!(cmp.current_iteration, 2);
    }

    #[test]
    fn compare_with_regression_and_improvement() {
        let baseline = make_report(1, &[("Pricing", "m1", 0.8), ("Core", "m1", 0.3)]);
        let current = make_report(2, &[("Pricing", "m1", 0.4), ("Core", "m1", 0.9)]);
        let cmp = current.compare(&baseline, 0.05);
        assert_eq!(cmp.regressions.len(), 1);
        assert_eq!(cmp.regressions[0].theme, "Pricing");
        assert_eq!(cmp.improvements.len(), 1);
        assert!(cmp.has_regressions());
        let md = cmp.to_markdown();
        assert!(md.contains("### Regressions"));
        assert!(md.contains("| Core | m1 |"));
    }

    #[test]
    fn compare_with_new_and_removed() {
        let baseline = make_report(1, &[("Old", "m1", 0.5)]);
        let current = make_report(2, &[("New", "m1", 0.5)]);
        let cmp = current.compare(&baseline, 0.05);
        assert_eq!(cmp.new_pairs, 1);
        assert_eq!(cmp.removed_pairs, 1);
    }

    #[test]
    fn compare_keeps_questions_sharing_a_theme_apart() {
        let pricing = |question: &str, score: f64| QuestionResult {
            question_id: question.to_lowercase(),
            question: question.into(),
            theme: "Pricing".into(),
            model_responses: vec![make_response("m1", score)],
        };
        let mut baseline = make_report(1, &[]);
        baseline.question_results = vec![pricing("What does it cost?", 0.9), pricing("Is there a free tier?", 0.9)];
        let mut current = make_report(2, &[]);
        current.question_results = vec![pricing("What does it cost?", 0.1), pricing("Is there a free tier?", 0.9)];

        let cmp = current.compare(&baseline, 0.05);
        assert_eq!(cmp.regressions.len(), 1);
        assert_eq!(cmp.regressions[0].question, "What does it cost?");
        assert!((cmp.regressions[0].delta + 0.8).abs() < 1e-9);
        assert_eq!(cmp.unchanged, 1);
        assert_eq!(cmp.new_pairs, 0);
        assert_eq!(cmp.removed_pairs, 0);
    }

    #[test]
    fn json_roundtrip_is_lossless() {
        let mut report = make_report(3, &[("Pricing", "m1", 0.123456789), ("Core", "m2", 0.1)]);
        report.gaps.push(Gap {
            id: "gap-0".into(),
            gap_type: GapType::Hallucinated,
            title: "Invented pricing".into(),
            description: "d".into(),
            business_impact: String::new(),
            severity: Severity::High,
            affected_questions: vec!["q-0".into()],
        });
        report.fixes.push(Fix {
            id: "fix-0".into(),
            category: FixCategory::Positioning,
            title: "t".into(),
            description: "d".into(),
            priority: Priority::Low,
            related_gaps: vec!["gap-0".into()],
        });
        report.question_results[0].model_responses[0] = ModelResponse::failed("m1", "m1", "boom");
        let mut trace = TraceRecorder::new();
        trace.record_model(TraceKind::Response, "Response received", "ok", "m1", Some(42));
        report.trace_logs = trace.into_logs();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");
        report.save_json(&path).unwrap();
        let loaded = EvaluationReport::load_json(&path).unwrap();

        assert_eq!(loaded, report);
    }

    #[test]
    fn gap_type_serializes_as_type_field() {
        let gap = Gap {
            id: "gap-1".into(),
            gap_type: GapType::Weak,
            title: "t".into(),
            description: "d".into(),
            business_impact: String::new(),
            severity: Severity::Medium,
            affected_questions: vec![],
        };
        let json = serde_json::to_value(&gap).unwrap();
        assert_eq!(json["type"], "weak");
        assert_eq!(json["severity"], "medium");
    }
}
