//! Score aggregation across questions, models, and iterations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::ModelConfig;
use crate::report::{EvaluationReport, ModelScore, QuestionResult};
use crate::scoring::clamp_unit;

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        clamp_unit(sum / n as f64)
    }
}

/// Mean response score across every question and model, placeholders included.
pub fn overall_score(results: &[QuestionResult]) -> f64 {
    mean(
        results
            .iter()
            .flat_map(|q| &q.model_responses)
            .map(|r| r.score),
    )
}

/// Mean response score per model, in roster order.
pub fn model_scores(results: &[QuestionResult], models: &[ModelConfig]) -> Vec<ModelScore> {
    models
        .iter()
        .map(|m| ModelScore {
            model_id: m.id.clone(),
            model_name: m.name.clone(),
            score: mean(
                results
                    .iter()
                    .flat_map(|q| &q.model_responses)
                    .filter(|r| r.model_id == m.id)
                    .map(|r| r.score),
            ),
        })
        .collect()
}

/// Qualitative band of a [0, 1] score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Excellent,
    Good,
    Warning,
    Danger,
}

impl ScoreBand {
    pub fn of(score: f64) -> Self {
        if score >= 0.8 {
            ScoreBand::Excellent
        } else if score >= 0.6 {
            ScoreBand::Good
        } else if score >= 0.4 {
            ScoreBand::Warning
        } else {
            ScoreBand::Danger
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreBand::Excellent => write!(f, "excellent"),
            ScoreBand::Good => write!(f, "good"),
            ScoreBand::Warning => write!(f, "warning"),
            ScoreBand::Danger => write!(f, "danger"),
        }
    }
}

/// One report's position in a project's score history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendPoint {
    pub iteration: u32,
    pub overall_score: f64,
    /// Change from the previous iteration, absent for the first.
    pub delta: Option<f64>,
}

/// Overall-score trend of a project's reports, ordered by iteration.
pub fn score_trend(reports: &[EvaluationReport]) -> Vec<TrendPoint> {
    let mut ordered: Vec<&EvaluationReport> = reports.iter().collect();
    ordered.sort_by_key(|r| r.iteration);

    let mut previous: Option<f64> = None;
    ordered
        .into_iter()
        .map(|r| {
            let point = TrendPoint {
                iteration: r.iteration,
                overall_score: r.overall_score,
                delta: previous.map(|p| r.overall_score - p),
            };
            previous = Some(r.overall_score);
            point
        })
        .collect()
}
