//! Heuristic response scoring.
//!
//! Derives three bounded sub-scores from free-text model output using
//! keyword and length checks. The scorer is pure: the same text, product
//! name, and competitor list always produce the same scores.

use serde::{Deserialize, Serialize};

use crate::defaults::{ACCURACY_METRIC, DIFFERENTIATION_METRIC, FEATURE_COVERAGE_METRIC};
use crate::model::ScoringMetric;

/// Phrases that indicate the model refused or could not look at the product.
const DISQUALIFYING_PHRASES: [&str; 2] = ["cannot access", "unable to browse"];

const FEATURE_KEYWORDS: [&str; 6] = [
    "feature",
    "capability",
    "allows",
    "enables",
    "support",
    "provide",
];

const LIST_MARKERS: [&str; 3] = ["- ", "* ", "1. "];

const COMPARISON_KEYWORDS: [&str; 7] = [
    "unlike", "compared", "versus", "vs", "better", "distinct", "unique",
];

const ACCURACY_BASE: f64 = 0.5;
const NAME_MATCH_BONUS: f64 = 0.2;
const NO_REFUSAL_BONUS: f64 = 0.2;
const LENGTH_BONUS: f64 = 0.1;
const LENGTH_THRESHOLD: usize = 200;

const COVERAGE_BASE: f64 = 0.4;
const FEATURE_KEYWORD_STEP: f64 = 0.05;
const FEATURE_KEYWORD_CAP: f64 = 0.3;
const LIST_BONUS: f64 = 0.3;

const DIFFERENTIATION_BASE: f64 = 0.3;
const COMPETITOR_STEP: f64 = 0.15;
const COMPETITOR_CAP: f64 = 0.4;
const COMPARISON_STEP: f64 = 0.1;
const COMPARISON_CAP: f64 = 0.3;

/// The three heuristic sub-scores of a response, each in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub accuracy: f64,
    pub feature_coverage: f64,
    pub differentiation_clarity: f64,
}

impl SubScores {
    /// All-zero scores used for failed requests.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Clamp every component into [0, 1].
    pub fn clamped(self) -> Self {
        Self {
            accuracy: clamp_unit(self.accuracy),
            feature_coverage: clamp_unit(self.feature_coverage),
            differentiation_clarity: clamp_unit(self.differentiation_clarity),
        }
    }

    /// Unweighted mean of the three sub-scores.
    pub fn mean(&self) -> f64 {
        clamp_unit((self.accuracy + self.feature_coverage + self.differentiation_clarity) / 3.0)
    }

    /// Human-readable percentage breakdown.
    pub fn rubric_details(&self) -> String {
        format!(
            "Accuracy: {}%, Coverage: {}%, Clarity: {}%",
            (self.accuracy * 100.0).round(),
            (self.feature_coverage * 100.0).round(),
            (self.differentiation_clarity * 100.0).round()
        )
    }

    /// The sub-score that backs a rubric metric, if the heuristic has one.
    fn for_metric(&self, metric_id: &str) -> Option<f64> {
        match metric_id {
            ACCURACY_METRIC => Some(self.accuracy),
            FEATURE_COVERAGE_METRIC => Some(self.feature_coverage),
            DIFFERENTIATION_METRIC => Some(self.differentiation_clarity),
            _ => None,
        }
    }
}

/// Clamp a score into [0, 1]. NaN maps to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Score a response.
///
/// `competitors` is a comma-separated list; empty entries are ignored and
/// repeated names only count once.
pub fn score_response(text: &str, product_name: &str, competitors: &str) -> SubScores {
    let lower = text.to_lowercase();

    SubScores {
        accuracy: accuracy(&lower, text, product_name),
        feature_coverage: feature_coverage(&lower),
        differentiation_clarity: differentiation_clarity(&lower, competitors),
    }
    .clamped()
}

fn accuracy(lower: &str, original: &str, product_name: &str) -> f64 {
    let mut score = ACCURACY_BASE;

    let name = product_name.trim().to_lowercase();
    if !name.is_empty() && lower.contains(&name) {
        score += NAME_MATCH_BONUS;
    }
    if !DISQUALIFYING_PHRASES.iter().any(|p| lower.contains(p)) {
        score += NO_REFUSAL_BONUS;
    }
    if original.chars().count() > LENGTH_THRESHOLD {
        score += LENGTH_BONUS;
    }

    clamp_unit(score)
}

fn feature_coverage(lower: &str) -> f64 {
    let matched = FEATURE_KEYWORDS.iter().filter(|k| lower.contains(*k)).count();
    let mut score = COVERAGE_BASE + (matched as f64 * FEATURE_KEYWORD_STEP).min(FEATURE_KEYWORD_CAP);

    if LIST_MARKERS.iter().any(|m| lower.contains(m)) {
        score += LIST_BONUS;
    }

    clamp_unit(score)
}

fn differentiation_clarity(lower: &str, competitors: &str) -> f64 {
    let mut score = DIFFERENTIATION_BASE;

    let mut names: Vec<String> = competitors
        .split(',')
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect();
    names.sort();
    names.dedup();

    if !names.is_empty() {
        let mentioned = names.iter().filter(|n| lower.contains(n.as_str())).count();
        score += (mentioned as f64 * COMPETITOR_STEP).min(COMPETITOR_CAP);
    }

    let comparisons = COMPARISON_KEYWORDS
        .iter()
        .filter(|k| lower.contains(*k))
        .count();
    score += (comparisons as f64 * COMPARISON_STEP).min(COMPARISON_CAP);

    clamp_unit(score)
}

/// A rubric metric's 0-3 score for one response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricScore {
    pub metric_id: String,
    pub metric_name: String,
    /// Rubric level, 0-3.
    pub score: u8,
    pub reasoning: String,
}

/// Map sub-scores onto the rubric metrics that have a heuristic counterpart.
pub fn rubric_scores(scores: &SubScores, metrics: &[ScoringMetric]) -> Vec<MetricScore> {
    metrics
        .iter()
        .filter_map(|metric| {
            let value = scores.for_metric(&metric.id)?;
            let level = (clamp_unit(value) * 3.0).round() as u8;
            let reasoning = metric
                .rubric
                .iter()
                .find(|cell| cell.score == level)
                .map(|cell| cell.description.clone())
                .unwrap_or_default();
            Some(MetricScore {
                metric_id: metric.id.clone(),
                metric_name: metric.name.clone(),
                score: level,
                reasoning,
            })
        })
        .collect()
}
