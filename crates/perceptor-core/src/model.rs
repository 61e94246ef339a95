//! Core data model types for perceptor.
//!
//! These are the inputs of an audit: the product under evaluation, the
//! golden questions asked about it, the scoring rubric, and the models
//! that answer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A product being audited across one or more evaluation runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier for this project.
    pub id: String,
    /// Product name, used by the scorer for accuracy matching.
    pub name: String,
    /// Free-form product description.
    #[serde(default)]
    pub description: String,
    /// Public website the simulated buyer is looking at.
    pub website_url: String,
    #[serde(default)]
    pub docs_url: Option<String>,
    #[serde(default)]
    pub pricing_url: Option<String>,
    /// Competitor names the buyer might know.
    #[serde(default)]
    pub competitors: Vec<String>,
    /// Who the simulated buyer is.
    #[serde(default)]
    pub target_persona: TargetPersona,
    pub created_at: DateTime<Utc>,
    /// Number of reports saved for this project. Never decreases.
    #[serde(default)]
    pub evaluation_count: u32,
    /// Overall score of the most recent report.
    #[serde(default)]
    pub last_score: Option<f64>,
}

impl Project {
    /// Create a project with a fresh id and no evaluations.
    pub fn new(name: &str, website_url: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: String::new(),
            website_url: website_url.to_string(),
            docs_url: None,
            pricing_url: None,
            competitors: Vec::new(),
            target_persona: TargetPersona::default(),
            created_at: Utc::now(),
            evaluation_count: 0,
            last_score: None,
        }
    }

    /// Competitors as the comma-separated list the scorer consumes.
    pub fn competitors_csv(&self) -> String {
        self.competitors.join(", ")
    }
}

/// Split a comma-separated competitor list into trimmed, non-empty names.
pub fn parse_competitors(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// The buyer persona the models are asked to role-play.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetPersona {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub team_type: String,
    #[serde(default)]
    pub company_size: String,
    #[serde(default)]
    pub industry: Option<String>,
}

impl TargetPersona {
    /// A persona described only by a free-text role.
    pub fn from_description(description: &str) -> Self {
        Self {
            role: description.trim().to_string(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.role.is_empty()
            && self.team_type.is_empty()
            && self.company_size.is_empty()
            && self.industry.as_deref().is_none_or(str::is_empty)
    }
}

impl fmt::Display for TargetPersona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "Product managers and teams");
        }
        write!(f, "{}", self.role)?;
        if !self.team_type.is_empty() {
            write!(f, " on a {} team", self.team_type)?;
        }
        if !self.company_size.is_empty() {
            write!(f, " at a company of {}", self.company_size)?;
        }
        if let Some(industry) = self.industry.as_deref().filter(|i| !i.is_empty()) {
            write!(f, " ({industry})")?;
        }
        Ok(())
    }
}

/// A buyer-style question asked of every enabled model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldenPrompt {
    pub id: String,
    pub question: String,
    pub theme: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// One 0-3 level of a scoring metric's rubric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricCell {
    pub score: u8,
    pub description: String,
}

/// A named scoring dimension with a weight and a 0-3 rubric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringMetric {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub weight: f64,
    #[serde(default = "default_rubric")]
    pub rubric: Vec<RubricCell>,
}

pub fn default_rubric() -> Vec<RubricCell> {
    [
        "Worst case",
        "Below expectations",
        "Meets expectations",
        "Exceeds expectations",
    ]
    .iter()
    .enumerate()
    .map(|(score, description)| RubricCell {
        score: score as u8,
        description: (*description).to_string(),
    })
    .collect()
}

/// A model that answers golden questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Stable identifier used in reports.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Key of the provider entry in the configuration.
    pub provider: String,
    /// Model identifier sent on the wire. Defaults to `id`.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

impl ModelConfig {
    pub fn wire_model(&self) -> &str {
        self.model.as_deref().unwrap_or(&self.id)
    }
}

fn default_true() -> bool {
    true
}

pub fn default_temperature() -> f64 {
    0.7
}

/// Priority of a recommendation or fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[serde(alias = "High", alias = "HIGH")]
    High,
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "Low", alias = "LOW")]
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" | "med" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// Severity of a detected gap. Same scale as [`Priority`].
pub type Severity = Priority;
