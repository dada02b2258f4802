use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A chapter-level objective that guides intents.
///
/// `updated_at` equals `created_at` when the goal is created and is restamped
/// on every successful update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: Uuid,
    pub title: String,
    pub clarity_statement: String,
    /// Lines the work must not cross.
    pub guardrails: Vec<String>,
    /// Who may decide what while pursuing the goal.
    pub decision_rights: Vec<String>,
    pub constraints: Vec<String>,
    pub success_criteria: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or fully replacing a goal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalInput {
    pub title: String,
    pub clarity_statement: String,
    #[serde(default)]
    pub guardrails: Vec<String>,
    #[serde(default)]
    pub decision_rights: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub success_criteria: Vec<String>,
}

/// Optional criteria applied when listing goals.
#[derive(Debug, Clone, Default)]
pub struct GoalFilters {
    /// Case-insensitive substring matched against title, clarity statement and success criteria.
    pub query: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}
