use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A submitted intent from an engineer.
///
/// The identifier and creation timestamp are assigned once when the intent is
/// created and never change afterwards. Updates replace every other field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    pub id: Uuid,
    pub statement: String,
    pub context: String,
    pub expected_outcome: String,
    /// People involved, normalized to a case-insensitively unique list.
    pub collaborators: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating or fully replacing an intent.
///
/// Required text fields are validated by the caller; the repository persists
/// them as given and only normalizes `collaborators`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentInput {
    pub statement: String,
    pub context: String,
    pub expected_outcome: String,
    #[serde(default)]
    pub collaborators: Vec<String>,
}

/// Optional criteria applied when listing intents. All present criteria must match.
#[derive(Debug, Clone, Default)]
pub struct IntentFilters {
    /// Case-insensitive substring matched against statement, context and expected outcome.
    pub query: Option<String>,
    /// Case-insensitive exact match against any collaborator.
    pub collaborator: Option<String>,
    /// Inclusive lower bound on the creation timestamp.
    pub created_after: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the creation timestamp.
    pub created_before: Option<DateTime<Utc>>,
}
