use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AppState;
use crate::db::RepoError;
use crate::models::*;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

type ApiError = (StatusCode, String);

// ============================================================
// Error Handling
// ============================================================

/// Map a repository failure to a response.
///
/// NotFound becomes a 404 naming the resource. Everything else is logged
/// server-side and the client only sees a generic message.
fn repo_error(resource: &'static str) -> impl Fn(RepoError) -> ApiError {
    move |e| {
        if e.is_not_found() {
            return (StatusCode::NOT_FOUND, format!("{resource} not found"));
        }

        tracing::error!("Failed to access {}: {}", resource, e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    }
}

fn bad_request(msg: impl Into<String>) -> ApiError {
    let msg = msg.into();
    tracing::warn!("Validation error: {}", msg);
    (StatusCode::BAD_REQUEST, msg)
}

/// Trim a required text field, rejecting it if nothing is left.
fn required(value: String, field: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(bad_request(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

// ============================================================
// Listing
// ============================================================

/// Query parameters shared by the list endpoints.
///
/// Numbers are kept as text so that unparsable values fall back to defaults
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub q: Option<String>,
    /// Intents only.
    pub collaborator: Option<String>,
    pub created_after: Option<String>,
    pub created_before: Option<String>,
}

impl ListQuery {
    fn page(&self) -> i64 {
        parse_int(self.page.as_deref(), 1).max(1)
    }

    fn page_size(&self) -> i64 {
        let size = parse_int(self.page_size.as_deref(), DEFAULT_PAGE_SIZE);
        if size < 1 {
            DEFAULT_PAGE_SIZE
        } else {
            size.min(MAX_PAGE_SIZE)
        }
    }

    fn pagination(&self) -> Pagination {
        let page_size = self.page_size();
        Pagination::new(page_size, (self.page() - 1).saturating_mul(page_size))
    }

    fn search(&self) -> Option<String> {
        non_blank(self.q.as_deref())
    }

    fn created_after(&self) -> Result<Option<DateTime<Utc>>, ApiError> {
        parse_timestamp(self.created_after.as_deref(), "createdAfter")
    }

    fn created_before(&self) -> Result<Option<DateTime<Utc>>, ApiError> {
        parse_timestamp(self.created_before.as_deref(), "createdBefore")
    }

    fn respond<T>(&self, page: Page<T>) -> ListResponse<T> {
        let page_size = self.page_size();
        let total_pages = if page.total_count > 0 {
            (page.total_count + page_size - 1) / page_size
        } else {
            0
        };

        ListResponse {
            items: page.items,
            pagination: PaginationResponse {
                page: self.page(),
                page_size,
                total_items: page.total_count,
                total_pages,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResponse {
    pub page: i64,
    pub page_size: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub pagination: PaginationResponse,
}

fn parse_int(value: Option<&str>, fallback: i64) -> i64 {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_timestamp(value: Option<&str>, field: &str) -> Result<Option<DateTime<Utc>>, ApiError> {
    let Some(value) = non_blank(value) else {
        return Ok(None);
    };
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| Some(dt.with_timezone(&Utc)))
        .map_err(|_| bad_request(format!("{field} must be RFC3339 timestamp")))
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> &'static str {
    "ok"
}

// ============================================================
// Intents
// ============================================================

fn validate_intent(input: IntentInput) -> Result<IntentInput, ApiError> {
    Ok(IntentInput {
        statement: required(input.statement, "statement")?,
        context: required(input.context, "context")?,
        expected_outcome: required(input.expected_outcome, "expectedOutcome")?,
        collaborators: input.collaborators,
    })
}

pub async fn create_intent(
    State(state): State<AppState>,
    Json(input): Json<IntentInput>,
) -> Result<(StatusCode, Json<Intent>), ApiError> {
    let input = validate_intent(input)?;
    state
        .intents
        .create(&state.request_context(), input)
        .map(|i| (StatusCode::CREATED, Json(i)))
        .map_err(repo_error("Intent"))
}

pub async fn list_intents(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<Intent>>, ApiError> {
    let filters = IntentFilters {
        query: query.search(),
        collaborator: non_blank(query.collaborator.as_deref()),
        created_after: query.created_after()?,
        created_before: query.created_before()?,
    };

    let page = state
        .intents
        .list(&state.request_context(), &filters, query.pagination())
        .map_err(repo_error("Intent"))?;

    Ok(Json(query.respond(page)))
}

pub async fn get_intent(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Intent>, ApiError> {
    state
        .intents
        .get(&state.request_context(), id)
        .map(Json)
        .map_err(repo_error("Intent"))
}

pub async fn update_intent(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<IntentInput>,
) -> Result<Json<Intent>, ApiError> {
    let input = validate_intent(input)?;
    state
        .intents
        .update(&state.request_context(), id, input)
        .map(Json)
        .map_err(repo_error("Intent"))
}

pub async fn delete_intent(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .intents
        .delete(&state.request_context(), id)
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(repo_error("Intent"))
}

// ============================================================
// Goals
// ============================================================

fn validate_goal(input: GoalInput) -> Result<GoalInput, ApiError> {
    Ok(GoalInput {
        title: required(input.title, "title")?,
        clarity_statement: required(input.clarity_statement, "clarityStatement")?,
        ..input
    })
}

pub async fn create_goal(
    State(state): State<AppState>,
    Json(input): Json<GoalInput>,
) -> Result<(StatusCode, Json<Goal>), ApiError> {
    let input = validate_goal(input)?;
    state
        .goals
        .create(&state.request_context(), input)
        .map(|g| (StatusCode::CREATED, Json(g)))
        .map_err(repo_error("Goal"))
}

pub async fn list_goals(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<Goal>>, ApiError> {
    let filters = GoalFilters {
        query: query.search(),
        created_after: query.created_after()?,
        created_before: query.created_before()?,
    };

    let page = state
        .goals
        .list(&state.request_context(), &filters, query.pagination())
        .map_err(repo_error("Goal"))?;

    Ok(Json(query.respond(page)))
}

pub async fn get_goal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Goal>, ApiError> {
    state
        .goals
        .get(&state.request_context(), id)
        .map(Json)
        .map_err(repo_error("Goal"))
}

pub async fn update_goal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<GoalInput>,
) -> Result<Json<Goal>, ApiError> {
    let input = validate_goal(input)?;
    state
        .goals
        .update(&state.request_context(), id, input)
        .map(Json)
        .map_err(repo_error("Goal"))
}

pub async fn delete_goal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .goals
        .delete(&state.request_context(), id)
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(repo_error("Goal"))
}
