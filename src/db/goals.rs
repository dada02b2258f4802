use chrono::{DateTime, Utc};
use rusqlite::{params_from_iter, Row};
use uuid::Uuid;

use super::predicate::PredicateBuilder;
use super::tags::{decode_tags, encode_tags, normalize_tags};
use super::{format_timestamp, read_timestamp, read_uuid};
use super::{Database, RepoError, RepoResult, RequestContext};
use crate::models::{Goal, GoalFilters, GoalInput, Page, Pagination};

const SELECT_GOALS: &str = "SELECT id, title, clarity_statement, guardrails, decision_rights, \
     constraints, success_criteria, created_at, updated_at FROM goals";

const RETURNING_GOAL: &str = "RETURNING id, title, clarity_statement, guardrails, decision_rights, \
     constraints, success_criteria, created_at, updated_at";

// success_criteria is matched against its stored JSON text.
const SEARCH_COLUMNS: &[&str] = &["title", "clarity_statement", "success_criteria"];

const ORDER_BY: &str = "created_at DESC, id DESC";

struct GoalRow {
    id: Uuid,
    title: String,
    clarity_statement: String,
    guardrails: String,
    decision_rights: String,
    constraints: String,
    success_criteria: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GoalRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: read_uuid(row, 0)?,
            title: row.get(1)?,
            clarity_statement: row.get(2)?,
            guardrails: row.get(3)?,
            decision_rights: row.get(4)?,
            constraints: row.get(5)?,
            success_criteria: row.get(6)?,
            created_at: read_timestamp(row, 7)?,
            updated_at: read_timestamp(row, 8)?,
        })
    }

    fn into_goal(self) -> RepoResult<Goal> {
        Ok(Goal {
            id: self.id,
            title: self.title,
            clarity_statement: self.clarity_statement,
            guardrails: decode_tags(&self.guardrails)?,
            decision_rights: decode_tags(&self.decision_rights)?,
            constraints: decode_tags(&self.constraints)?,
            success_criteria: decode_tags(&self.success_criteria)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// The four tag sets of a goal input, normalized and encoded for storage.
struct EncodedTagSets {
    guardrails: Vec<String>,
    decision_rights: Vec<String>,
    constraints: Vec<String>,
    success_criteria: Vec<String>,
    json: [String; 4],
}

impl EncodedTagSets {
    fn from_input(input: &GoalInput) -> RepoResult<Self> {
        let guardrails = normalize_tags(&input.guardrails);
        let decision_rights = normalize_tags(&input.decision_rights);
        let constraints = normalize_tags(&input.constraints);
        let success_criteria = normalize_tags(&input.success_criteria);
        let json = [
            encode_tags(&guardrails)?,
            encode_tags(&decision_rights)?,
            encode_tags(&constraints)?,
            encode_tags(&success_criteria)?,
        ];
        Ok(Self {
            guardrails,
            decision_rights,
            constraints,
            success_criteria,
            json,
        })
    }
}

/// Owns the lifecycle of [`Goal`] records.
///
/// Same operations as [`super::IntentRepository`], plus an `updated_at`
/// timestamp restamped on every update.
#[derive(Clone)]
pub struct GoalRepository {
    db: Database,
}

impl GoalRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn create(&self, ctx: &RequestContext, input: GoalInput) -> RepoResult<Goal> {
        let tags = EncodedTagSets::from_input(&input)?;
        let id = Uuid::new_v4();
        let now = Utc::now();
        let stamp = format_timestamp(&now);

        self.db.with_conn(ctx, |conn| {
            conn.execute(
                "INSERT INTO goals (id, title, clarity_statement, guardrails, decision_rights,
                                    constraints, success_criteria, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
                (
                    id.to_string(),
                    &input.title,
                    &input.clarity_statement,
                    &tags.json[0],
                    &tags.json[1],
                    &tags.json[2],
                    &tags.json[3],
                    &stamp,
                ),
            )?;
            Ok(())
        })?;

        tracing::debug!(goal_id = %id, "created goal");

        Ok(Goal {
            id,
            title: input.title,
            clarity_statement: input.clarity_statement,
            guardrails: tags.guardrails,
            decision_rights: tags.decision_rights,
            constraints: tags.constraints,
            success_criteria: tags.success_criteria,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get(&self, ctx: &RequestContext, id: Uuid) -> RepoResult<Goal> {
        let row = self.db.with_conn(ctx, |conn| {
            Ok(conn.query_row(
                &format!("{SELECT_GOALS} WHERE id = ?1"),
                [id.to_string()],
                GoalRow::from_row,
            )?)
        })?;
        row.into_goal()
    }

    /// Replace every mutable field, restamp `updated_at` and return the stored row.
    pub fn update(&self, ctx: &RequestContext, id: Uuid, input: GoalInput) -> RepoResult<Goal> {
        let tags = EncodedTagSets::from_input(&input)?;
        let now = Utc::now();

        let row = self.db.with_conn(ctx, |conn| {
            Ok(conn.query_row(
                &format!(
                    "UPDATE goals
                     SET title = ?1,
                         clarity_statement = ?2,
                         guardrails = ?3,
                         decision_rights = ?4,
                         constraints = ?5,
                         success_criteria = ?6,
                         updated_at = ?7
                     WHERE id = ?8
                     {RETURNING_GOAL}"
                ),
                (
                    &input.title,
                    &input.clarity_statement,
                    &tags.json[0],
                    &tags.json[1],
                    &tags.json[2],
                    &tags.json[3],
                    format_timestamp(&now),
                    id.to_string(),
                ),
                GoalRow::from_row,
            )?)
        })?;

        tracing::debug!(goal_id = %id, "updated goal");
        row.into_goal()
    }

    pub fn delete(&self, ctx: &RequestContext, id: Uuid) -> RepoResult<()> {
        let affected = self.db.with_conn(ctx, |conn| {
            Ok(conn.execute("DELETE FROM goals WHERE id = ?1", [id.to_string()])?)
        })?;

        if affected == 0 {
            return Err(RepoError::NotFound);
        }

        tracing::debug!(goal_id = %id, "deleted goal");
        Ok(())
    }

    pub fn list(
        &self,
        ctx: &RequestContext,
        filters: &GoalFilters,
        pagination: Pagination,
    ) -> RepoResult<Page<Goal>> {
        let predicates = PredicateBuilder::new()
            .search(filters.query.as_deref(), SEARCH_COLUMNS)
            .at_or_after("created_at", filters.created_after)
            .at_or_before("created_at", filters.created_before)
            .build();

        let (rows, total_count) = self.db.with_conn(ctx, |conn| {
            let total: i64 = conn.query_row(
                &predicates.count_sql("goals"),
                params_from_iter(predicates.args()),
                |row| row.get(0),
            )?;

            let (sql, args) = predicates.page_sql(SELECT_GOALS, ORDER_BY, pagination);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(args.iter()), GoalRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok((rows, total))
        })?;

        let items = rows
            .into_iter()
            .map(GoalRow::into_goal)
            .collect::<RepoResult<Vec<_>>>()?;

        tracing::debug!(
            returned = items.len(),
            total = total_count,
            filters = predicates.clauses().len(),
            "listed goals"
        );

        Ok(Page { items, total_count })
    }
}
