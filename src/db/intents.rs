use chrono::{DateTime, Utc};
use rusqlite::{params_from_iter, Row};
use uuid::Uuid;

use super::predicate::PredicateBuilder;
use super::tags::{decode_tags, encode_tags, normalize_tags};
use super::{format_timestamp, read_timestamp, read_uuid};
use super::{Database, RepoError, RepoResult, RequestContext};
use crate::models::{Intent, IntentFilters, IntentInput, Page, Pagination};

const SELECT_INTENTS: &str =
    "SELECT id, statement, context, expected_outcome, collaborators, created_at FROM intents";

const SEARCH_COLUMNS: &[&str] = &["statement", "context", "expected_outcome"];

// Identifier breaks ties between intents created in the same instant.
const ORDER_BY: &str = "created_at DESC, id DESC";

/// Row as stored, before the collaborators column is decoded.
struct IntentRow {
    id: Uuid,
    statement: String,
    context: String,
    expected_outcome: String,
    collaborators: String,
    created_at: DateTime<Utc>,
}

impl IntentRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: read_uuid(row, 0)?,
            statement: row.get(1)?,
            context: row.get(2)?,
            expected_outcome: row.get(3)?,
            collaborators: row.get(4)?,
            created_at: read_timestamp(row, 5)?,
        })
    }

    fn into_intent(self) -> RepoResult<Intent> {
        Ok(Intent {
            id: self.id,
            statement: self.statement,
            context: self.context,
            expected_outcome: self.expected_outcome,
            collaborators: decode_tags(&self.collaborators)?,
            created_at: self.created_at,
        })
    }
}

/// Owns the lifecycle of [`Intent`] records.
#[derive(Clone)]
pub struct IntentRepository {
    db: Database,
}

impl IntentRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Persist a new intent with a fresh id and creation timestamp.
    pub fn create(&self, ctx: &RequestContext, input: IntentInput) -> RepoResult<Intent> {
        let collaborators = normalize_tags(&input.collaborators);
        let collaborators_json = encode_tags(&collaborators)?;
        let id = Uuid::new_v4();
        let now = Utc::now();

        self.db.with_conn(ctx, |conn| {
            conn.execute(
                "INSERT INTO intents
                 (id, statement, context, expected_outcome, collaborators, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                (
                    id.to_string(),
                    &input.statement,
                    &input.context,
                    &input.expected_outcome,
                    &collaborators_json,
                    format_timestamp(&now),
                ),
            )?;
            Ok(())
        })?;

        tracing::debug!(intent_id = %id, "created intent");

        Ok(Intent {
            id,
            statement: input.statement,
            context: input.context,
            expected_outcome: input.expected_outcome,
            collaborators,
            created_at: now,
        })
    }

    pub fn get(&self, ctx: &RequestContext, id: Uuid) -> RepoResult<Intent> {
        let row = self.db.with_conn(ctx, |conn| {
            Ok(conn.query_row(
                &format!("{SELECT_INTENTS} WHERE id = ?1"),
                [id.to_string()],
                IntentRow::from_row,
            )?)
        })?;
        row.into_intent()
    }

    /// Replace every mutable field and return the stored row.
    ///
    /// The id and creation timestamp are left untouched.
    pub fn update(&self, ctx: &RequestContext, id: Uuid, input: IntentInput) -> RepoResult<Intent> {
        let collaborators = normalize_tags(&input.collaborators);
        let collaborators_json = encode_tags(&collaborators)?;

        let row = self.db.with_conn(ctx, |conn| {
            Ok(conn.query_row(
                "UPDATE intents
                 SET statement = ?1,
                     context = ?2,
                     expected_outcome = ?3,
                     collaborators = ?4
                 WHERE id = ?5
                 RETURNING id, statement, context, expected_outcome, collaborators, created_at",
                (
                    &input.statement,
                    &input.context,
                    &input.expected_outcome,
                    &collaborators_json,
                    id.to_string(),
                ),
                IntentRow::from_row,
            )?)
        })?;

        tracing::debug!(intent_id = %id, "updated intent");
        row.into_intent()
    }

    pub fn delete(&self, ctx: &RequestContext, id: Uuid) -> RepoResult<()> {
        let affected = self.db.with_conn(ctx, |conn| {
            Ok(conn.execute("DELETE FROM intents WHERE id = ?1", [id.to_string()])?)
        })?;

        if affected == 0 {
            return Err(RepoError::NotFound);
        }

        tracing::debug!(intent_id = %id, "deleted intent");
        Ok(())
    }

    /// Newest-first page of intents matching `filters`, with the total match count.
    pub fn list(
        &self,
        ctx: &RequestContext,
        filters: &IntentFilters,
        pagination: Pagination,
    ) -> RepoResult<Page<Intent>> {
        let predicates = PredicateBuilder::new()
            .search(filters.query.as_deref(), SEARCH_COLUMNS)
            .tag_member("collaborators", filters.collaborator.as_deref())
            .at_or_after("created_at", filters.created_after)
            .at_or_before("created_at", filters.created_before)
            .build();

        let (rows, total_count) = self.db.with_conn(ctx, |conn| {
            let total: i64 = conn.query_row(
                &predicates.count_sql("intents"),
                params_from_iter(predicates.args()),
                |row| row.get(0),
            )?;

            let (sql, args) = predicates.page_sql(SELECT_INTENTS, ORDER_BY, pagination);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(args.iter()), IntentRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok((rows, total))
        })?;

        let items = rows
            .into_iter()
            .map(IntentRow::into_intent)
            .collect::<RepoResult<Vec<_>>>()?;

        tracing::debug!(
            returned = items.len(),
            total = total_count,
            filters = predicates.clauses().len(),
            "listed intents"
        );

        Ok(Page { items, total_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> IntentRepository {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        IntentRepository::new(db)
    }

    #[test]
    fn corrupt_collaborators_surface_as_serialization_failure() {
        let repo = repo();
        let ctx = RequestContext::background();
        let created = repo
            .create(
                &ctx,
                IntentInput {
                    statement: "Ship".into(),
                    context: "Q3".into(),
                    expected_outcome: "Shipped".into(),
                    collaborators: vec!["Ana".into()],
                },
            )
            .unwrap();

        repo.db
            .with_conn(&ctx, |conn| {
                conn.execute(
                    "UPDATE intents SET collaborators = '{\"not\": \"an array\"}' WHERE id = ?1",
                    [created.id.to_string()],
                )?;
                Ok(())
            })
            .unwrap();

        let err = repo.get(&ctx, created.id).unwrap_err();
        assert!(matches!(err, RepoError::Serialization(_)));

        let err = repo
            .list(&ctx, &IntentFilters::default(), Pagination::unbounded())
            .unwrap_err();
        assert!(err.is_serialization_failure());
    }

    #[test]
    fn collaborators_are_stored_as_json_arrays() {
        let repo = repo();
        let ctx = RequestContext::background();
        let created = repo
            .create(
                &ctx,
                IntentInput {
                    statement: "Ship".into(),
                    context: "Q3".into(),
                    expected_outcome: "Shipped".into(),
                    collaborators: vec![],
                },
            )
            .unwrap();

        let raw: String = repo
            .db
            .with_conn(&ctx, |conn| {
                Ok(conn.query_row(
                    "SELECT collaborators FROM intents WHERE id = ?1",
                    [created.id.to_string()],
                    |row| row.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(raw, "[]");
    }

    #[test]
    fn operations_fail_when_context_is_done() {
        let repo = repo();
        let ctx = RequestContext::background();
        ctx.cancel();

        let err = repo
            .create(
                &ctx,
                IntentInput {
                    statement: "Ship".into(),
                    context: "Q3".into(),
                    expected_outcome: "Shipped".into(),
                    collaborators: vec![],
                },
            )
            .unwrap_err();
        assert!(err.is_execution_failure());

        let fresh = RequestContext::background();
        let page = repo
            .list(&fresh, &IntentFilters::default(), Pagination::unbounded())
            .unwrap();
        assert_eq!(page.total_count, 0);
    }
}
