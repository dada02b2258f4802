//! Dynamic WHERE-clause assembly for filtered listings.
//!
//! Each filter criterion contributes one boolean fragment and binds its value
//! to the next numbered placeholder. Filter values never appear in the SQL
//! text. The same [`Predicates`] value produces both the COUNT query and the
//! page query, so the total and the returned rows are computed against an
//! identical predicate set.
//!
//! Case-insensitive fragments compare through the `fold` SQL function, which
//! every connection registers with [`register_case_fold`]. SQLite's own
//! `lower()` and `LIKE` only fold ASCII.

use chrono::{DateTime, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::{Value, ValueRef};
use rusqlite::Connection;

use super::format_timestamp;
use crate::models::Pagination;

/// Collects predicate fragments and their bound arguments.
///
/// Placeholder numbers are contiguous from the starting number, in the order
/// criteria are added.
#[derive(Debug, Clone)]
pub struct PredicateBuilder {
    clauses: Vec<String>,
    args: Vec<Value>,
    next_param: usize,
}

impl Default for PredicateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PredicateBuilder {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Start numbering at `first_param`, for fragments appended after
    /// parameters the caller has already bound.
    pub fn starting_at(first_param: usize) -> Self {
        Self {
            clauses: Vec::new(),
            args: Vec::new(),
            next_param: first_param.max(1),
        }
    }

    fn bind(&mut self, value: Value) -> usize {
        let param = self.next_param;
        self.args.push(value);
        self.next_param += 1;
        param
    }

    /// Case-insensitive "contains" match of `term` against any of `columns`.
    ///
    /// The term is bound once and every column references the same
    /// placeholder. Blank terms add nothing.
    pub fn search(mut self, term: Option<&str>, columns: &[&str]) -> Self {
        let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) else {
            return self;
        };
        if columns.is_empty() {
            return self;
        }

        let pattern = format!("%{}%", escape_like(&fold(term)));
        let param = self.bind(Value::Text(pattern));
        let alternatives = columns
            .iter()
            .map(|column| format!("fold({column}) LIKE ?{param} ESCAPE '\\'"))
            .collect::<Vec<_>>()
            .join(" OR ");
        self.clauses.push(format!("({alternatives})"));
        self
    }

    /// Case-insensitive membership of `value` in the JSON array stored in `column`.
    pub fn tag_member(mut self, column: &str, value: Option<&str>) -> Self {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return self;
        };

        let param = self.bind(Value::Text(fold(value)));
        self.clauses.push(format!(
            "EXISTS (SELECT 1 FROM json_each({column}) AS t WHERE fold(t.value) = ?{param})"
        ));
        self
    }

    /// Inclusive lower bound on a timestamp column.
    pub fn at_or_after(mut self, column: &str, ts: Option<DateTime<Utc>>) -> Self {
        if let Some(ts) = ts {
            let param = self.bind(Value::Text(format_timestamp(&ts)));
            self.clauses.push(format!("{column} >= ?{param}"));
        }
        self
    }

    /// Inclusive upper bound on a timestamp column.
    pub fn at_or_before(mut self, column: &str, ts: Option<DateTime<Utc>>) -> Self {
        if let Some(ts) = ts {
            let param = self.bind(Value::Text(format_timestamp(&ts)));
            self.clauses.push(format!("{column} <= ?{param}"));
        }
        self
    }

    pub fn build(self) -> Predicates {
        Predicates {
            clauses: self.clauses,
            args: self.args,
            next_param: self.next_param,
        }
    }
}

/// The finished predicate set for one listing.
#[derive(Debug, Clone)]
pub struct Predicates {
    clauses: Vec<String>,
    args: Vec<Value>,
    next_param: usize,
}

impl Predicates {
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn clauses(&self) -> &[String] {
        &self.clauses
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// The first placeholder number not used by any predicate.
    pub fn next_param(&self) -> usize {
        self.next_param
    }

    /// ` WHERE a AND b ...`, or an empty string when there are no predicates.
    pub fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn count_sql(&self, table: &str) -> String {
        format!("SELECT COUNT(*) FROM {table}{}", self.where_clause())
    }

    /// The page query and its full argument list.
    ///
    /// LIMIT is omitted for a non-positive limit and OFFSET for a
    /// non-positive offset. SQLite only accepts OFFSET after a LIMIT, so an
    /// offset without a limit is written as `LIMIT -1 OFFSET ?n`.
    pub fn page_sql(
        &self,
        select_from: &str,
        order_by: &str,
        pagination: Pagination,
    ) -> (String, Vec<Value>) {
        let mut sql = format!("{select_from}{} ORDER BY {order_by}", self.where_clause());
        let mut args = self.args.clone();
        let mut param = self.next_param;

        if pagination.limit > 0 {
            sql.push_str(&format!(" LIMIT ?{param}"));
            args.push(Value::Integer(pagination.limit));
            param += 1;
        } else if pagination.offset > 0 {
            sql.push_str(" LIMIT -1");
        }

        if pagination.offset > 0 {
            sql.push_str(&format!(" OFFSET ?{param}"));
            args.push(Value::Integer(pagination.offset));
        }

        (sql, args)
    }
}

/// Unicode lowercase, the same folding the tag normalizer dedupes by.
fn fold(text: &str) -> String {
    text.to_lowercase()
}

/// Register `fold(x)`: the Unicode lowercase of a text value, NULL otherwise.
pub(crate) fn register_case_fold(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "fold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            Ok(match ctx.get_raw(0) {
                ValueRef::Text(bytes) => Some(fold(&String::from_utf8_lossy(bytes))),
                _ => None,
            })
        },
    )
}

/// Escape LIKE wildcards so the term matches literally under `ESCAPE '\'`.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
