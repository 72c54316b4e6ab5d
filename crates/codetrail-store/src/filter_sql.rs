//! Renders an `ActivityFilter` as a SQL `WHERE` clause.
//!
//! Every query path (rows, totals, groups) appends the same clause, so a
//! filter means the same thing everywhere.

use codetrail_core::filter::ActivityFilter;
use sqlx::{Postgres, QueryBuilder};

/// Appends ` WHERE ...` for `filter`. Always emits a `WHERE`, so callers can
/// follow up with `GROUP BY` or `ORDER BY` without tracking state.
pub(crate) fn push_where(builder: &mut QueryBuilder<'_, Postgres>, filter: &ActivityFilter) {
    builder.push(" WHERE TRUE");
    if let Some(start) = filter.start_millis() {
        builder.push(r#" AND "time" >= "#).push_bind(start);
    }
    if let Some(end) = filter.end_millis() {
        builder.push(r#" AND "time" <= "#).push_bind(end);
    }
    push_any(builder, "project", &filter.projects);
    push_any(builder, "language", &filter.languages);
    push_any(builder, "computer_id", &filter.computers);
    push_any(builder, "file", &filter.files);
}

/// Appends ` LIMIT`/` OFFSET` when set. A zero limit emits no ` LIMIT`.
pub(crate) fn push_page(builder: &mut QueryBuilder<'_, Postgres>, filter: &ActivityFilter) {
    if let Some(limit) = filter.row_limit() {
        builder.push(" LIMIT ").push_bind(i64::from(limit));
    }
    if let Some(offset) = filter.offset {
        builder.push(" OFFSET ").push_bind(i64::from(offset));
    }
}

fn push_any(builder: &mut QueryBuilder<'_, Postgres>, column: &'static str, values: &[String]) {
    if values.is_empty() {
        return;
    }
    builder
        .push(" AND ")
        .push(column)
        .push(" = ANY(")
        .push_bind(values.to_vec())
        .push(")");
}
