//! `PostgreSQL` implementation of the `ActivityRepository` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument};

use codetrail_core::activity::{ActivityKind, ActivityRecord, NewActivity};
use codetrail_core::error::DomainError;
use codetrail_core::filter::ActivityFilter;
use codetrail_core::repository::{
    ActivityRepository, AggregateRow, Dimension, GroupKey, Totals,
};

use crate::config::DatabaseConfig;
use crate::filter_sql::{push_page, push_where};
use crate::schema;

const RECORD_COLUMNS: &str = r#"id, kind, "time", duration, language, file, project, computer_id,
    vcs_type, vcs_repo, vcs_branch, line, "char", created_at"#;

/// PostgreSQL-backed activity repository.
#[derive(Debug, Clone)]
pub struct PgActivityRepository {
    pool: PgPool,
}

impl PgActivityRepository {
    /// Creates a new `PgActivityRepository` over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool, verifies the server answers, and ensures the schema.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the server is unreachable or
    /// the schema cannot be created.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .connect_with(config.connect_options.clone())
            .await
            .map_err(infrastructure)?;
        schema::ensure_schema(&pool).await.map_err(infrastructure)?;
        info!(
            host = config.connect_options.get_host(),
            "connected to PostgreSQL activity store"
        );
        Ok(Self::new(pool))
    }

    /// The underlying pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(FromRow)]
struct ActivityRow {
    id: i64,
    kind: i16,
    time: i64,
    duration: i64,
    language: String,
    file: String,
    project: String,
    computer_id: String,
    vcs_type: String,
    vcs_repo: String,
    vcs_branch: String,
    line: i32,
    #[sqlx(rename = "char")]
    character: i32,
    created_at: DateTime<Utc>,
}

impl From<ActivityRow> for ActivityRecord {
    fn from(row: ActivityRow) -> Self {
        Self {
            id: row.id,
            activity: NewActivity {
                kind: ActivityKind::from_code(i64::from(row.kind)),
                time: row.time,
                duration: row.duration,
                language: row.language,
                file: row.file,
                project: row.project,
                computer_id: row.computer_id,
                vcs_type: row.vcs_type,
                vcs_repo: row.vcs_repo,
                vcs_branch: row.vcs_branch,
                line: row.line,
                character: row.character,
            },
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct AggregateSqlRow {
    key: String,
    total_duration: i64,
    count: i64,
    first_id: i64,
}

fn infrastructure(err: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(err.to_string())
}

#[async_trait]
impl ActivityRepository for PgActivityRepository {
    #[instrument(skip_all, fields(time = activity.time))]
    async fn save(&self, activity: &NewActivity) -> Result<ActivityRecord, DomainError> {
        let sql = format!(
            r#"INSERT INTO activities
                (kind, "time", duration, language, file, project, computer_id,
                 vcs_type, vcs_repo, vcs_branch, line, "char")
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {RECORD_COLUMNS}"#
        );
        let row: ActivityRow = sqlx::query_as(&sql)
            .bind(activity.kind.code())
            .bind(activity.time)
            .bind(activity.duration)
            .bind(&activity.language)
            .bind(&activity.file)
            .bind(&activity.project)
            .bind(&activity.computer_id)
            .bind(&activity.vcs_type)
            .bind(&activity.vcs_repo)
            .bind(&activity.vcs_branch)
            .bind(activity.line)
            .bind(activity.character)
            .fetch_one(&self.pool)
            .await
            .map_err(infrastructure)?;
        Ok(row.into())
    }

    async fn find(&self, filter: &ActivityFilter) -> Result<Vec<ActivityRecord>, DomainError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {RECORD_COLUMNS} FROM activities"
        ));
        push_where(&mut builder, filter);
        builder.push(r#" ORDER BY "time" DESC, id DESC"#);
        push_page(&mut builder, filter);

        let rows: Vec<ActivityRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(infrastructure)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn totals(&self, filter: &ActivityFilter) -> Result<Totals, DomainError> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT COALESCE(SUM(duration), 0)::BIGINT, COUNT(id) FROM activities",
        );
        push_where(&mut builder, filter);

        let (total_duration, count): (i64, i64) = builder
            .build_query_as()
            .fetch_one(&self.pool)
            .await
            .map_err(infrastructure)?;
        Ok(Totals {
            total_duration,
            count,
        })
    }

    async fn aggregate(
        &self,
        filter: &ActivityFilter,
        key: GroupKey,
        limit: Option<u32>,
    ) -> Result<Vec<AggregateRow>, DomainError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT ");
        match key {
            GroupKey::Dimension(dimension) => {
                builder.push(dimension.column());
            }
            GroupKey::Period(granularity) => {
                builder
                    .push(r#"to_char(to_timestamp("time" / 1000.0) AT TIME ZONE 'UTC', "#)
                    .push_bind(granularity.pg_pattern())
                    .push(")");
            }
        }
        builder.push(
            " AS key, SUM(duration)::BIGINT AS total_duration, COUNT(id) AS count, \
             MIN(id) AS first_id FROM activities",
        );
        push_where(&mut builder, filter);
        builder.push(" GROUP BY 1");
        match key {
            GroupKey::Dimension(_) => builder.push(" ORDER BY total_duration DESC, first_id ASC"),
            GroupKey::Period(_) => builder.push(" ORDER BY key ASC"),
        };
        if let Some(limit) = limit {
            builder.push(" LIMIT ").push_bind(i64::from(limit));
        }

        let rows: Vec<AggregateSqlRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(infrastructure)?;
        Ok(rows
            .into_iter()
            .map(|row| AggregateRow {
                key: row.key,
                total_duration: row.total_duration,
                count: row.count,
                first_id: row.first_id,
            })
            .collect())
    }

    async fn distinct_values(&self, dimension: Dimension) -> Result<Vec<String>, DomainError> {
        let column = dimension.column();
        let sql = format!(
            "SELECT DISTINCT {column} FROM activities WHERE {column} <> '' ORDER BY {column} ASC"
        );
        sqlx::query_scalar(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(infrastructure)
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("PostgreSQL activity store disconnected");
    }
}
