//! Postgres `DataStore`. Rows travel as JSONB (`to_jsonb` / `jsonb_populate_record`),
//! change notifications arrive over `LISTEN table_changes`.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgListener, types::Json, PgPool};
use std::time::{Duration, Instant};

use super::{
    row_object, ChangeCallback, ChangeEvent, ChangeFeed, DataStore, EventFilter, Query,
    Subscription, Table,
};
use crate::error::StoreResult;

pub const CHANGE_CHANNEL: &str = "table_changes";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    feed: ChangeFeed,
}

impl PgStore {
    /// Wrap a pool and start forwarding `pg_notify` change events to subscribers.
    pub async fn connect(pool: PgPool) -> StoreResult<Self> {
        let feed = ChangeFeed::default();

        let mut listener = PgListener::connect_with(&pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;

        let forward = feed.clone();
        tokio::spawn(async move {
            loop {
                match listener.recv().await {
                    Ok(notification) => {
                        match serde_json::from_str::<ChangeEvent>(notification.payload()) {
                            Ok(event) => forward.publish(event),
                            Err(e) => tracing::warn!(
                                payload = %notification.payload(),
                                error = %e,
                                "ignoring malformed change notification"
                            ),
                        }
                    }
                    Err(e) => {
                        // PgListener reconnects on the next recv.
                        tracing::error!(error = %e, "change listener error");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        tracing::info!(channel = CHANGE_CHANNEL, "listening for table changes");
        Ok(Self { pool, feed })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// `WHERE` clause comparing JSON projections, with placeholders starting at `first`.
/// Column names are bound as parameters, never interpolated.
fn where_clause(query: &Query, first: usize) -> String {
    if query.filters.is_empty() {
        return String::new();
    }
    let conditions: Vec<String> = (0..query.filters.len())
        .map(|i| {
            let col = first + i * 2;
            format!("(to_jsonb(t) -> ${}) = ${}", col, col + 1)
        })
        .collect();
    format!(" WHERE {}", conditions.join(" AND "))
}

fn bind_filters<'q>(
    mut q: sqlx::query::QueryScalar<'q, sqlx::Postgres, Value, sqlx::postgres::PgArguments>,
    query: &'q Query,
) -> sqlx::query::QueryScalar<'q, sqlx::Postgres, Value, sqlx::postgres::PgArguments> {
    for filter in &query.filters {
        q = q.bind(filter.column.as_str()).bind(Json(&filter.value));
    }
    q
}

#[async_trait]
impl DataStore for PgStore {
    async fn select(&self, table: Table, query: Query) -> StoreResult<Vec<Value>> {
        query.validate(table)?;

        let mut sql = format!("SELECT to_jsonb(t) FROM {} AS t", table.name());
        sql.push_str(&where_clause(&query, 1));
        if let Some(order) = &query.order {
            // Column is whitelisted by `validate`.
            sql.push_str(&format!(
                " ORDER BY t.{} {}",
                order.column,
                if order.ascending { "ASC" } else { "DESC" }
            ));
        }

        let rows = bind_filters(sqlx::query_scalar::<_, Value>(&sql), &query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn insert(&self, table: Table, rows: Vec<Value>) -> StoreResult<Vec<Value>> {
        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::with_capacity(rows.len());

        for row in &rows {
            let object = row_object(table, row)?;
            let columns: Vec<&str> = object.keys().map(String::as_str).collect();
            let sql = if columns.is_empty() {
                format!(
                    "INSERT INTO {table} AS t DEFAULT VALUES RETURNING to_jsonb(t)",
                    table = table.name()
                )
            } else {
                format!(
                    "INSERT INTO {table} AS t ({cols}) \
                     SELECT {cols} FROM jsonb_populate_record(NULL::{table}, $1) \
                     RETURNING to_jsonb(t)",
                    table = table.name(),
                    cols = columns.join(", "),
                )
            };

            let inserted = sqlx::query_scalar::<_, Value>(&sql)
                .bind(Json(row))
                .fetch_one(&mut *tx)
                .await?;
            stored.push(inserted);
        }

        tx.commit().await?;
        Ok(stored)
    }

    async fn update(&self, table: Table, patch: Value, query: Query) -> StoreResult<u64> {
        query.validate(table)?;
        let object = row_object(table, &patch)?;
        if object.is_empty() {
            return Ok(0);
        }

        let columns: Vec<&str> = object.keys().map(String::as_str).collect();
        let projected: Vec<String> = columns.iter().map(|c| format!("r.{}", c)).collect();
        let sql = format!(
            "UPDATE {table} AS t SET ({cols}) = \
             (SELECT {projected} FROM jsonb_populate_record(NULL::{table}, $1) AS r){filters}",
            table = table.name(),
            cols = columns.join(", "),
            projected = projected.join(", "),
            filters = where_clause(&query, 2),
        );

        let mut q = sqlx::query(&sql).bind(Json(&patch));
        for filter in &query.filters {
            q = q.bind(filter.column.as_str()).bind(Json(&filter.value));
        }
        let result = q.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, table: Table, query: Query) -> StoreResult<u64> {
        query.validate(table)?;

        let sql = format!(
            "DELETE FROM {} AS t{}",
            table.name(),
            where_clause(&query, 1)
        );
        let mut q = sqlx::query(&sql);
        for filter in &query.filters {
            q = q.bind(filter.column.as_str()).bind(Json(&filter.value));
        }
        let result = q.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    fn subscribe(
        &self,
        table: Table,
        filter: EventFilter,
        callback: ChangeCallback,
    ) -> Subscription {
        self.feed.subscribe(table, filter, callback)
    }

    async fn ping(&self) -> StoreResult<Duration> {
        let start = Instant::now();
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(start.elapsed())
    }
}
