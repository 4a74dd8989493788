//! In-process `DataStore` used when no database is configured, and by tests.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::{cmp::Ordering, collections::HashMap, time::Duration};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    row_object, ChangeCallback, ChangeEvent, ChangeFeed, ChangeKind, DataStore, EventFilter,
    Query, Subscription, Table,
};
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<Table, Vec<Value>>>,
    feed: ChangeFeed,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows currently held for `table`, in insertion order.
    pub async fn rows(&self, table: Table) -> Vec<Value> {
        self.tables
            .read()
            .await
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }
}

/// Postgres-like ordering: numbers and strings compare naturally, nulls sort last.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn select(&self, table: Table, query: Query) -> StoreResult<Vec<Value>> {
        query.validate(table)?;

        let tables = self.tables.read().await;
        let mut rows: Vec<Value> = tables
            .get(&table)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default();

        if let Some(order) = &query.order {
            // Stable sort keeps insertion order between equal keys.
            rows.sort_by(|a, b| {
                let a = a.get(&order.column).unwrap_or(&Value::Null);
                let b = b.get(&order.column).unwrap_or(&Value::Null);
                let ord = compare_values(a, b);
                if order.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }

        Ok(rows)
    }

    async fn insert(&self, table: Table, rows: Vec<Value>) -> StoreResult<Vec<Value>> {
        let mut stored = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut object: Map<String, Value> = row_object(table, row)?.clone();
            let now = Value::String(Utc::now().to_rfc3339());
            object
                .entry("id")
                .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
            object.entry("created_at").or_insert_with(|| now.clone());
            object.entry("updated_at").or_insert(now);
            stored.push(Value::Object(object));
        }

        {
            let mut tables = self.tables.write().await;
            let existing = tables.entry(table).or_default();
            for row in &stored {
                if existing.iter().any(|r| r.get("id") == row.get("id")) {
                    return Err(StoreError::InvalidRow {
                        table,
                        reason: "duplicate id".to_string(),
                    });
                }
            }
            existing.extend(stored.iter().cloned());
        }

        self.feed.publish(ChangeEvent {
            table,
            kind: ChangeKind::Insert,
        });
        Ok(stored)
    }

    async fn update(&self, table: Table, patch: Value, query: Query) -> StoreResult<u64> {
        query.validate(table)?;
        let patch = row_object(table, &patch)?.clone();

        let mut affected = 0;
        {
            let mut tables = self.tables.write().await;
            for row in tables.entry(table).or_default().iter_mut() {
                if !query.matches(row) {
                    continue;
                }
                if let Some(object) = row.as_object_mut() {
                    for (key, value) in &patch {
                        object.insert(key.clone(), value.clone());
                    }
                    affected += 1;
                }
            }
        }

        if affected > 0 {
            self.feed.publish(ChangeEvent {
                table,
                kind: ChangeKind::Update,
            });
        }
        Ok(affected)
    }

    async fn delete(&self, table: Table, query: Query) -> StoreResult<u64> {
        query.validate(table)?;

        let affected = {
            let mut tables = self.tables.write().await;
            let rows = tables.entry(table).or_default();
            let before = rows.len();
            rows.retain(|r| !query.matches(r));
            (before - rows.len()) as u64
        };

        if affected > 0 {
            self.feed.publish(ChangeEvent {
                table,
                kind: ChangeKind::Delete,
            });
        }
        Ok(affected)
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
        Ok(Duration::ZERO)
    }
}
