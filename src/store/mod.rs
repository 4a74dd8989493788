/*!
 * Data Store Client
 * Table-scoped select/insert/update/delete/subscribe over JSON rows
 */
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, str::FromStr, sync::Arc, time::Duration};
use tokio::{sync::broadcast, task::JoinHandle};

use crate::error::{StoreError, StoreResult};

pub use memory::MemoryStore;
pub use postgres::PgStore;

// ============================================================================
// Tables
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Profile,
    Projects,
    Experiences,
    Skills,
    Contacts,
    Blogs,
}

impl Table {
    pub const ALL: [Table; 6] = [
        Table::Profile,
        Table::Projects,
        Table::Experiences,
        Table::Skills,
        Table::Contacts,
        Table::Blogs,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Profile => "profile",
            Table::Projects => "projects",
            Table::Experiences => "experiences",
            Table::Skills => "skills",
            Table::Contacts => "contacts",
            Table::Blogs => "blogs",
        }
    }

    /// Column whitelist. Filters, orderings and written keys must name one of these.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Table::Profile => &[
                "id",
                "name",
                "title",
                "bio",
                "avatar_url",
                "email",
                "years_of_experience",
                "companies",
                "core_competencies",
                "specialized_skills",
                "approach_text",
                "security_audits_count",
                "vulnerabilities_count",
                "architectures_count",
                "certifications_count",
                "github_url",
                "linkedin_url",
                "twitter_url",
                "created_at",
                "updated_at",
            ],
            Table::Projects => &[
                "id",
                "title",
                "description",
                "image_url",
                "github_url",
                "live_url",
                "tags",
                "technologies",
                "details",
                "color",
                "created_at",
                "updated_at",
            ],
            Table::Experiences => &[
                "id",
                "company",
                "position",
                "start_date",
                "end_date",
                "current",
                "mission",
                "achievements",
                "created_at",
                "updated_at",
            ],
            Table::Skills => &[
                "id",
                "name",
                "category",
                "level",
                "icon",
                "created_at",
                "updated_at",
            ],
            Table::Contacts => &[
                "id",
                "name",
                "email",
                "subject",
                "message",
                "status",
                "created_at",
                "updated_at",
            ],
            Table::Blogs => &[
                "id",
                "title",
                "slug",
                "content",
                "excerpt",
                "image_url",
                "tags",
                "published",
                "created_at",
                "updated_at",
            ],
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns().contains(&column)
    }

    pub(crate) fn check_column(&self, column: &str) -> StoreResult<()> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(StoreError::UnknownColumn {
                table: *self,
                column: column.to_string(),
            })
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Table {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| format!("unknown table '{}'", s))
    }
}

// ============================================================================
// Query builder
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// `eq` filters (AND-combined) and an optional ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    /// Shorthand for the identifier filter used by update and delete.
    pub fn by_id(id: impl ToString) -> Self {
        Self::new().eq("id", id.to_string())
    }

    pub(crate) fn validate(&self, table: Table) -> StoreResult<()> {
        for filter in &self.filters {
            table.check_column(&filter.column)?;
        }
        if let Some(order) = &self.order {
            table.check_column(&order.column)?;
        }
        Ok(())
    }

    pub(crate) fn matches(&self, row: &Value) -> bool {
        self.filters
            .iter()
            .all(|f| row.get(&f.column).unwrap_or(&Value::Null) == &f.value)
    }
}

// ============================================================================
// Realtime change notifications
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    #[serde(rename = "op")]
    pub kind: ChangeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFilter {
    #[default]
    All,
    Only(ChangeKind),
}

impl EventFilter {
    pub fn accepts(&self, kind: ChangeKind) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Only(k) => *k == kind,
        }
    }
}

pub type ChangeCallback = Arc<dyn Fn(ChangeEvent) + Send + Sync>;

/// Broadcast fan-out of change events to table subscriptions.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: ChangeEvent) {
        // No receivers is fine; nobody is listening yet.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(
        &self,
        table: Table,
        filter: EventFilter,
        callback: ChangeCallback,
    ) -> Subscription {
        let mut rx = self.sender.subscribe();
        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) if event.table == table && filter.accepts(event.kind) => {
                        callback(event)
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(table = %table, skipped, "change subscription lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        tracing::debug!(table = %table, "subscribed to changes");
        Subscription {
            table,
            handle: Some(handle),
        }
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Handle for a live change subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    table: Table,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn table(&self) -> Table {
        self.table
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn unsubscribe(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!(table = %self.table, "unsubscribed from changes");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

// ============================================================================
// Store capability
// ============================================================================

#[async_trait]
pub trait DataStore: Send + Sync {
    async fn select(&self, table: Table, query: Query) -> StoreResult<Vec<Value>>;

    /// First matching row. Zero rows is `None`, not an error.
    async fn select_single(&self, table: Table, query: Query) -> StoreResult<Option<Value>> {
        Ok(self.select(table, query).await?.into_iter().next())
    }

    async fn insert(&self, table: Table, rows: Vec<Value>) -> StoreResult<Vec<Value>>;

    async fn update(&self, table: Table, patch: Value, query: Query) -> StoreResult<u64>;

    async fn delete(&self, table: Table, query: Query) -> StoreResult<u64>;

    fn subscribe(&self, table: Table, filter: EventFilter, callback: ChangeCallback)
        -> Subscription;

    async fn ping(&self) -> StoreResult<Duration>;
}

/// Keys of a row object that are writable columns of `table`.
pub(crate) fn row_object(
    table: Table,
    row: &Value,
) -> StoreResult<&serde_json::Map<String, Value>> {
    let object = row.as_object().ok_or_else(|| StoreError::InvalidRow {
        table,
        reason: "expected a JSON object".to_string(),
    })?;
    for key in object.keys() {
        table.check_column(key)?;
    }
    Ok(object)
}
