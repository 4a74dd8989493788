/*!
 * Admin Dashboard
 * In-memory view of all six collections; every mutation goes through here
 */
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::{
    collections::BTreeMap,
    sync::{Arc, Weak},
    time::Duration,
};
use tokio::{
    sync::{Mutex, RwLock},
    time::Instant,
};
use uuid::Uuid;

use crate::config::{AppConfig, ImageConfig};
use crate::content::{
    decode_rows, dialog::FieldSpec, group_skills, resolve_table, ContentDialog, ContentType,
    Record, RecordRef, SkillGroup,
};
use crate::db::models::{Blog, Contact, ContactStatus, Experience, Profile, Project, Row, Skill};
use crate::error::{DashboardError, DialogError, StoreResult};
use crate::public;
use crate::store::{ChangeEvent, DataStore, EventFilter, Query, Subscription, Table};

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub banner_ttl: Duration,
    pub images: ImageConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            banner_ttl: Duration::from_secs(3),
            images: ImageConfig::default(),
        }
    }
}

impl From<&AppConfig> for DashboardConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            banner_ttl: config.banner_ttl,
            images: config.site.images.clone(),
        }
    }
}

// ============================================================================
// State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerKind {
    Success,
    Error,
}

/// Transient status message shown above the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
}

#[derive(Debug)]
struct ShownBanner {
    banner: Banner,
    shown_at: Instant,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Collections {
    pub profile: Option<Row<Profile>>,
    pub projects: Vec<Row<Project>>,
    pub experiences: Vec<Row<Experience>>,
    pub skills: Vec<Row<Skill>>,
    pub contacts: Vec<Row<Contact>>,
    pub blogs: Vec<Row<Blog>>,
}

#[derive(Debug)]
struct DashboardState {
    collections: Collections,
    errors: BTreeMap<ContentType, String>,
    loading: bool,
    banner: Option<ShownBanner>,
    dialog: ContentDialog,
    /// Bumped whenever the shared dialog is opened, edited or closed.
    dialog_generation: u64,
    /// Generation of the dialog whose submit is in flight.
    submitting: Option<u64>,
    pending_delete: Option<RecordRef>,
}

impl DashboardState {
    fn dialog_busy(&self) -> bool {
        self.submitting == Some(self.dialog_generation)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DialogView {
    pub open: bool,
    pub kind: ContentType,
    pub title: String,
    pub description: &'static str,
    pub editing: Option<Uuid>,
    pub draft: Value,
    pub error: Option<String>,
    pub fields: &'static [FieldSpec],
    pub disabled: Vec<&'static str>,
}

impl From<&ContentDialog> for DialogView {
    fn from(dialog: &ContentDialog) -> Self {
        Self {
            open: dialog.is_open(),
            kind: dialog.kind(),
            title: dialog.title(),
            description: dialog.description(),
            editing: dialog.editing_id(),
            draft: dialog.draft().as_value(),
            error: dialog.error().map(str::to_string),
            fields: dialog.fields(),
            disabled: dialog
                .fields()
                .iter()
                .filter(|f| !dialog.is_enabled(f.name))
                .map(|f| f.name)
                .collect(),
        }
    }
}

/// Everything the admin page renders.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub profile: Option<Row<Profile>>,
    pub projects: Vec<Row<Project>>,
    pub experiences: Vec<Row<Experience>>,
    pub skills: Vec<SkillGroup>,
    pub contacts: Vec<Row<Contact>>,
    pub blogs: Vec<Row<Blog>>,
    pub errors: BTreeMap<ContentType, String>,
    pub loading: bool,
    pub banner: Option<Banner>,
    pub dialog: DialogView,
    pub pending_delete: Option<RecordRef>,
}

fn collection_label(kind: ContentType) -> &'static str {
    match kind {
        ContentType::Profile => "profile data",
        other => other.table().name(),
    }
}

/// Store a fetch result, or record a per-collection error and keep the old data.
fn settle<T>(
    errors: &mut BTreeMap<ContentType, String>,
    slot: &mut T,
    kind: ContentType,
    result: StoreResult<T>,
) {
    match result {
        Ok(value) => {
            *slot = value;
            errors.remove(&kind);
        }
        Err(e) => {
            tracing::error!(collection = kind.table().name(), error = %e, "failed to load collection");
            errors.insert(kind, format!("Error loading {}", collection_label(kind)));
        }
    }
}

async fn fetch_contacts(store: &dyn DataStore) -> StoreResult<Vec<Row<Contact>>> {
    let rows = store
        .select(Table::Contacts, Query::new().order("created_at", false))
        .await?;
    decode_rows(Table::Contacts, rows)
}

/// All posts, drafts included.
async fn fetch_all_blogs(store: &dyn DataStore) -> StoreResult<Vec<Row<Blog>>> {
    let rows = store
        .select(Table::Blogs, Query::new().order("created_at", false))
        .await?;
    decode_rows(Table::Blogs, rows)
}

// ============================================================================
// Dashboard
// ============================================================================

pub struct Dashboard {
    store: Arc<dyn DataStore>,
    config: DashboardConfig,
    state: RwLock<DashboardState>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl Dashboard {
    pub fn new(store: Arc<dyn DataStore>, config: DashboardConfig) -> Self {
        Self {
            store,
            config,
            state: RwLock::new(DashboardState {
                collections: Collections::default(),
                errors: BTreeMap::new(),
                loading: false,
                banner: None,
                dialog: ContentDialog::new(ContentType::Project),
                dialog_generation: 0,
                submitting: None,
                pending_delete: None,
            }),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    // ------------------------------------------------------------------------
    // Loading and realtime
    // ------------------------------------------------------------------------

    /// Fetch all six collections. A failed fetch never stops the others.
    pub async fn load(&self) {
        self.state.write().await.loading = true;

        let store = self.store.as_ref();
        let (profile, projects, experiences, skills, contacts, blogs) = tokio::join!(
            public::fetch_profile(store),
            public::fetch_projects(store),
            public::fetch_experiences(store),
            public::fetch_skills(store),
            fetch_contacts(store),
            fetch_all_blogs(store),
        );

        let mut guard = self.state.write().await;
        let state = &mut *guard;
        let (errors, c) = (&mut state.errors, &mut state.collections);
        settle(errors, &mut c.profile, ContentType::Profile, profile);
        settle(errors, &mut c.projects, ContentType::Project, projects);
        settle(errors, &mut c.experiences, ContentType::Experience, experiences);
        settle(errors, &mut c.skills, ContentType::Skill, skills);
        settle(errors, &mut c.contacts, ContentType::Contact, contacts);
        settle(errors, &mut c.blogs, ContentType::Blog, blogs);
        state.loading = false;

        tracing::debug!(failed = state.errors.len(), "dashboard data loaded");
    }

    /// Subscribe to every table and load. Any change reloads everything.
    pub async fn mount(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let subscriptions: Vec<Subscription> = Table::ALL
            .into_iter()
            .map(|table| {
                let weak = weak.clone();
                self.store.subscribe(
                    table,
                    EventFilter::All,
                    Arc::new(move |event: ChangeEvent| {
                        let weak = weak.clone();
                        tokio::spawn(async move {
                            if let Some(dashboard) = weak.upgrade() {
                                tracing::debug!(table = %event.table, op = ?event.kind, "change received, reloading");
                                dashboard.load().await;
                            }
                        });
                    }),
                )
            })
            .collect();

        self.subscriptions.lock().await.extend(subscriptions);
        tracing::info!("admin dashboard mounted");
        self.load().await;
    }

    pub async fn unmount(&self) {
        let mut subscriptions = self.subscriptions.lock().await;
        for subscription in subscriptions.iter_mut() {
            subscription.unsubscribe();
        }
        subscriptions.clear();
        tracing::info!("admin dashboard unmounted");
    }

    pub async fn is_mounted(&self) -> bool {
        self.subscriptions
            .lock()
            .await
            .iter()
            .any(Subscription::is_active)
    }

    // ------------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------------

    pub async fn snapshot(&self) -> DashboardSnapshot {
        let state = self.state.read().await;
        let c = &state.collections;
        DashboardSnapshot {
            profile: c.profile.clone(),
            projects: c.projects.clone(),
            experiences: c.experiences.clone(),
            skills: group_skills(&c.skills),
            contacts: c.contacts.clone(),
            blogs: c.blogs.clone(),
            errors: state.errors.clone(),
            loading: state.loading,
            banner: self.live_banner(&state),
            dialog: DialogView::from(&state.dialog),
            pending_delete: state.pending_delete,
        }
    }

    pub async fn collections(&self) -> Collections {
        self.state.read().await.collections.clone()
    }

    pub async fn errors(&self) -> BTreeMap<ContentType, String> {
        self.state.read().await.errors.clone()
    }

    pub async fn dialog(&self) -> ContentDialog {
        self.state.read().await.dialog.clone()
    }

    pub async fn pending_delete(&self) -> Option<RecordRef> {
        self.state.read().await.pending_delete
    }

    /// The current banner, if it has not yet timed out.
    pub async fn banner(&self) -> Option<Banner> {
        let state = self.state.read().await;
        self.live_banner(&state)
    }

    fn live_banner(&self, state: &DashboardState) -> Option<Banner> {
        state
            .banner
            .as_ref()
            .filter(|shown| shown.shown_at.elapsed() < self.config.banner_ttl)
            .map(|shown| shown.banner.clone())
    }

    async fn show_banner(&self, kind: BannerKind, text: String) {
        self.state.write().await.banner = Some(ShownBanner {
            banner: Banner { kind, text },
            shown_at: Instant::now(),
        });
    }

    // ------------------------------------------------------------------------
    // Add / edit
    // ------------------------------------------------------------------------

    pub async fn open_add(&self, kind: ContentType) {
        let mut state = self.state.write().await;
        state.dialog.open(kind, None);
        state.dialog_generation += 1;
    }

    pub async fn open_edit(&self, target: RecordRef) -> Result<(), DashboardError> {
        let row = self.fetch_row(target).await?;
        let mut state = self.state.write().await;
        state.dialog.open(target.kind, Some(&row));
        state.dialog_generation += 1;
        Ok(())
    }

    /// Apply field edits to the open dialog's draft. Rejected while that draft is submitting.
    pub async fn edit_draft(&self, edits: &Value) -> Result<(), DashboardError> {
        let mut state = self.state.write().await;
        if !state.dialog.is_open() {
            return Err(DashboardError::Dialog(DialogError::Closed));
        }
        if state.dialog_busy() {
            return Err(DashboardError::Dialog(DialogError::Submitting));
        }
        state.dialog.apply(edits)?;
        state.dialog_generation += 1;
        Ok(())
    }

    pub async fn close_dialog(&self) {
        let mut state = self.state.write().await;
        state.dialog.close();
        state.dialog_generation += 1;
    }

    /// Submit the open dialog. On failure the dialog stays open with its draft.
    ///
    /// The outcome is written back only if the dialog was not reopened or
    /// closed while the save ran.
    pub async fn submit_dialog(&self) -> Result<Uuid, DashboardError> {
        let (mut dialog, generation) = {
            let mut state = self.state.write().await;
            if state.dialog_busy() {
                return Err(DashboardError::Dialog(DialogError::Submitting));
            }
            state.submitting = Some(state.dialog_generation);
            (state.dialog.clone(), state.dialog_generation)
        };

        let outcome = self.run_dialog(&mut dialog).await;

        let mut state = self.state.write().await;
        if state.submitting == Some(generation) {
            state.submitting = None;
        }
        if state.dialog_generation == generation {
            state.dialog = dialog;
            state.dialog_generation += 1;
        } else {
            tracing::debug!(kind = %dialog.kind(), "dialog replaced during submit, keeping the newer one");
        }
        outcome
    }

    /// One-shot add or edit that leaves the dashboard's own dialog untouched.
    pub async fn submit_form(
        &self,
        kind: ContentType,
        editing: Option<Uuid>,
        edits: &Value,
    ) -> Result<Uuid, DashboardError> {
        let mut dialog = ContentDialog::new(kind);
        match editing {
            Some(id) => {
                let row = self.fetch_row(RecordRef::new(kind, id)).await?;
                dialog.open(kind, Some(&row));
            }
            None => dialog.open(kind, None),
        }
        dialog.apply(edits)?;
        self.run_dialog(&mut dialog).await
    }

    async fn run_dialog(&self, dialog: &mut ContentDialog) -> Result<Uuid, DashboardError> {
        let editing = dialog.editing_id();
        let mut saved = None;
        let mut failure = None;
        let (saved_slot, failure_slot) = (&mut saved, &mut failure);

        let submitted = dialog
            .submit(move |record| async move {
                match self.save(editing, record).await {
                    Ok(id) => {
                        *saved_slot = Some(id);
                        Ok(())
                    }
                    Err(e) => {
                        let message = e.to_string();
                        *failure_slot = Some(e);
                        Err(message)
                    }
                }
            })
            .await;

        match submitted {
            Ok(_) => saved.ok_or(DashboardError::MissingId),
            Err(e) => Err(failure.unwrap_or(DashboardError::Dialog(e))),
        }
    }

    /// Insert or update a normalized record, then reload.
    pub async fn save(&self, editing: Option<Uuid>, record: Record) -> Result<Uuid, DashboardError> {
        let kind = record.content_type();
        match self.persist(editing, &record).await {
            Ok((id, updated)) => {
                let verb = if updated { "updated" } else { "added" };
                tracing::info!(kind = %kind, id = %id, "content {}", verb);
                self.show_banner(BannerKind::Success, format!("{} {} successfully!", kind, verb))
                    .await;
                self.load().await;
                Ok(id)
            }
            Err(e) => {
                let verb = if editing.is_some() { "update" } else { "add" };
                tracing::error!(kind = %kind, error = %e, "failed to {} content", verb);
                self.show_banner(BannerKind::Error, format!("Failed to {} {}", verb, kind))
                    .await;
                Err(e)
            }
        }
    }

    /// Returns the row id and whether an existing row was updated.
    async fn persist(
        &self,
        editing: Option<Uuid>,
        record: &Record,
    ) -> Result<(Uuid, bool), DashboardError> {
        let kind = record.content_type();
        let table = kind.table();

        if let Some(url) = record
            .image_urls()
            .into_iter()
            .find(|url| !self.config.images.allows(url))
        {
            return Err(DashboardError::ImageHost(url.to_string()));
        }

        let mut row = record.to_value().map_err(|e| DashboardError::Decode {
            kind,
            reason: e.to_string(),
        })?;
        let now = Value::from(Utc::now().to_rfc3339());
        row["updated_at"] = now.clone();

        // The profile is a singleton: an add becomes an update of the existing row.
        let target = match editing {
            Some(id) => Some(id),
            None if kind == ContentType::Profile => {
                public::fetch_profile(self.store.as_ref()).await?.map(|p| p.id)
            }
            None => None,
        };

        if let Record::Blog(blog) = record {
            self.ensure_slug_free(&blog.slug, target).await?;
        }

        match target {
            Some(id) => {
                let affected = self.store.update(table, row, Query::by_id(id)).await?;
                if affected == 0 {
                    return Err(DashboardError::NotFound {
                        kind,
                        id: id.to_string(),
                    });
                }
                Ok((id, true))
            }
            None => {
                row["created_at"] = now;
                let stored = self.store.insert(table, vec![row]).await?;
                let id = stored
                    .first()
                    .and_then(|r| r.get("id"))
                    .and_then(Value::as_str)
                    .and_then(|s| Uuid::parse_str(s).ok())
                    .ok_or(DashboardError::MissingId)?;
                Ok((id, false))
            }
        }
    }

    /// Slugs address posts publicly, so two posts may not share one.
    async fn ensure_slug_free(&self, slug: &str, own_id: Option<Uuid>) -> Result<(), DashboardError> {
        let taken = self
            .store
            .select(Table::Blogs, Query::new().eq("slug", slug))
            .await?
            .iter()
            .filter_map(|row| row.get("id").and_then(Value::as_str))
            .any(|id| own_id.map_or(true, |own| Uuid::parse_str(id).ok() != Some(own)));

        if taken {
            return Err(DashboardError::Dialog(DialogError::Invalid {
                field: "slug".to_string(),
                reason: format!("'{}' is already used by another post", slug),
            }));
        }
        Ok(())
    }

    async fn fetch_row(&self, target: RecordRef) -> Result<Value, DashboardError> {
        self.store
            .select_single(target.kind.table(), Query::by_id(target.id))
            .await?
            .ok_or_else(|| DashboardError::NotFound {
                kind: target.kind,
                id: target.id.to_string(),
            })
    }

    // ------------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------------

    pub async fn request_delete(&self, target: RecordRef) {
        self.state.write().await.pending_delete = Some(target);
    }

    /// Stage a delete for a record without a typed reference. An explicit
    /// `type` tag is used when present, otherwise the record's fields decide.
    pub async fn request_delete_untyped(&self, record: &Value) -> Result<RecordRef, DashboardError> {
        let Some(table) = resolve_table(record) else {
            tracing::warn!(record = %record, "delete requested for a record of unknown type");
            self.show_banner(BannerKind::Error, DashboardError::UnknownType.to_string())
                .await;
            return Err(DashboardError::UnknownType);
        };

        let Some(id) = record
            .get("id")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
        else {
            tracing::warn!(record = %record, "delete requested for a record without an id");
            self.show_banner(BannerKind::Error, "Cannot delete item: missing id".to_string())
                .await;
            return Err(DashboardError::MissingId);
        };

        let target = RecordRef::new(ContentType::from_table(table), id);
        self.request_delete(target).await;
        Ok(target)
    }

    pub async fn cancel_delete(&self) -> Option<RecordRef> {
        self.state.write().await.pending_delete.take()
    }

    /// Delete the staged record. On failure it stays staged.
    pub async fn confirm_delete(&self) -> Result<RecordRef, DashboardError> {
        let target = self
            .state
            .write()
            .await
            .pending_delete
            .take()
            .ok_or(DashboardError::NoPendingDelete)?;

        match self.delete(target).await {
            Ok(()) => Ok(target),
            Err(e) => {
                self.state.write().await.pending_delete = Some(target);
                Err(e)
            }
        }
    }

    pub async fn delete(&self, target: RecordRef) -> Result<(), DashboardError> {
        let table = target.kind.table();
        let result = match self.store.delete(table, Query::by_id(target.id)).await {
            Ok(0) => Err(DashboardError::NotFound {
                kind: target.kind,
                id: target.id.to_string(),
            }),
            Ok(_) => Ok(()),
            Err(e) => Err(e.into()),
        };

        match &result {
            Ok(()) => {
                tracing::info!(table = %table, id = %target.id, "content deleted");
                self.show_banner(BannerKind::Success, format!("{} deleted successfully!", table))
                    .await;
                self.load().await;
            }
            Err(e) => {
                tracing::error!(table = %table, id = %target.id, error = %e, "failed to delete content");
                self.show_banner(BannerKind::Error, format!("Error deleting {}", table))
                    .await;
            }
        }
        result
    }

    // ------------------------------------------------------------------------
    // Contacts
    // ------------------------------------------------------------------------

    /// Change a message's status and patch the local list in place.
    pub async fn set_contact_status(
        &self,
        id: Uuid,
        status: ContactStatus,
    ) -> Result<(), DashboardError> {
        let now = Utc::now();
        let patch = json!({ "status": status, "updated_at": now.to_rfc3339() });

        let affected = match self.store.update(Table::Contacts, patch, Query::by_id(id)).await {
            Ok(affected) => affected,
            Err(e) => {
                tracing::error!(id = %id, error = %e, "failed to update contact status");
                self.show_banner(BannerKind::Error, "Error updating contact status".to_string())
                    .await;
                return Err(e.into());
            }
        };
        if affected == 0 {
            return Err(DashboardError::NotFound {
                kind: ContentType::Contact,
                id: id.to_string(),
            });
        }

        let mut state = self.state.write().await;
        if let Some(contact) = state.collections.contacts.iter_mut().find(|c| c.id == id) {
            contact.data.status = status;
            contact.updated_at = now;
        }
        Ok(())
    }

    /// Delete a message and splice it out of the local list.
    pub async fn delete_contact(&self, id: Uuid) -> Result<(), DashboardError> {
        let affected = match self.store.delete(Table::Contacts, Query::by_id(id)).await {
            Ok(affected) => affected,
            Err(e) => {
                tracing::error!(id = %id, error = %e, "failed to delete contact");
                self.show_banner(BannerKind::Error, "Error deleting contacts".to_string())
                    .await;
                return Err(e.into());
            }
        };
        if affected == 0 {
            return Err(DashboardError::NotFound {
                kind: ContentType::Contact,
                id: id.to_string(),
            });
        }

        self.state
            .write()
            .await
            .collections
            .contacts
            .retain(|c| c.id != id);
        self.show_banner(BannerKind::Success, "contacts deleted successfully!".to_string())
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::{ChangeCallback, MemoryStore};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// MemoryStore that can fail selects on one table or all writes, and counts deletes.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        failing_select: Option<Table>,
        failing_writes: AtomicBool,
        deletes: AtomicUsize,
        /// Signals the first notify when an insert starts, then waits on the second.
        insert_gate: Option<(Arc<Notify>, Arc<Notify>)>,
    }

    impl FlakyStore {
        fn unavailable() -> StoreError {
            StoreError::Unavailable("connection reset".to_string())
        }
    }

    #[async_trait]
    impl DataStore for FlakyStore {
        async fn select(&self, table: Table, query: Query) -> StoreResult<Vec<Value>> {
            if self.failing_select == Some(table) {
                return Err(Self::unavailable());
            }
            self.inner.select(table, query).await
        }

        async fn insert(&self, table: Table, rows: Vec<Value>) -> StoreResult<Vec<Value>> {
            if let Some((started, release)) = &self.insert_gate {
                started.notify_one();
                release.notified().await;
            }
            if self.failing_writes.load(Ordering::SeqCst) {
                return Err(Self::unavailable());
            }
            self.inner.insert(table, rows).await
        }

        async fn update(&self, table: Table, patch: Value, query: Query) -> StoreResult<u64> {
            if self.failing_writes.load(Ordering::SeqCst) {
                return Err(Self::unavailable());
            }
            self.inner.update(table, patch, query).await
        }

        async fn delete(&self, table: Table, query: Query) -> StoreResult<u64> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            self.inner.delete(table, query).await
        }

        fn subscribe(
            &self,
            table: Table,
            filter: EventFilter,
            callback: ChangeCallback,
        ) -> Subscription {
            self.inner.subscribe(table, filter, callback)
        }

        async fn ping(&self) -> StoreResult<Duration> {
            self.inner.ping().await
        }
    }

    fn dashboard_over(store: Arc<FlakyStore>) -> Dashboard {
        Dashboard::new(store, DashboardConfig::default())
    }

    async fn seed(store: &FlakyStore) {
        store
            .inner
            .insert(
                Table::Projects,
                vec![json!({ "title": "Scanner", "technologies": ["Rust"] })],
            )
            .await
            .unwrap();
        store
            .inner
            .insert(
                Table::Skills,
                vec![json!({ "name": "Nmap", "category": "Security Tools", "level": 90 })],
            )
            .await
            .unwrap();
        store
            .inner
            .insert(
                Table::Blogs,
                vec![json!({ "title": "Hello", "slug": "hello", "published": false })],
            )
            .await
            .unwrap();
        store
            .inner
            .insert(
                Table::Contacts,
                vec![json!({ "name": "Ann", "email": "ann@example.com", "message": "hi" })],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_contacts_failure_does_not_block_other_collections() {
        let store = Arc::new(FlakyStore {
            failing_select: Some(Table::Contacts),
            ..Default::default()
        });
        seed(&store).await;
        let dashboard = dashboard_over(store);

        dashboard.load().await;
        let snapshot = dashboard.snapshot().await;

        assert_eq!(snapshot.projects.len(), 1);
        assert_eq!(snapshot.skills.len(), 1);
        assert_eq!(snapshot.blogs.len(), 1, "drafts are visible to the admin");
        assert!(snapshot.contacts.is_empty());
        assert_eq!(snapshot.errors.len(), 1);
        assert_eq!(
            snapshot.errors.get(&ContentType::Contact).map(String::as_str),
            Some("Error loading contacts")
        );
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn test_add_current_experience() {
        let store = Arc::new(FlakyStore::default());
        let dashboard = dashboard_over(store.clone());

        dashboard.open_add(ContentType::Experience).await;
        dashboard
            .edit_draft(&json!({
                "company": "Acme",
                "position": "Analyst",
                "start_date": "2021-01-01",
                "end_date": "2023-01-01",
                "current": true,
                "achievements": "Found 10 bugs\nWrote 3 reports"
            }))
            .await
            .unwrap();
        let id = dashboard.submit_dialog().await.unwrap();

        let collections = dashboard.collections().await;
        let exp = &collections.experiences[0];
        assert_eq!(exp.id, id);
        assert_eq!(exp.data.end_date, None);
        assert_eq!(exp.data.start_date, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
        assert_eq!(exp.data.achievements, vec!["Found 10 bugs", "Wrote 3 reports"]);

        assert!(!dashboard.dialog().await.is_open());
        assert_eq!(
            dashboard.banner().await,
            Some(Banner {
                kind: BannerKind::Success,
                text: "experience added successfully!".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_edit_updates_existing_row() {
        let store = Arc::new(FlakyStore::default());
        seed(&store).await;
        let dashboard = dashboard_over(store.clone());
        dashboard.load().await;

        let project = dashboard.collections().await.projects[0].clone();
        dashboard
            .open_edit(RecordRef::new(ContentType::Project, project.id))
            .await
            .unwrap();
        assert_eq!(dashboard.dialog().await.editing_id(), Some(project.id));

        dashboard
            .edit_draft(&json!({ "title": "Scanner v2", "description": "Port scanner" }))
            .await
            .unwrap();
        dashboard.submit_dialog().await.unwrap();

        let rows = store.inner.rows(Table::Projects).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], "Scanner v2");
        assert_eq!(rows[0]["technologies"], json!(["Rust"]));
        assert_eq!(dashboard.collections().await.projects[0].data.title, "Scanner v2");
    }

    #[tokio::test]
    async fn test_profile_stays_singleton() {
        let store = Arc::new(FlakyStore::default());
        let dashboard = dashboard_over(store.clone());
        let form = json!({ "name": "Ada", "title": "Engineer", "bio": "Builds things" });

        let first = dashboard
            .submit_form(ContentType::Profile, None, &form)
            .await
            .unwrap();
        let second = dashboard
            .submit_form(ContentType::Profile, None, &json!({ "name": "Ada L.", "title": "Engineer", "bio": "Builds things" }))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.inner.rows(Table::Profile).await.len(), 1);
        let profile = dashboard.collections().await.profile.unwrap();
        assert_eq!(profile.data.name, "Ada L.");
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_dialog_open() {
        let store = Arc::new(FlakyStore::default());
        store.failing_writes.store(true, Ordering::SeqCst);
        let dashboard = dashboard_over(store.clone());

        dashboard.open_add(ContentType::Skill).await;
        dashboard
            .edit_draft(&json!({ "name": "Rust", "category": "Technical Skills", "level": "80" }))
            .await
            .unwrap();
        let before = dashboard.dialog().await.draft().clone();

        let result = dashboard.submit_dialog().await;
        assert!(matches!(result, Err(DashboardError::Store(_))));

        let dialog = dashboard.dialog().await;
        assert!(dialog.is_open());
        assert!(dialog.error().is_some());
        assert_eq!(dialog.draft(), &before);
        assert_eq!(
            dashboard.banner().await.map(|b| b.text),
            Some("Failed to add skill".to_string())
        );
    }

    #[tokio::test]
    async fn test_invalid_draft_is_a_dialog_error() {
        let dashboard = dashboard_over(Arc::new(FlakyStore::default()));
        dashboard.open_add(ContentType::Blog).await;
        let result = dashboard.submit_dialog().await;
        assert!(matches!(
            result,
            Err(DashboardError::Dialog(DialogError::MissingField(_)))
        ));
        assert!(dashboard.dialog().await.is_open());
    }

    #[tokio::test]
    async fn test_dialog_opened_during_submit_is_kept() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let store = Arc::new(FlakyStore {
            insert_gate: Some((started.clone(), release.clone())),
            ..Default::default()
        });
        let dashboard = Arc::new(dashboard_over(store.clone()));

        dashboard.open_add(ContentType::Skill).await;
        dashboard
            .edit_draft(&json!({ "name": "Rust", "category": "Technical Skills" }))
            .await
            .unwrap();

        let submitting = dashboard.clone();
        let submit = tokio::spawn(async move { submitting.submit_dialog().await });
        started.notified().await;

        // The in-flight draft is frozen.
        assert!(matches!(
            dashboard.edit_draft(&json!({ "level": 10 })).await,
            Err(DashboardError::Dialog(DialogError::Submitting))
        ));
        assert!(matches!(
            dashboard.submit_dialog().await,
            Err(DashboardError::Dialog(DialogError::Submitting))
        ));

        // A new dialog is independent of it.
        dashboard.open_add(ContentType::Blog).await;
        dashboard
            .edit_draft(&json!({ "title": "Draft post" }))
            .await
            .unwrap();

        release.notify_one();
        submit.await.unwrap().unwrap();

        let dialog = dashboard.dialog().await;
        assert!(dialog.is_open());
        assert_eq!(dialog.kind(), ContentType::Blog);
        assert_eq!(dialog.draft().get("title"), Some(&json!("Draft post")));
        assert_eq!(store.inner.rows(Table::Skills).await.len(), 1);
    }

    #[tokio::test]
    async fn test_close_during_failed_submit_stays_closed() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let store = Arc::new(FlakyStore {
            insert_gate: Some((started.clone(), release.clone())),
            failing_writes: AtomicBool::new(true),
            ..Default::default()
        });
        let dashboard = Arc::new(dashboard_over(store));

        dashboard.open_add(ContentType::Skill).await;
        dashboard
            .edit_draft(&json!({ "name": "Go", "category": "Technical Skills" }))
            .await
            .unwrap();

        let submitting = dashboard.clone();
        let submit = tokio::spawn(async move { submitting.submit_dialog().await });
        started.notified().await;
        dashboard.close_dialog().await;
        release.notify_one();
        assert!(submit.await.unwrap().is_err());

        // The failed draft does not reopen over the close.
        assert!(!dashboard.dialog().await.is_open());
    }

    #[tokio::test]
    async fn test_unknown_type_issues_no_delete() {
        let store = Arc::new(FlakyStore::default());
        let dashboard = dashboard_over(store.clone());

        let record = json!({ "id": Uuid::new_v4().to_string(), "name": "mystery" });
        let result = dashboard.request_delete_untyped(&record).await;

        assert!(matches!(result, Err(DashboardError::UnknownType)));
        assert_eq!(store.deletes.load(Ordering::SeqCst), 0);
        assert!(dashboard.pending_delete().await.is_none());
        assert_eq!(
            dashboard.banner().await.map(|b| b.text),
            Some("Cannot delete item: unknown type".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_id_shows_banner() {
        let store = Arc::new(FlakyStore::default());
        let dashboard = dashboard_over(store.clone());

        let record = json!({ "type": "blog", "title": "No id yet" });
        let result = dashboard.request_delete_untyped(&record).await;

        assert!(matches!(result, Err(DashboardError::MissingId)));
        assert_eq!(store.deletes.load(Ordering::SeqCst), 0);
        assert!(dashboard.pending_delete().await.is_none());
        assert_eq!(
            dashboard.banner().await.map(|b| b.text),
            Some("Cannot delete item: missing id".to_string())
        );
    }

    #[tokio::test]
    async fn test_sniffed_project_delete() {
        let store = Arc::new(FlakyStore::default());
        seed(&store).await;
        let dashboard = dashboard_over(store.clone());
        dashboard.load().await;

        let row = serde_json::to_value(&dashboard.collections().await.projects[0]).unwrap();
        let target = dashboard.request_delete_untyped(&row).await.unwrap();
        assert_eq!(target.kind, ContentType::Project);
        assert_eq!(dashboard.pending_delete().await, Some(target));

        dashboard.confirm_delete().await.unwrap();
        assert_eq!(store.deletes.load(Ordering::SeqCst), 1);
        assert!(store.inner.rows(Table::Projects).await.is_empty());
        assert!(dashboard.collections().await.projects.is_empty());
        assert!(dashboard.pending_delete().await.is_none());
    }

    #[tokio::test]
    async fn test_confirm_without_request() {
        let dashboard = dashboard_over(Arc::new(FlakyStore::default()));
        assert!(matches!(
            dashboard.confirm_delete().await,
            Err(DashboardError::NoPendingDelete)
        ));
    }

    #[tokio::test]
    async fn test_banner_auto_dismisses() {
        tokio::time::pause();
        let dashboard = dashboard_over(Arc::new(FlakyStore::default()));
        dashboard
            .save(
                None,
                Record::Skill(Skill {
                    name: "Go".to_string(),
                    category: "Technical Skills".to_string().into(),
                    level: 60,
                    icon: "💻".to_string(),
                }),
            )
            .await
            .unwrap();
        assert!(dashboard.banner().await.is_some());

        tokio::time::advance(Duration::from_millis(2999)).await;
        assert!(dashboard.banner().await.is_some());
        tokio::time::advance(Duration::from_millis(2)).await;
        assert!(dashboard.banner().await.is_none());
    }

    fn post(title: &str, slug: &str) -> Record {
        Record::Blog(Blog {
            title: title.to_string(),
            slug: slug.to_string(),
            content: "Body".to_string(),
            excerpt: String::new(),
            image_url: None,
            tags: vec![],
            published: false,
        })
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let store = Arc::new(FlakyStore::default());
        let dashboard = dashboard_over(store.clone());

        let first = dashboard.save(None, post("Hello", "hello")).await.unwrap();
        let result = dashboard.save(None, post("Hello again", "hello")).await;
        assert!(matches!(
            result,
            Err(DashboardError::Dialog(DialogError::Invalid { ref field, .. })) if field == "slug"
        ));
        assert_eq!(store.inner.select(Table::Blogs, Query::new()).await.unwrap().len(), 1);

        // Re-saving a post under its own slug is fine.
        dashboard
            .save(Some(first), post("Hello, edited", "hello"))
            .await
            .unwrap();
        assert_eq!(dashboard.collections().await.blogs[0].data.title, "Hello, edited");
    }

    #[tokio::test]
    async fn test_image_host_policy() {
        let config = DashboardConfig {
            images: ImageConfig {
                unoptimized: false,
                remote_hosts: vec!["*.supabase.co".to_string()],
            },
            ..Default::default()
        };
        let dashboard = Dashboard::new(Arc::new(FlakyStore::default()), config);

        let result = dashboard
            .submit_form(
                ContentType::Blog,
                None,
                &json!({ "title": "Hi", "content": "x", "image_url": "https://evil.example/x.png" }),
            )
            .await;
        assert!(matches!(result, Err(DashboardError::ImageHost(_))));
    }

    #[tokio::test]
    async fn test_contact_status_patches_locally() {
        let store = Arc::new(FlakyStore::default());
        seed(&store).await;
        let dashboard = dashboard_over(store.clone());
        dashboard.load().await;

        let id = dashboard.collections().await.contacts[0].id;
        dashboard
            .set_contact_status(id, ContactStatus::Replied)
            .await
            .unwrap();
        assert_eq!(
            dashboard.collections().await.contacts[0].data.status,
            ContactStatus::Replied
        );
        assert_eq!(store.inner.rows(Table::Contacts).await[0]["status"], "replied");

        dashboard.delete_contact(id).await.unwrap();
        assert!(dashboard.collections().await.contacts.is_empty());
        assert!(matches!(
            dashboard.delete_contact(id).await,
            Err(DashboardError::NotFound { .. })
        ));
    }

    async fn wait_for<F, Fut>(mut check: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        for _ in 0..50 {
            if check().await {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_realtime_change_reloads_until_unmounted() {
        let store = Arc::new(FlakyStore::default());
        let dashboard = Arc::new(dashboard_over(store.clone()));
        dashboard.mount().await;
        assert!(dashboard.is_mounted().await);

        store
            .inner
            .insert(Table::Skills, vec![json!({ "name": "Rust", "category": "Technical Skills" })])
            .await
            .unwrap();
        let watched = dashboard.clone();
        let loaded = wait_for(move || {
            let dashboard = watched.clone();
            async move { dashboard.collections().await.skills.len() == 1 }
        })
        .await;
        assert!(loaded);

        dashboard.unmount().await;
        assert!(!dashboard.is_mounted().await);

        store
            .inner
            .insert(Table::Skills, vec![json!({ "name": "Go", "category": "Technical Skills" })])
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(dashboard.collections().await.skills.len(), 1);
    }
}
