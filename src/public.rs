/*!
 * Public Read Views
 * Ordered, read-only fetches for the public site and the contact form
 */
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::content::{decode_row, decode_rows, ContentDialog, ContentType, Record};
use crate::db::models::{Blog, Contact, ContactStatus, Experience, Profile, Project, Row, Skill};
use crate::error::{DashboardError, StoreResult};
use crate::store::{DataStore, Query, Table};

pub async fn fetch_profile(store: &dyn DataStore) -> StoreResult<Option<Row<Profile>>> {
    store
        .select_single(Table::Profile, Query::new())
        .await?
        .map(|row| decode_row(Table::Profile, row))
        .transpose()
}

pub async fn fetch_projects(store: &dyn DataStore) -> StoreResult<Vec<Row<Project>>> {
    let rows = store
        .select(Table::Projects, Query::new().order("created_at", false))
        .await?;
    decode_rows(Table::Projects, rows)
}

pub async fn fetch_experiences(store: &dyn DataStore) -> StoreResult<Vec<Row<Experience>>> {
    let rows = store
        .select(Table::Experiences, Query::new().order("start_date", false))
        .await?;
    decode_rows(Table::Experiences, rows)
}

pub async fn fetch_skills(store: &dyn DataStore) -> StoreResult<Vec<Row<Skill>>> {
    let rows = store
        .select(Table::Skills, Query::new().order("category", true))
        .await?;
    decode_rows(Table::Skills, rows)
}

/// Published posts, newest first.
pub async fn fetch_published_blogs(store: &dyn DataStore) -> StoreResult<Vec<Row<Blog>>> {
    let query = Query::new()
        .eq("published", true)
        .order("created_at", false);
    let rows = store.select(Table::Blogs, query).await?;
    decode_rows(Table::Blogs, rows)
}

/// Posts carrying `tag`; `None` keeps everything.
pub fn filter_by_tag(blogs: &[Row<Blog>], tag: Option<&str>) -> Vec<Row<Blog>> {
    match tag {
        None => blogs.to_vec(),
        Some(tag) => blogs
            .iter()
            .filter(|b| b.data.tags.iter().any(|t| t == tag))
            .cloned()
            .collect(),
    }
}

/// Every tag in use, first-seen order, no duplicates.
pub fn collect_tags(blogs: &[Row<Blog>]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in blogs.iter().flat_map(|b| b.data.tags.iter()) {
        if !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }
    tags
}

/// Outcome of a slug lookup. A missing post is a normal result, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "post", rename_all = "snake_case")]
pub enum BlogLookup {
    Found(Box<Row<Blog>>),
    NotFound,
}

/// Published post by slug. Drafts are reported as not found.
pub async fn fetch_blog_by_slug(store: &dyn DataStore, slug: &str) -> StoreResult<BlogLookup> {
    let query = Query::new().eq("slug", slug).eq("published", true);
    match store.select_single(Table::Blogs, query).await? {
        Some(row) => Ok(BlogLookup::Found(Box::new(decode_row(Table::Blogs, row)?))),
        None => Ok(BlogLookup::NotFound),
    }
}

/// Store a message from the public contact form. New messages are always unread.
pub async fn submit_contact(
    store: &dyn DataStore,
    form: &Value,
) -> Result<Row<Contact>, DashboardError> {
    let mut dialog = ContentDialog::new(ContentType::Contact);
    dialog.open(ContentType::Contact, None);
    dialog.apply(form)?;

    let Record::Contact(mut contact) = dialog.normalize()? else {
        return Err(DashboardError::UnknownType);
    };
    contact.status = ContactStatus::Unread;

    let mut row = serde_json::to_value(&contact).map_err(|e| DashboardError::Decode {
        kind: ContentType::Contact,
        reason: e.to_string(),
    })?;
    let now = Utc::now().to_rfc3339();
    row["created_at"] = Value::from(now.clone());
    row["updated_at"] = Value::from(now);

    let stored = store
        .insert(Table::Contacts, vec![row])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| DashboardError::NotFound {
            kind: ContentType::Contact,
            id: "new".to_string(),
        })?;

    tracing::info!(email = %contact.email, "contact message received");
    Ok(decode_row(Table::Contacts, stored)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    async fn seed_blogs(store: &MemoryStore) {
        store
            .insert(
                Table::Blogs,
                vec![
                    json!({ "title": "Rust", "slug": "rust", "tags": ["rust", "systems"], "published": true, "created_at": "2024-01-01T00:00:00+00:00" }),
                    json!({ "title": "Draft", "slug": "draft", "tags": ["rust"], "published": false, "created_at": "2024-02-01T00:00:00+00:00" }),
                    json!({ "title": "Web", "slug": "web", "tags": ["web"], "published": true, "created_at": "2024-03-01T00:00:00+00:00" }),
                ],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_published_blogs_newest_first() {
        let store = MemoryStore::new();
        seed_blogs(&store).await;

        let blogs = fetch_published_blogs(&store).await.unwrap();
        let slugs: Vec<&str> = blogs.iter().map(|b| b.data.slug.as_str()).collect();
        assert_eq!(slugs, vec!["web", "rust"]);
    }

    #[tokio::test]
    async fn test_filter_by_tag_returns_exact_subset() {
        let store = MemoryStore::new();
        seed_blogs(&store).await;
        let blogs = fetch_published_blogs(&store).await.unwrap();

        let rust = filter_by_tag(&blogs, Some("rust"));
        assert_eq!(rust.len(), 1);
        assert_eq!(rust[0].data.slug, "rust");
        assert_eq!(filter_by_tag(&blogs, None), blogs);
        assert!(filter_by_tag(&blogs, Some("go")).is_empty());
        assert_eq!(collect_tags(&blogs), vec!["web", "rust", "systems"]);
    }

    #[tokio::test]
    async fn test_blog_by_slug_hides_drafts() {
        let store = MemoryStore::new();
        seed_blogs(&store).await;

        assert!(matches!(
            fetch_blog_by_slug(&store, "rust").await.unwrap(),
            BlogLookup::Found(_)
        ));
        assert_eq!(fetch_blog_by_slug(&store, "draft").await.unwrap(), BlogLookup::NotFound);
        assert_eq!(fetch_blog_by_slug(&store, "nope").await.unwrap(), BlogLookup::NotFound);
    }

    #[tokio::test]
    async fn test_missing_profile_is_none() {
        let store = MemoryStore::new();
        assert!(fetch_profile(&store).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_submit_contact_forces_unread() {
        let store = MemoryStore::new();
        let form = json!({
            "name": "Ann",
            "email": "ann@example.com",
            "subject": "Hi",
            "message": "Hello there",
            "status": "replied"
        });

        let row = submit_contact(&store, &form).await.unwrap();
        assert_eq!(row.data.status, ContactStatus::Unread);
        assert_eq!(store.rows(Table::Contacts).await.len(), 1);
    }

    #[tokio::test]
    async fn test_submit_contact_rejects_bad_email() {
        let store = MemoryStore::new();
        let form = json!({ "name": "Ann", "email": "nope", "message": "Hello" });
        assert!(submit_contact(&store, &form).await.is_err());
        assert!(store.rows(Table::Contacts).await.is_empty());
    }
}
