/**
 * Blog Routes
 * Published post list with tag filtering, and post lookup by slug
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::content::normalize::is_valid_slug;
use crate::db::models::{Blog, Row};
use crate::error::ApiError;
use crate::public::{self, BlogLookup};
use crate::routes::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for GET /api/blog
#[derive(Debug, Deserialize)]
pub struct BlogListQuery {
    /// No tag (or an empty one) means all posts
    pub tag: Option<String>,
}

/// Response for GET /api/blog
#[derive(Debug, Serialize)]
pub struct BlogListResponse {
    pub items: Vec<Row<Blog>>,
    /// Every tag across published posts, for the filter bar
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/blog - published posts, newest first
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<BlogListQuery>,
) -> Result<Json<BlogListResponse>, ApiError> {
    let tag = query.tag.filter(|t| !t.trim().is_empty());
    let posts = public::fetch_published_blogs(state.store.as_ref()).await?;

    Ok(Json(BlogListResponse {
        items: public::filter_by_tag(&posts, tag.as_deref()),
        tags: public::collect_tags(&posts),
        tag,
    }))
}

/// GET /api/blog/{slug} - a missing post is 404 with a `not_found` status body
pub async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    if !is_valid_slug(&slug) {
        return Err(ApiError::BadRequest(
            "Slug must contain only lowercase letters, numbers, and hyphens".to_string(),
        ));
    }

    let lookup = public::fetch_blog_by_slug(state.store.as_ref(), &slug).await?;
    let status = match lookup {
        BlogLookup::Found(_) => StatusCode::OK,
        BlogLookup::NotFound => {
            tracing::debug!(slug = %slug, "blog post not found");
            StatusCode::NOT_FOUND
        }
    };
    Ok((status, Json(lookup)).into_response())
}
