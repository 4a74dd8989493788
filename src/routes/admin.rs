/**
 * Admin Routes
 * Content management behind the session guard. Every mutation goes
 * through the shared dashboard so banners and reloads stay consistent.
 */
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::admin::DashboardSnapshot;
use crate::content::dialog::{field_set, FieldSpec};
use crate::content::{ContentType, RecordRef};
use crate::db::models::ContactStatus;
use crate::error::ApiError;
use crate::routes::{AppState, SuccessResponse};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FieldsResponse {
    #[serde(rename = "type")]
    pub kind: ContentType,
    pub fields: &'static [FieldSpec],
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: ContactStatus,
}

#[derive(Debug, Deserialize)]
pub struct OpenDialogRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted: RecordRef,
}

fn parse_kind(raw: &str) -> Result<ContentType, ApiError> {
    raw.parse::<ContentType>().map_err(ApiError::BadRequest)
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid id '{}'", raw)))
}

// ============================================================================
// Dashboard
// ============================================================================

/// GET /api/admin/dashboard
pub async fn dashboard(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    Json(state.dashboard.snapshot().await)
}

/// POST /api/admin/reload - refetch every collection
pub async fn reload(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    state.dashboard.load().await;
    Json(state.dashboard.snapshot().await)
}

/// GET /api/admin/fields/{type}
pub async fn fields(Path(kind): Path<String>) -> Result<Json<FieldsResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    Ok(Json(FieldsResponse {
        kind,
        fields: field_set(kind),
    }))
}

// ============================================================================
// Add / edit
// ============================================================================

/// POST /api/admin/{type}
pub async fn create(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<SuccessResponse>), ApiError> {
    let kind = parse_kind(&kind)?;
    let id = state.dashboard.submit_form(kind, None, &payload).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::with_id(id))))
}

/// PATCH /api/admin/{type}/{id} - fields absent from the body keep their stored values
pub async fn update(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    Json(payload): Json<Value>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    let id = parse_id(&id)?;
    let id = state.dashboard.submit_form(kind, Some(id), &payload).await?;
    Ok(Json(SuccessResponse::with_id(id)))
}

/// POST /api/admin/dialog - open the shared dialog for an add or an edit
pub async fn open_dialog(
    State(state): State<AppState>,
    Json(payload): Json<OpenDialogRequest>,
) -> Result<Json<DashboardSnapshot>, ApiError> {
    let kind = parse_kind(&payload.kind)?;
    match payload.id.as_deref() {
        Some(id) => {
            let target = RecordRef::new(kind, parse_id(id)?);
            state.dashboard.open_edit(target).await?;
        }
        None => state.dashboard.open_add(kind).await,
    }
    Ok(Json(state.dashboard.snapshot().await))
}

/// PATCH /api/admin/dialog - apply field edits to the open draft
pub async fn edit_dialog(
    State(state): State<AppState>,
    Json(edits): Json<Value>,
) -> Result<Json<DashboardSnapshot>, ApiError> {
    state.dashboard.edit_draft(&edits).await?;
    Ok(Json(state.dashboard.snapshot().await))
}

/// POST /api/admin/dialog/submit
pub async fn submit_dialog(
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let id = state.dashboard.submit_dialog().await?;
    Ok(Json(SuccessResponse::with_id(id)))
}

/// DELETE /api/admin/dialog
pub async fn close_dialog(State(state): State<AppState>) -> Json<SuccessResponse> {
    state.dashboard.close_dialog().await;
    Json(SuccessResponse::ok())
}

// ============================================================================
// Delete
// ============================================================================

/// DELETE /api/admin/{type}/{id} - contacts are spliced from the local list, the rest reload
pub async fn remove(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let target = RecordRef::new(parse_kind(&kind)?, parse_id(&id)?);
    match target.kind {
        ContentType::Contact => state.dashboard.delete_contact(target.id).await?,
        _ => state.dashboard.delete(target).await?,
    }
    Ok(Json(SuccessResponse::ok()))
}

/// POST /api/admin/delete - delete a record given only its stored shape
pub async fn remove_untyped(
    State(state): State<AppState>,
    Json(record): Json<Value>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state.dashboard.request_delete_untyped(&record).await?;
    let deleted = state.dashboard.confirm_delete().await?;
    Ok(Json(DeleteResponse {
        success: true,
        deleted,
    }))
}

// ============================================================================
// Contacts
// ============================================================================

/// PATCH /api/admin/contacts/{id}/status
pub async fn contact_status(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    Json(payload): Json<StatusRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    if parse_kind(&kind)? != ContentType::Contact {
        return Err(ApiError::BadRequest(
            "Only contact messages have a status".to_string(),
        ));
    }
    let id = parse_id(&id)?;
    state.dashboard.set_contact_status(id, payload.status).await?;
    Ok(Json(SuccessResponse::with_id(id)))
}
