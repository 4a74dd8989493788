/**
 * Portfolio Routes
 * Public read endpoints for profile, projects, experience and skills,
 * plus the public contact form
 */
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use serde_json::Value;

use crate::config::SiteConfig;
use crate::content::{group_skills, SkillGroup};
use crate::db::models::{Experience, Profile, Project, Row};
use crate::error::ApiError;
use crate::public;
use crate::routes::{AppState, SuccessResponse};

/// Envelope for public collection reads
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

/// GET /api/profile - `data` is null until a profile exists
pub async fn get_profile(
    State(state): State<AppState>,
) -> Result<Json<DataResponse<Option<Row<Profile>>>>, ApiError> {
    let profile = public::fetch_profile(state.store.as_ref()).await?;
    Ok(Json(DataResponse { data: profile }))
}

/// GET /api/projects - newest first
pub async fn list_projects(
    State(state): State<AppState>,
) -> Result<Json<DataResponse<Vec<Row<Project>>>>, ApiError> {
    let projects = public::fetch_projects(state.store.as_ref()).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/experiences - most recent start date first
pub async fn list_experiences(
    State(state): State<AppState>,
) -> Result<Json<DataResponse<Vec<Row<Experience>>>>, ApiError> {
    let experiences = public::fetch_experiences(state.store.as_ref()).await?;
    Ok(Json(DataResponse { data: experiences }))
}

/// GET /api/skills - grouped by category
pub async fn list_skills(
    State(state): State<AppState>,
) -> Result<Json<DataResponse<Vec<SkillGroup>>>, ApiError> {
    let skills = public::fetch_skills(state.store.as_ref()).await?;
    Ok(Json(DataResponse {
        data: group_skills(&skills),
    }))
}

/// POST /api/contact
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<SuccessResponse>), ApiError> {
    let contact = public::submit_contact(state.store.as_ref(), &payload).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::with_id(contact.id))))
}

/// GET /api/site - deployment packaging options
pub async fn site_config(State(state): State<AppState>) -> Json<SiteConfig> {
    Json(state.config.site.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{get, json_request, memory_state, send};
    use crate::store::{DataStore, Table};
    use axum::{
        routing::{get as get_route, post},
        Router,
    };
    use serde_json::json;

    fn router(state: AppState) -> Router {
        Router::new()
            .route("/api/profile", get_route(get_profile))
            .route("/api/projects", get_route(list_projects))
            .route("/api/experiences", get_route(list_experiences))
            .route("/api/skills", get_route(list_skills))
            .route("/api/contact", post(submit_contact))
            .route("/api/site", get_route(site_config))
            .with_state(state)
    }

    #[tokio::test]
    async fn test_missing_profile_is_null_not_error() {
        let (state, _) = memory_state();
        let (status, body) = send(router(state), get("/api/profile")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_experiences_sorted_by_start_date() {
        let (state, store) = memory_state();
        store
            .insert(
                Table::Experiences,
                vec![
                    json!({ "company": "Old", "position": "Dev", "start_date": "2018-03-01" }),
                    json!({ "company": "New", "position": "Lead", "start_date": "2022-09-01", "current": true }),
                ],
            )
            .await
            .unwrap();

        let (status, body) = send(router(state), get("/api/experiences")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["company"], "New");
        assert_eq!(body["data"][1]["company"], "Old");
    }

    #[tokio::test]
    async fn test_skills_are_grouped() {
        let (state, store) = memory_state();
        store
            .insert(
                Table::Skills,
                vec![
                    json!({ "name": "Burp", "category": "Security Tools", "level": 80 }),
                    json!({ "name": "Rust", "category": "Technical Skills", "level": 90 }),
                    json!({ "name": "Nmap", "category": "Security Tools", "level": 85 }),
                ],
            )
            .await
            .unwrap();

        let (_, body) = send(router(state), get("/api/skills")).await;
        let groups = body["data"].as_array().unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0]["category"], "Security Tools");
        assert_eq!(groups[0]["skills"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_contact_form_creates_unread_message() {
        let (state, store) = memory_state();
        let form = json!({ "name": "Ann", "email": "ann@example.com", "message": "Hello" });

        let (status, body) =
            send(router(state), json_request("POST", "/api/contact", &form)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);

        let rows = store.rows(Table::Contacts).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["status"], "unread");
    }

    #[tokio::test]
    async fn test_contact_form_requires_message() {
        let (state, _) = memory_state();
        let form = json!({ "name": "Ann", "email": "ann@example.com" });
        let (status, body) =
            send(router(state), json_request("POST", "/api/contact", &form)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Message is required");
    }

    #[tokio::test]
    async fn test_site_config_defaults() {
        let (state, _) = memory_state();
        let (_, body) = send(router(state), get("/api/site")).await;
        assert_eq!(body["output"], "server");
        assert_eq!(body["images"]["remote_hosts"], json!(["**"]));
    }
}
