//! Portfolio CMS - public portfolio API plus the admin content dashboard

pub mod admin;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod logging;
pub mod public;
pub mod routes;
pub mod store;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::routes::AppState;
use crate::store::{DataStore, MemoryStore, PgStore};

/// Configure CORS from environment variables.
/// Uses ALLOWED_ORIGINS (comma-separated) or FRONTEND_ORIGIN.
/// Falls back to the local frontend dev server.
pub fn configure_cors() -> CorsLayer {
    let allowed_origins = std::env::var("ALLOWED_ORIGINS")
        .ok()
        .and_then(|s| {
            let origins: Vec<HeaderValue> = s
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                None
            } else {
                Some(origins)
            }
        })
        .or_else(|| {
            std::env::var("FRONTEND_ORIGIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|origin| vec![origin])
        })
        .unwrap_or_else(|| {
            vec![
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
            ]
        });

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}

/// Admin API, all of it behind the session guard.
fn admin_routes() -> Router<AppState> {
    use routes::admin;

    Router::new()
        .route("/dashboard", get(admin::dashboard))
        .route("/reload", post(admin::reload))
        .route("/fields/{type}", get(admin::fields))
        .route(
            "/dialog",
            post(admin::open_dialog)
                .patch(admin::edit_dialog)
                .delete(admin::close_dialog),
        )
        .route("/dialog/submit", post(admin::submit_dialog))
        .route("/delete", post(admin::remove_untyped))
        .route("/{type}/{id}/status", patch(admin::contact_status))
        .route("/{type}", post(admin::create))
        .route("/{type}/{id}", patch(admin::update).delete(admin::remove))
        .route_layer(middleware::from_fn(routes::auth::require_session))
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors();
    tracing::info!("CORS configured");

    Router::new()
        .route("/api/profile", get(routes::portfolio::get_profile))
        .route("/api/projects", get(routes::portfolio::list_projects))
        .route("/api/experiences", get(routes::portfolio::list_experiences))
        .route("/api/skills", get(routes::portfolio::list_skills))
        .route("/api/contact", post(routes::portfolio::submit_contact))
        .route("/api/site", get(routes::portfolio::site_config))
        .route("/api/blog", get(routes::blog::list_posts))
        .route("/api/blog/{slug}", get(routes::blog::get_post))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/verify", post(routes::auth::verify_token))
        .route("/api/auth/logout", post(routes::auth::logout))
        .route("/admin", get(routes::auth::admin_page))
        .nest("/api/admin", admin_routes())
        .route("/health", get(routes::health::health_ping))
        .route("/health/detailed", get(routes::health::health_detailed))
        .route("/health/ready", get(routes::health::health_ready))
        .with_state(state)
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        // Compress responses with gzip/br/zstd automatically
        .layer(CompressionLayer::new())
        // Global 2 MB request body cap
        .layer(RequestBodyLimitLayer::new(2 * 1024 * 1024))
        .layer(cors)
}

/// Postgres when DATABASE_URL is set and reachable, the in-memory store otherwise.
async fn connect_store() -> Arc<dyn DataStore> {
    if std::env::var("DATABASE_URL").is_err() {
        tracing::info!("DATABASE_URL not set. Using the in-memory store.");
        return Arc::new(MemoryStore::new());
    }

    let pool = match db::init_pool(None).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!(
                "Failed to initialize database pool: {}. Falling back to the in-memory store.",
                e
            );
            return Arc::new(MemoryStore::new());
        }
    };

    if let Err(e) = db::run_migrations(&pool).await {
        tracing::error!("Failed to run database migrations: {}", e);
    }

    match PgStore::connect(pool).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!(
                "Failed to start change listener: {}. Falling back to the in-memory store.",
                e
            );
            Arc::new(MemoryStore::new())
        }
    }
}

/// Run the server (used by main).
pub async fn run() {
    dotenvy::dotenv().ok();

    let _log_guards = logging::init(&logging::LogSettings::from_env());

    routes::health::init_start_time();

    let config = AppConfig::from_env();

    // Refuse to start in production with the insecure default JWT secret.
    if config.is_production() {
        let secret = std::env::var("JWT_SECRET").unwrap_or_default();
        if secret.is_empty() || secret == routes::auth::DEFAULT_JWT_SECRET {
            panic!(
                "FATAL: JWT_SECRET must be set to a secure, unique value in production. \
                 Refusing to start with the default secret."
            );
        }

        let admin_email = std::env::var("ADMIN_EMAIL").unwrap_or_default();
        let admin_password_set =
            std::env::var("ADMIN_HASH_PASSWORD").is_ok() || std::env::var("ADMIN_PASSWORD").is_ok();

        if admin_email.is_empty() || admin_email == "admin@example.com" {
            tracing::warn!(
                "SECURITY: ADMIN_EMAIL is using an insecure default. \
                 Set ADMIN_EMAIL to a real address."
            );
        }
        if !admin_password_set {
            tracing::warn!(
                "SECURITY: Neither ADMIN_HASH_PASSWORD nor ADMIN_PASSWORD is set. \
                 The fallback default password 'admin123' is insecure. \
                 Set ADMIN_HASH_PASSWORD to a bcrypt hash of a strong password."
            );
        }
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid HOST/PORT configuration");

    let store = connect_store().await;
    let state = AppState::new(store, config);
    state.dashboard.mount().await;

    let app = create_app(state.clone());

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutdown signal received");
        })
        .await
        .expect("Server error");

    state.dashboard.unmount().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{get, json_request, memory_state, send};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_public_routes_are_open() {
        let (state, _) = memory_state();
        let (status, body) = send(create_app(state), get("/api/projects")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn test_admin_api_requires_session() {
        let (state, store) = memory_state();
        let app = create_app(state);

        let (status, _) = send(app.clone(), get("/api/admin/dashboard")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let body = json!({ "title": "Sneaky", "description": "d" });
        let (status, _) = send(app, json_request("POST", "/api/admin/project", &body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(store.rows(store::Table::Projects).await.is_empty());
    }

    #[tokio::test]
    async fn test_admin_api_with_bearer_session() {
        let (state, _) = memory_state();
        let token = routes::auth::create_session_token("admin@example.com").unwrap();

        let req = axum::http::Request::get("/api/admin/dashboard")
            .header("authorization", format!("Bearer {}", token))
            .body(axum::body::Body::empty())
            .unwrap();
        let (status, body) = send(create_app(state), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["loading"], false);
    }
}
