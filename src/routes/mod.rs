/**
 * Routes Module
 * API route handlers and the state they share
 */
pub mod admin;
pub mod auth;
pub mod blog;
pub mod health;
pub mod portfolio;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::admin::{Dashboard, DashboardConfig};
use crate::config::AppConfig;
use crate::store::DataStore;

/// Shared handler state. The store is injected, never global.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DataStore>,
    pub dashboard: Arc<Dashboard>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn DataStore>, config: AppConfig) -> Self {
        let dashboard = Arc::new(Dashboard::new(
            store.clone(),
            DashboardConfig::from(&config),
        ));
        Self {
            store,
            dashboard,
            config: Arc::new(config),
        }
    }
}

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body for mutations that return nothing else
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<uuid::Uuid>,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            id: None,
        }
    }

    pub fn with_id(id: uuid::Uuid) -> Self {
        Self {
            success: true,
            id: Some(id),
        }
    }
}
