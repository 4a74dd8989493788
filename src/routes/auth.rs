/**
 * Authentication Routes
 * Admin session: login, verify, logout, and the guard in front of /admin
 */
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::AppState;

// ============================================================================
// Configuration
// ============================================================================

lazy_static::lazy_static! {
    /// JWT secret key from environment
    pub static ref JWT_SECRET: String = std::env::var("JWT_SECRET")
        .unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string());

    /// Admin email from environment
    pub static ref ADMIN_EMAIL: String = std::env::var("ADMIN_EMAIL")
        .unwrap_or_else(|_| "admin@example.com".to_string());

    /// Admin password hash: ADMIN_HASH_PASSWORD, else a hash of ADMIN_PASSWORD,
    /// else a hash of the development default
    pub static ref ADMIN_PASSWORD_HASH: String = {
        if let Ok(hash) = std::env::var("ADMIN_HASH_PASSWORD") {
            hash
        } else {
            let plain = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());
            hash(plain, DEFAULT_COST).unwrap_or_default()
        }
    };
}

pub const DEFAULT_JWT_SECRET: &str = "default-jwt-secret-change-in-production";

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";

/// Where `/admin` sends visitors without a session
pub const LOGIN_PATH: &str = "/login";

const SESSION_EXPIRY_HOURS: i64 = 12;

// ============================================================================
// Types
// ============================================================================

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// User info returned to frontend
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_id: String,
    pub email: String,
    pub role: String,
}

impl From<Claims> for UserInfo {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub user: UserInfo,
    pub access_token: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub success: bool,
    pub is_valid: bool,
    pub user: Option<UserInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

// ============================================================================
// Tokens and cookies
// ============================================================================

pub fn create_session_token(email: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: "admin".to_string(),
        email: email.to_string(),
        role: "ADMIN".to_string(),
        exp: (now + Duration::hours(SESSION_EXPIRY_HOURS)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
}

/// Verify and decode a session token
pub fn verify_session_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(JWT_SECRET.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn cookie_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
}

/// Session token from the Authorization header, falling back to the cookie.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    bearer_token(headers).or_else(|| cookie_token(headers))
}

/// Valid session claims, if any.
pub fn current_session(headers: &HeaderMap) -> Option<Claims> {
    let token = session_token(headers)?;
    match verify_session_token(token) {
        Ok(claims) => Some(claims),
        Err(e) => {
            tracing::debug!("Session verification failed: {}", e);
            None
        }
    }
}

fn session_cookie(token: &str, max_age_secs: i64) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    ))
    .ok()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/login
pub async fn login(Json(payload): Json<LoginRequest>) -> Result<Response, ApiError> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }
    if !payload.email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email format".to_string()));
    }

    let email_matches = payload.email.eq_ignore_ascii_case(&ADMIN_EMAIL);
    // bcrypt is CPU-bound; keep the async executor free.
    let password = payload.password.clone();
    let password_matches =
        tokio::task::spawn_blocking(move || verify(password, &ADMIN_PASSWORD_HASH).unwrap_or(false))
            .await
            .unwrap_or(false);

    if !email_matches || !password_matches {
        tracing::warn!("Failed login attempt for: {}", payload.email);
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = create_session_token(&payload.email).map_err(|e| {
        tracing::error!("Failed to create session token: {}", e);
        ApiError::Unauthorized("Failed to create session".to_string())
    })?;
    let claims = verify_session_token(&token)
        .map_err(|_| ApiError::Unauthorized("Failed to create session".to_string()))?;

    tracing::info!("Successful login for: {}", payload.email);

    let mut response = Json(LoginResponse {
        success: true,
        user: claims.into(),
        access_token: token.clone(),
    })
    .into_response();
    if let Some(cookie) = session_cookie(&token, SESSION_EXPIRY_HOURS * 3600) {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    Ok(response)
}

/// POST /api/auth/verify
pub async fn verify_token(headers: HeaderMap) -> Json<VerifyResponse> {
    match current_session(&headers) {
        Some(claims) => Json(VerifyResponse {
            success: true,
            is_valid: true,
            user: Some(claims.into()),
            error: None,
        }),
        None => Json(VerifyResponse {
            success: false,
            is_valid: false,
            user: None,
            error: Some(if session_token(&headers).is_some() {
                "Invalid or expired token".to_string()
            } else {
                "No session".to_string()
            }),
        }),
    }
}

/// POST /api/auth/logout - always succeeds and clears the cookie
pub async fn logout() -> Response {
    let mut response = Json(LogoutResponse { success: true }).into_response();
    if let Some(cookie) = session_cookie("", 0) {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    response
}

/// Middleware for `/api/admin/*`: 401 without a valid session.
pub async fn require_session(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let claims = current_session(request.headers())
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// GET /admin - dashboard snapshot, or a redirect to the login page
pub async fn admin_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if current_session(&headers).is_none() {
        return Redirect::to(LOGIN_PATH).into_response();
    }
    (StatusCode::OK, Json(state.dashboard.snapshot().await)).into_response()
}
