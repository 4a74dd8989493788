use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use std::time::Instant;
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tracing::Instrument;

/// How a finished request is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    ClientError,
    ServerError,
}

impl From<StatusCode> for Outcome {
    fn from(status: StatusCode) -> Self {
        if status.is_server_error() {
            Outcome::ServerError
        } else if status.is_client_error() {
            Outcome::ClientError
        } else {
            Outcome::Success
        }
    }
}

pub async fn log_request(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let req_id: String = request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    // Handler logs inherit the request id through this span.
    let span = tracing::info_span!("request", request_id = %req_id, method = %method, uri = %uri);

    async move {
        tracing::debug!(version = ?request.version(), "incoming request");

        let response = next.run(request).await;

        let duration_ms = start.elapsed().as_millis();
        let status = response.status();

        match Outcome::from(status) {
            Outcome::ServerError => tracing::error!(
                status = %status,
                duration_ms = %duration_ms,
                "request completed with error"
            ),
            Outcome::ClientError => tracing::warn!(
                status = %status,
                duration_ms = %duration_ms,
                "request completed with client error"
            ),
            Outcome::Success => tracing::info!(
                status = %status,
                duration_ms = %duration_ms,
                "request completed successfully"
            ),
        }

        response
    }
    .instrument(span)
    .await
}

pub fn request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware, routing::get, Router};
    use tower::ServiceExt;

    #[test]
    fn test_outcome_from_status() {
        assert_eq!(Outcome::from(StatusCode::OK), Outcome::Success);
        assert_eq!(Outcome::from(StatusCode::SEE_OTHER), Outcome::Success);
        assert_eq!(Outcome::from(StatusCode::NOT_FOUND), Outcome::ClientError);
        assert_eq!(Outcome::from(StatusCode::SERVICE_UNAVAILABLE), Outcome::ServerError);
    }

    #[tokio::test]
    async fn test_request_id_is_set_and_propagated() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(propagate_request_id_layer())
            .layer(middleware::from_fn(log_request))
            .layer(request_id_layer());

        let res = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let id = res.headers().get("x-request-id").unwrap().to_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn test_incoming_request_id_is_kept() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(propagate_request_id_layer())
            .layer(middleware::from_fn(log_request))
            .layer(request_id_layer());

        let req = Request::get("/")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.headers().get("x-request-id").unwrap(), "abc-123");
    }
}
