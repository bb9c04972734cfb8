//! Unified error handling with Sentry integration.
//!
//! Every failure a handler can produce is an [`AppError`]. Its
//! `IntoResponse` impl is the only place failures become HTTP responses;
//! server errors are captured to Sentry before responding and never leak
//! their details to the client.
//!
//! The JSON body is `{timestamp, status, error, message, path}`. The request
//! path is not known here, so the body is also stashed in the response
//! extensions and [`error_envelope_middleware`] fills the path in.

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Path, Request,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::ServiceError;

/// Generic message for 5xx responses.
const INTERNAL_MESSAGE: &str = "Internal server error";

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Domain failure from a service.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// No verified caller identity.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller identified but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Resource or route not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status and client-facing message.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Service(err) => match err {
                ServiceError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                ServiceError::Duplicate { .. } => (StatusCode::CONFLICT, err.to_string()),
                ServiceError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
                ServiceError::BadCredentials(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
                ServiceError::Repository(RepositoryError::Conflict(msg)) => (
                    StatusCode::CONFLICT,
                    format!("Database constraint violation: {msg}"),
                ),
                ServiceError::Repository(RepositoryError::NotFound) => {
                    (StatusCode::NOT_FOUND, "Resource not found".to_owned())
                }
                ServiceError::Repository(_)
                | ServiceError::Token(_)
                | ServiceError::PasswordHash
                | ServiceError::CodeSpaceExhausted(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_MESSAGE.to_owned(),
                ),
            },
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_MESSAGE.to_owned(),
            ),
        }
    }
}

/// JSON error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    pub error: String,
    pub message: String,
    pub path: String,
}

impl ErrorBody {
    fn new(status: StatusCode, message: String) -> Self {
        Self {
            timestamp: Utc::now(),
            status: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Unknown").to_owned(),
            message,
            path: String::new(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(status = status.as_u16(), message = %message, "Request rejected");
        }

        let body = ErrorBody::new(status, message);
        let mut response = (status, Json(body.clone())).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

/// Rewrite error bodies with the path of the request that produced them.
pub async fn error_envelope_middleware(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let mut response = next.run(request).await;

    match response.extensions_mut().remove::<ErrorBody>() {
        Some(mut body) => {
            body.path = path;
            let mut rewritten = (response.status(), Json(body)).into_response();
            for (name, value) in response.headers() {
                if !rewritten.headers().contains_key(name) {
                    rewritten.headers_mut().insert(name.clone(), value.clone());
                }
            }
            rewritten
        }
        None => response,
    }
}

/// Fallback for unknown routes.
pub async fn not_found(request: Request) -> AppError {
    AppError::NotFound(format!("No route for {} {}", request.method(), request.uri().path()))
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(format!("Malformed request body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(format!("Invalid parameter value: {}", rejection.body_text()))
    }
}

/// `Json` extractor whose rejection is an [`AppError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// `Path` extractor whose rejection is an [`AppError`].
#[derive(Debug, Clone, Copy)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the current request.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn echo_id(ApiPath(id): ApiPath<i64>, ApiJson(body): ApiJson<i64>) -> String {
        format!("{id}:{body}")
    }

    async fn call(uri: &str, body: &'static str) -> Response {
        use tower::ServiceExt;

        let app = axum::Router::new().route("/items/{id}", axum::routing::post(echo_id));
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body))
            .unwrap();
        app.oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_extractors_pass_values_through() {
        let resp = call("/items/7", "3").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes, "7:3");
    }

    #[tokio::test]
    async fn test_extractor_rejections_are_bad_requests() {
        let resp = call("/items/abc", "3").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = resp.extensions().get::<ErrorBody>().unwrap();
        assert!(body.message.starts_with("Invalid parameter value"));

        let resp = call("/items/7", "{").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = resp.extensions().get::<ErrorBody>().unwrap();
        assert!(body.message.starts_with("Malformed request body"));
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_service_error_status_codes() {
        assert_eq!(
            get_status(ServiceError::Validation("x".to_owned()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(
                ServiceError::Duplicate {
                    resource: "User",
                    field: "email",
                    value: "a@x".to_owned(),
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(ServiceError::not_found("Product", "id", 7).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(ServiceError::BadCredentials("nope".to_owned()).into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(ServiceError::Repository(RepositoryError::Conflict("fk".to_owned())).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(ServiceError::PasswordHash.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_gateway_error_status_codes() {
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_server_error_details_are_not_exposed() {
        let err = AppError::Service(ServiceError::Repository(RepositoryError::DataCorruption(
            "invalid email in users row 3".to_owned(),
        )));
        let (status, message) = err.status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, INTERNAL_MESSAGE);
    }

    #[test]
    fn test_error_body_carries_reason_phrase() {
        let response = AppError::Forbidden("no".to_owned()).into_response();
        let body = response.extensions().get::<ErrorBody>().unwrap();
        assert_eq!(body.status, 403);
        assert_eq!(body.error, "Forbidden");
        assert_eq!(body.message, "no");
        assert_eq!(body.path, "");
    }
}
