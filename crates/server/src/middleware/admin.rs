//! Admin gate for catalog writes.
//!
//! `POST`, `PATCH` and `DELETE` requests under the configured path prefix
//! are refused with 403 unless the caller's email is the configured admin
//! email. Reads under the prefix are public.

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::auth::OptionalCaller;
use crate::config::AdminGateConfig;
use crate::error::AppError;
use crate::state::AppState;

/// Whether `method` on `path` is a gated catalog write.
fn is_gated(config: &AdminGateConfig, method: &Method, path: &str) -> bool {
    matches!(*method, Method::POST | Method::PATCH | Method::DELETE)
        && path.starts_with(&config.path_prefix)
}

/// Refuse gated writes from anyone but the admin.
///
/// Must run after the bearer middleware so the caller is already resolved.
pub async fn admin_gate_middleware(
    State(state): State<AppState>,
    OptionalCaller(caller): OptionalCaller,
    request: Request,
    next: Next,
) -> Response {
    let config = &state.config().admin;

    if is_gated(config, request.method(), request.uri().path()) {
        let is_admin = caller
            .as_ref()
            .is_some_and(|c| c.email.as_str() == config.email);
        if !is_admin {
            tracing::warn!(
                method = %request.method(),
                path = %request.uri().path(),
                caller = caller.as_ref().map(|c| c.email.as_str()),
                "Catalog write refused"
            );
            return AppError::Forbidden(config.message.clone()).into_response();
        }
    }

    next.run(request).await
}
