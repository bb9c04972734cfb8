//! Cartwheel shop backend library.
//!
//! Accounts, bearer tokens, the product catalog, per-user carts and
//! wishlists over a transactional store. The binary in `main.rs` wires this
//! to configuration, tracing and Sentry; tests drive [`app`] directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, middleware::from_fn, middleware::from_fn_with_state};
use tower::ServiceBuilder;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::state::AppState;

/// Build the router with the full middleware chain.
///
/// Layers run top to bottom as listed in [`middleware`]. Sentry layers are
/// left to the binary so tests run without a hub.
pub fn app(state: AppState) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
                status = tracing::field::Empty,
                latency_ms = tracing::field::Empty,
            )
        })
        .on_response(
            |response: &axum::http::Response<_>, latency: std::time::Duration, span: &Span| {
                span.record("status", response.status().as_u16());
                span.record(
                    "latency_ms",
                    u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                );
                DefaultOnResponse::default().on_response(response, latency, span);
            },
        );

    routes::routes()
        .fallback(error::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(trace)
                .layer(from_fn(middleware::request_id_middleware))
                .layer(from_fn(error::error_envelope_middleware))
                .layer(from_fn_with_state(
                    state.clone(),
                    middleware::bearer_auth_middleware,
                ))
                .layer(from_fn_with_state(
                    state.clone(),
                    middleware::admin_gate_middleware,
                )),
        )
        .with_state(state)
}
