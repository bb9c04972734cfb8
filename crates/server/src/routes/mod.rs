//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                    - Liveness
//! GET    /health/ready              - Readiness (store round-trip)
//!
//! # Accounts
//! POST   /account                   - Sign up
//! POST   /token                     - Exchange email/password for a bearer token
//!
//! # Catalog (writes are admin-only)
//! GET    /products                  - Product listing
//! GET    /products/{id}             - Product detail
//! POST   /products                  - Create (code is generated)
//! PATCH  /products/{id}             - Partial update
//! DELETE /products/{id}             - Delete
//!
//! # Cart (requires auth)
//! GET    /cart                      - Caller's cart with totals
//! POST   /cart/items                - Add a product
//! PATCH  /cart/items/{product_id}   - Set a line's quantity
//! DELETE /cart/items/{product_id}   - Remove a line
//! DELETE /cart                      - Clear
//!
//! # Wishlist (requires auth)
//! GET    /wishlist                  - Caller's wishlist
//! POST   /wishlist/items            - Save a product
//! DELETE /wishlist/items/{product_id} - Remove a product
//! DELETE /wishlist                  - Clear
//! ```

pub mod account;
pub mod cart;
pub mod products;
pub mod wishlist;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, patch, post},
};
use serde::Serialize;

use crate::state::AppState;

/// Envelope for write responses.
#[derive(Debug, Serialize)]
pub struct ApiDataResponse<T> {
    pub status: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiDataResponse<T> {
    /// A successful response carrying `data`.
    pub fn ok(message: &str, data: T) -> Self {
        Self {
            status: true,
            message: message.to_owned(),
            data: Some(data),
        }
    }
}

impl ApiDataResponse<()> {
    /// A successful response without data.
    #[must_use]
    pub fn message(message: &str) -> Self {
        Self {
            status: true,
            message: message.to_owned(),
            data: None,
        }
    }
}

/// Create the main router with all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/account", post(account::create_account))
        .route("/token", post(account::issue_token))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
}

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .patch(products::update)
                .delete(products::delete),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route(
            "/items/{product_id}",
            patch(cart::update).delete(cart::remove),
        )
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show).delete(wishlist::clear))
        .route("/items", post(wishlist::add))
        .route("/items/{product_id}", delete(wishlist::remove))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
