//! Wishlist route handlers.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use cartwheel_core::wishlist::{Wishlist, WishlistItem};
use cartwheel_core::{ProductCode, ProductId, UserId, WishlistId};

use crate::error::{ApiJson, ApiPath, Result};
use crate::middleware::RequireCaller;
use crate::services::ServiceError;
use crate::services::wishlist::WishlistService;
use crate::state::AppState;

/// Wishlist as rendered to clients.
#[derive(Debug, Clone, Serialize)]
pub struct WishlistResponse {
    pub id: WishlistId,
    pub user_id: UserId,
    pub items: Vec<WishlistItemResponse>,
    pub total_items: usize,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

/// One saved product.
#[derive(Debug, Clone, Serialize)]
pub struct WishlistItemResponse {
    pub product_id: ProductId,
    pub product_code: ProductCode,
    pub product_name: String,
    pub product_image: Option<String>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub product_price: Option<Decimal>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub added_at: DateTime<Utc>,
}

impl From<WishlistItem> for WishlistItemResponse {
    fn from(item: WishlistItem) -> Self {
        Self {
            product_id: item.product.id,
            product_code: item.product.code,
            product_name: item.product.name,
            product_image: item.product.image,
            product_price: item.product.price,
            added_at: item.created_at,
        }
    }
}

impl From<Wishlist> for WishlistResponse {
    fn from(wishlist: Wishlist) -> Self {
        let total_items = wishlist.total_items();
        Self {
            id: wishlist.id,
            user_id: wishlist.user_id,
            items: wishlist
                .items
                .into_iter()
                .map(WishlistItemResponse::from)
                .collect(),
            total_items,
            created_at: wishlist.created_at,
            updated_at: wishlist.updated_at,
        }
    }
}

/// Save-to-wishlist body.
#[derive(Debug, Deserialize)]
pub struct AddToWishlistRequest {
    pub product_id: Option<ProductId>,
}

fn wishlists(state: &AppState) -> WishlistService<'_> {
    WishlistService::new(state.store(), &state.config().messages)
}

/// Show the caller's wishlist.
#[instrument(skip_all, fields(user_id = %caller.user_id))]
pub async fn show(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
) -> Result<Json<WishlistResponse>> {
    let wishlist = wishlists(&state).get(caller.user_id).await?;
    Ok(Json(wishlist.into()))
}

/// Save a product.
#[instrument(skip_all, fields(user_id = %caller.user_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiJson(body): ApiJson<Option<AddToWishlistRequest>>,
) -> Result<Json<WishlistResponse>> {
    let body = body.ok_or_else(|| {
        ServiceError::Validation(state.config().messages.wishlist_request_null.clone())
    })?;

    let wishlist = wishlists(&state)
        .add(caller.user_id, body.product_id)
        .await?;
    Ok(Json(wishlist.into()))
}

/// Remove a saved product.
#[instrument(skip_all, fields(user_id = %caller.user_id, product_id = %product_id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<Json<WishlistResponse>> {
    let wishlist = wishlists(&state).remove(caller.user_id, product_id).await?;
    Ok(Json(wishlist.into()))
}

/// Drop every saved product.
#[instrument(skip_all, fields(user_id = %caller.user_id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
) -> Result<Json<WishlistResponse>> {
    let wishlist = wishlists(&state).clear(caller.user_id).await?;
    Ok(Json(wishlist.into()))
}
