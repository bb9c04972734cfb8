//! Cart route handlers.
//!
//! Every operation acts on the caller's own cart and answers with the whole
//! cart, totals included.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use cartwheel_core::cart::{Cart, CartItem};
use cartwheel_core::{CartId, ProductCode, ProductId, UserId};

use crate::error::{ApiJson, ApiPath, Result};
use crate::middleware::RequireCaller;
use crate::services::ServiceError;
use crate::services::cart::CartService;
use crate::state::AppState;

/// Cart as rendered to clients.
#[derive(Debug, Clone, Serialize)]
pub struct CartResponse {
    pub id: CartId,
    pub user_id: UserId,
    pub items: Vec<CartItemResponse>,
    pub total_items: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

/// One cart line as rendered to clients.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemResponse {
    pub product_id: ProductId,
    pub product_code: ProductCode,
    pub product_name: String,
    pub product_image: Option<String>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub product_price: Option<Decimal>,
    pub quantity: i32,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub subtotal: Option<Decimal>,
}

impl From<CartItem> for CartItemResponse {
    fn from(item: CartItem) -> Self {
        let subtotal = item.subtotal();
        Self {
            product_id: item.product.id,
            product_code: item.product.code,
            product_name: item.product.name,
            product_image: item.product.image,
            product_price: item.product.price,
            quantity: item.quantity,
            subtotal,
        }
    }
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        let totals = cart.totals();
        Self {
            id: cart.id,
            user_id: cart.user_id,
            items: cart.items.into_iter().map(CartItemResponse::from).collect(),
            total_items: totals.total_items,
            total_price: totals.total_price,
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        }
    }
}

/// Add-to-cart body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: Option<ProductId>,
    pub quantity: Option<i32>,
}

/// Cart line update body.
#[derive(Debug, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: Option<i32>,
}

fn carts(state: &AppState) -> CartService<'_> {
    let config = state.config();
    CartService::new(state.store(), &config.cart, &config.messages)
}

/// Show the caller's cart.
#[instrument(skip_all, fields(user_id = %caller.user_id))]
pub async fn show(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
) -> Result<Json<CartResponse>> {
    let cart = carts(&state).get(caller.user_id).await?;
    Ok(Json(cart.into()))
}

/// Add a product to the caller's cart.
#[instrument(skip_all, fields(user_id = %caller.user_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiJson(body): ApiJson<Option<AddToCartRequest>>,
) -> Result<Json<CartResponse>> {
    let body = body.ok_or_else(|| {
        ServiceError::Validation(state.config().messages.cart_create_null.clone())
    })?;

    let cart = carts(&state)
        .add(caller.user_id, body.product_id, body.quantity)
        .await?;
    Ok(Json(cart.into()))
}

/// Set the quantity of one line.
#[instrument(skip_all, fields(user_id = %caller.user_id, product_id = %product_id))]
pub async fn update(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(product_id): ApiPath<ProductId>,
    ApiJson(body): ApiJson<Option<UpdateCartItemRequest>>,
) -> Result<Json<CartResponse>> {
    let body = body.ok_or_else(|| {
        ServiceError::Validation(state.config().messages.cart_update_null.clone())
    })?;

    let cart = carts(&state)
        .update(caller.user_id, product_id, body.quantity)
        .await?;
    Ok(Json(cart.into()))
}

/// Remove one line.
#[instrument(skip_all, fields(user_id = %caller.user_id, product_id = %product_id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<Json<CartResponse>> {
    let cart = carts(&state).remove(caller.user_id, product_id).await?;
    Ok(Json(cart.into()))
}

/// Drop every line.
#[instrument(skip_all, fields(user_id = %caller.user_id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
) -> Result<Json<CartResponse>> {
    let cart = carts(&state).clear(caller.user_id).await?;
    Ok(Json(cart.into()))
}
