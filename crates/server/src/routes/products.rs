//! Catalog route handlers.
//!
//! Reads are public. Writes reach these handlers only if the admin gate let
//! them through.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use cartwheel_core::catalog::{Product, ProductPatch};
use cartwheel_core::{InventoryStatus, ProductCode, ProductId};

use super::ApiDataResponse;
use crate::error::{ApiJson, ApiPath, Result};
use crate::services::ServiceError;
use crate::services::catalog::{CatalogService, NewProduct};
use crate::state::AppState;

/// Product as rendered to clients.
#[derive(Debug, Clone, Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub code: ProductCode,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub quantity: i32,
    pub internal_reference: Option<String>,
    pub shell_id: Option<i64>,
    pub inventory_status: Option<InventoryStatus>,
    pub rating: Option<i32>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            code: p.code,
            name: p.name,
            description: p.description,
            image: p.image,
            category: p.category,
            price: p.price,
            quantity: p.quantity,
            internal_reference: p.internal_reference,
            shell_id: p.shell_id,
            inventory_status: p.inventory_status,
            rating: p.rating,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Product create/patch body. A `code` field, if sent, is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub internal_reference: Option<String>,
    pub shell_id: Option<i64>,
    pub inventory_status: Option<InventoryStatus>,
    pub rating: Option<i32>,
}

impl From<ProductRequest> for NewProduct {
    fn from(req: ProductRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            image: req.image,
            category: req.category,
            price: req.price,
            quantity: req.quantity,
            internal_reference: req.internal_reference,
            shell_id: req.shell_id,
            inventory_status: req.inventory_status,
            rating: req.rating,
        }
    }
}

impl From<ProductRequest> for ProductPatch {
    fn from(req: ProductRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            image: req.image,
            category: req.category,
            price: req.price,
            quantity: req.quantity,
            internal_reference: req.internal_reference,
            shell_id: req.shell_id,
            inventory_status: req.inventory_status,
            rating: req.rating,
        }
    }
}

fn catalog(state: &AppState) -> CatalogService<'_> {
    let config = state.config();
    CatalogService::new(state.store(), &config.catalog, &config.messages)
}

/// List all products.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<ProductResponse>>> {
    let products = catalog(&state).list().await?;
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

/// Show one product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<ProductResponse>> {
    let product = catalog(&state).get(id).await?;
    Ok(Json(product.into()))
}

/// Create a product with a generated code.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Option<ProductRequest>>,
) -> Result<impl IntoResponse> {
    let body = body.ok_or_else(|| {
        ServiceError::Validation(state.config().messages.product_create_null.clone())
    })?;

    let product = catalog(&state).create(body.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiDataResponse::ok(
            "Product created successfully",
            ProductResponse::from(product),
        )),
    ))
}

/// Merge the present fields into a product.
#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(body): ApiJson<Option<ProductRequest>>,
) -> Result<Json<ApiDataResponse<ProductResponse>>> {
    let body = body.ok_or_else(|| {
        ServiceError::Validation(state.config().messages.product_update_null.clone())
    })?;

    let product = catalog(&state).update(id, body.into()).await?;

    Ok(Json(ApiDataResponse::ok(
        "Product updated successfully",
        product.into(),
    )))
}

/// Delete a product.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<ApiDataResponse<()>>> {
    catalog(&state).delete(id).await?;
    Ok(Json(ApiDataResponse::message("Product deleted successfully")))
}
