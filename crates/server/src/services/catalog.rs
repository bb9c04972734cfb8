//! Catalog service.
//!
//! Products are created with a generated code that is unique across the
//! catalog and never changes afterwards.

use rust_decimal::Decimal;
use uuid::Uuid;

use cartwheel_core::catalog::{Product, ProductFields, ProductPatch};
use cartwheel_core::{InventoryStatus, ProductCode, ProductId};

use super::ServiceError;
use crate::config::{CatalogConfig, Messages};
use crate::db::{AccessMode, RepositoryError, Store, UnitOfWork};

/// Attempts at drawing a fresh product code before giving up.
pub const MAX_CODE_ATTEMPTS: u32 = 16;

/// Product creation input. Absent fields are `None`.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
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

/// Catalog service.
pub struct CatalogService<'a> {
    store: &'a dyn Store,
    config: &'a CatalogConfig,
    messages: &'a Messages,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store, config: &'a CatalogConfig, messages: &'a Messages) -> Self {
        Self {
            store,
            config,
            messages,
        }
    }

    /// All products.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the read fails.
    pub async fn list(&self) -> Result<Vec<Product>, ServiceError> {
        let mut uow = self.store.begin(AccessMode::ReadOnly).await?;
        let products = uow.list_products().await?;
        uow.commit().await?;
        Ok(products)
    }

    /// One product.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if there is no such product.
    pub async fn get(&self, id: ProductId) -> Result<Product, ServiceError> {
        let mut uow = self.store.begin(AccessMode::ReadOnly).await?;
        let product = uow
            .product(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", "id", id))?;
        uow.commit().await?;
        Ok(product)
    }

    /// Validate, assign a unique code and persist.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a missing or blank name, a
    /// negative price or quantity, or a field outside the model's limits.
    /// Returns `ServiceError::CodeSpaceExhausted` if no free code is found.
    pub async fn create(&self, input: NewProduct) -> Result<Product, ServiceError> {
        let name = match input.name {
            None => return Err(self.invalid(&self.messages.product_name_null)),
            Some(name) if name.trim().is_empty() => {
                return Err(self.invalid(&self.messages.product_name_empty));
            }
            Some(name) => name,
        };
        self.check_non_negative(input.price, input.quantity)?;

        let fields = ProductFields {
            name,
            description: input.description,
            image: input.image,
            category: input.category,
            price: input.price,
            quantity: input.quantity.unwrap_or(0),
            internal_reference: input.internal_reference,
            shell_id: input.shell_id,
            inventory_status: input.inventory_status,
            rating: input.rating,
        };
        fields
            .check_limits()
            .map_err(|e| ServiceError::Validation(format!("Validation failed: {e}")))?;

        let mut uow = self.store.begin(AccessMode::ReadWrite).await?;
        let code = self.unique_code(uow.as_mut()).await?;
        let product = uow.insert_product(&code, &fields).await?;
        uow.commit().await?;

        tracing::info!(product_id = %product.id, code = %product.code, "Product created");
        Ok(product)
    }

    /// Merge the present fields of `patch` into the stored product.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if there is no such product and
    /// `ServiceError::Validation` for a blank name or negative numbers.
    pub async fn update(&self, id: ProductId, patch: ProductPatch) -> Result<Product, ServiceError> {
        if patch.name.as_ref().is_some_and(|n| n.trim().is_empty()) {
            return Err(self.invalid(&self.messages.product_name_empty));
        }
        self.check_non_negative(patch.price, patch.quantity)?;
        patch
            .check_limits()
            .map_err(|e| ServiceError::Validation(format!("Validation failed: {e}")))?;

        let mut uow = self.store.begin(AccessMode::ReadWrite).await?;
        let mut product = uow
            .product(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", "id", id))?;
        patch.apply_to(&mut product);
        let product = uow.update_product(&product).await.map_err(|e| match e {
            RepositoryError::NotFound => ServiceError::not_found("Product", "id", id),
            other => other.into(),
        })?;
        uow.commit().await?;

        tracing::info!(product_id = %id, "Product updated");
        Ok(product)
    }

    /// Remove a product.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if there is no such product, or a
    /// repository conflict if carts or wishlists still reference it.
    pub async fn delete(&self, id: ProductId) -> Result<(), ServiceError> {
        let mut uow = self.store.begin(AccessMode::ReadWrite).await?;
        if !uow.delete_product(id).await? {
            return Err(ServiceError::not_found("Product", "id", id));
        }
        uow.commit().await?;

        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// Draw codes until one is free.
    async fn unique_code(&self, uow: &mut dyn UnitOfWork) -> Result<ProductCode, ServiceError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = self.generate_code()?;
            if !uow.code_exists(&code).await? {
                return Ok(code);
            }
            tracing::debug!(code = %code, "Product code collision");
        }
        tracing::error!(
            attempts = MAX_CODE_ATTEMPTS,
            code_length = self.config.code_length,
            "Product code space exhausted"
        );
        Err(ServiceError::CodeSpaceExhausted(MAX_CODE_ATTEMPTS))
    }

    fn generate_code(&self) -> Result<ProductCode, ServiceError> {
        let uuid = Uuid::new_v4().to_string();
        let body = if uuid.len() >= self.config.uuid_min_length {
            uuid.get(..self.config.code_length).unwrap_or(uuid.as_str())
        } else {
            uuid.as_str()
        };
        let code = format!("{}{}", self.config.code_prefix, body.to_uppercase());
        ProductCode::parse(&code).map_err(|e| ServiceError::Validation(e.to_string()))
    }

    fn check_non_negative(
        &self,
        price: Option<Decimal>,
        quantity: Option<i32>,
    ) -> Result<(), ServiceError> {
        let min = self.config.min_value;
        if price.is_some_and(|p| p < min) {
            return Err(ServiceError::Validation(self.messages.negative_value("price")));
        }
        if quantity.is_some_and(|q| Decimal::from(q) < min) {
            return Err(ServiceError::Validation(
                self.messages.negative_value("quantity"),
            ));
        }
        Ok(())
    }

    fn invalid(&self, message: &str) -> ServiceError {
        tracing::warn!(message, "Rejected product input");
        ServiceError::Validation(message.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::config::ServerConfig;
    use crate::db::MemoryStore;

    fn config() -> ServerConfig {
        ServerConfig::new(
            SecretString::from("memory:"),
            SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6"),
            "admin@shop.test",
        )
    }

    fn lamp() -> NewProduct {
        NewProduct {
            name: Some("Desk lamp".to_owned()),
            price: Some(Decimal::new(1999, 2)),
            quantity: Some(4),
            category: Some("Lighting".to_owned()),
            inventory_status: Some(InventoryStatus::InStock),
            ..NewProduct::default()
        }
    }

    #[tokio::test]
    async fn test_create_assigns_prefixed_unique_codes() {
        let store = MemoryStore::new();
        let config = config();
        let service = CatalogService::new(&store, &config.catalog, &config.messages);

        let a = service.create(lamp()).await.unwrap();
        let b = service.create(lamp()).await.unwrap();

        assert!(a.code.as_str().starts_with("PRD-"));
        assert_eq!(a.code.as_str().len(), "PRD-".len() + 8);
        assert_ne!(a.code, b.code);
    }

    #[tokio::test]
    async fn test_create_then_get_round_trips_attributes() {
        let store = MemoryStore::new();
        let config = config();
        let service = CatalogService::new(&store, &config.catalog, &config.messages);

        let created = service.create(lamp()).await.unwrap();
        let fetched = service.get(created.id).await.unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.name, "Desk lamp");
        assert_eq!(fetched.price, Some(Decimal::new(1999, 2)));
        assert_eq!(fetched.quantity, 4);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let store = MemoryStore::new();
        let config = config();
        let service = CatalogService::new(&store, &config.catalog, &config.messages);

        let mut input = lamp();
        input.name = None;
        let err = service.create(input).await.unwrap_err();
        assert_eq!(err.to_string(), config.messages.product_name_null);

        let mut input = lamp();
        input.name = Some("   ".to_owned());
        let err = service.create(input).await.unwrap_err();
        assert_eq!(err.to_string(), config.messages.product_name_empty);

        let mut input = lamp();
        input.price = Some(Decimal::new(-1, 0));
        let err = service.create(input).await.unwrap_err();
        assert_eq!(err.to_string(), "price must not be negative");

        let mut input = lamp();
        input.rating = Some(9);
        assert!(matches!(
            service.create(input).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_merges_and_keeps_code() {
        let store = MemoryStore::new();
        let config = config();
        let service = CatalogService::new(&store, &config.catalog, &config.messages);
        let created = service.create(lamp()).await.unwrap();

        let updated = service
            .update(
                created.id,
                ProductPatch {
                    quantity: Some(10),
                    ..ProductPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.code, created.code);
        assert_eq!(updated.name, created.name);
        assert_eq!(updated.quantity, 10);
    }

    #[tokio::test]
    async fn test_update_rejects_negative_quantity() {
        let store = MemoryStore::new();
        let config = config();
        let service = CatalogService::new(&store, &config.catalog, &config.messages);
        let created = service.create(lamp()).await.unwrap();

        let err = service
            .update(
                created.id,
                ProductPatch {
                    quantity: Some(-1),
                    ..ProductPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "quantity must not be negative");
        assert_eq!(service.get(created.id).await.unwrap().quantity, 4);
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let store = MemoryStore::new();
        let config = config();
        let service = CatalogService::new(&store, &config.catalog, &config.messages);

        let err = service.get(ProductId::new(7)).await.unwrap_err();
        assert_eq!(err.to_string(), "Product not found with id: 7");
        assert!(matches!(
            service.delete(ProductId::new(7)).await,
            Err(ServiceError::NotFound { .. })
        ));
    }
}
