//! Cart service.
//!
//! Every operation loads (or lazily creates) the caller's cart inside one
//! unit of work, plans the change with [`StockRules`], applies it and
//! returns the cart as it stands after the write. A rejected plan leaves
//! the transaction uncommitted, so nothing changes.

use cartwheel_core::cart::{Cart, CartRejection, StockRules};
use cartwheel_core::catalog::Product;
use cartwheel_core::{ProductId, UserId};

use super::ServiceError;
use crate::config::{CartConfig, Messages};
use crate::db::{AccessMode, Store, UnitOfWork};

/// Cart service.
pub struct CartService<'a> {
    store: &'a dyn Store,
    rules: StockRules,
    messages: &'a Messages,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store, config: &CartConfig, messages: &'a Messages) -> Self {
        Self {
            store,
            rules: StockRules::new(config.min_quantity),
            messages,
        }
    }

    /// The caller's cart, created empty on first access.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn get(&self, user_id: UserId) -> Result<Cart, ServiceError> {
        let mut uow = self.store.begin(AccessMode::ReadWrite).await?;
        let cart = uow.cart_for_user(user_id).await?;
        uow.commit().await?;
        Ok(cart)
    }

    /// Add `quantity` of a product, merging into an existing line.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a missing product id, a
    /// quantity below the minimum, an out-of-stock product or insufficient
    /// stock, and `ServiceError::NotFound` for an unknown product.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: Option<ProductId>,
        quantity: Option<i32>,
    ) -> Result<Cart, ServiceError> {
        let product_id =
            product_id.ok_or_else(|| self.invalid(&self.messages.product_null))?;
        let quantity = self.valid_quantity(quantity)?;
        tracing::debug!(user_id = %user_id, product_id = %product_id, quantity, "Adding to cart");

        let mut uow = self.store.begin(AccessMode::ReadWrite).await?;
        let cart = uow.cart_for_user(user_id).await?;
        let product = load_product(uow.as_mut(), product_id).await?;

        let change = self
            .rules
            .plan_add(&cart, &product, quantity)
            .map_err(|r| self.rejected(r))?;
        uow.apply_line_change(cart.id, change).await?;

        let cart = uow.cart_for_user(user_id).await?;
        uow.commit().await?;

        tracing::info!(user_id = %user_id, product_id = %product_id, quantity, "Added to cart");
        Ok(cart)
    }

    /// Replace the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a quantity below the minimum or
    /// above stock, `ServiceError::NotFound` for an unknown product or a
    /// product that is not in the cart.
    pub async fn update(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Option<i32>,
    ) -> Result<Cart, ServiceError> {
        let quantity = self.valid_quantity(quantity)?;
        tracing::debug!(user_id = %user_id, product_id = %product_id, quantity, "Updating cart line");

        let mut uow = self.store.begin(AccessMode::ReadWrite).await?;
        let cart = uow.cart_for_user(user_id).await?;
        let product = load_product(uow.as_mut(), product_id).await?;

        let change = self
            .rules
            .plan_update(&cart, &product, quantity)
            .map_err(|r| self.rejected(r))?;
        uow.apply_line_change(cart.id, change).await?;

        let cart = uow.cart_for_user(user_id).await?;
        uow.commit().await?;

        tracing::info!(user_id = %user_id, product_id = %product_id, quantity, "Cart line updated");
        Ok(cart)
    }

    /// Remove the line for a product.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` for an unknown product or a product
    /// that is not in the cart.
    pub async fn remove(&self, user_id: UserId, product_id: ProductId) -> Result<Cart, ServiceError> {
        let mut uow = self.store.begin(AccessMode::ReadWrite).await?;
        let cart = uow.cart_for_user(user_id).await?;
        load_product(uow.as_mut(), product_id).await?;

        if !uow.delete_cart_line(cart.id, product_id).await? {
            return Err(self.rejected(CartRejection::LineMissing(product_id)));
        }

        let cart = uow.cart_for_user(user_id).await?;
        uow.commit().await?;

        tracing::info!(user_id = %user_id, product_id = %product_id, "Removed from cart");
        Ok(cart)
    }

    /// Drop every line.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn clear(&self, user_id: UserId) -> Result<Cart, ServiceError> {
        let mut uow = self.store.begin(AccessMode::ReadWrite).await?;
        let cart = uow.cart_for_user(user_id).await?;
        uow.clear_cart(cart.id).await?;
        let cart = uow.cart_for_user(user_id).await?;
        uow.commit().await?;

        tracing::info!(user_id = %user_id, "Cart cleared");
        Ok(cart)
    }

    fn valid_quantity(&self, quantity: Option<i32>) -> Result<i32, ServiceError> {
        let quantity = quantity.ok_or_else(|| self.rejected(self.below_minimum()))?;
        self.rules
            .check_quantity(quantity)
            .map_err(|r| self.rejected(r))?;
        Ok(quantity)
    }

    const fn below_minimum(&self) -> CartRejection {
        CartRejection::BelowMinimum {
            min: self.rules.min_quantity,
        }
    }

    fn rejected(&self, rejection: CartRejection) -> ServiceError {
        tracing::warn!(?rejection, "Cart write rejected");
        match rejection {
            CartRejection::BelowMinimum { .. } => {
                ServiceError::Validation(self.messages.quantity_must_be_positive.clone())
            }
            CartRejection::OutOfStock => ServiceError::Validation(self.messages.out_of_stock.clone()),
            CartRejection::NotEnoughStock { available } => {
                ServiceError::Validation(self.messages.not_enough_stock(available))
            }
            CartRejection::LineMissing(product_id) => {
                ServiceError::not_found("Cart item", "productId", product_id)
            }
        }
    }

    fn invalid(&self, message: &str) -> ServiceError {
        tracing::warn!(message, "Rejected cart input");
        ServiceError::Validation(message.to_owned())
    }
}

pub(crate) async fn load_product(
    uow: &mut dyn UnitOfWork,
    product_id: ProductId,
) -> Result<Product, ServiceError> {
    uow.product(product_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Product", "id", product_id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use cartwheel_core::catalog::ProductFields;
    use cartwheel_core::{Email, InventoryStatus, ProductCode};

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::NewUser;

    struct Fixture {
        store: MemoryStore,
        messages: Messages,
        config: CartConfig,
        user_id: UserId,
    }

    impl Fixture {
        async fn new() -> Self {
            let store = MemoryStore::new();
            let mut uow = store.begin(AccessMode::ReadWrite).await.unwrap();
            let user = uow
                .insert_user(&NewUser {
                    username: "ann".to_owned(),
                    firstname: "Ann".to_owned(),
                    email: Email::parse("ann@shop.test").unwrap(),
                    password_hash: "hash".to_owned(),
                })
                .await
                .unwrap();
            uow.commit().await.unwrap();
            Self {
                store,
                messages: Messages::default(),
                config: CartConfig { min_quantity: 1 },
                user_id: user.id,
            }
        }

        fn service(&self) -> CartService<'_> {
            CartService::new(&self.store, &self.config, &self.messages)
        }

        async fn product(&self, code: &str, quantity: i32, status: InventoryStatus) -> ProductId {
            let mut uow = self.store.begin(AccessMode::ReadWrite).await.unwrap();
            let product = uow
                .insert_product(
                    &ProductCode::parse(code).unwrap(),
                    &ProductFields {
                        name: "Mug".to_owned(),
                        price: Some(Decimal::TEN),
                        quantity,
                        inventory_status: Some(status),
                        ..ProductFields::default()
                    },
                )
                .await
                .unwrap();
            uow.commit().await.unwrap();
            product.id
        }
    }

    #[tokio::test]
    async fn test_get_creates_empty_cart_once() {
        let fx = Fixture::new().await;
        let first = fx.service().get(fx.user_id).await.unwrap();
        let second = fx.service().get(fx.user_id).await.unwrap();
        assert!(first.items.is_empty());
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_add_then_exceeding_stock_leaves_cart_unchanged() {
        let fx = Fixture::new().await;
        let x = fx.product("PRD-X", 3, InventoryStatus::InStock).await;

        let cart = fx.service().add(fx.user_id, Some(x), Some(2)).await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.totals().total_items, 2);
        assert_eq!(cart.totals().total_price, Decimal::from(20));

        let err = fx.service().add(fx.user_id, Some(x), Some(2)).await.unwrap_err();
        assert_eq!(err.to_string(), "not enough stock: 3 available");

        let cart = fx.service().get(fx.user_id).await.unwrap();
        assert_eq!(cart.items[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_add_validates_input_before_touching_store() {
        let fx = Fixture::new().await;
        let x = fx.product("PRD-X", 3, InventoryStatus::InStock).await;

        for quantity in [None, Some(0), Some(-3)] {
            let err = fx.service().add(fx.user_id, Some(x), quantity).await.unwrap_err();
            assert_eq!(err.to_string(), fx.messages.quantity_must_be_positive);
        }
        let err = fx.service().add(fx.user_id, None, Some(1)).await.unwrap_err();
        assert_eq!(err.to_string(), fx.messages.product_null);

        assert!(fx.service().get(fx.user_id).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_add_unknown_product_is_not_found() {
        let fx = Fixture::new().await;
        let err = fx
            .service()
            .add(fx.user_id, Some(ProductId::new(999)), Some(1))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Product not found with id: 999");
    }

    #[tokio::test]
    async fn test_out_of_stock_flag_blocks_add_with_positive_quantity() {
        let fx = Fixture::new().await;
        let y = fx.product("PRD-Y", 5, InventoryStatus::OutOfStock).await;

        let err = fx.service().add(fx.user_id, Some(y), Some(1)).await.unwrap_err();
        assert_eq!(err.to_string(), "product out of stock");
    }

    #[tokio::test]
    async fn test_update_and_remove() {
        let fx = Fixture::new().await;
        let x = fx.product("PRD-X", 3, InventoryStatus::InStock).await;
        fx.service().add(fx.user_id, Some(x), Some(2)).await.unwrap();

        let err = fx.service().update(fx.user_id, x, Some(4)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let cart = fx.service().update(fx.user_id, x, Some(3)).await.unwrap();
        assert_eq!(cart.totals().total_items, 3);
        assert_eq!(cart.totals().total_price, Decimal::from(30));

        let cart = fx.service().remove(fx.user_id, x).await.unwrap();
        assert!(cart.items.is_empty());

        let err = fx.service().remove(fx.user_id, x).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Cart item not found with productId: {x}")
        );
    }

    #[tokio::test]
    async fn test_update_missing_line_is_not_found() {
        let fx = Fixture::new().await;
        let x = fx.product("PRD-X", 3, InventoryStatus::InStock).await;
        let err = fx.service().update(fx.user_id, x, Some(1)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { resource: "Cart item", .. }));
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let fx = Fixture::new().await;
        let x = fx.product("PRD-X", 3, InventoryStatus::InStock).await;
        fx.service().add(fx.user_id, Some(x), Some(1)).await.unwrap();

        for _ in 0..2 {
            let cart = fx.service().clear(fx.user_id).await.unwrap();
            assert!(cart.items.is_empty());
            assert_eq!(cart.totals().total_items, 0);
        }
    }
}
