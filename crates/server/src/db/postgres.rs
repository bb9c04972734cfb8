//! `PostgreSQL` implementation of [`Store`] and [`UnitOfWork`].

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use cartwheel_core::cart::{Cart, LineChange};
use cartwheel_core::catalog::{Product, ProductFields};
use cartwheel_core::wishlist::Wishlist;
use cartwheel_core::{CartId, Email, ProductCode, ProductId, UserId, WishlistId};

use super::{AccessMode, RepositoryError, Store, UnitOfWork, carts, products, users, wishlists};
use crate::models::{NewUser, User};

/// Store backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self, mode: AccessMode) -> Result<Box<dyn UnitOfWork>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(mode.as_sql()).execute(&mut *tx).await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// A `PostgreSQL` transaction. Rolled back on drop unless committed.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn username_exists(&mut self, username: &str) -> Result<bool, RepositoryError> {
        users::username_exists(&mut self.tx, username).await
    }

    async fn email_exists(&mut self, email: &Email) -> Result<bool, RepositoryError> {
        users::email_exists(&mut self.tx, email).await
    }

    async fn insert_user(&mut self, user: &NewUser) -> Result<User, RepositoryError> {
        users::insert(&mut self.tx, user).await
    }

    async fn user_by_email(&mut self, email: &Email) -> Result<Option<User>, RepositoryError> {
        users::get_by_email(&mut self.tx, email).await
    }

    async fn list_products(&mut self) -> Result<Vec<Product>, RepositoryError> {
        products::list(&mut self.tx).await
    }

    async fn product(&mut self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        products::get(&mut self.tx, id).await
    }

    async fn code_exists(&mut self, code: &ProductCode) -> Result<bool, RepositoryError> {
        products::code_exists(&mut self.tx, code).await
    }

    async fn insert_product(
        &mut self,
        code: &ProductCode,
        fields: &ProductFields,
    ) -> Result<Product, RepositoryError> {
        products::insert(&mut self.tx, code, fields).await
    }

    async fn update_product(&mut self, product: &Product) -> Result<Product, RepositoryError> {
        products::update(&mut self.tx, product).await
    }

    async fn delete_product(&mut self, id: ProductId) -> Result<bool, RepositoryError> {
        products::delete(&mut self.tx, id).await
    }

    async fn cart_for_user(&mut self, user_id: UserId) -> Result<Cart, RepositoryError> {
        carts::get_or_create(&mut self.tx, user_id).await
    }

    async fn apply_line_change(
        &mut self,
        cart_id: CartId,
        change: LineChange,
    ) -> Result<(), RepositoryError> {
        carts::apply(&mut self.tx, cart_id, change).await
    }

    async fn delete_cart_line(
        &mut self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        carts::delete_line(&mut self.tx, cart_id, product_id).await
    }

    async fn clear_cart(&mut self, cart_id: CartId) -> Result<(), RepositoryError> {
        carts::clear(&mut self.tx, cart_id).await
    }

    async fn wishlist_for_user(&mut self, user_id: UserId) -> Result<Wishlist, RepositoryError> {
        wishlists::get_or_create(&mut self.tx, user_id).await
    }

    async fn insert_wishlist_item(
        &mut self,
        wishlist_id: WishlistId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        wishlists::insert_item(&mut self.tx, wishlist_id, product_id).await
    }

    async fn delete_wishlist_item(
        &mut self,
        wishlist_id: WishlistId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        wishlists::delete_item(&mut self.tx, wishlist_id, product_id).await
    }

    async fn clear_wishlist(&mut self, wishlist_id: WishlistId) -> Result<(), RepositoryError> {
        wishlists::clear(&mut self.tx, wishlist_id).await
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}
