//! Persistence for users, products, carts and wishlists.
//!
//! # Tables
//!
//! - `users` - Accounts (unique `username`, unique `email`)
//! - `products` - Catalog (unique `code`)
//! - `shopping_carts` / `cart_items` - One cart per user, one line per product
//! - `wishlists` / `wishlist_items` - One wishlist per user, one entry per product
//!
//! Every request runs inside a single [`UnitOfWork`] obtained from a
//! [`Store`]. Dropping a unit of work without calling
//! [`UnitOfWork::commit`] rolls it back.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p cartwheel-cli -- migrate
//! ```

pub mod carts;
pub mod memory;
pub mod postgres;
pub mod products;
pub mod users;
pub mod wishlists;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use cartwheel_core::cart::{Cart, LineChange};
use cartwheel_core::catalog::{Product, ProductFields};
use cartwheel_core::wishlist::Wishlist;
use cartwheel_core::{CartId, Email, ProductCode, ProductId, UserId, WishlistId};

use crate::models::{NewUser, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in database is invalid or corrupted.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Entity not found.
    #[error("not found")]
    NotFound,

    /// A constraint (unique or foreign key) was violated.
    #[error("{0}")]
    Conflict(String),
}

/// Map constraint violations to [`RepositoryError::Conflict`].
pub(crate) fn map_constraint(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && (db_err.is_unique_violation() || db_err.is_foreign_key_violation())
    {
        return RepositoryError::Conflict(db_err.message().to_owned());
    }
    RepositoryError::Database(e)
}

/// Transaction access mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AccessMode {
    #[default]
    ReadWrite,
    ReadOnly,
}

impl AccessMode {
    /// `SET TRANSACTION` clause for this mode.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::ReadWrite => "SET TRANSACTION READ WRITE",
            Self::ReadOnly => "SET TRANSACTION READ ONLY",
        }
    }
}

/// Source of units of work.
#[async_trait]
pub trait Store: Send + Sync {
    /// Start a transaction.
    async fn begin(&self, mode: AccessMode) -> Result<Box<dyn UnitOfWork>, RepositoryError>;

    /// Round-trip to the backing store.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// One transaction spanning everything a request reads and writes.
///
/// Cart and wishlist accessors get-or-create the row and hold it for the
/// rest of the transaction, so operations on one cart are serialized.
#[async_trait]
pub trait UnitOfWork: Send {
    // ============ Users ============

    async fn username_exists(&mut self, username: &str) -> Result<bool, RepositoryError>;

    async fn email_exists(&mut self, email: &Email) -> Result<bool, RepositoryError>;

    /// # Errors
    ///
    /// `Conflict` if the username or email is taken.
    async fn insert_user(&mut self, user: &NewUser) -> Result<User, RepositoryError>;

    async fn user_by_email(&mut self, email: &Email) -> Result<Option<User>, RepositoryError>;

    // ============ Products ============

    async fn list_products(&mut self) -> Result<Vec<Product>, RepositoryError>;

    async fn product(&mut self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn code_exists(&mut self, code: &ProductCode) -> Result<bool, RepositoryError>;

    /// # Errors
    ///
    /// `Conflict` if the code is taken.
    async fn insert_product(
        &mut self,
        code: &ProductCode,
        fields: &ProductFields,
    ) -> Result<Product, RepositoryError>;

    /// Persist every mutable column of `product`; the code is left alone.
    ///
    /// # Errors
    ///
    /// `NotFound` if the product no longer exists.
    async fn update_product(&mut self, product: &Product) -> Result<Product, RepositoryError>;

    /// Returns `false` if no such product exists.
    ///
    /// # Errors
    ///
    /// `Conflict` if a cart or wishlist still references the product.
    async fn delete_product(&mut self, id: ProductId) -> Result<bool, RepositoryError>;

    // ============ Carts ============

    /// The user's cart with its lines, created empty if absent.
    async fn cart_for_user(&mut self, user_id: UserId) -> Result<Cart, RepositoryError>;

    async fn apply_line_change(
        &mut self,
        cart_id: CartId,
        change: LineChange,
    ) -> Result<(), RepositoryError>;

    /// Returns `false` if the cart has no line for the product.
    async fn delete_cart_line(
        &mut self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError>;

    async fn clear_cart(&mut self, cart_id: CartId) -> Result<(), RepositoryError>;

    // ============ Wishlists ============

    /// The user's wishlist with its entries, created empty if absent.
    async fn wishlist_for_user(&mut self, user_id: UserId) -> Result<Wishlist, RepositoryError>;

    async fn insert_wishlist_item(
        &mut self,
        wishlist_id: WishlistId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError>;

    /// Returns `false` if the wishlist has no entry for the product.
    async fn delete_wishlist_item(
        &mut self,
        wishlist_id: WishlistId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError>;

    async fn clear_wishlist(&mut self, wishlist_id: WishlistId) -> Result<(), RepositoryError>;

    // ============ Transaction ============

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
