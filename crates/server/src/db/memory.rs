//! In-process implementation of [`Store`].
//!
//! Holds every table in memory behind one async mutex. A unit of work takes
//! the lock for its whole lifetime, works on a copy of the tables and swaps
//! the copy in on commit, so uncommitted work is discarded on drop. Unique
//! and foreign-key rules match the `PostgreSQL` schema.
//!
//! Used by tests and by `CARTWHEEL_DATABASE_URL=memory:` for local runs.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use cartwheel_core::cart::{Cart, CartItem, LineChange};
use cartwheel_core::catalog::{Product, ProductFields};
use cartwheel_core::wishlist::{Wishlist, WishlistItem};
use cartwheel_core::{
    CartId, CartItemId, Email, ProductCode, ProductId, UserId, WishlistId, WishlistItemId,
};

use super::{AccessMode, RepositoryError, Store, UnitOfWork};
use crate::models::{NewUser, User};

/// Store that keeps all data in process memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self, mode: AccessMode) -> Result<Box<dyn UnitOfWork>, RepositoryError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryUnitOfWork {
            guard,
            working,
            mode,
        }))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct OwnerRow<Id> {
    id: Id,
    user_id: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct LineRow<Id, ParentId> {
    id: Id,
    parent_id: ParentId,
    product_id: ProductId,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    last_id: i64,
    users: BTreeMap<UserId, User>,
    products: BTreeMap<ProductId, Product>,
    carts: BTreeMap<CartId, OwnerRow<CartId>>,
    cart_items: BTreeMap<CartItemId, LineRow<CartItemId, CartId>>,
    wishlists: BTreeMap<WishlistId, OwnerRow<WishlistId>>,
    wishlist_items: BTreeMap<WishlistItemId, LineRow<WishlistItemId, WishlistId>>,
}

impl MemoryState {
    const fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn product_row(&self, id: ProductId) -> Result<&Product, RepositoryError> {
        self.products.get(&id).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("line references missing product {id}"))
        })
    }

    fn product_referenced(&self, id: ProductId) -> bool {
        self.cart_items.values().any(|l| l.product_id == id)
            || self.wishlist_items.values().any(|l| l.product_id == id)
    }

    fn cart(&self, row: &OwnerRow<CartId>) -> Result<Cart, RepositoryError> {
        let items = self
            .cart_items
            .values()
            .filter(|line| line.parent_id == row.id)
            .map(|line| {
                Ok(CartItem {
                    id: line.id,
                    cart_id: line.parent_id,
                    product: self.product_row(line.product_id)?.clone(),
                    quantity: line.quantity,
                    created_at: line.created_at,
                    updated_at: line.updated_at,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;
        Ok(Cart {
            id: row.id,
            user_id: row.user_id,
            items,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    fn wishlist(&self, row: &OwnerRow<WishlistId>) -> Result<Wishlist, RepositoryError> {
        let items = self
            .wishlist_items
            .values()
            .filter(|line| line.parent_id == row.id)
            .map(|line| {
                Ok(WishlistItem {
                    id: line.id,
                    wishlist_id: line.parent_id,
                    product: self.product_row(line.product_id)?.clone(),
                    created_at: line.created_at,
                    updated_at: line.updated_at,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;
        Ok(Wishlist {
            id: row.id,
            user_id: row.user_id,
            items,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    fn require_user(&self, user_id: UserId) -> Result<(), RepositoryError> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(RepositoryError::Conflict(format!(
                "user {user_id} does not exist"
            )))
        }
    }

    fn require_product(&self, product_id: ProductId) -> Result<(), RepositoryError> {
        if self.products.contains_key(&product_id) {
            Ok(())
        } else {
            Err(RepositoryError::Conflict(format!(
                "product {product_id} does not exist"
            )))
        }
    }

    fn touch_cart(&mut self, cart_id: CartId) {
        if let Some(cart) = self.carts.get_mut(&cart_id) {
            cart.updated_at = Utc::now();
        }
    }

    fn touch_wishlist(&mut self, wishlist_id: WishlistId) {
        if let Some(wishlist) = self.wishlists.get_mut(&wishlist_id) {
            wishlist.updated_at = Utc::now();
        }
    }
}

/// A unit of work over [`MemoryStore`].
struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    mode: AccessMode,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn username_exists(&mut self, username: &str) -> Result<bool, RepositoryError> {
        Ok(self.working.users.values().any(|u| u.username == username))
    }

    async fn email_exists(&mut self, email: &Email) -> Result<bool, RepositoryError> {
        Ok(self.working.users.values().any(|u| &u.email == email))
    }

    async fn insert_user(&mut self, user: &NewUser) -> Result<User, RepositoryError> {
        let s = &mut self.working;
        if s.users.values().any(|u| u.username == user.username) {
            return Err(RepositoryError::Conflict(
                "duplicate key value violates unique constraint \"users_username_key\"".to_owned(),
            ));
        }
        if s.users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict(
                "duplicate key value violates unique constraint \"users_email_key\"".to_owned(),
            ));
        }
        let now = Utc::now();
        let row = User {
            id: UserId::new(s.next_id()),
            username: user.username.clone(),
            firstname: user.firstname.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: now,
            updated_at: now,
        };
        s.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn user_by_email(&mut self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .working
            .users
            .values()
            .find(|u| &u.email == email)
            .cloned())
    }

    async fn list_products(&mut self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.working.products.values().cloned().collect())
    }

    async fn product(&mut self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.working.products.get(&id).cloned())
    }

    async fn code_exists(&mut self, code: &ProductCode) -> Result<bool, RepositoryError> {
        Ok(self.working.products.values().any(|p| &p.code == code))
    }

    async fn insert_product(
        &mut self,
        code: &ProductCode,
        fields: &ProductFields,
    ) -> Result<Product, RepositoryError> {
        let s = &mut self.working;
        if s.products.values().any(|p| &p.code == code) {
            return Err(RepositoryError::Conflict(
                "duplicate key value violates unique constraint \"products_code_key\"".to_owned(),
            ));
        }
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(s.next_id()),
            code: code.clone(),
            name: fields.name.clone(),
            description: fields.description.clone(),
            image: fields.image.clone(),
            category: fields.category.clone(),
            price: fields.price,
            quantity: fields.quantity,
            internal_reference: fields.internal_reference.clone(),
            shell_id: fields.shell_id,
            inventory_status: fields.inventory_status,
            rating: fields.rating,
            created_at: now,
            updated_at: now,
        };
        s.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(&mut self, product: &Product) -> Result<Product, RepositoryError> {
        let stored = self
            .working
            .products
            .get_mut(&product.id)
            .ok_or(RepositoryError::NotFound)?;
        let code = stored.code.clone();
        let created_at = stored.created_at;
        *stored = Product {
            code,
            created_at,
            updated_at: Utc::now(),
            ..product.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_product(&mut self, id: ProductId) -> Result<bool, RepositoryError> {
        if !self.working.products.contains_key(&id) {
            return Ok(false);
        }
        if self.working.product_referenced(id) {
            return Err(RepositoryError::Conflict(format!(
                "product {id} is still referenced by cart or wishlist items"
            )));
        }
        self.working.products.remove(&id);
        Ok(true)
    }

    async fn cart_for_user(&mut self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let s = &mut self.working;
        s.require_user(user_id)?;
        let existing = s.carts.values().find(|c| c.user_id == user_id).cloned();
        let row = match existing {
            Some(row) => row,
            None => {
                let now = Utc::now();
                let row = OwnerRow {
                    id: CartId::new(s.next_id()),
                    user_id,
                    created_at: now,
                    updated_at: now,
                };
                s.carts.insert(row.id, row.clone());
                row
            }
        };
        s.cart(&row)
    }

    async fn apply_line_change(
        &mut self,
        cart_id: CartId,
        change: LineChange,
    ) -> Result<(), RepositoryError> {
        let s = &mut self.working;
        let now = Utc::now();
        match change {
            LineChange::Insert {
                product_id,
                quantity,
            } => {
                s.require_product(product_id)?;
                if s.cart_items
                    .values()
                    .any(|l| l.parent_id == cart_id && l.product_id == product_id)
                {
                    return Err(RepositoryError::Conflict(
                        "duplicate key value violates unique constraint \"cart_items_cart_product_key\""
                            .to_owned(),
                    ));
                }
                let id = CartItemId::new(s.next_id());
                s.cart_items.insert(
                    id,
                    LineRow {
                        id,
                        parent_id: cart_id,
                        product_id,
                        quantity,
                        created_at: now,
                        updated_at: now,
                    },
                );
            }
            LineChange::SetQuantity { item_id, quantity } => {
                let line = s
                    .cart_items
                    .get_mut(&item_id)
                    .filter(|l| l.parent_id == cart_id)
                    .ok_or(RepositoryError::NotFound)?;
                line.quantity = quantity;
                line.updated_at = now;
            }
        }
        s.touch_cart(cart_id);
        Ok(())
    }

    async fn delete_cart_line(
        &mut self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let s = &mut self.working;
        let before = s.cart_items.len();
        s.cart_items
            .retain(|_, l| !(l.parent_id == cart_id && l.product_id == product_id));
        let removed = s.cart_items.len() < before;
        if removed {
            s.touch_cart(cart_id);
        }
        Ok(removed)
    }

    async fn clear_cart(&mut self, cart_id: CartId) -> Result<(), RepositoryError> {
        let s = &mut self.working;
        s.cart_items.retain(|_, l| l.parent_id != cart_id);
        s.touch_cart(cart_id);
        Ok(())
    }

    async fn wishlist_for_user(&mut self, user_id: UserId) -> Result<Wishlist, RepositoryError> {
        let s = &mut self.working;
        s.require_user(user_id)?;
        let existing = s.wishlists.values().find(|w| w.user_id == user_id).cloned();
        let row = match existing {
            Some(row) => row,
            None => {
                let now = Utc::now();
                let row = OwnerRow {
                    id: WishlistId::new(s.next_id()),
                    user_id,
                    created_at: now,
                    updated_at: now,
                };
                s.wishlists.insert(row.id, row.clone());
                row
            }
        };
        s.wishlist(&row)
    }

    async fn insert_wishlist_item(
        &mut self,
        wishlist_id: WishlistId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        let s = &mut self.working;
        s.require_product(product_id)?;
        if s.wishlist_items
            .values()
            .any(|l| l.parent_id == wishlist_id && l.product_id == product_id)
        {
            return Err(RepositoryError::Conflict(
                "duplicate key value violates unique constraint \"wishlist_items_wishlist_product_key\""
                    .to_owned(),
            ));
        }
        let now = Utc::now();
        let id = WishlistItemId::new(s.next_id());
        s.wishlist_items.insert(
            id,
            LineRow {
                id,
                parent_id: wishlist_id,
                product_id,
                quantity: 1,
                created_at: now,
                updated_at: now,
            },
        );
        s.touch_wishlist(wishlist_id);
        Ok(())
    }

    async fn delete_wishlist_item(
        &mut self,
        wishlist_id: WishlistId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let s = &mut self.working;
        let before = s.wishlist_items.len();
        s.wishlist_items
            .retain(|_, l| !(l.parent_id == wishlist_id && l.product_id == product_id));
        let removed = s.wishlist_items.len() < before;
        if removed {
            s.touch_wishlist(wishlist_id);
        }
        Ok(removed)
    }

    async fn clear_wishlist(&mut self, wishlist_id: WishlistId) -> Result<(), RepositoryError> {
        let s = &mut self.working;
        s.wishlist_items.retain(|_, l| l.parent_id != wishlist_id);
        s.touch_wishlist(wishlist_id);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let Self {
            mut guard,
            working,
            mode,
        } = *self;
        if mode == AccessMode::ReadWrite {
            *guard = working;
        }
        Ok(())
    }
}
