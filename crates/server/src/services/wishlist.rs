//! Wishlist service.

use cartwheel_core::wishlist::Wishlist;
use cartwheel_core::{ProductId, UserId};

use super::ServiceError;
use super::cart::load_product;
use crate::config::Messages;
use crate::db::{AccessMode, Store};

/// Wishlist service.
pub struct WishlistService<'a> {
    store: &'a dyn Store,
    messages: &'a Messages,
}

impl<'a> WishlistService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store, messages: &'a Messages) -> Self {
        Self { store, messages }
    }

    /// The caller's wishlist, created empty on first access.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn get(&self, user_id: UserId) -> Result<Wishlist, ServiceError> {
        let mut uow = self.store.begin(AccessMode::ReadWrite).await?;
        let wishlist = uow.wishlist_for_user(user_id).await?;
        uow.commit().await?;
        Ok(wishlist)
    }

    /// Save a product. Adding a product twice keeps a single entry.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a missing product id and
    /// `ServiceError::NotFound` for an unknown product.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: Option<ProductId>,
    ) -> Result<Wishlist, ServiceError> {
        let product_id = product_id.ok_or_else(|| {
            ServiceError::Validation(self.messages.wishlist_product_id_null.clone())
        })?;

        let mut uow = self.store.begin(AccessMode::ReadWrite).await?;
        let wishlist = uow.wishlist_for_user(user_id).await?;
        load_product(uow.as_mut(), product_id).await?;

        if wishlist.contains(product_id) {
            uow.commit().await?;
            tracing::debug!(user_id = %user_id, product_id = %product_id, "Already in wishlist");
            return Ok(wishlist);
        }

        uow.insert_wishlist_item(wishlist.id, product_id).await?;
        let wishlist = uow.wishlist_for_user(user_id).await?;
        uow.commit().await?;

        tracing::info!(user_id = %user_id, product_id = %product_id, "Added to wishlist");
        Ok(wishlist)
    }

    /// Remove a saved product.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product is not in the wishlist.
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Wishlist, ServiceError> {
        let mut uow = self.store.begin(AccessMode::ReadWrite).await?;
        let wishlist = uow.wishlist_for_user(user_id).await?;
        if !uow.delete_wishlist_item(wishlist.id, product_id).await? {
            return Err(ServiceError::not_found(
                "Wishlist item",
                "productId",
                product_id,
            ));
        }
        let wishlist = uow.wishlist_for_user(user_id).await?;
        uow.commit().await?;

        tracing::info!(user_id = %user_id, product_id = %product_id, "Removed from wishlist");
        Ok(wishlist)
    }

    /// Drop every entry.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn clear(&self, user_id: UserId) -> Result<Wishlist, ServiceError> {
        let mut uow = self.store.begin(AccessMode::ReadWrite).await?;
        let wishlist = uow.wishlist_for_user(user_id).await?;
        uow.clear_wishlist(wishlist.id).await?;
        let wishlist = uow.wishlist_for_user(user_id).await?;
        uow.commit().await?;
        Ok(wishlist)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cartwheel_core::catalog::ProductFields;
    use cartwheel_core::{Email, ProductCode};

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::NewUser;

    async fn seed(store: &MemoryStore) -> (UserId, ProductId) {
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
        let product = uow
            .insert_product(
                &ProductCode::parse("PRD-W").unwrap(),
                &ProductFields {
                    name: "Vase".to_owned(),
                    ..ProductFields::default()
                },
            )
            .await
            .unwrap();
        uow.commit().await.unwrap();
        (user.id, product.id)
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let store = MemoryStore::new();
        let messages = Messages::default();
        let (user_id, product_id) = seed(&store).await;
        let service = WishlistService::new(&store, &messages);

        service.add(user_id, Some(product_id)).await.unwrap();
        let wishlist = service.add(user_id, Some(product_id)).await.unwrap();

        assert_eq!(wishlist.total_items(), 1);
        assert!(wishlist.contains(product_id));
    }

    #[tokio::test]
    async fn test_add_requires_product_id() {
        let store = MemoryStore::new();
        let messages = Messages::default();
        let (user_id, _) = seed(&store).await;
        let service = WishlistService::new(&store, &messages);

        let err = service.add(user_id, None).await.unwrap_err();
        assert_eq!(err.to_string(), messages.wishlist_product_id_null);
    }

    #[tokio::test]
    async fn test_remove_requires_presence() {
        let store = MemoryStore::new();
        let messages = Messages::default();
        let (user_id, product_id) = seed(&store).await;
        let service = WishlistService::new(&store, &messages);

        assert!(matches!(
            service.remove(user_id, product_id).await,
            Err(ServiceError::NotFound { .. })
        ));

        service.add(user_id, Some(product_id)).await.unwrap();
        let wishlist = service.remove(user_id, product_id).await.unwrap();
        assert_eq!(wishlist.total_items(), 0);
    }

    #[tokio::test]
    async fn test_clear_empties_wishlist() {
        let store = MemoryStore::new();
        let messages = Messages::default();
        let (user_id, product_id) = seed(&store).await;
        let service = WishlistService::new(&store, &messages);

        service.add(user_id, Some(product_id)).await.unwrap();
        let wishlist = service.clear(user_id).await.unwrap();
        assert!(wishlist.items.is_empty());
    }
}
