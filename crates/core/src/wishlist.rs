//! Wishlist model.
//!
//! A wishlist is a set of product references per user: no quantities, no
//! stock checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::types::{ProductId, UserId, WishlistId, WishlistItemId};

/// A user's wishlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wishlist {
    pub id: WishlistId,
    pub user_id: UserId,
    pub items: Vec<WishlistItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product saved to a wishlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub id: WishlistItemId,
    pub wishlist_id: WishlistId,
    pub product: Product,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wishlist {
    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.item_for(product_id).is_some()
    }

    #[must_use]
    pub fn item_for(&self, product_id: ProductId) -> Option<&WishlistItem> {
        self.items.iter().find(|item| item.product.id == product_id)
    }

    #[must_use]
    pub fn total_items(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::product;

    #[test]
    fn test_contains_by_product_id() {
        let now = Utc::now();
        let wishlist = Wishlist {
            id: WishlistId::new(1),
            user_id: UserId::new(1),
            items: vec![WishlistItem {
                id: WishlistItemId::new(1),
                wishlist_id: WishlistId::new(1),
                product: product(4, None, 0),
                created_at: now,
                updated_at: now,
            }],
            created_at: now,
            updated_at: now,
        };
        assert!(wishlist.contains(ProductId::new(4)));
        assert!(!wishlist.contains(ProductId::new(5)));
        assert_eq!(wishlist.total_items(), 1);
    }
}
