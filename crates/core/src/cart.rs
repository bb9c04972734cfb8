//! Cart model and stock rules.
//!
//! A cart owns its lines; a line references its cart by id and carries a
//! snapshot of the product it is pinned to. At most one line exists per
//! product in a cart.
//!
//! Writes are planned by [`StockRules`] against the current cart and product,
//! producing a [`LineChange`] that the persistence layer applies, or a
//! [`CartRejection`] explaining why nothing may change. Totals are derived on
//! read and never stored.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::types::{CartId, CartItemId, ProductId, UserId};

/// A user's shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    /// Lines in insertion order.
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product: Product,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartItem {
    /// `price * quantity`, or `None` when the product has no price.
    #[must_use]
    pub fn subtotal(&self) -> Option<Decimal> {
        self.product
            .price
            .map(|price| price * Decimal::from(self.quantity))
    }
}

/// Aggregates derived from a cart's lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartTotals {
    pub total_items: i64,
    pub total_price: Decimal,
}

impl Cart {
    /// The line pinned to `product_id`, if any.
    #[must_use]
    pub fn line_for(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product.id == product_id)
    }

    /// Sum quantities and subtotals. Lines without a subtotal add to
    /// `total_items` but not to `total_price`.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        self.items.iter().fold(CartTotals::default(), |acc, item| CartTotals {
            total_items: acc.total_items + i64::from(item.quantity),
            total_price: acc.total_price + item.subtotal().unwrap_or(Decimal::ZERO),
        })
    }
}

/// A single write to apply to a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineChange {
    /// Create a new line.
    Insert { product_id: ProductId, quantity: i32 },
    /// Overwrite the quantity of an existing line.
    SetQuantity { item_id: CartItemId, quantity: i32 },
}

/// Why a cart write was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartRejection {
    /// Requested quantity is below the configured minimum.
    BelowMinimum { min: i32 },
    /// The product is flagged out of stock and cannot start a new line.
    OutOfStock,
    /// The resulting line would exceed on-hand stock.
    NotEnoughStock { available: i32 },
    /// No line for this product exists in the cart.
    LineMissing(ProductId),
}

/// Stock-availability rules for cart writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockRules {
    pub min_quantity: i32,
}

impl Default for StockRules {
    fn default() -> Self {
        Self { min_quantity: 1 }
    }
}

impl StockRules {
    #[must_use]
    pub const fn new(min_quantity: i32) -> Self {
        Self { min_quantity }
    }

    /// Reject quantities below the minimum.
    ///
    /// # Errors
    ///
    /// Returns [`CartRejection::BelowMinimum`].
    pub const fn check_quantity(&self, quantity: i32) -> Result<(), CartRejection> {
        if quantity < self.min_quantity {
            return Err(CartRejection::BelowMinimum {
                min: self.min_quantity,
            });
        }
        Ok(())
    }

    /// Plan adding `quantity` of `product` to `cart`.
    ///
    /// The increment is checked against stock first; when a line already
    /// exists the merged quantity is checked again.
    ///
    /// # Errors
    ///
    /// Returns a [`CartRejection`] if the minimum, out-of-stock or stock
    /// rules are violated.
    pub fn plan_add(
        &self,
        cart: &Cart,
        product: &Product,
        quantity: i32,
    ) -> Result<LineChange, CartRejection> {
        self.check_quantity(quantity)?;
        if product.is_flagged_out_of_stock() {
            return Err(CartRejection::OutOfStock);
        }
        check_stock(product, quantity)?;

        match cart.line_for(product.id) {
            Some(line) => {
                let merged = line
                    .quantity
                    .checked_add(quantity)
                    .ok_or(CartRejection::NotEnoughStock {
                        available: product.quantity,
                    })?;
                check_stock(product, merged)?;
                Ok(LineChange::SetQuantity {
                    item_id: line.id,
                    quantity: merged,
                })
            }
            None => Ok(LineChange::Insert {
                product_id: product.id,
                quantity,
            }),
        }
    }

    /// Plan replacing the quantity of the line for `product`.
    ///
    /// The out-of-stock flag is not consulted; it only guards new lines.
    ///
    /// # Errors
    ///
    /// Returns a [`CartRejection`] if the minimum is violated, the line is
    /// missing, or stock is insufficient.
    pub fn plan_update(
        &self,
        cart: &Cart,
        product: &Product,
        quantity: i32,
    ) -> Result<LineChange, CartRejection> {
        self.check_quantity(quantity)?;
        let line = cart
            .line_for(product.id)
            .ok_or(CartRejection::LineMissing(product.id))?;
        check_stock(product, quantity)?;
        Ok(LineChange::SetQuantity {
            item_id: line.id,
            quantity,
        })
    }
}

const fn check_stock(product: &Product, quantity: i32) -> Result<(), CartRejection> {
    if quantity > product.quantity {
        return Err(CartRejection::NotEnoughStock {
            available: product.quantity,
        });
    }
    Ok(())
}
