//! Catalog model.
//!
//! A [`Product`] is the unit the cart reserves against: its `quantity` is the
//! stock ceiling for cart writes and its `inventory_status` guards new cart
//! lines. [`ProductFields`] is what an administrator supplies on create and
//! [`ProductPatch`] is the partial form accepted on update.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{InventoryStatus, ProductCode, ProductId};

/// Maximum product name length.
pub const NAME_MAX: usize = 100;
/// Minimum product name length.
pub const NAME_MIN: usize = 2;
/// Maximum description length.
pub const DESCRIPTION_MAX: usize = 2000;
/// Maximum image URL length.
pub const IMAGE_MAX: usize = 255;
/// Maximum category length.
pub const CATEGORY_MAX: usize = 50;
/// Maximum internal reference length.
pub const INTERNAL_REFERENCE_MAX: usize = 50;
/// Highest allowed rating.
pub const RATING_MAX: i32 = 5;

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Product {
    pub id: ProductId,
    /// Immutable after creation.
    pub code: ProductCode,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    /// On-hand stock.
    pub quantity: i32,
    pub internal_reference: Option<String>,
    pub shell_id: Option<i64>,
    pub inventory_status: Option<InventoryStatus>,
    pub rating: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether the administrator has flagged the product as out of stock.
    #[must_use]
    pub fn is_flagged_out_of_stock(&self) -> bool {
        self.inventory_status == Some(InventoryStatus::OutOfStock)
    }
}

/// Attributes of a product being created. The code is generated separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFields {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: i32,
    pub internal_reference: Option<String>,
    pub shell_id: Option<i64>,
    pub inventory_status: Option<InventoryStatus>,
    pub rating: Option<i32>,
}

impl ProductFields {
    /// Check the column-width and range limits of the model.
    ///
    /// # Errors
    ///
    /// Returns the first [`LimitViolation`] found.
    pub fn check_limits(&self) -> Result<(), LimitViolation> {
        check_limits(&Limited {
            name: Some(&self.name),
            description: self.description.as_deref(),
            image: self.image.as_deref(),
            category: self.category.as_deref(),
            internal_reference: self.internal_reference.as_deref(),
            rating: self.rating,
        })
    }
}

/// Partial update of a product. `None` means "leave unchanged".
///
/// Has no `code` field: product codes never change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
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

impl ProductPatch {
    /// Check the limits of every field that is present.
    ///
    /// # Errors
    ///
    /// Returns the first [`LimitViolation`] found.
    pub fn check_limits(&self) -> Result<(), LimitViolation> {
        check_limits(&Limited {
            name: self.name.as_deref(),
            description: self.description.as_deref(),
            image: self.image.as_deref(),
            category: self.category.as_deref(),
            internal_reference: self.internal_reference.as_deref(),
            rating: self.rating,
        })
    }

    /// Merge the present fields into `product`.
    pub fn apply_to(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = Some(description);
        }
        if let Some(image) = self.image {
            product.image = Some(image);
        }
        if let Some(category) = self.category {
            product.category = Some(category);
        }
        if let Some(price) = self.price {
            product.price = Some(price);
        }
        if let Some(quantity) = self.quantity {
            product.quantity = quantity;
        }
        if let Some(internal_reference) = self.internal_reference {
            product.internal_reference = Some(internal_reference);
        }
        if let Some(shell_id) = self.shell_id {
            product.shell_id = Some(shell_id);
        }
        if let Some(status) = self.inventory_status {
            product.inventory_status = Some(status);
        }
        if let Some(rating) = self.rating {
            product.rating = Some(rating);
        }
    }
}

/// A field outside the limits of the product model.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LimitViolation {
    #[error("Product name must be between {NAME_MIN} and {NAME_MAX} characters")]
    NameLength,
    #[error("Description cannot exceed {DESCRIPTION_MAX} characters")]
    DescriptionLength,
    #[error("Image URL cannot exceed {IMAGE_MAX} characters")]
    ImageLength,
    #[error("Category cannot exceed {CATEGORY_MAX} characters")]
    CategoryLength,
    #[error("Internal reference cannot exceed {INTERNAL_REFERENCE_MAX} characters")]
    InternalReferenceLength,
    #[error("Rating must be between 0 and {RATING_MAX}")]
    RatingRange,
}

struct Limited<'a> {
    name: Option<&'a str>,
    description: Option<&'a str>,
    image: Option<&'a str>,
    category: Option<&'a str>,
    internal_reference: Option<&'a str>,
    rating: Option<i32>,
}

fn longer_than(value: Option<&str>, max: usize) -> bool {
    value.is_some_and(|v| v.chars().count() > max)
}

fn check_limits(fields: &Limited<'_>) -> Result<(), LimitViolation> {
    if let Some(name) = fields.name {
        let len = name.chars().count();
        if !(NAME_MIN..=NAME_MAX).contains(&len) {
            return Err(LimitViolation::NameLength);
        }
    }
    if longer_than(fields.description, DESCRIPTION_MAX) {
        return Err(LimitViolation::DescriptionLength);
    }
    if longer_than(fields.image, IMAGE_MAX) {
        return Err(LimitViolation::ImageLength);
    }
    if longer_than(fields.category, CATEGORY_MAX) {
        return Err(LimitViolation::CategoryLength);
    }
    if longer_than(fields.internal_reference, INTERNAL_REFERENCE_MAX) {
        return Err(LimitViolation::InternalReferenceLength);
    }
    if fields.rating.is_some_and(|r| !(0..=RATING_MAX).contains(&r)) {
        return Err(LimitViolation::RatingRange);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn product(id: i64, price: Option<Decimal>, quantity: i32) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(id),
            code: ProductCode::parse(&format!("PRD-{id:08}")).unwrap(),
            name: format!("Product {id}"),
            description: None,
            image: None,
            category: None,
            price,
            quantity,
            internal_reference: None,
            shell_id: None,
            inventory_status: Some(InventoryStatus::InStock),
            rating: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_patch_leaves_code_and_absent_fields() {
        let mut p = product(1, Some(Decimal::new(1000, 2)), 3);
        let before = p.clone();
        ProductPatch {
            quantity: Some(9),
            category: Some("tools".to_owned()),
            ..ProductPatch::default()
        }
        .apply_to(&mut p);

        assert_eq!(p.code, before.code);
        assert_eq!(p.name, before.name);
        assert_eq!(p.price, before.price);
        assert_eq!(p.quantity, 9);
        assert_eq!(p.category.as_deref(), Some("tools"));
    }

    #[test]
    fn test_name_length_limits() {
        let fields = ProductFields {
            name: "x".to_owned(),
            ..ProductFields::default()
        };
        assert_eq!(fields.check_limits(), Err(LimitViolation::NameLength));

        let fields = ProductFields {
            name: "xy".to_owned(),
            ..ProductFields::default()
        };
        assert!(fields.check_limits().is_ok());
    }

    #[test]
    fn test_patch_only_checks_present_fields() {
        assert!(ProductPatch::default().check_limits().is_ok());
        let patch = ProductPatch {
            rating: Some(6),
            ..ProductPatch::default()
        };
        assert_eq!(patch.check_limits(), Err(LimitViolation::RatingRange));
    }

    #[test]
    fn test_out_of_stock_flag_is_independent_of_quantity() {
        let mut p = product(1, None, 5);
        p.inventory_status = Some(InventoryStatus::OutOfStock);
        assert!(p.is_flagged_out_of_stock());
        p.inventory_status = None;
        p.quantity = 0;
        assert!(!p.is_flagged_out_of_stock());
    }
}
