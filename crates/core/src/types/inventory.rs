//! Inventory status of a catalog product.

use serde::{Deserialize, Serialize};

/// Stock status label attached to a product by the catalog administrator.
///
/// The label is stored as supplied and is not derived from the on-hand
/// quantity. The cart only consults it when a product is first added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "inventory_status", rename_all = "UPPERCASE")
)]
#[serde(rename_all = "UPPERCASE")]
pub enum InventoryStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl InventoryStatus {
    /// Wire representation (`INSTOCK`, `LOWSTOCK`, `OUTOFSTOCK`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InStock => "INSTOCK",
            Self::LowStock => "LOWSTOCK",
            Self::OutOfStock => "OUTOFSTOCK",
        }
    }
}

impl std::fmt::Display for InventoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InventoryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INSTOCK" => Ok(Self::InStock),
            "LOWSTOCK" => Ok(Self::LowStock),
            "OUTOFSTOCK" => Ok(Self::OutOfStock),
            _ => Err(format!("invalid inventory status: {s}")),
        }
    }
}
