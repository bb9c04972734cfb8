//! Core types for Cartwheel.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod code;
pub mod email;
pub mod id;
pub mod inventory;

pub use code::{ProductCode, ProductCodeError};
pub use email::{Email, EmailError};
pub use id::*;
pub use inventory::InventoryStatus;
