//! Cartwheel Core - domain types and rules.
//!
//! This crate provides the types shared by every Cartwheel component:
//! - `server` - HTTP backend (accounts, catalog, cart, wishlist)
//! - `cli` - Command-line tools for migrations and account management
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP. Stock checks for cart writes live here as a planner that
//! the server's transactional services execute.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, product codes and statuses
//! - [`catalog`] - Products, create fields and patch merging
//! - [`cart`] - Carts, derived totals and the stock-rule planner
//! - [`wishlist`] - Wishlists

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod types;
pub mod wishlist;

pub use types::*;
