//! Business logic services.
//!
//! # Services
//!
//! - [`accounts`] - Account creation and password login
//! - [`tokens`] - Bearer token issue and verification
//! - [`catalog`] - Product administration and product code generation
//! - [`cart`] - Per-user carts with stock rules
//! - [`wishlist`] - Per-user wishlists
//!
//! Each service call runs in exactly one unit of work: it begins, does its
//! reads and writes, and commits only on success.

pub mod accounts;
pub mod cart;
pub mod catalog;
pub mod tokens;
pub mod wishlist;

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors surfaced by services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or semantically invalid input.
    #[error("{0}")]
    Validation(String),

    /// A unique attribute is already taken.
    #[error("{resource} already exists with {field}: {value}")]
    Duplicate {
        resource: &'static str,
        field: &'static str,
        value: String,
    },

    /// The requested entity does not exist.
    #[error("{resource} not found with {field}: {value}")]
    NotFound {
        resource: &'static str,
        field: &'static str,
        value: String,
    },

    /// Unknown email or wrong password.
    #[error("{0}")]
    BadCredentials(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Token could not be signed.
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Every generated product code collided.
    #[error("no unique product code after {0} attempts")]
    CodeSpaceExhausted(u32),
}

impl ServiceError {
    pub(crate) fn not_found(
        resource: &'static str,
        field: &'static str,
        value: impl ToString,
    ) -> Self {
        Self::NotFound {
            resource,
            field,
            value: value.to_string(),
        }
    }
}
