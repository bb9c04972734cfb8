//! Per-request caller identity.

use cartwheel_core::{Email, UserId};

/// The principal resolved from a verified bearer token.
///
/// Inserted into request extensions by the bearer middleware and passed
/// explicitly to handlers through the auth extractors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// User's database ID.
    pub user_id: UserId,
    /// User's email address.
    pub email: Email,
}
