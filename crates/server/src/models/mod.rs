//! Server-side domain types that do not belong in the core crate.

pub mod caller;
pub mod user;

pub use caller::Caller;
pub use user::{NewUser, User};
