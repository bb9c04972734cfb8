//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (record on span, echo in response)
//! 4. Error envelope (fill `path` into error bodies)
//! 5. Bearer auth (resolve the caller)
//! 6. Admin gate (refuse non-admin catalog writes)

pub mod admin;
pub mod auth;
pub mod request_id;

pub use admin::admin_gate_middleware;
pub use auth::{OptionalCaller, RequireCaller, bearer_auth_middleware};
pub use request_id::request_id_middleware;
