//! Bearer authentication middleware and extractors.
//!
//! The middleware resolves `Authorization: Bearer <token>` into a [`Caller`]
//! and stores it in the request extensions. A missing or invalid token is
//! not an error here: the request simply proceeds without a caller, and
//! handlers that need one reject with 401 through [`RequireCaller`].

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::Caller;
use crate::services::accounts::AccountService;
use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// Resolve the bearer token, if any, into a [`Caller`].
///
/// The token's subject must still match a stored user; tokens for deleted
/// accounts resolve to no caller.
pub async fn bearer_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix(BEARER_PREFIX));

    if let Some(email) = token.and_then(|t| state.tokens().verify(t)) {
        let accounts = AccountService::new(state.store(), &state.config().messages);
        match accounts.find_by_email(&email).await {
            Ok(Some(user)) => {
                set_sentry_user(&user.id, Some(user.email.as_str()));
                tracing::debug!(user_id = %user.id, "Bearer token accepted");
                request.extensions_mut().insert(Caller {
                    user_id: user.id,
                    email: user.email,
                });
            }
            Ok(None) => tracing::debug!("Bearer token subject has no account"),
            Err(e) => return AppError::from(e).into_response(),
        }
    }

    next.run(request).await
}

/// Extractor that requires a verified caller.
///
/// Rejects with 401 and the configured "no authentication" message.
///
/// # Example
///
/// ```rust,ignore
/// async fn cart(RequireCaller(caller): RequireCaller) -> impl IntoResponse {
///     format!("cart of {}", caller.email)
/// }
/// ```
pub struct RequireCaller(pub Caller);

impl FromRequestParts<AppState> for RequireCaller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized(state.config().messages.no_authentication.clone()))
    }
}

/// Extractor that optionally gets the caller.
///
/// Unlike `RequireCaller`, this never rejects.
pub struct OptionalCaller(pub Option<Caller>);

impl<S> FromRequestParts<S> for OptionalCaller
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Caller>().cloned()))
    }
}
