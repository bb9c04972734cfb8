//! Account and token route handlers.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::ApiDataResponse;
use crate::error::{ApiJson, Result};
use crate::services::ServiceError;
use crate::services::accounts::{AccountService, NewAccount};
use crate::state::AppState;

/// Sign-up request body.
#[derive(Debug, Deserialize)]
pub struct AccountRequest {
    pub username: Option<String>,
    pub firstname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl From<AccountRequest> for NewAccount {
    fn from(req: AccountRequest) -> Self {
        Self {
            username: req.username,
            firstname: req.firstname,
            email: req.email,
            password: req.password,
        }
    }
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login response body.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Create an account.
#[instrument(skip_all)]
pub async fn create_account(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Option<AccountRequest>>,
) -> Result<impl IntoResponse> {
    let messages = &state.config().messages;
    let body = body.ok_or_else(|| ServiceError::Validation(messages.account_create_null.clone()))?;

    AccountService::new(state.store(), messages)
        .create_user(body.into())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiDataResponse::message("Account created successfully")),
    ))
}

/// Exchange an email/password pair for a bearer token.
#[instrument(skip_all)]
pub async fn issue_token(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<TokenRequest>,
) -> Result<Json<TokenResponse>> {
    let user = AccountService::new(state.store(), &state.config().messages)
        .login(&body.email, &body.password)
        .await?;

    let token = state
        .tokens()
        .issue(&user.email)
        .map_err(ServiceError::from)?;

    tracing::info!(user_id = %user.id, "Token issued");
    Ok(Json(TokenResponse { token }))
}
