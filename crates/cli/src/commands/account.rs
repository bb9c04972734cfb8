//! Account management command.
//!
//! # Usage
//!
//! ```bash
//! cw-cli account create -u ann -f Ann -e ann@example.com -p 's3cret!'
//! ```
//!
//! Applies the same validation as `POST /account`.

use cartwheel_server::services::accounts::{AccountService, NewAccount};

use super::connect;

/// Create a shop account.
///
/// # Errors
///
/// Returns an error if a field is invalid, the username or email is taken,
/// or the database is unreachable.
pub async fn create(
    username: String,
    firstname: String,
    email: String,
    password: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let (config, store) = connect().await?;

    let user = AccountService::new(store.as_ref(), &config.messages)
        .create_user(NewAccount {
            username: Some(username),
            firstname: Some(firstname),
            email: Some(email),
            password: Some(password),
        })
        .await?;

    tracing::info!(
        "Account created successfully! ID: {}, Username: {}, Email: {}",
        user.id,
        user.username,
        user.email
    );
    if user.email.as_str() == config.admin.email {
        tracing::info!("This account is the catalog administrator");
    }
    Ok(())
}
