//! Account service.
//!
//! Self-service account creation and password login. This is the only
//! place a submitted password is compared to a stored hash.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use cartwheel_core::{Email, EmailError};

use super::ServiceError;
use crate::config::Messages;
use crate::db::{AccessMode, Store};
use crate::models::{NewUser, User};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Account creation input. Absent fields are `None`.
#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub username: Option<String>,
    pub firstname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Account service.
pub struct AccountService<'a> {
    store: &'a dyn Store,
    messages: &'a Messages,
}

impl<'a> AccountService<'a> {
    /// Create a new account service.
    #[must_use]
    pub const fn new(store: &'a dyn Store, messages: &'a Messages) -> Self {
        Self { store, messages }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if a field is missing or blank or
    /// the password is too short, `ServiceError::Duplicate` if the username
    /// or email is taken.
    pub async fn create_user(&self, account: NewAccount) -> Result<User, ServiceError> {
        let m = self.messages;
        let username = required(account.username, &m.username_null)?;
        let firstname = required(account.firstname, &m.firstname_null)?;
        let email = required(account.email, &m.email_null)?;
        let password = required(account.password, &m.password_null)?;
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ServiceError::Validation(m.password_length.clone()));
        }
        let email = Email::parse(&email).map_err(|e| match e {
            EmailError::Empty => ServiceError::Validation(m.email_null.clone()),
            other @ EmailError::TooLong { .. } => ServiceError::Validation(other.to_string()),
        })?;

        tracing::debug!(username = %username, "Creating account");

        let mut uow = self.store.begin(AccessMode::ReadWrite).await?;
        if uow.username_exists(&username).await? {
            tracing::warn!(username = %username, "Username already taken");
            return Err(ServiceError::Duplicate {
                resource: "User",
                field: "username",
                value: username,
            });
        }
        if uow.email_exists(&email).await? {
            tracing::warn!(email = %email, "Email already registered");
            return Err(ServiceError::Duplicate {
                resource: "User",
                field: "email",
                value: email.into_inner(),
            });
        }

        let password_hash = hash_password(&password)?;
        let user = uow
            .insert_user(&NewUser {
                username,
                firstname,
                email,
                password_hash,
            })
            .await?;
        uow.commit().await?;

        tracing::info!(user_id = %user.id, "Account created");
        Ok(user)
    }

    /// Check an email/password pair.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::BadCredentials` for an unknown email or a wrong
    /// password alike.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        let bad_credentials = || ServiceError::BadCredentials(self.messages.invalid_credentials.clone());

        let email = Email::parse(email).map_err(|_| bad_credentials())?;
        let user = self.find_by_email(&email).await?;

        if !check_password(password, user.as_ref().map(|u| u.password_hash.as_str())) {
            match &user {
                Some(user) => tracing::warn!(user_id = %user.id, "Password mismatch"),
                None => tracing::debug!("Login for unknown email"),
            }
            return Err(bad_credentials());
        }
        user.ok_or_else(bad_credentials)
    }

    /// Look up a user by email.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the lookup fails.
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<User>, ServiceError> {
        let mut uow = self.store.begin(AccessMode::ReadOnly).await?;
        let user = uow.user_by_email(email).await?;
        uow.commit().await?;
        Ok(user)
    }
}

/// Reject `None` and blank values.
fn required(value: Option<String>, message: &str) -> Result<String, ServiceError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ServiceError::Validation(message.to_owned())),
    }
}

/// Hash a password using Argon2.
pub(crate) fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| ServiceError::PasswordHash)
}

/// Check `password` against a stored hash, or against nothing when the
/// account does not exist. Both cases run one Argon2 derivation so response
/// time does not reveal which emails are registered.
fn check_password(password: &str, hash: Option<&str>) -> bool {
    match hash {
        Some(hash) => verify_password(password, hash).is_ok(),
        None => {
            let _ = hash_password(password);
            false
        }
    }
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), ServiceError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| ServiceError::PasswordHash)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| ServiceError::PasswordHash)
}
