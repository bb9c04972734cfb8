//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CARTWHEEL_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`; `memory:` selects the in-process store)
//! - `CARTWHEEL_TOKEN_SECRET` - Bearer token signing secret (min 32 chars, high entropy)
//! - `CARTWHEEL_ADMIN_EMAIL` - Email of the single catalog administrator
//!
//! ## Optional
//! - `CARTWHEEL_HOST` - Bind address (default: 127.0.0.1)
//! - `CARTWHEEL_PORT` - Listen port (default: 8080)
//! - `CARTWHEEL_TOKEN_EXPIRY_SECS` - Token lifetime (default: 36000)
//! - `CARTWHEEL_ADMIN_PATH` - Path prefix whose writes are admin-only (default: /products)
//! - `CARTWHEEL_ADMIN_MESSAGE` - Body message of the admin-gate 403
//! - `CARTWHEEL_CART_MIN_QUANTITY` - Smallest quantity accepted by cart writes (default: 1)
//! - `CARTWHEEL_PRODUCT_CODE_PREFIX` - Generated product code prefix (default: PRD-)
//! - `CARTWHEEL_PRODUCT_CODE_LENGTH` - Random characters after the prefix (default: 8)
//! - `CARTWHEEL_PRODUCT_UUID_MIN_LENGTH` - Shortest UUID text the generator may slice (default: 32)
//! - `CARTWHEEL_PRODUCT_MIN_VALUE` - Lower bound for price and quantity (default: 0)
//! - `CARTWHEEL_LOG_FORMAT` - `json` for JSON log lines (default: text)
//! - `CARTWHEEL_MSG_*` - Overrides for client-facing messages (see [`Messages`])
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use cartwheel_core::ProductCode;

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const UUID_TEXT_LENGTH: usize = 36;

/// Value of the database URL that selects the in-memory store.
pub const MEMORY_DATABASE_URL: &str = "memory:";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Bearer token settings
    pub token: TokenConfig,
    /// Catalog write gate
    pub admin: AdminGateConfig,
    /// Product code generation and numeric thresholds
    pub catalog: CatalogConfig,
    /// Cart rules
    pub cart: CartConfig,
    /// Client-facing messages
    pub messages: Messages,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Log output format
    pub log_format: LogFormat,
}

/// Bearer token configuration.
///
/// Implements `Debug` manually to redact the signing secret.
#[derive(Clone)]
pub struct TokenConfig {
    /// HMAC signing secret
    pub secret: SecretString,
    /// Token lifetime in seconds
    pub expiry_secs: i64,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"[REDACTED]")
            .field("expiry_secs", &self.expiry_secs)
            .finish()
    }
}

/// Admin gate configuration.
#[derive(Debug, Clone)]
pub struct AdminGateConfig {
    /// The only caller allowed to write under `path_prefix`
    pub email: String,
    /// Path prefix whose `POST`/`PATCH`/`DELETE` requests are gated
    pub path_prefix: String,
    /// Message returned with the 403
    pub message: String,
}

/// Product code generation and validation thresholds.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub code_prefix: String,
    pub code_length: usize,
    pub uuid_min_length: usize,
    /// Lower bound for price and quantity
    pub min_value: Decimal,
}

/// Cart rules.
#[derive(Debug, Clone, Copy)]
pub struct CartConfig {
    pub min_quantity: i32,
}

/// Client-facing messages.
///
/// `not_enough_stock` may contain `{available}` and `negative_value` may
/// contain `{field}`; both are substituted when rendered.
#[derive(Debug, Clone)]
pub struct Messages {
    pub invalid_credentials: String,
    pub account_create_null: String,
    pub username_null: String,
    pub firstname_null: String,
    pub email_null: String,
    pub password_null: String,
    pub password_length: String,
    pub no_authentication: String,
    pub not_enough_stock: String,
    pub out_of_stock: String,
    pub quantity_must_be_positive: String,
    pub cart_create_null: String,
    pub cart_update_null: String,
    pub product_null: String,
    pub product_create_null: String,
    pub product_update_null: String,
    pub product_name_null: String,
    pub product_name_empty: String,
    pub negative_value: String,
    pub wishlist_request_null: String,
    pub wishlist_product_id_null: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            invalid_credentials: "Invalid email or password".to_owned(),
            account_create_null: "Account creation request must not be null".to_owned(),
            username_null: "Username is required".to_owned(),
            firstname_null: "Firstname is required".to_owned(),
            email_null: "Email is required".to_owned(),
            password_null: "Password is required".to_owned(),
            password_length: "Password must be at least 6 characters long".to_owned(),
            no_authentication: "Authentication required".to_owned(),
            not_enough_stock: "not enough stock: {available} available".to_owned(),
            out_of_stock: "product out of stock".to_owned(),
            quantity_must_be_positive: "quantity must be positive".to_owned(),
            cart_create_null: "Add to cart request must not be null".to_owned(),
            cart_update_null: "Cart update request must not be null".to_owned(),
            product_null: "Product id is required".to_owned(),
            product_create_null: "Product creation request must not be null".to_owned(),
            product_update_null: "Product update request must not be null".to_owned(),
            product_name_null: "Product name is required".to_owned(),
            product_name_empty: "Product name must not be empty".to_owned(),
            negative_value: "{field} must not be negative".to_owned(),
            wishlist_request_null: "Wishlist request must not be null".to_owned(),
            wishlist_product_id_null: "Product id is required".to_owned(),
        }
    }
}

impl Messages {
    /// Render the not-enough-stock message for `available` units.
    #[must_use]
    pub fn not_enough_stock(&self, available: i32) -> String {
        self.not_enough_stock
            .replace("{available}", &available.to_string())
    }

    /// Render the negative-value message for `field`.
    #[must_use]
    pub fn negative_value(&self, field: &str) -> String {
        self.negative_value.replace("{field}", field)
    }

    fn from_env() -> Self {
        let d = Self::default();
        Self {
            invalid_credentials: env_message("INVALID_CREDENTIALS", d.invalid_credentials),
            account_create_null: env_message("ACCOUNT_CREATE_NULL", d.account_create_null),
            username_null: env_message("USERNAME_NULL", d.username_null),
            firstname_null: env_message("FIRSTNAME_NULL", d.firstname_null),
            email_null: env_message("EMAIL_NULL", d.email_null),
            password_null: env_message("PASSWORD_NULL", d.password_null),
            password_length: env_message("PASSWORD_LENGTH", d.password_length),
            no_authentication: env_message("NO_AUTHENTICATION", d.no_authentication),
            not_enough_stock: env_message("NOT_ENOUGH_STOCK", d.not_enough_stock),
            out_of_stock: env_message("OUT_OF_STOCK", d.out_of_stock),
            quantity_must_be_positive: env_message(
                "QUANTITY_MUST_BE_POSITIVE",
                d.quantity_must_be_positive,
            ),
            cart_create_null: env_message("CART_CREATE_NULL", d.cart_create_null),
            cart_update_null: env_message("CART_UPDATE_NULL", d.cart_update_null),
            product_null: env_message("PRODUCT_NULL", d.product_null),
            product_create_null: env_message("PRODUCT_CREATE_NULL", d.product_create_null),
            product_update_null: env_message("PRODUCT_UPDATE_NULL", d.product_update_null),
            product_name_null: env_message("PRODUCT_NAME_NULL", d.product_name_null),
            product_name_empty: env_message("PRODUCT_NAME_EMPTY", d.product_name_empty),
            negative_value: env_message("NEGATIVE_VALUE", d.negative_value),
            wishlist_request_null: env_message("WISHLIST_REQUEST_NULL", d.wishlist_request_null),
            wishlist_product_id_null: env_message(
                "WISHLIST_PRODUCT_ID_NULL",
                d.wishlist_product_id_null,
            ),
        }
    }
}

impl ServerConfig {
    /// Build a configuration with defaults for everything but the three
    /// required values. Secrets are not strength-checked.
    #[must_use]
    pub fn new(database_url: SecretString, token_secret: SecretString, admin_email: &str) -> Self {
        Self {
            database_url,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 8080,
            token: TokenConfig {
                secret: token_secret,
                expiry_secs: 36_000,
            },
            admin: AdminGateConfig {
                email: admin_email.to_owned(),
                path_prefix: "/products".to_owned(),
                message: DEFAULT_ADMIN_MESSAGE.to_owned(),
            },
            catalog: CatalogConfig {
                code_prefix: "PRD-".to_owned(),
                code_length: 8,
                uuid_min_length: 32,
                min_value: Decimal::ZERO,
            },
            cart: CartConfig { min_quantity: 1 },
            messages: Messages::default(),
            sentry_dsn: None,
            sentry_environment: None,
            log_format: LogFormat::Text,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("CARTWHEEL_DATABASE_URL")?;
        let host = parse_env::<IpAddr>("CARTWHEEL_HOST", "127.0.0.1")?;
        let port = parse_env::<u16>("CARTWHEEL_PORT", "8080")?;

        let secret = get_validated_secret("CARTWHEEL_TOKEN_SECRET")?;
        validate_token_secret(&secret, "CARTWHEEL_TOKEN_SECRET")?;
        let token = TokenConfig {
            secret,
            expiry_secs: parse_env("CARTWHEEL_TOKEN_EXPIRY_SECS", "36000")?,
        };

        let admin = AdminGateConfig {
            email: get_required_env("CARTWHEEL_ADMIN_EMAIL")?,
            path_prefix: get_env_or_default("CARTWHEEL_ADMIN_PATH", "/products"),
            message: get_env_or_default("CARTWHEEL_ADMIN_MESSAGE", DEFAULT_ADMIN_MESSAGE),
        };

        let catalog = CatalogConfig {
            code_prefix: get_env_or_default("CARTWHEEL_PRODUCT_CODE_PREFIX", "PRD-"),
            code_length: parse_env("CARTWHEEL_PRODUCT_CODE_LENGTH", "8")?,
            uuid_min_length: parse_env("CARTWHEEL_PRODUCT_UUID_MIN_LENGTH", "32")?,
            min_value: parse_env("CARTWHEEL_PRODUCT_MIN_VALUE", "0")?,
        };

        let cart = CartConfig {
            min_quantity: parse_env("CARTWHEEL_CART_MIN_QUANTITY", "1")?,
        };

        let log_format = match get_optional_env("CARTWHEEL_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let config = Self {
            database_url,
            host,
            port,
            token,
            admin,
            catalog,
            cart,
            messages: Messages::from_env(),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            log_format,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` naming the offending variable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let catalog = &self.catalog;
        if catalog.uuid_min_length > UUID_TEXT_LENGTH {
            return Err(ConfigError::InvalidEnvVar(
                "CARTWHEEL_PRODUCT_UUID_MIN_LENGTH".to_owned(),
                format!("must be at most {UUID_TEXT_LENGTH}"),
            ));
        }
        if catalog.code_length == 0 || catalog.code_length > catalog.uuid_min_length {
            return Err(ConfigError::InvalidEnvVar(
                "CARTWHEEL_PRODUCT_CODE_LENGTH".to_owned(),
                format!("must be between 1 and {}", catalog.uuid_min_length),
            ));
        }
        let code_len = catalog.code_prefix.chars().count() + catalog.code_length;
        if !(ProductCode::MIN_LENGTH..=ProductCode::MAX_LENGTH).contains(&code_len) {
            return Err(ConfigError::InvalidEnvVar(
                "CARTWHEEL_PRODUCT_CODE_PREFIX".to_owned(),
                format!(
                    "prefix plus code length must be between {} and {} (got {code_len})",
                    ProductCode::MIN_LENGTH,
                    ProductCode::MAX_LENGTH
                ),
            ));
        }
        if self.cart.min_quantity < 1 {
            return Err(ConfigError::InvalidEnvVar(
                "CARTWHEEL_CART_MIN_QUANTITY".to_owned(),
                "must be at least 1".to_owned(),
            ));
        }
        if self.token.expiry_secs <= 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CARTWHEEL_TOKEN_EXPIRY_SECS".to_owned(),
                "must be positive".to_owned(),
            ));
        }
        Ok(())
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the in-memory store was requested.
    #[must_use]
    pub fn uses_memory_store(&self) -> bool {
        self.database_url.expose_secret() == MEMORY_DATABASE_URL
    }
}

const DEFAULT_ADMIN_MESSAGE: &str = "Only the administrator may modify products";

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn env_message(suffix: &str, default: String) -> String {
    get_optional_env(&format!("CARTWHEEL_MSG_{suffix}")).unwrap_or(default)
}

/// Validate that the token secret meets minimum length requirements.
fn validate_token_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_TOKEN_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
