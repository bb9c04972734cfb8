//! Bearer token issue and verification.
//!
//! Tokens are HS256 JWTs whose subject is the user's email. They carry no
//! authorization data.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use cartwheel_core::Email;

use crate::config::TokenConfig;

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user email)
    pub sub: String,
    /// Issued at
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
}

/// Signs and verifies bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_secs: i64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("expiry_secs", &self.expiry_secs)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    #[must_use]
    pub fn new(config: &TokenConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            expiry_secs: config.expiry_secs,
        }
    }

    /// Issue a token for `email`.
    ///
    /// # Errors
    ///
    /// Returns the signing error.
    pub fn issue(&self, email: &Email) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: email.as_str().to_owned(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.expiry_secs)).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }

    /// The subject email of a well-formed, untampered, unexpired token.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<Email> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => Email::parse(&data.claims.sub).ok(),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected bearer token");
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn service(expiry_secs: i64) -> TokenService {
        TokenService::new(&TokenConfig {
            secret: SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6"),
            expiry_secs,
        })
    }

    #[test]
    fn test_issued_token_verifies_to_email() {
        let tokens = service(60);
        let email = Email::parse("a@x").unwrap();
        let token = tokens.issue(&email).unwrap();
        assert_eq!(tokens.verify(&token), Some(email));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let tokens = service(-10);
        let token = tokens.issue(&Email::parse("a@x").unwrap()).unwrap();
        assert_eq!(tokens.verify(&token), None);
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let tokens = service(60);
        let token = tokens.issue(&Email::parse("a@x").unwrap()).unwrap();

        for i in [0, token.len() / 2, token.len() - 2] {
            let mut bytes = token.clone().into_bytes();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();
            assert_eq!(tokens.verify(&tampered), None, "byte {i} mutated");
        }
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let other = TokenService::new(&TokenConfig {
            secret: SecretString::from("Zq8#Lm2!Tx7$Vb4@Nc9&Hy1*Rk6^Wd3"),
            expiry_secs: 60,
        });
        let token = other.issue(&Email::parse("a@x").unwrap()).unwrap();
        assert_eq!(service(60).verify(&token), None);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert_eq!(service(60).verify("not-a-token"), None);
        assert_eq!(service(60).verify(""), None);
    }
}
