//! Secure API credential management.

use crate::error::AuthError;
use common::Venue;
use secrecy::{ExposeSecret, SecretString};

/// API credentials for authenticated requests.
///
/// The secret key is wrapped in `SecretString`, which keeps it out of
/// `Debug` output and zeroes the memory on drop.
#[derive(Clone)]
pub struct ApiCredentials {
    api_key: String,
    secret_key: SecretString,
}

impl ApiCredentials {
    /// Load credentials for `venue` from environment variables.
    ///
    /// Looks for `<PREFIX>_API_KEY` and `<PREFIX>_SECRET_KEY`, where the
    /// prefix is [`Venue::env_prefix`].
    ///
    /// # Errors
    /// Returns `AuthError::MissingEnvVar` if either variable is not set and
    /// `AuthError::EmptyKey` if the API key is blank.
    pub fn from_env(venue: Venue) -> Result<Self, AuthError> {
        dotenvy::dotenv().ok();

        let key_var = format!("{}_API_KEY", venue.env_prefix());
        let secret_var = format!("{}_SECRET_KEY", venue.env_prefix());

        let api_key =
            std::env::var(&key_var).map_err(|_| AuthError::MissingEnvVar(key_var.clone()))?;
        let secret_key =
            std::env::var(&secret_var).map_err(|_| AuthError::MissingEnvVar(secret_var))?;

        if api_key.trim().is_empty() {
            return Err(AuthError::EmptyKey(key_var));
        }

        Ok(Self::new(api_key, secret_key))
    }

    /// Create credentials from explicit values.
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key,
            secret_key: SecretString::from(secret_key),
        }
    }

    /// Get the API key (public, safe to log).
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Expose the secret key for signing.
    ///
    /// Only use this for cryptographic operations.
    pub fn expose_secret(&self) -> &str {
        self.secret_key.expose_secret()
    }
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}
