//! API users and bearer tokens.

mod gateway;

pub use gateway::{AuthGateway, AuthTables};

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use guest_core::FieldErrors;
use rand::distributions::Alphanumeric;
use rand::Rng;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

/// Length of the random part of a plain-text token.
const TOKEN_SECRET_LEN: usize = 40;

/// Minimum password length accepted on registration.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("The given data was invalid")]
    Validation(FieldErrors),

    #[error("Wrong email or password!")]
    InvalidCredentials,

    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("User or token id space exhausted")]
    IdsExhausted,
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(e: argon2::password_hash::Error) -> Self {
        AuthError::Hashing(e.to_string())
    }
}

/// A registered API user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check a password against the stored hash.
    pub fn verify_password(&self, password: &str) -> bool {
        PasswordHash::new(&self.password_hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }
}

/// A personal access token. Only the hash of the secret is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub id: u64,
    pub user_id: u64,
    pub name: String,
    /// SHA-256 of the secret part, hex encoded
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_used_at: Option<DateTime<Utc>>,
}

/// The user behind an authenticated request and the token it used.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub token_id: u64,
}

/// Registration input.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RegisterUser {
    #[validate(
        required(message = "The name field is required."),
        length(max = 255, message = "The name must not be greater than 255 characters.")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "The email field is required."),
        email(message = "The email must be a valid email address."),
        length(max = 255, message = "The email must not be greater than 255 characters.")
    )]
    pub email: Option<String>,

    pub password: Option<SecretString>,
}

/// Login input.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct Credentials {
    #[validate(
        required(message = "The email field is required."),
        email(message = "The email must be a valid email address.")
    )]
    pub email: Option<String>,

    pub password: Option<SecretString>,
}

/// Hash a password with Argon2 and a random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Hash a token secret using SHA-256.
pub fn hash_token(secret: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generate the random part of a plain-text token.
pub fn generate_token_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_SECRET_LEN)
        .map(char::from)
        .collect()
}

/// Split a plain-text token of the form `"{id}|{secret}"`.
pub fn split_token(plain: &str) -> Option<(u64, &str)> {
    let (id, secret) = plain.split_once('|')?;
    let id = id.parse().ok()?;
    if secret.is_empty() {
        return None;
    }
    Some((id, secret))
}
