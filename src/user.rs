use std::fmt;

use pbkdf2::pbkdf2_hmac;
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::errors::BackendError;
use crate::normalization;

const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 32;
const MIN_PASSWORD_LENGTH: usize = 6;

/// The user whose document a record lives in. Requests without a
/// session are served from the anonymous owner when login is optional.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Owner(String);

impl Owner {
    pub fn user(username: impl Into<String>) -> Self {
        Owner(username.into())
    }

    /// The empty string can never pass username validation.
    pub fn anonymous() -> Self {
        Owner(String::new())
    }

    pub fn is_anonymous(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_anonymous() {
            f.write_str("(anonymous)")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// The PBKDF2-HMAC-SHA256 rounds applied to new passwords. Stored
/// credentials keep the count they were created with.
pub const PASSWORD_ITERATIONS: u32 = 200_000;

const HASH_LENGTH: usize = 32;

/// A salted PBKDF2 password hash.
#[derive(Clone, Debug, PartialEq)]
pub struct Credentials {
    pub(crate) salt: String,
    pub(crate) hash: String,
    pub(crate) iterations: u32,
}

impl Credentials {
    /// Hashes `password` with a fresh random salt.
    pub fn new(password: &str) -> Self {
        Self::with_iterations(password, PASSWORD_ITERATIONS)
    }

    pub fn with_iterations(password: &str, iterations: u32) -> Self {
        let salt = Uuid::new_v4().to_string();
        let iterations = iterations.max(1);
        let hash = derive_key(password, &salt, iterations);

        Credentials {
            salt,
            hash,
            iterations,
        }
    }

    pub fn from_parts(salt: String, hash: String, iterations: u32) -> Self {
        Credentials {
            salt,
            hash,
            iterations,
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Compares in constant time.
    pub fn verify(&self, password: &str) -> bool {
        let derived = derive_key(password, &self.salt, self.iterations.max(1));

        derived.as_bytes().ct_eq(self.hash.as_bytes()).into()
    }
}

/// Derives the hex-encoded PBKDF2-HMAC-SHA256 key for `password`.
fn derive_key(password: &str, salt: &str, iterations: u32) -> String {
    let mut key = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut key);

    key.iter().map(|b| format!("{:02x}", b)).collect()
}

/// A username and password, as sent to the registration and login
/// endpoints.
#[derive(Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default, deserialize_with = "normalization::deserialize_option")]
    pub(crate) username: Option<String>,

    #[serde(default)]
    pub(crate) password: Option<String>,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .finish()
    }
}

impl LoginRequest {
    /// Builds a request outside of HTTP, normalizing the username the
    /// same way request bodies are.
    pub fn new(username: impl AsRef<str>, password: impl Into<String>) -> Self {
        let username = normalization::normalize_text(username);

        LoginRequest {
            username: Some(username).filter(|u| !u.is_empty()),
            password: Some(password.into()),
        }
    }

    /// Checks that both fields are present, returning them.
    pub fn into_parts(self) -> Result<(String, String), BackendError> {
        let username = self.username.ok_or(BackendError::MissingField("username"))?;
        let password = self
            .password
            .filter(|p| !p.is_empty())
            .ok_or(BackendError::MissingField("password"))?;

        Ok((username, password))
    }

    /// Like `into_parts`, but also enforces the rules for new accounts.
    pub fn into_registration(self) -> Result<(String, String), BackendError> {
        let (username, password) = self.into_parts()?;

        validate_username(&username)?;

        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(BackendError::invalid_field(
                "password",
                format!("must be at least {} characters", MIN_PASSWORD_LENGTH),
            ));
        }

        Ok((username, password))
    }
}

pub fn validate_username(username: &str) -> Result<(), BackendError> {
    let length = username.chars().count();

    if length < MIN_USERNAME_LENGTH || length > MAX_USERNAME_LENGTH {
        return Err(BackendError::invalid_field(
            "username",
            format!(
                "must be between {} and {} characters",
                MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH
            ),
        ));
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(BackendError::invalid_field(
            "username",
            "may only contain letters, digits, '_', '-' and '.'",
        ));
    }

    Ok(())
}
