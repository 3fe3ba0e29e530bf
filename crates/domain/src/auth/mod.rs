//! Account registration and password login.

mod error;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Deserialize;
use store::{NewUser, UserRecord, UserStore};

pub use error::AuthError;

use crate::email::Email;
use crate::error::{ValidationError, optional_text, required_text};
use crate::identity::{Identity, Role};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_NAME_LEN: usize = 255;
const MAX_PHONE_LEN: usize = 32;

/// A registration request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterUser {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub pincode: Option<String>,
}

/// Registers users and verifies credentials.
#[derive(Clone)]
pub struct AuthService<S> {
    store: S,
}

impl<S: UserStore> AuthService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates an account and returns its identity.
    #[tracing::instrument(skip(self, request))]
    pub async fn register(&self, request: RegisterUser) -> Result<Identity, AuthError> {
        let name = required_text("name", request.name.as_deref(), MAX_NAME_LEN)?;
        let email = Email::parse("email", request.email.as_deref().unwrap_or_default())?;
        let password = validate_password(request.password.as_deref())?;
        let role = match request.role.as_deref().map(str::trim) {
            None | Some("") => Role::default(),
            Some(raw) => raw
                .parse::<Role>()
                .ok()
                .filter(Role::is_self_assignable)
                .ok_or_else(|| ValidationError::new("role", "must be customer or dealer"))?,
        };

        let phone = optional_text("phone", request.phone.as_deref(), MAX_PHONE_LEN)?;
        let address = optional_text("address", request.address.as_deref(), 1_000)?;
        let city = optional_text("city", request.city.as_deref(), 100)?;
        let state = optional_text("state", request.state.as_deref(), 100)?;
        let pincode = optional_text("pincode", request.pincode.as_deref(), 10)?;

        let password_hash = hash_password(password).await?;
        let user = self
            .store
            .create_user(NewUser {
                name,
                email: email.into_inner(),
                password_hash,
                role: role.as_str().to_string(),
                phone,
                address,
                city,
                state,
                pincode,
            })
            .await?;

        tracing::info!(user_id = %user.id, role = %role, "User registered");
        identity_of(user)
    }

    /// Verifies credentials and returns the caller's identity.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = Email::parse("email", email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, hash) = self
            .store
            .get_credentials(email.as_str())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password.to_string(), hash).await?;

        if !user.active {
            tracing::warn!(user_id = %user.id, "Login attempt on disabled account");
            return Err(AuthError::AccountDisabled);
        }

        tracing::info!(user_id = %user.id, "User logged in");
        identity_of(user)
    }
}

fn identity_of(user: UserRecord) -> Result<Identity, AuthError> {
    let role = user.role.parse::<Role>().map_err(|e| {
        AuthError::Store(store::StoreError::Corrupt(format!("user {}: {e}", user.id)))
    })?;
    Ok(Identity {
        user_id: user.id,
        name: user.name,
        email: user.email,
        role,
    })
}

fn validate_password(password: Option<&str>) -> Result<String, ValidationError> {
    let password = password.unwrap_or_default();
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::new(
            "password",
            format!("must be at least {MIN_PASSWORD_LENGTH} characters"),
        ));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::new(
            "password",
            format!("must be at most {MAX_PASSWORD_LENGTH} characters"),
        ));
    }
    Ok(password.to_string())
}

/// Hash a password using Argon2id.
async fn hash_password(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| AuthError::PasswordHash)
    })
    .await
    .map_err(|_| AuthError::PasswordHash)?
}

/// Verify a password against a stored PHC hash.
async fn verify_password(password: String, hash: String) -> Result<(), AuthError> {
    tokio::task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&hash).map_err(|_| AuthError::InvalidCredentials)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidCredentials)
    })
    .await
    .map_err(|_| AuthError::PasswordHash)?
}
