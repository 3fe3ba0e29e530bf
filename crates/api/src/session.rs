//! Session layer and identity extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use domain::Identity;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, Session, SessionManagerLayer, SessionStore};

use crate::error::ApiError;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "trendify_session";

/// Session key holding the logged-in [`Identity`].
pub const IDENTITY_KEY: &str = "identity";

/// Session expiry after inactivity, in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Creates the session layer over any session store.
pub fn session_layer<T: SessionStore + Clone>(store: T, secure: bool) -> SessionManagerLayer<T> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(
            SESSION_EXPIRY_SECONDS,
        )))
        .with_secure(secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Reads the identity stored in a session, if any.
pub async fn current_identity(session: &Session) -> Result<Option<Identity>, ApiError> {
    Ok(session.get::<Identity>(IDENTITY_KEY).await?)
}

/// Extractor that requires a logged-in user.
///
/// Rejects with 401 when the session carries no identity.
pub struct RequireAuth(pub Identity);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let OptionalAuth(identity) = OptionalAuth::from_request_parts(parts, state).await?;
        identity
            .map(Self)
            .ok_or_else(|| ApiError::Unauthorized("Please log in to continue".to_string()))
    }
}

/// Extractor that optionally gets the logged-in user.
pub struct OptionalAuth(pub Option<Identity>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Err(ApiError::Internal("session layer missing".to_string()));
        };
        Ok(Self(current_identity(session).await?))
    }
}
