//! Registration, login and session endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use domain::{Identity, RegisterUser, ValidationError};
use serde::{Deserialize, Serialize};
use store::Store;
use tower_sessions::Session;

use super::{Success, success};
use crate::AppState;
use crate::error::{ApiError, ApiJson};
use crate::session::{IDENTITY_KEY, RequireAuth};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserBody {
    pub user: Identity,
}

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: &'static str,
}

/// POST /auth/register: create an account.
#[tracing::instrument(skip(state, request))]
pub async fn register<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(request): ApiJson<RegisterUser>,
) -> Result<(StatusCode, Json<Success<UserBody>>), ApiError> {
    let user = state.auth.register(request).await?;
    Ok((StatusCode::CREATED, success(UserBody { user })))
}

/// POST /auth/login: verify credentials and start a session.
#[tracing::instrument(skip(state, session, request))]
pub async fn login<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    session: Session,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<Success<UserBody>>, ApiError> {
    let email = request
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| ValidationError::required("email"))?;
    let password = request
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ValidationError::required("password"))?;

    let user = state.auth.login(&email, &password).await?;

    // New id on privilege change
    session.cycle_id().await?;
    session.insert(IDENTITY_KEY, &user).await?;

    Ok(success(UserBody { user }))
}

/// POST /auth/logout: end the session.
#[tracing::instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Json<Success<MessageBody>>, ApiError> {
    session.flush().await?;
    Ok(success(MessageBody {
        message: "Logged out",
    }))
}

/// GET /auth/me: the logged-in identity.
pub async fn me(RequireAuth(user): RequireAuth) -> Json<Success<UserBody>> {
    success(UserBody { user })
}
