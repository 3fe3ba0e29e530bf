//! API error types with HTTP response mapping.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domain::{AuthError, CartError, CatalogError, OrderError, ValidationError};

/// Message returned for every 5xx response.
const INTERNAL_MESSAGE: &str = "Something went wrong. Please try again later.";

/// API-level error type that maps to HTTP responses.
///
/// Every variant renders as `{"status": "error", "message": ...}`.
#[derive(Debug)]
pub enum ApiError {
    /// Input failed validation.
    Validation(ValidationError),
    /// Bad request from the client.
    BadRequest(String),
    /// No session identity where one is required.
    Unauthorized(String),
    /// Authenticated but not allowed.
    Forbidden(String),
    /// Resource not found.
    NotFound(String),
    /// Request conflicts with existing data.
    Conflict(String),
    /// Internal server error. The cause is logged, never returned.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(cause) => {
                tracing::error!(error = %cause, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_MESSAGE.to_string(),
                )
            }
        };

        let body = serde_json::json!({ "status": "error", "message": message });
        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err)
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Validation(e) => ApiError::Validation(e),
            OrderError::ProductUnavailable { .. } => ApiError::BadRequest(err.to_string()),
            OrderError::NotFound(_) => ApiError::NotFound(err.to_string()),
            OrderError::Persistence(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(e) => ApiError::Validation(e),
            AuthError::EmailTaken => ApiError::Conflict("Email is already registered".to_string()),
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid email or password".to_string())
            }
            AuthError::AccountDisabled => {
                ApiError::Forbidden("This account has been disabled".to_string())
            }
            AuthError::PasswordHash | AuthError::Store(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::Validation(e) => ApiError::Validation(e),
            CartError::ProductUnavailable(_) => ApiError::BadRequest(err.to_string()),
            CartError::NotInCart(_) => ApiError::NotFound(err.to_string()),
            CartError::Store(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::ProductNotFound(_) => ApiError::NotFound(err.to_string()),
            CatalogError::Store(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<tower_sessions::session::Error> for ApiError {
    fn from(err: tower_sessions::session::Error) -> Self {
        ApiError::Internal(format!("session error: {err}"))
    }
}

/// JSON body extractor whose rejections use the error envelope.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
            })?;
        Ok(Self(value))
    }
}

/// Path parameter extractor whose rejections use the error envelope.
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    Path<T>: FromRequestParts<S, Rejection = PathRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}
