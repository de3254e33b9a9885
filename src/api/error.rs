use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::{AuthError, SearchError};

#[derive(Debug)]
pub enum ApiError {
    ValidationError(String),

    Unauthorized(String),

    TokenExpired(String),

    NotFound(String),

    RateLimited(String),

    ExternalApiError { service: String, message: String },

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            Self::TokenExpired(msg) => write!(f, "Token expired: {msg}"),
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::RateLimited(msg) => write!(f, "Rate limited: {msg}"),
            Self::ExternalApiError { service, message } => {
                write!(f, "{service} error: {message}")
            }
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Tag carried in the error body so clients can branch without parsing text.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ValidationError(_) => "validation",
            Self::Unauthorized(_) => "unauthorized",
            Self::TokenExpired(_) => "token_expired",
            Self::NotFound(_) => "not_found",
            Self::RateLimited(_) => "rate_limited",
            Self::ExternalApiError { .. } => "external_api",
            Self::DatabaseError(_) => "database",
            Self::InternalError(_) => "internal",
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) | Self::TokenExpired(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::ExternalApiError { .. } | Self::DatabaseError(_) | Self::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::ValidationError(msg)
            | Self::Unauthorized(msg)
            | Self::TokenExpired(msg)
            | Self::NotFound(msg)
            | Self::RateLimited(msg) => msg.clone(),
            Self::ExternalApiError { service, message } => {
                tracing::warn!("{} API error: {}", service, message);
                format!("{service} service is unavailable")
            }
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                "A database error occurred".to_string()
            }
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
        };

        let body = ApiResponse::<()>::error(self.kind(), message);
        (self.status(), Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(msg) => Self::ValidationError(msg),
            AuthError::EmailTaken
            | AuthError::UsernameTaken
            | AuthError::InvalidResetToken => Self::ValidationError(err.to_string()),
            AuthError::InvalidCredentials | AuthError::InvalidToken => {
                Self::Unauthorized(err.to_string())
            }
            AuthError::TokenExpired => Self::TokenExpired(err.to_string()),
            AuthError::AccountLocked => Self::RateLimited(err.to_string()),
            AuthError::AccountNotFound => Self::NotFound(err.to_string()),
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Validation(msg) => Self::ValidationError(msg),
            SearchError::NotFound(msg) => Self::NotFound(msg),
            SearchError::MissingApiKey => Self::InternalError(err.to_string()),
            SearchError::Provider(e) => Self::tmdb_error(e.to_string()),
            SearchError::Database(msg) => Self::DatabaseError(msg),
        }
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    pub fn tmdb_error(msg: impl Into<String>) -> Self {
        Self::ExternalApiError {
            service: "TMDB".to_string(),
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_map_to_distinct_kinds() {
        let expired = ApiError::from(AuthError::TokenExpired);
        let invalid = ApiError::from(AuthError::InvalidToken);
        assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(invalid.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(expired.kind(), "token_expired");
        assert_eq!(invalid.kind(), "unauthorized");

        let locked = ApiError::from(AuthError::AccountLocked);
        assert_eq!(locked.status(), StatusCode::TOO_MANY_REQUESTS);

        let duplicate = ApiError::from(AuthError::EmailTaken);
        assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);
        assert!(matches!(duplicate, ApiError::ValidationError(msg) if msg == "Email already in use"));
    }

    #[test]
    fn test_search_errors() {
        assert_eq!(
            ApiError::from(SearchError::MissingApiKey).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(SearchError::NotFound("Movie 1 not found".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(SearchError::Validation("Query is required".into())).kind(),
            "validation"
        );
    }
}
