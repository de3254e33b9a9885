use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;

use super::{
    ApiError, ApiResponse, AppState, AuthResponse, ForgotPasswordRequest, LoginRequest,
    MessageResponse, ProfileResponse, RequestUser, ResetPasswordRequest, SignupRequest, UserDto,
};
use crate::services::AuthSession;

pub const AUTH_COOKIE: &str = "auth_token";

const RESET_ACK: &str = "If your email is registered, you will receive a password reset link";

// ============================================================================
// Helpers
// ============================================================================

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::validation(e.body_text()))
}

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    let max_age = state.shared.tokens.ttl().num_seconds();
    Cookie::build((AUTH_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(state.config().server.secure_cookies)
        .max_age(time::Duration::seconds(max_age))
        .build()
}

fn session_response(
    state: &AppState,
    jar: CookieJar,
    session: AuthSession,
    message: &str,
) -> (CookieJar, Json<ApiResponse<AuthResponse>>) {
    let jar = jar.add(session_cookie(state, session.token.clone()));
    let body = AuthResponse {
        token: session.token,
        user: UserDto {
            email: session.profile.email,
            username: session.profile.username,
        },
        message: message.to_string(),
    };
    (jar, Json(ApiResponse::success(body)))
}

/// Bearer header first, then the session cookie.
fn extract_token(headers: &HeaderMap, jar: &CookieJar) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && !token.trim().is_empty()
    {
        return Some(token.trim().to_string());
    }

    jar.get(AUTH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/signup
pub async fn signup(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<
    (
        StatusCode,
        Extension<RequestUser>,
        CookieJar,
        Json<ApiResponse<AuthResponse>>,
    ),
    ApiError,
> {
    let payload = parse_body(payload)?;

    let session = state
        .auth_service()
        .register(&payload.email, &payload.password, &payload.username)
        .await?;

    let user = Extension(RequestUser(session.profile.id));
    let (jar, body) = session_response(&state, jar, session, "User created successfully");
    Ok((StatusCode::CREATED, user, jar, body))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(Extension<RequestUser>, CookieJar, Json<ApiResponse<AuthResponse>>), ApiError> {
    let payload = parse_body(payload)?;

    let session = state
        .auth_service()
        .authenticate(&payload.email, &payload.password)
        .await?;

    let user = Extension(RequestUser(session.profile.id));
    let (jar, body) = session_response(&state, jar, session, "Login successful");
    Ok((user, jar, body))
}

/// POST /auth/logout
/// Always answers with an expired cookie, even when the request carried none.
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<ApiResponse<MessageResponse>>) {
    let cookie = Cookie::build((AUTH_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::ZERO)
        .build();

    (
        jar.add(cookie),
        Json(ApiResponse::success(MessageResponse::new(
            "Logged out successfully",
        ))),
    )
}

/// GET /auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(Extension<RequestUser>, Json<ApiResponse<ProfileResponse>>), ApiError> {
    let token = extract_token(&headers, &jar)
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    let profile = state.auth_service().resolve_session(&token).await?;

    Ok((
        Extension(RequestUser(profile.id)),
        Json(ApiResponse::success(ProfileResponse { user: profile })),
    ))
}

/// POST /auth/forgot-password
/// Same response whether or not the email belongs to an account.
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ForgotPasswordRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let payload = parse_body(payload)?;

    // Delivery of the ticket happens out of band; it never goes in the response.
    let _ticket = state
        .auth_service()
        .request_password_reset(&payload.email)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(RESET_ACK))))
}

/// POST /auth/reset-password
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let payload = parse_body(payload)?;

    state
        .auth_service()
        .reset_password(&payload.token, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password has been reset",
    ))))
}
