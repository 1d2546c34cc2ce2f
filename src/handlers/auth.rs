//! Authentication endpoints

use crate::{
    auth::{AuthContext, TokenPair},
    error::AppError,
    middleware::AppState,
    models::auth::{LoginResponse, RefreshTokenRequest, RefreshTokenResponse},
    models::user::{LoginRequest, RegisterRequest, UserResponse},
};
use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;

const ACCESS_COOKIE: &str = "accessToken";
const REFRESH_COOKIE: &str = "refreshToken";

fn session_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .build()
}

/// Set both token cookies on the jar
fn with_session_cookies(jar: CookieJar, pair: &TokenPair, secure: bool) -> CookieJar {
    jar.add(session_cookie(ACCESS_COOKIE, pair.access_token.clone(), secure))
        .add(session_cookie(REFRESH_COOKIE, pair.refresh_token.clone(), secure))
}

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = state.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let (user, pair) = state.auth.login(request).await?;
    let jar = with_session_cookies(jar, &pair, state.config.security.cookie_secure);

    Ok((
        jar,
        Json(LoginResponse {
            user,
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_in: pair.expires_in,
        }),
    ))
}

/// POST /api/v1/auth/refresh
///
/// The refresh token is read from the `refreshToken` cookie, with the JSON
/// body as fallback for non-browser clients.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Option<Json<RefreshTokenRequest>>,
) -> Result<(CookieJar, Json<RefreshTokenResponse>), AppError> {
    let presented = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .or_else(|| body.and_then(|Json(request)| request.refresh_token))
        .ok_or_else(|| AppError::authentication("Missing refresh token"))?;

    let pair = state.auth.refresh(&presented).await?;
    let jar = with_session_cookies(jar, &pair, state.config.security.cookie_secure);

    Ok((
        jar,
        Json(RefreshTokenResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_in: pair.expires_in,
        }),
    ))
}

/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    jar: CookieJar,
) -> Result<(CookieJar, Json<serde_json::Value>), AppError> {
    state.auth.logout(&auth.user_id).await?;

    let jar = jar
        .remove(Cookie::build(ACCESS_COOKIE).path("/").build())
        .remove(Cookie::build(REFRESH_COOKIE).path("/").build());

    Ok((
        jar,
        Json(serde_json::json!({ "message": "Logged out successfully" })),
    ))
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.auth.current_user(&auth.user_id).await?;
    Ok(Json(user))
}
