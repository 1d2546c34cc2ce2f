//! Request authentication middleware and the extractor it feeds

use crate::{
    auth::jwt::TokenError,
    error::AppError,
    middleware::AppState,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;

/// Identity of the authenticated caller, loaded from the live user record
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: ObjectId,
    pub username: String,
    pub email: String,
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// Pull the access token from the Authorization header or, failing that,
/// from the `accessToken` cookie
fn extract_token(parts: &Parts) -> Option<String> {
    if let Some(value) = parts.headers.get(header::AUTHORIZATION) {
        if let Ok(value) = value.to_str() {
            if let Some(token) = value.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    CookieJar::from_headers(&parts.headers)
        .get("accessToken")
        .map(|cookie| cookie.value().to_string())
}

/// Authenticate the request and attach an [`AuthContext`]
///
/// The token subject is re-resolved against the user store on every
/// request, so tokens for deleted accounts stop working immediately.
pub async fn jwt_auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = request.into_parts();

    let token = extract_token(&parts)
        .ok_or_else(|| AppError::Authentication("Missing access token".to_string()))?;

    let claims = state.jwt.validate_access_token(&token).map_err(|e| match e {
        TokenError::Expired => AppError::Authentication("Access token expired".to_string()),
        TokenError::Invalid => AppError::Authentication("Invalid access token".to_string()),
    })?;

    let user_id = ObjectId::parse_str(&claims.sub)
        .map_err(|_| AppError::Authentication("Invalid access token".to_string()))?;

    let user = state
        .users
        .find_by_id(&user_id)
        .await?
        .ok_or_else(|| AppError::Authentication("Invalid access token".to_string()))?;

    parts.extensions.insert(AuthContext {
        user_id: user.id,
        username: user.username,
        email: user.email,
    });

    Ok(next.run(Request::from_parts(parts, body)).await)
}
