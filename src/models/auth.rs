//! Authentication-related DTOs

use super::user::UserResponse;
use serde::{Deserialize, Serialize};

/// Login response body (tokens are also set as cookies)
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
}

/// Token refresh request body
///
/// The token may also arrive via the `refreshToken` cookie; the body field
/// is the fallback for non-browser clients.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshTokenRequest {
    #[serde(default, alias = "refreshToken")]
    pub refresh_token: Option<String>,
}

/// Rotated token pair response body
#[derive(Debug, Serialize)]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
}
