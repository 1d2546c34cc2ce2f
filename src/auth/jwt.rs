//! JWT token generation and validation
//! Access/refresh token pair with distinct signing secrets and lifetimes

use crate::{config::AppConfig, error::AppError};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use mongodb::bson::oid::ObjectId;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Access-token claims: subject plus denormalized profile fields
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AccessClaims {
    /// Subject (user id, hex)
    pub sub: String,
    pub username: String,
    pub email: String,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
    /// Unique token id; guarantees two tokens never collide even when
    /// minted within the same second
    pub jti: String,
}

/// Refresh-token claims: subject and unique token id only
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RefreshClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Token pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until the access token expires
    pub expires_in: u64,
}

/// Validation failure, with expiry distinguished from a bad signature or
/// malformed token
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

/// JWT service
pub struct JwtService {
    access_encoding_key: EncodingKey,
    access_decoding_key: DecodingKey,
    refresh_encoding_key: EncodingKey,
    refresh_decoding_key: DecodingKey,
    access_token_exp_secs: u64,
    refresh_token_exp_secs: u64,
}

impl JwtService {
    /// Create JWT service from config
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let access_secret = config.security.access_token_secret.expose_secret();
        let refresh_secret = config.security.refresh_token_secret.expose_secret();

        // HS256 wants at least 32 bytes of key material
        if access_secret.len() < 32 || refresh_secret.len() < 32 {
            return Err(AppError::Config(
                "JWT secrets too short (min 32 chars)".to_string(),
            ));
        }

        Ok(Self {
            access_encoding_key: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding_key: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding_key: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding_key: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_token_exp_secs: config.security.access_token_exp_secs,
            refresh_token_exp_secs: config.security.refresh_token_exp_secs,
        })
    }

    pub fn access_token_exp_secs(&self) -> u64 {
        self.access_token_exp_secs
    }

    /// Generate an access token carrying the subject's public profile
    pub fn generate_access_token(
        &self,
        user_id: &ObjectId,
        username: &str,
        email: &str,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now + Duration::seconds(self.access_token_exp_secs as i64);

        let claims = AccessClaims {
            sub: user_id.to_hex(),
            username: username.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.access_encoding_key).map_err(|e| {
            tracing::error!("Failed to encode access token: {:?}", e);
            AppError::Internal(format!("Failed to encode access token: {}", e))
        })
    }

    /// Generate a refresh token carrying the subject id only
    pub fn generate_refresh_token(&self, user_id: &ObjectId) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now + Duration::seconds(self.refresh_token_exp_secs as i64);

        let claims = RefreshClaims {
            sub: user_id.to_hex(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.refresh_encoding_key).map_err(|e| {
            tracing::error!("Failed to encode refresh token: {:?}", e);
            AppError::Internal(format!("Failed to encode refresh token: {}", e))
        })
    }

    /// Generate both tokens for one subject
    pub fn generate_token_pair(
        &self,
        user_id: &ObjectId,
        username: &str,
        email: &str,
    ) -> Result<TokenPair, AppError> {
        let access_token = self.generate_access_token(user_id, username, email)?;
        let refresh_token = self.generate_refresh_token(user_id)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.access_token_exp_secs,
        })
    }

    /// Validate an access token against the access secret
    pub fn validate_access_token(&self, token: &str) -> Result<AccessClaims, TokenError> {
        Ok(decode::<AccessClaims>(token, &self.access_decoding_key, &validation())
            .map_err(classify_error)?
            .claims)
    }

    /// Validate a refresh token against the refresh secret
    pub fn validate_refresh_token(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        Ok(decode::<RefreshClaims>(token, &self.refresh_decoding_key, &validation())
            .map_err(classify_error)?
            .claims)
    }
}

/// Exact-expiry validation, no clock leeway
fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation
}

fn classify_error(e: jsonwebtoken::errors::Error) -> TokenError {
    match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => {
            tracing::debug!("Token validation failed: {:?}", e);
            TokenError::Invalid
        }
    }
}
