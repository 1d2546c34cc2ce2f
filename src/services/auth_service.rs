//! Account and session management
//!
//! Owns the credential checks and the refresh-token lifecycle. Exactly one
//! refresh token is trusted per user at a time; issuing or rotating a pair
//! persists the new refresh token before it is ever returned to the caller.

use crate::{
    auth::{JwtService, PasswordHasher, TokenError, TokenPair},
    error::AppError,
    models::user::{LoginRequest, RegisterRequest, User, UserResponse},
    repository::UserStore,
};
use mongodb::bson::{oid::ObjectId, DateTime};
use std::sync::Arc;
use validator::Validate;

/// Authentication service
pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt: Arc<JwtService>,
    hasher: PasswordHasher,
    password_min_length: usize,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        jwt: Arc<JwtService>,
        hasher: PasswordHasher,
        password_min_length: usize,
    ) -> Self {
        Self {
            users,
            jwt,
            hasher,
            password_min_length,
        }
    }

    /// Create an account
    pub async fn register(&self, request: RegisterRequest) -> Result<UserResponse, AppError> {
        request.validate()?;
        let request = request.normalized();

        if request.password.len() < self.password_min_length {
            return Err(AppError::Validation(format!(
                "password: must be at least {} characters",
                self.password_min_length
            )));
        }

        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::BadRequest(
                "User already exists with this email.".to_string(),
            ));
        }
        if self
            .users
            .find_by_username(&request.username)
            .await?
            .is_some()
        {
            return Err(AppError::BadRequest(
                "User already exists with this username.".to_string(),
            ));
        }

        let now = DateTime::now();
        let user = User {
            id: ObjectId::new(),
            username: request.username,
            email: request.email,
            password_hash: self.hasher.hash_password(&request.password)?,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };

        self.users.insert(&user).await?;
        tracing::info!(user_id = %user.id, "User registered");

        Ok(UserResponse::from(user))
    }

    /// Check credentials and start a session chain
    pub async fn login(
        &self,
        request: LoginRequest,
    ) -> Result<(UserResponse, TokenPair), AppError> {
        request.validate()?;
        let email = request.email.trim().to_lowercase();

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::not_found("User not found."))?;

        if !self
            .hasher
            .verify_password(&request.password, &user.password_hash)?
        {
            return Err(AppError::BadRequest(
                "Username or password incorrect!".to_string(),
            ));
        }

        let pair = self.issue_token_pair(&user).await?;
        tracing::info!(user_id = %user.id, "User logged in");

        Ok((UserResponse::from(user), pair))
    }

    /// Generate a pair and persist the refresh half before returning it
    async fn issue_token_pair(&self, user: &User) -> Result<TokenPair, AppError> {
        let pair = self
            .jwt
            .generate_token_pair(&user.id, &user.username, &user.email)?;
        self.users
            .set_refresh_token(&user.id, Some(&pair.refresh_token))
            .await?;
        Ok(pair)
    }

    /// Rotate a refresh token for a fresh pair
    ///
    /// The presented token must be structurally valid, unexpired, and still
    /// the single stored token for its subject. The swap to the new token
    /// is atomic, so two concurrent refreshes with the same token yield
    /// exactly one winner.
    pub async fn refresh(&self, presented: &str) -> Result<TokenPair, AppError> {
        let claims = self
            .jwt
            .validate_refresh_token(presented)
            .map_err(|e| match e {
                TokenError::Expired => {
                    AppError::authentication("Refresh token is expired or used")
                }
                TokenError::Invalid => AppError::authentication("Invalid refresh token"),
            })?;

        let user_id = ObjectId::parse_str(&claims.sub)
            .map_err(|_| AppError::authentication("Invalid refresh token"))?;

        let user = self
            .users
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| AppError::authentication("Invalid refresh token"))?;

        let pair = self
            .jwt
            .generate_token_pair(&user.id, &user.username, &user.email)?;

        let rotated = self
            .users
            .rotate_refresh_token(&user.id, presented, &pair.refresh_token)
            .await?;
        if !rotated {
            tracing::warn!(user_id = %user.id, "Refresh token replay detected");
            return Err(AppError::authentication("Refresh token is expired or used"));
        }

        tracing::debug!(user_id = %user.id, "Refresh token rotated");
        Ok(pair)
    }

    /// End the session chain by clearing the stored refresh token
    pub async fn logout(&self, user_id: &ObjectId) -> Result<(), AppError> {
        self.users.set_refresh_token(user_id, None).await?;
        tracing::info!(user_id = %user_id, "User logged out");
        Ok(())
    }

    /// Load the caller's own account
    pub async fn current_user(&self, user_id: &ObjectId) -> Result<UserResponse, AppError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;
        Ok(UserResponse::from(user))
    }
}
