//! User domain models

use super::datetime_to_rfc3339;
use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// User account document
///
/// `refresh_token` mirrors the single trusted refresh-token value for this
/// user; `None` means no active session chain. Presenting any other value,
/// even validly signed, is rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 64, message = "must be 3 to 64 characters"))]
    pub username: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

impl RegisterRequest {
    /// Case-normalize identity fields the way the store indexes them
    pub fn normalized(self) -> Self {
        Self {
            username: self.username.trim().to_lowercase(),
            email: self.email.trim().to_lowercase(),
            password: self.password,
        }
    }
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

/// User response (sensitive fields excluded)
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_hex(),
            username: user.username,
            email: user.email,
            created_at: datetime_to_rfc3339(user.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_normalized() {
        let req = RegisterRequest {
            username: "  BookWorm ".to_string(),
            email: " A@X.COM ".to_string(),
            password: "secret-password".to_string(),
        };

        let req = req.normalized();
        assert_eq!(req.username, "bookworm");
        assert_eq!(req.email, "a@x.com");
        assert_eq!(req.password, "secret-password");
    }

    #[test]
    fn test_user_response_excludes_sensitive_fields() {
        let user = User {
            id: ObjectId::new(),
            username: "reader".to_string(),
            email: "reader@example.com".to_string(),
            password_hash: "$argon2id$...".to_string(),
            refresh_token: Some("token".to_string()),
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        };

        let response = UserResponse::from(user);
        let json = serde_json::to_value(&response).unwrap();

        assert!(json.get("password_hash").is_none());
        assert!(json.get("refresh_token").is_none());
        assert_eq!(json["username"], "reader");
    }
}
