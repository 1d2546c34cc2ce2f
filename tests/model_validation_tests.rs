//! Request DTO validation and error envelope behavior

use elib_service::{
    error::AppError,
    models::auth::RefreshTokenRequest,
    models::user::{LoginRequest, RegisterRequest},
};
use validator::Validate;

#[test]
fn test_register_request_validation() {
    let valid = RegisterRequest {
        username: "bookworm".to_string(),
        email: "bookworm@example.com".to_string(),
        password: "long-enough".to_string(),
    };
    assert!(valid.validate().is_ok());

    let bad_email = RegisterRequest {
        email: "not-an-email".to_string(),
        ..valid_clone(&valid)
    };
    assert!(bad_email.validate().is_err());

    let short_username = RegisterRequest {
        username: "ab".to_string(),
        ..valid_clone(&valid)
    };
    assert!(short_username.validate().is_err());
}

fn valid_clone(req: &RegisterRequest) -> RegisterRequest {
    RegisterRequest {
        username: req.username.clone(),
        email: req.email.clone(),
        password: req.password.clone(),
    }
}

#[test]
fn test_login_request_validation() {
    let valid = LoginRequest {
        email: "bookworm@example.com".to_string(),
        password: "pw".to_string(),
    };
    assert!(valid.validate().is_ok());

    let empty_password = LoginRequest {
        email: "bookworm@example.com".to_string(),
        password: String::new(),
    };
    assert!(empty_password.validate().is_err());
}

#[test]
fn test_validation_errors_collapse_to_bad_request() {
    let request = RegisterRequest {
        username: "ab".to_string(),
        email: "nope".to_string(),
        password: String::new(),
    };

    let err: AppError = request.validate().unwrap_err().into();
    assert_eq!(err.code(), 400);

    let message = err.user_message();
    assert!(message.contains("email"));
    assert!(message.contains("username"));
}

#[test]
fn test_refresh_request_accepts_both_field_spellings() {
    let snake: RefreshTokenRequest =
        serde_json::from_value(serde_json::json!({ "refresh_token": "abc" })).unwrap();
    assert_eq!(snake.refresh_token.as_deref(), Some("abc"));

    let camel: RefreshTokenRequest =
        serde_json::from_value(serde_json::json!({ "refreshToken": "abc" })).unwrap();
    assert_eq!(camel.refresh_token.as_deref(), Some("abc"));

    let empty: RefreshTokenRequest = serde_json::from_value(serde_json::json!({})).unwrap();
    assert_eq!(empty.refresh_token, None);
}
