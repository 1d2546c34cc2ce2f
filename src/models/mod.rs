//! Domain models and request/response DTOs

pub mod auth;
pub mod book;
pub mod user;

use mongodb::bson::DateTime;

/// Render a BSON datetime as an RFC 3339 string for API responses
pub fn datetime_to_rfc3339(date: DateTime) -> String {
    date.try_to_rfc3339_string()
        .unwrap_or_else(|_| "Invalid Date".to_string())
}
