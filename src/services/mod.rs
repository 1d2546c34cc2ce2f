//! Business logic layer

pub mod auth_service;
pub mod book_service;
pub mod media_service;

pub use auth_service::AuthService;
pub use book_service::BookService;
pub use media_service::{CloudinaryMediaStore, MediaStore, StagedUpload};
