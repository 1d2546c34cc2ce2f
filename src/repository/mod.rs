//! Persistence layer
//!
//! Services talk to the [`UserStore`] and [`BookStore`] traits; the Mongo
//! implementations live in the sibling modules, and tests substitute
//! in-memory doubles.

pub mod book_repo;
pub mod user_repo;

pub use book_repo::MongoBookStore;
pub use user_repo::MongoUserStore;

use crate::{
    error::AppError,
    models::book::{Book, BookListQuery, BookPatch},
    models::user::User,
};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

/// User persistence operations
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: &User) -> Result<(), AppError>;
    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Overwrite the stored refresh token; `None` clears it
    async fn set_refresh_token(
        &self,
        id: &ObjectId,
        token: Option<&str>,
    ) -> Result<(), AppError>;

    /// Atomically swap `presented` for `next`; returns false when the
    /// stored token no longer matches `presented`
    async fn rotate_refresh_token(
        &self,
        id: &ObjectId,
        presented: &str,
        next: &str,
    ) -> Result<bool, AppError>;
}

/// Book persistence operations
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn insert(&self, book: &Book) -> Result<(), AppError>;
    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Book>, AppError>;

    /// Page of books matching the query, newest first, plus the matching total
    async fn list(&self, query: &BookListQuery) -> Result<(Vec<Book>, u64), AppError>;
    async fn list_by_author(&self, author_id: &ObjectId) -> Result<Vec<Book>, AppError>;
    async fn count(&self) -> Result<u64, AppError>;

    /// Apply a patch and return the updated document
    async fn update(&self, id: &ObjectId, patch: &BookPatch) -> Result<Option<Book>, AppError>;
    async fn delete(&self, id: &ObjectId) -> Result<bool, AppError>;
}
