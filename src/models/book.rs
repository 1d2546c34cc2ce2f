//! Book domain models

use super::datetime_to_rfc3339;
use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Book document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub description: String,
    pub genre: String,
    pub author_id: ObjectId,
    /// Media-host URL of the cover image
    pub cover_image: String,
    /// Media-host URL of the book document
    pub file: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Metadata fields of a book-creation multipart request, collected into a
/// typed draft before validation
#[derive(Debug, Default, Validate)]
pub struct CreateBookDraft {
    #[validate(length(min = 1, max = 256, message = "is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 4096, message = "is required"))]
    pub description: String,
    #[validate(length(min = 1, max = 64, message = "is required"))]
    pub genre: String,
}

/// Metadata and passthrough-URL fields of a book-update request; file
/// parts are handled separately
#[derive(Debug, Default, Validate)]
pub struct UpdateBookDraft {
    #[validate(length(min = 1, max = 256, message = "must not be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 4096, message = "must not be empty"))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 64, message = "must not be empty"))]
    pub genre: Option<String>,
    #[validate(url(message = "must be a valid URL"))]
    pub cover_image_url: Option<String>,
    #[validate(url(message = "must be a valid URL"))]
    pub file_url: Option<String>,
}

/// Resolved field changes applied to a stored book; `None` leaves the
/// field untouched
#[derive(Debug, Default, Clone)]
pub struct BookPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub cover_image: Option<String>,
    pub file: Option<String>,
}

impl BookPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.genre.is_none()
            && self.cover_image.is_none()
            && self.file.is_none()
    }
}

/// Listing query parameters (skip/limit pass-through plus substring search)
#[derive(Debug, Default, Deserialize)]
pub struct BookListQuery {
    pub page: Option<u64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

impl BookListQuery {
    pub const DEFAULT_LIMIT: i64 = 10;
    pub const MAX_LIMIT: i64 = 100;

    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn skip(&self) -> u64 {
        self.page()
            .saturating_sub(1)
            .saturating_mul(self.limit() as u64)
    }
}

/// Book response
#[derive(Debug, Clone, Serialize)]
pub struct BookResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub genre: String,
    pub author_id: String,
    pub cover_image: String,
    pub file: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id.to_hex(),
            title: book.title,
            description: book.description,
            genre: book.genre,
            author_id: book.author_id.to_hex(),
            cover_image: book.cover_image,
            file: book.file,
            created_at: datetime_to_rfc3339(book.created_at),
            updated_at: datetime_to_rfc3339(book.updated_at),
        }
    }
}

/// Single book response with the author's public name resolved
#[derive(Debug, Serialize)]
pub struct BookDetailResponse {
    #[serde(flatten)]
    pub book: BookResponse,
    pub author_username: Option<String>,
}

/// Paginated listing response
#[derive(Debug, Serialize)]
pub struct PaginatedBooks {
    pub items: Vec<BookResponse>,
    pub total: u64,
    pub page: u64,
    pub limit: i64,
}

/// Total-count response
#[derive(Debug, Serialize)]
pub struct BookCountResponse {
    pub total: u64,
}
