//! Book catalog management
//!
//! Create/update flows stage uploaded files on disk, push them to the
//! media host, and only then touch the catalog; staged files are removed
//! in every path.

use crate::{
    auth::AuthContext,
    error::AppError,
    models::book::{
        Book, BookCountResponse, BookDetailResponse, BookListQuery, BookPatch, BookResponse,
        CreateBookDraft, PaginatedBooks, UpdateBookDraft,
    },
    repository::{BookStore, UserStore},
    services::media_service::{MediaStore, StagedUpload},
};
use mongodb::bson::{oid::ObjectId, DateTime};
use std::sync::Arc;
use validator::Validate;

/// Book service
pub struct BookService {
    books: Arc<dyn BookStore>,
    users: Arc<dyn UserStore>,
    media: Arc<dyn MediaStore>,
}

impl BookService {
    pub fn new(
        books: Arc<dyn BookStore>,
        users: Arc<dyn UserStore>,
        media: Arc<dyn MediaStore>,
    ) -> Self {
        Self {
            books,
            users,
            media,
        }
    }

    /// Create a book from validated metadata and two staged uploads
    pub async fn create(
        &self,
        author: &AuthContext,
        draft: CreateBookDraft,
        cover: StagedUpload,
        file: StagedUpload,
    ) -> Result<BookResponse, AppError> {
        let result = self.create_inner(author, draft, &cover, &file).await;
        cover.cleanup().await;
        file.cleanup().await;
        result
    }

    async fn create_inner(
        &self,
        author: &AuthContext,
        draft: CreateBookDraft,
        cover: &StagedUpload,
        file: &StagedUpload,
    ) -> Result<BookResponse, AppError> {
        draft.validate()?;

        let cover_url = self.media.upload_cover(&cover.path, &cover.filename).await?;
        let file_url = match self.media.upload_book_file(&file.path, &file.filename).await {
            Ok(url) => url,
            Err(e) => {
                // The cover already landed on the media host; remove it so
                // the failed create leaves no orphaned asset
                if let Err(del) = self.media.delete_cover(&cover_url).await {
                    tracing::warn!("Failed to remove orphaned cover asset: {}", del);
                }
                return Err(e);
            }
        };

        let now = DateTime::now();
        let book = Book {
            id: ObjectId::new(),
            title: draft.title,
            description: draft.description,
            genre: draft.genre,
            author_id: author.user_id,
            cover_image: cover_url,
            file: file_url,
            created_at: now,
            updated_at: now,
        };

        self.books.insert(&book).await?;
        tracing::info!(book_id = %book.id, author_id = %author.user_id, "Book created");

        Ok(BookResponse::from(book))
    }

    /// Paginated catalog listing
    pub async fn list(&self, query: BookListQuery) -> Result<PaginatedBooks, AppError> {
        let (page, limit) = (query.page(), query.limit());
        let (books, total) = self.books.list(&query).await?;

        Ok(PaginatedBooks {
            items: books.into_iter().map(BookResponse::from).collect(),
            total,
            page,
            limit,
        })
    }

    pub async fn count(&self) -> Result<BookCountResponse, AppError> {
        Ok(BookCountResponse {
            total: self.books.count().await?,
        })
    }

    /// Books owned by the caller
    pub async fn list_mine(&self, author_id: &ObjectId) -> Result<Vec<BookResponse>, AppError> {
        let books = self.books.list_by_author(author_id).await?;
        Ok(books.into_iter().map(BookResponse::from).collect())
    }

    /// Single book with the author's public name resolved
    pub async fn get(&self, id: &str) -> Result<BookDetailResponse, AppError> {
        let book = self.find_book(id).await?;
        let author_username = self
            .users
            .find_by_id(&book.author_id)
            .await?
            .map(|user| user.username);

        Ok(BookDetailResponse {
            book: BookResponse::from(book),
            author_username,
        })
    }

    /// Update an owned book, replacing media assets when new files arrive
    pub async fn update(
        &self,
        caller: &AuthContext,
        id: &str,
        draft: UpdateBookDraft,
        cover: Option<StagedUpload>,
        file: Option<StagedUpload>,
    ) -> Result<BookResponse, AppError> {
        let result = self
            .update_inner(caller, id, draft, cover.as_ref(), file.as_ref())
            .await;
        if let Some(cover) = cover {
            cover.cleanup().await;
        }
        if let Some(file) = file {
            file.cleanup().await;
        }
        result
    }

    async fn update_inner(
        &self,
        caller: &AuthContext,
        id: &str,
        draft: UpdateBookDraft,
        cover: Option<&StagedUpload>,
        file: Option<&StagedUpload>,
    ) -> Result<BookResponse, AppError> {
        draft.validate()?;
        let book = self.find_book(id).await?;

        if book.author_id != caller.user_id {
            return Err(AppError::forbidden("You can not update others book."));
        }

        let mut patch = BookPatch {
            title: draft.title,
            description: draft.description,
            genre: draft.genre,
            cover_image: draft.cover_image_url,
            file: draft.file_url,
        };

        // Fresh uploads win over passthrough URLs; the replaced asset is
        // removed from the media host afterwards, best effort
        if let Some(cover) = cover {
            patch.cover_image =
                Some(self.media.upload_cover(&cover.path, &cover.filename).await?);
        }
        if let Some(file) = file {
            patch.file = Some(
                self.media
                    .upload_book_file(&file.path, &file.filename)
                    .await?,
            );
        }

        let updated = self
            .books
            .update(&book.id, &patch)
            .await?
            .ok_or_else(|| AppError::not_found("Book not found."))?;

        if cover.is_some() {
            if let Err(e) = self.media.delete_cover(&book.cover_image).await {
                tracing::warn!(book_id = %book.id, "Failed to delete replaced cover: {}", e);
            }
        }
        if file.is_some() {
            if let Err(e) = self.media.delete_book_file(&book.file).await {
                tracing::warn!(book_id = %book.id, "Failed to delete replaced file: {}", e);
            }
        }

        tracing::info!(book_id = %book.id, "Book updated");
        Ok(BookResponse::from(updated))
    }

    /// Delete an owned book and its media assets
    pub async fn delete(&self, caller: &AuthContext, id: &str) -> Result<(), AppError> {
        let book = self.find_book(id).await?;

        if book.author_id != caller.user_id {
            return Err(AppError::forbidden("You can not delete others book."));
        }

        if let Err(e) = self.media.delete_cover(&book.cover_image).await {
            tracing::warn!(book_id = %book.id, "Failed to delete cover asset: {}", e);
        }
        if let Err(e) = self.media.delete_book_file(&book.file).await {
            tracing::warn!(book_id = %book.id, "Failed to delete file asset: {}", e);
        }

        self.books.delete(&book.id).await?;
        tracing::info!(book_id = %book.id, "Book deleted");
        Ok(())
    }

    async fn find_book(&self, id: &str) -> Result<Book, AppError> {
        let id = ObjectId::parse_str(id)
            .map_err(|_| AppError::BadRequest("Invalid book id".to_string()))?;
        self.books
            .find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::not_found("Book not found."))
    }
}
