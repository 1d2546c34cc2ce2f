//! Shared test fixtures: configuration and in-memory store doubles
//! Not every test binary uses every fixture.
#![allow(dead_code)]

use async_trait::async_trait;
use elib_service::{
    config::{
        AppConfig, CorsConfig, DatabaseConfig, LoggingConfig, MediaConfig, SecurityConfig,
        ServerConfig, UploadsConfig,
    },
    error::AppError,
    models::book::{Book, BookListQuery, BookPatch},
    models::user::User,
    repository::{BookStore, UserStore},
    services::MediaStore,
};
use mongodb::bson::oid::ObjectId;
use secrecy::Secret;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

pub fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            addr: "127.0.0.1:0".to_string(),
            graceful_shutdown_timeout_secs: 5,
        },
        database: DatabaseConfig {
            uri: Secret::new("mongodb://localhost:27017".to_string()),
            name: "elib-test".to_string(),
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            access_token_secret: Secret::new(
                "integration_access_secret_32_chars_long!".to_string(),
            ),
            refresh_token_secret: Secret::new(
                "integration_refresh_secret_32_chars_long".to_string(),
            ),
            access_token_exp_secs: 900,
            refresh_token_exp_secs: 2_592_000,
            password_min_length: 8,
            cookie_secure: true,
        },
        media: MediaConfig {
            cloud_name: "test-cloud".to_string(),
            api_key: "key".to_string(),
            api_secret: Secret::new("media-secret".to_string()),
            base_url: "https://api.cloudinary.com/v1_1".to_string(),
            cover_folder: "book-covers".to_string(),
            file_folder: "book-pdfs".to_string(),
        },
        uploads: UploadsConfig {
            dir: std::env::temp_dir()
                .join("elib-test-uploads")
                .to_string_lossy()
                .to_string(),
            max_body_bytes: 10_000_000,
        },
        cors: CorsConfig { allow_origin: None },
    }
}

/// In-memory user store
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<ObjectId, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored_refresh_token(&self, id: &ObjectId) -> Option<String> {
        self.users
            .lock()
            .unwrap()
            .get(id)
            .and_then(|user| user.refresh_token.clone())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: &User) -> Result<(), AppError> {
        self.users.lock().unwrap().insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn set_refresh_token(
        &self,
        id: &ObjectId,
        token: Option<&str>,
    ) -> Result<(), AppError> {
        if let Some(user) = self.users.lock().unwrap().get_mut(id) {
            user.refresh_token = token.map(|t| t.to_string());
        }
        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        id: &ObjectId,
        presented: &str,
        next: &str,
    ) -> Result<bool, AppError> {
        let mut users = self.users.lock().unwrap();
        match users.get_mut(id) {
            Some(user) if user.refresh_token.as_deref() == Some(presented) => {
                user.refresh_token = Some(next.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// In-memory book store
#[derive(Default)]
pub struct InMemoryBookStore {
    books: Mutex<HashMap<ObjectId, Book>>,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn insert(&self, book: &Book) -> Result<(), AppError> {
        self.books.lock().unwrap().insert(book.id, book.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Book>, AppError> {
        Ok(self.books.lock().unwrap().get(id).cloned())
    }

    async fn list(&self, query: &BookListQuery) -> Result<(Vec<Book>, u64), AppError> {
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut matching: Vec<Book> = self
            .books
            .lock()
            .unwrap()
            .values()
            .filter(|book| match &search {
                Some(s) => {
                    book.title.to_lowercase().contains(s)
                        || book.genre.to_lowercase().contains(s)
                }
                None => true,
            })
            .cloned()
            .collect();

        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len() as u64;

        let page: Vec<Book> = matching
            .into_iter()
            .skip(query.skip() as usize)
            .take(query.limit() as usize)
            .collect();

        Ok((page, total))
    }

    async fn list_by_author(&self, author_id: &ObjectId) -> Result<Vec<Book>, AppError> {
        let mut books: Vec<Book> = self
            .books
            .lock()
            .unwrap()
            .values()
            .filter(|book| book.author_id == *author_id)
            .cloned()
            .collect();
        books.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(books)
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.books.lock().unwrap().len() as u64)
    }

    async fn update(&self, id: &ObjectId, patch: &BookPatch) -> Result<Option<Book>, AppError> {
        let mut books = self.books.lock().unwrap();
        let Some(book) = books.get_mut(id) else {
            return Ok(None);
        };

        if let Some(title) = &patch.title {
            book.title = title.clone();
        }
        if let Some(description) = &patch.description {
            book.description = description.clone();
        }
        if let Some(genre) = &patch.genre {
            book.genre = genre.clone();
        }
        if let Some(cover_image) = &patch.cover_image {
            book.cover_image = cover_image.clone();
        }
        if let Some(file) = &patch.file {
            book.file = file.clone();
        }
        book.updated_at = mongodb::bson::DateTime::now();

        Ok(Some(book.clone()))
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool, AppError> {
        Ok(self.books.lock().unwrap().remove(id).is_some())
    }
}

/// Media store double that hands out deterministic URLs and records
/// deletions; book-file uploads can be switched to fail
#[derive(Default)]
pub struct FakeMediaStore {
    pub uploaded: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
    pub fail_book_file_uploads: AtomicBool,
}

impl FakeMediaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MediaStore for FakeMediaStore {
    async fn upload_cover(&self, _path: &Path, filename: &str) -> Result<String, AppError> {
        let url = format!("https://media.test/image/upload/book-covers/{}", filename);
        self.uploaded.lock().unwrap().push(url.clone());
        Ok(url)
    }

    async fn upload_book_file(&self, _path: &Path, filename: &str) -> Result<String, AppError> {
        if self.fail_book_file_uploads.load(Ordering::SeqCst) {
            return Err(AppError::upstream("media host rejected the file"));
        }
        let url = format!("https://media.test/raw/upload/book-pdfs/{}", filename);
        self.uploaded.lock().unwrap().push(url.clone());
        Ok(url)
    }

    async fn delete_cover(&self, url: &str) -> Result<(), AppError> {
        self.deleted.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn delete_book_file(&self, url: &str) -> Result<(), AppError> {
        self.deleted.lock().unwrap().push(url.to_string());
        Ok(())
    }
}
