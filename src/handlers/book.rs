//! Book catalog endpoints
//!
//! Create and update accept multipart forms: text metadata fields plus a
//! `coverImage` image part and a `file` document part. File parts are
//! staged under the uploads directory before being pushed to the media
//! host.

use crate::{
    auth::AuthContext,
    error::AppError,
    middleware::AppState,
    models::book::{
        BookCountResponse, BookDetailResponse, BookListQuery, BookResponse, CreateBookDraft,
        PaginatedBooks, UpdateBookDraft,
    },
    services::StagedUpload,
};
use axum::{
    extract::{Json, Multipart, Path, Query, State},
    http::StatusCode,
};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// Fields collected from a book multipart form
#[derive(Default)]
struct BookForm {
    title: Option<String>,
    description: Option<String>,
    genre: Option<String>,
    cover_image_url: Option<String>,
    file_url: Option<String>,
    cover: Option<StagedUpload>,
    file: Option<StagedUpload>,
}

impl BookForm {
    /// Remove any staged files; used on paths that bail before the
    /// service takes ownership
    async fn discard(self) {
        if let Some(cover) = self.cover {
            cover.cleanup().await;
        }
        if let Some(file) = self.file {
            file.cleanup().await;
        }
    }
}

/// Strip any path components a client smuggles into a filename
fn sanitize_filename(filename: &str) -> String {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim();
    if name.is_empty() {
        "upload".to_string()
    } else {
        name.to_string()
    }
}

async fn stage_field(
    uploads_dir: &str,
    field: axum::extract::multipart::Field<'_>,
) -> Result<StagedUpload, AppError> {
    let filename = sanitize_filename(field.file_name().unwrap_or("upload"));
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?;

    tokio::fs::create_dir_all(uploads_dir).await.map_err(|e| {
        tracing::error!(dir = uploads_dir, "Failed to create uploads dir: {}", e);
        AppError::Internal("Failed to stage upload".to_string())
    })?;

    let path = PathBuf::from(uploads_dir).join(format!("{}-{}", Uuid::new_v4(), filename));
    tokio::fs::write(&path, &bytes).await.map_err(|e| {
        tracing::error!(path = %path.display(), "Failed to stage upload: {}", e);
        AppError::Internal("Failed to stage upload".to_string())
    })?;

    Ok(StagedUpload { path, filename })
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))
}

async fn collect_form(
    uploads_dir: &str,
    mut multipart: Multipart,
) -> Result<BookForm, AppError> {
    let mut form = BookForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let Some(name) = field.name().map(|n| n.to_string()) else {
            continue;
        };

        match name.as_str() {
            "title" => form.title = Some(read_text(field).await?),
            "description" => form.description = Some(read_text(field).await?),
            "genre" => form.genre = Some(read_text(field).await?),
            "coverImageUrl" => form.cover_image_url = Some(read_text(field).await?),
            "fileUrl" => form.file_url = Some(read_text(field).await?),
            "coverImage" => {
                if let Some(old) = form.cover.replace(stage_field(uploads_dir, field).await?) {
                    old.cleanup().await;
                }
            }
            "file" => {
                if let Some(old) = form.file.replace(stage_field(uploads_dir, field).await?) {
                    old.cleanup().await;
                }
            }
            other => tracing::debug!(field = other, "Ignoring unknown multipart field"),
        }
    }

    Ok(form)
}

/// POST /api/v1/books
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    multipart: Multipart,
) -> Result<(StatusCode, Json<BookResponse>), AppError> {
    let mut form = collect_form(&state.config.uploads.dir, multipart).await?;

    let Some(cover) = form.cover.take() else {
        form.discard().await;
        return Err(AppError::BadRequest(
            "Cover image file is required.".to_string(),
        ));
    };
    let Some(file) = form.file.take() else {
        form.discard().await;
        cover.cleanup().await;
        return Err(AppError::BadRequest("Book file is required.".to_string()));
    };

    let draft = CreateBookDraft {
        title: form.title.unwrap_or_default(),
        description: form.description.unwrap_or_default(),
        genre: form.genre.unwrap_or_default(),
    };

    let book = state.books.create(&auth, draft, cover, file).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// PATCH /api/v1/books/{id}
pub async fn update_book(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<BookResponse>, AppError> {
    let mut form = collect_form(&state.config.uploads.dir, multipart).await?;

    let draft = UpdateBookDraft {
        title: form.title.take(),
        description: form.description.take(),
        genre: form.genre.take(),
        cover_image_url: form.cover_image_url.take(),
        file_url: form.file_url.take(),
    };

    let book = state
        .books
        .update(&auth, &id, draft, form.cover.take(), form.file.take())
        .await?;
    Ok(Json(book))
}

/// DELETE /api/v1/books/{id}
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.books.delete(&auth, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/books
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookListQuery>,
) -> Result<Json<PaginatedBooks>, AppError> {
    Ok(Json(state.books.list(query).await?))
}

/// GET /api/v1/books/count
pub async fn count_books(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BookCountResponse>, AppError> {
    Ok(Json(state.books.count().await?))
}

/// GET /api/v1/books/mine
pub async fn my_books(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
) -> Result<Json<Vec<BookResponse>>, AppError> {
    Ok(Json(state.books.list_mine(&auth.user_id).await?))
}

/// GET /api/v1/books/{id}
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BookDetailResponse>, AppError> {
    Ok(Json(state.books.get(&id).await?))
}
