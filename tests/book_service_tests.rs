//! Book catalog flows against in-memory stores

mod common;

use common::{FakeMediaStore, InMemoryBookStore, InMemoryUserStore};
use elib_service::{
    auth::AuthContext,
    error::AppError,
    models::book::{BookListQuery, CreateBookDraft, UpdateBookDraft},
    models::user::User,
    repository::UserStore,
    services::{BookService, StagedUpload},
};
use mongodb::bson::{oid::ObjectId, DateTime};
use std::sync::Arc;
use tempfile::TempDir;

struct Fixture {
    service: BookService,
    media: Arc<FakeMediaStore>,
    staging: TempDir,
    author: AuthContext,
}

async fn fixture() -> Fixture {
    let users = Arc::new(InMemoryUserStore::new());
    let books = Arc::new(InMemoryBookStore::new());
    let media = Arc::new(FakeMediaStore::new());

    let author_id = ObjectId::new();
    users
        .insert(&User {
            id: author_id,
            username: "author".to_string(),
            email: "author@example.com".to_string(),
            password_hash: "unused".to_string(),
            refresh_token: None,
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        })
        .await
        .unwrap();

    Fixture {
        service: BookService::new(books, users, media.clone()),
        media,
        staging: TempDir::new().unwrap(),
        author: AuthContext {
            user_id: author_id,
            username: "author".to_string(),
            email: "author@example.com".to_string(),
        },
    }
}

fn stage(dir: &TempDir, filename: &str, contents: &[u8]) -> StagedUpload {
    let path = dir.path().join(filename);
    std::fs::write(&path, contents).unwrap();
    StagedUpload {
        path,
        filename: filename.to_string(),
    }
}

fn draft(title: &str) -> CreateBookDraft {
    CreateBookDraft {
        title: title.to_string(),
        description: "A description".to_string(),
        genre: "fiction".to_string(),
    }
}

#[tokio::test]
async fn test_create_book_uploads_and_cleans_staging() {
    let fx = fixture().await;
    let cover = stage(&fx.staging, "cover.png", b"png-bytes");
    let file = stage(&fx.staging, "book.pdf", b"pdf-bytes");
    let cover_path = cover.path.clone();
    let file_path = file.path.clone();

    let book = fx
        .service
        .create(&fx.author, draft("Dune"), cover, file)
        .await
        .unwrap();

    assert_eq!(book.title, "Dune");
    assert_eq!(book.author_id, fx.author.user_id.to_hex());
    assert!(book.cover_image.contains("book-covers/cover.png"));
    assert!(book.file.contains("book-pdfs/book.pdf"));

    assert_eq!(fx.media.uploaded.lock().unwrap().len(), 2);
    // Staged files are unlinked after the upload
    assert!(!cover_path.exists());
    assert!(!file_path.exists());
}

#[tokio::test]
async fn test_create_removes_uploaded_cover_when_file_upload_fails() {
    let fx = fixture().await;
    fx.media
        .fail_book_file_uploads
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let cover = stage(&fx.staging, "cover.png", b"png");
    let file = stage(&fx.staging, "book.pdf", b"pdf");

    let err = fx
        .service
        .create(&fx.author, draft("Dune"), cover, file)
        .await
        .unwrap_err();
    assert_eq!(err.code(), 500);

    // The cover that made it to the media host is cleaned up again
    let uploaded = fx.media.uploaded.lock().unwrap().clone();
    assert_eq!(uploaded.len(), 1);
    assert_eq!(*fx.media.deleted.lock().unwrap(), uploaded);
}

#[tokio::test]
async fn test_create_book_rejects_empty_metadata() {
    let fx = fixture().await;
    let cover = stage(&fx.staging, "cover.png", b"png");
    let file = stage(&fx.staging, "book.pdf", b"pdf");

    let err = fx
        .service
        .create(&fx.author, CreateBookDraft::default(), cover, file)
        .await
        .unwrap_err();
    assert_eq!(err.code(), 400);
}

#[tokio::test]
async fn test_get_book_resolves_author_username() {
    let fx = fixture().await;
    let cover = stage(&fx.staging, "cover.png", b"png");
    let file = stage(&fx.staging, "book.pdf", b"pdf");
    let created = fx
        .service
        .create(&fx.author, draft("Dune"), cover, file)
        .await
        .unwrap();

    let detail = fx.service.get(&created.id).await.unwrap();
    assert_eq!(detail.book.id, created.id);
    assert_eq!(detail.author_username, Some("author".to_string()));
}

#[tokio::test]
async fn test_get_book_not_found_and_bad_id() {
    let fx = fixture().await;

    let err = fx.service.get(&ObjectId::new().to_hex()).await.unwrap_err();
    assert_eq!(err.code(), 404);
    assert_eq!(err.user_message(), "Book not found.");

    let err = fx.service.get("not-an-id").await.unwrap_err();
    assert_eq!(err.code(), 400);
}

#[tokio::test]
async fn test_update_book_metadata() {
    let fx = fixture().await;
    let cover = stage(&fx.staging, "cover.png", b"png");
    let file = stage(&fx.staging, "book.pdf", b"pdf");
    let created = fx
        .service
        .create(&fx.author, draft("Dune"), cover, file)
        .await
        .unwrap();

    let updated = fx
        .service
        .update(
            &fx.author,
            &created.id,
            UpdateBookDraft {
                title: Some("Dune Messiah".to_string()),
                ..Default::default()
            },
            None,
            None,
        )
        .await
        .unwrap();

    assert_eq!(updated.title, "Dune Messiah");
    assert_eq!(updated.genre, "fiction");
    assert_eq!(updated.cover_image, created.cover_image);
}

#[tokio::test]
async fn test_update_replaces_cover_and_deletes_old_asset() {
    let fx = fixture().await;
    let cover = stage(&fx.staging, "old-cover.png", b"png");
    let file = stage(&fx.staging, "book.pdf", b"pdf");
    let created = fx
        .service
        .create(&fx.author, draft("Dune"), cover, file)
        .await
        .unwrap();

    let new_cover = stage(&fx.staging, "new-cover.png", b"png2");
    let updated = fx
        .service
        .update(
            &fx.author,
            &created.id,
            UpdateBookDraft::default(),
            Some(new_cover),
            None,
        )
        .await
        .unwrap();

    assert!(updated.cover_image.contains("new-cover.png"));
    assert!(fx
        .media
        .deleted
        .lock()
        .unwrap()
        .contains(&created.cover_image));
}

#[tokio::test]
async fn test_update_by_non_owner_forbidden() {
    let fx = fixture().await;
    let cover = stage(&fx.staging, "cover.png", b"png");
    let file = stage(&fx.staging, "book.pdf", b"pdf");
    let created = fx
        .service
        .create(&fx.author, draft("Dune"), cover, file)
        .await
        .unwrap();

    let stranger = AuthContext {
        user_id: ObjectId::new(),
        username: "stranger".to_string(),
        email: "stranger@example.com".to_string(),
    };

    let err = fx
        .service
        .update(
            &stranger,
            &created.id,
            UpdateBookDraft {
                title: Some("Hijacked".to_string()),
                ..Default::default()
            },
            None,
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), 403);
    assert_eq!(err.user_message(), "You can not update others book.");

    let err = fx.service.delete(&stranger, &created.id).await.unwrap_err();
    assert_eq!(err.code(), 403);
    assert_eq!(err.user_message(), "You can not delete others book.");
}

#[tokio::test]
async fn test_delete_book_removes_media_assets() {
    let fx = fixture().await;
    let cover = stage(&fx.staging, "cover.png", b"png");
    let file = stage(&fx.staging, "book.pdf", b"pdf");
    let created = fx
        .service
        .create(&fx.author, draft("Dune"), cover, file)
        .await
        .unwrap();

    fx.service.delete(&fx.author, &created.id).await.unwrap();

    let deleted = fx.media.deleted.lock().unwrap();
    assert!(deleted.contains(&created.cover_image));
    assert!(deleted.contains(&created.file));
    drop(deleted);

    let err = fx.service.get(&created.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_list_pagination_and_search() {
    let fx = fixture().await;

    for title in ["Dune", "Dune Messiah", "Neuromancer"] {
        let cover = stage(&fx.staging, &format!("{}.png", title), b"png");
        let file = stage(&fx.staging, &format!("{}.pdf", title), b"pdf");
        fx.service
            .create(&fx.author, draft(title), cover, file)
            .await
            .unwrap();
    }

    let all = fx.service.list(BookListQuery::default()).await.unwrap();
    assert_eq!(all.total, 3);
    assert_eq!(all.items.len(), 3);
    assert_eq!(all.page, 1);

    let page = fx
        .service
        .list(BookListQuery {
            page: Some(2),
            limit: Some(2),
            search: None,
        })
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 1);

    let search = fx
        .service
        .list(BookListQuery {
            search: Some("dune".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(search.total, 2);

    let count = fx.service.count().await.unwrap();
    assert_eq!(count.total, 3);
}

#[tokio::test]
async fn test_list_mine_filters_by_author() {
    let fx = fixture().await;
    let cover = stage(&fx.staging, "cover.png", b"png");
    let file = stage(&fx.staging, "book.pdf", b"pdf");
    fx.service
        .create(&fx.author, draft("Dune"), cover, file)
        .await
        .unwrap();

    let mine = fx.service.list_mine(&fx.author.user_id).await.unwrap();
    assert_eq!(mine.len(), 1);

    let none = fx.service.list_mine(&ObjectId::new()).await.unwrap();
    assert!(none.is_empty());
}
