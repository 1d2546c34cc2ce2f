//! MongoDB book store

use crate::{
    db::BOOKS_COLLECTION,
    error::AppError,
    models::book::{Book, BookListQuery, BookPatch},
    repository::BookStore,
};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Bson, DateTime, Document},
    Collection, Database,
};

/// Book store backed by the `books` collection
#[derive(Clone)]
pub struct MongoBookStore {
    collection: Collection<Book>,
}

impl MongoBookStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(BOOKS_COLLECTION),
        }
    }

    fn list_filter(query: &BookListQuery) -> Document {
        match query.search.as_deref().map(str::trim) {
            Some(search) if !search.is_empty() => {
                let pattern = regex_escape(search);
                doc! {
                    "$or": [
                        { "title": { "$regex": &pattern, "$options": "i" } },
                        { "genre": { "$regex": &pattern, "$options": "i" } },
                    ]
                }
            }
            _ => doc! {},
        }
    }
}

/// Escape regex metacharacters so user input only ever matches literally
fn regex_escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if "\\.+*?()|[]{}^$".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl BookStore for MongoBookStore {
    async fn insert(&self, book: &Book) -> Result<(), AppError> {
        self.collection.insert_one(book).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Book>, AppError> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn list(&self, query: &BookListQuery) -> Result<(Vec<Book>, u64), AppError> {
        let filter = Self::list_filter(query);
        let total = self.collection.count_documents(filter.clone()).await?;

        let books = self
            .collection
            .find(filter)
            .sort(doc! { "created_at": -1 })
            .skip(query.skip())
            .limit(query.limit())
            .await?
            .try_collect()
            .await?;

        Ok((books, total))
    }

    async fn list_by_author(&self, author_id: &ObjectId) -> Result<Vec<Book>, AppError> {
        Ok(self
            .collection
            .find(doc! { "author_id": author_id })
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?)
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    async fn update(&self, id: &ObjectId, patch: &BookPatch) -> Result<Option<Book>, AppError> {
        let mut set = doc! { "updated_at": DateTime::now() };
        if let Some(title) = &patch.title {
            set.insert("title", Bson::String(title.clone()));
        }
        if let Some(description) = &patch.description {
            set.insert("description", Bson::String(description.clone()));
        }
        if let Some(genre) = &patch.genre {
            set.insert("genre", Bson::String(genre.clone()));
        }
        if let Some(cover_image) = &patch.cover_image {
            set.insert("cover_image", Bson::String(cover_image.clone()));
        }
        if let Some(file) = &patch.file {
            set.insert("file", Bson::String(file.clone()));
        }

        Ok(self
            .collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(mongodb::options::ReturnDocument::After)
            .await?)
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool, AppError> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}
