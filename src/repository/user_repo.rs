//! MongoDB user store

use crate::{
    db::USERS_COLLECTION,
    error::AppError,
    models::user::User,
    repository::UserStore,
};
use async_trait::async_trait;
use mongodb::{
    bson::{doc, oid::ObjectId, DateTime},
    Collection, Database,
};

/// User store backed by the `users` collection
#[derive(Clone)]
pub struct MongoUserStore {
    collection: Collection<User>,
}

impl MongoUserStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(USERS_COLLECTION),
        }
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn insert(&self, user: &User) -> Result<(), AppError> {
        self.collection.insert_one(user).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>, AppError> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.collection.find_one(doc! { "email": email }).await?)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .collection
            .find_one(doc! { "username": username })
            .await?)
    }

    async fn set_refresh_token(
        &self,
        id: &ObjectId,
        token: Option<&str>,
    ) -> Result<(), AppError> {
        let update = match token {
            Some(token) => doc! {
                "$set": { "refresh_token": token, "updated_at": DateTime::now() },
            },
            None => doc! {
                "$unset": { "refresh_token": "" },
                "$set": { "updated_at": DateTime::now() },
            },
        };

        self.collection.update_one(doc! { "_id": id }, update).await?;
        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        id: &ObjectId,
        presented: &str,
        next: &str,
    ) -> Result<bool, AppError> {
        // Compare-and-swap: only succeeds while `presented` is still the
        // stored token, so a replayed token loses the race
        let result = self
            .collection
            .find_one_and_update(
                doc! { "_id": id, "refresh_token": presented },
                doc! { "$set": { "refresh_token": next, "updated_at": DateTime::now() } },
            )
            .await?;

        Ok(result.is_some())
    }
}
