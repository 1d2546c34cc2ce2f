//! Database setup
//! MongoDB client construction, unique indexes and health checks

use crate::config::DatabaseConfig;
use crate::models::{book::Book, user::User};
use mongodb::{bson::doc, options::IndexOptions, Client, Database, IndexModel};
use secrecy::ExposeSecret;

pub const USERS_COLLECTION: &str = "users";
pub const BOOKS_COLLECTION: &str = "books";

/// Connect to MongoDB and select the configured database
pub async fn connect(config: &DatabaseConfig) -> Result<Database, DbError> {
    let uri = config.uri.expose_secret();

    tracing::debug!("Connecting to MongoDB...");

    let client = Client::with_uri_str(uri).await.map_err(|e| {
        tracing::error!("Failed to create MongoDB client: {}", e);
        DbError::ConnectionFailed(e.to_string())
    })?;

    let db = client.database(&config.name);

    // Fail fast if the server is unreachable
    db.run_command(doc! { "ping": 1 }).await.map_err(|e| {
        tracing::error!("MongoDB ping failed: {}", e);
        DbError::ConnectionFailed(e.to_string())
    })?;

    tracing::info!(database = %config.name, "MongoDB connection established");

    Ok(db)
}

/// Create the unique indexes the data model relies on
pub async fn ensure_indexes(db: &Database) -> Result<(), DbError> {
    let users = db.collection::<User>(USERS_COLLECTION);

    for field in ["username", "email"] {
        let index = IndexModel::builder()
            .keys(doc! { field: 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        users
            .create_index(index)
            .await
            .map_err(|e| DbError::IndexFailed(format!("users.{}: {}", field, e)))?;
    }

    let books = db.collection::<Book>(BOOKS_COLLECTION);
    let author_index = IndexModel::builder().keys(doc! { "author_id": 1 }).build();
    books
        .create_index(author_index)
        .await
        .map_err(|e| DbError::IndexFailed(format!("books.author_id: {}", e)))?;

    tracing::info!("Database indexes ensured");
    Ok(())
}

/// Database health check (readiness probe)
pub async fn health_check(db: &Database) -> HealthStatus {
    match db.run_command(doc! { "ping": 1 }).await {
        Ok(_) => {
            tracing::debug!("Database health check: OK");
            HealthStatus::Healthy
        }
        Err(e) => {
            tracing::warn!("Database health check failed: {}", e);
            HealthStatus::Unhealthy(e.to_string())
        }
    }
}

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Index creation failed: {0}")]
    IndexFailed(String),
}

/// Health status
#[derive(Debug, Clone)]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}
