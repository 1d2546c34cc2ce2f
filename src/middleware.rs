//! HTTP middleware and shared application state

use crate::{
    auth::{JwtService, PasswordHasher},
    config::AppConfig,
    error::AppError,
    repository::{MongoBookStore, MongoUserStore, UserStore},
    services::{AuthService, BookService, CloudinaryMediaStore, MediaStore},
};
use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use mongodb::Database;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Shared application state
///
/// Services hold trait objects for their stores, so handlers stay testable
/// against in-memory doubles.
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Database,
    pub jwt: Arc<JwtService>,
    pub users: Arc<dyn UserStore>,
    pub auth: AuthService,
    pub books: BookService,
}

impl AppState {
    /// Wire services against the Mongo stores and the Cloudinary client
    pub fn new(config: Arc<AppConfig>, db: Database) -> Result<Self, AppError> {
        let jwt = Arc::new(JwtService::from_config(&config)?);
        let users: Arc<dyn UserStore> = Arc::new(MongoUserStore::new(&db));
        let books = Arc::new(MongoBookStore::new(&db));
        let media: Arc<dyn MediaStore> =
            Arc::new(CloudinaryMediaStore::new(config.media.clone()));

        let auth = AuthService::new(
            users.clone(),
            jwt.clone(),
            PasswordHasher::new(),
            config.security.password_min_length,
        );
        let book_service = BookService::new(books, users.clone(), media);

        Ok(Self {
            config,
            db,
            jwt,
            users,
            auth,
            books: book_service,
        })
    }
}

/// Per-request tracing and metrics
///
/// Assigns trace and request ids, runs the request inside a span carrying
/// them, and echoes both back as response headers.
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().to_string();
    let uri = req.uri().path().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    async move {
        let start = Instant::now();
        let mut response = next.run(req).await;
        let elapsed = start.elapsed();

        let status = response.status().as_u16();
        metrics::counter!(
            "http_requests_total",
            "method" => method.clone(),
            "status" => status.to_string()
        )
        .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            method = %method,
            uri = %uri,
            status = status,
            elapsed_ms = elapsed.as_millis(),
            "Request completed"
        );

        if let Ok(value) = trace_id.parse() {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = request_id.parse() {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

/// Honor an inbound trace id, generate one otherwise
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
