//! Route table

use crate::{
    auth::jwt_auth_middleware,
    handlers::{auth, book, health},
    middleware::{request_tracking_middleware, AppState},
};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/books", get(book::list_books))
        .route("/api/v1/books/count", get(book::count_books))
        .route("/api/v1/books/{id}", get(book::get_book));

    let protected = Router::new()
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/me", get(auth::me))
        .route("/api/v1/books", post(book::create_book))
        .route("/api/v1/books/mine", get(book::my_books))
        .route("/api/v1/books/{id}", patch(book::update_book))
        .route("/api/v1/books/{id}", delete(book::delete_book))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ));

    let max_body_bytes = state.config.uploads.max_body_bytes;
    let cors = cors_layer(state.config.cors.allow_origin.as_deref());

    public
        .merge(protected)
        .layer(middleware::from_fn(request_tracking_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}

/// CORS with credentials for the configured origin; no cross-origin access
/// when no origin is configured
fn cors_layer(allow_origin: Option<&str>) -> CorsLayer {
    let Some(origin) = allow_origin else {
        return CorsLayer::new();
    };

    match origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        Err(_) => {
            tracing::warn!(origin, "Ignoring unparseable CORS origin");
            CorsLayer::new()
        }
    }
}
