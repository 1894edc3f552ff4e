use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{accounts, books, handlers, handlers::AppState, patrons};

/// Creates the API router with all library endpoints
///
/// Accounts (no token required):
/// - POST /api/accounts/register
/// - POST /api/accounts/login
///
/// Catalog (bearer token required, DELETE requires Admin):
/// - /api/books, /api/books/:id, /api/books/:id/loans
/// - /api/patrons, /api/patrons/:id, /api/patrons/:id/loans
///
/// Lending (bearer token required):
/// - POST /api/borrow/:book_id/patron/:patron_id
/// - PUT /api/return/:book_id/patron/:patron_id
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Accounts
        .route("/api/accounts/register", post(accounts::register))
        .route("/api/accounts/login", post(accounts::login))
        // Books
        .route("/api/books", get(books::list_books).post(books::create_book))
        .route(
            "/api/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        .route("/api/books/:id/loans", get(books::list_book_loans))
        // Patrons
        .route(
            "/api/patrons",
            get(patrons::list_patrons).post(patrons::create_patron),
        )
        .route(
            "/api/patrons/:id",
            get(patrons::get_patron)
                .put(patrons::update_patron)
                .delete(patrons::delete_patron),
        )
        .route("/api/patrons/:id/loans", get(patrons::list_patron_loans))
        // Lending
        .route(
            "/api/borrow/:book_id/patron/:patron_id",
            post(handlers::borrow_book),
        )
        .route(
            "/api/return/:book_id/patron/:patron_id",
            put(handlers::return_book),
        )
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
