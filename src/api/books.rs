use crate::application::{catalog, lending};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use std::sync::Arc;
use validator::Validate;

use super::{
    auth::AuthenticatedUser,
    error::ApiError,
    handlers::AppState,
    types::{BookRequest, BookResponse, LoanResponse},
};

/// GET /api/books - 全書籍を取得
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<BookResponse>>, ApiError> {
    let books = catalog::list_books(&state.service_deps).await?;
    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

/// GET /api/books/:id
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = catalog::get_book(&state.service_deps, id).await?;
    Ok(Json(BookResponse::from(book)))
}

/// POST /api/books - 書籍を登録
///
/// 検証エラーはすべてのメッセージをまとめて400で返す。
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    body: Result<Json<BookRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BookResponse>), ApiError> {
    let Json(req) = body?;
    req.validate()?;

    let book = catalog::create_book(&state.service_deps, req.into_details()).await?;
    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

/// PUT /api/books/:id - 書籍を更新（全属性の置き換え）
pub async fn update_book(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    body: Result<Json<BookRequest>, JsonRejection>,
) -> Result<Json<BookResponse>, ApiError> {
    let Json(req) = body?;
    req.validate()?;

    let book = catalog::update_book(&state.service_deps, id, req.into_details()).await?;
    Ok(Json(BookResponse::from(book)))
}

/// DELETE /api/books/:id - 書籍を削除（Adminのみ）
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    user.require_admin()?;

    catalog::delete_book(&state.service_deps, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/books/:id/loans - 書籍の貸出履歴（新しい順）
pub async fn list_book_loans(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<LoanResponse>>, ApiError> {
    let loans = lending::loan_history_for_book(&state.service_deps, id).await?;
    Ok(Json(loans.into_iter().map(LoanResponse::from).collect()))
}
