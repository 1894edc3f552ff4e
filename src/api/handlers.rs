use crate::application::{
    ServiceDependencies,
    lending::{request_borrow, request_return},
};
use crate::domain::commands::{BorrowBook, ReturnBook};
use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use std::sync::Arc;

use super::{auth::AuthenticatedUser, error::ApiError, types::LendingResponse};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

// ============================================================================
// Lending handlers
// ============================================================================

/// POST /api/borrow/:book_id/patron/:patron_id - 書籍を貸し出す
///
/// 強制されるビジネスルール:
/// - 書籍ID・利用者IDが正の整数であること
/// - 書籍・利用者が存在すること
/// - 書籍が貸出中でないこと
pub async fn borrow_book(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((book_id, patron_id)): Path<(i64, i64)>,
) -> Result<Json<LendingResponse>, ApiError> {
    tracing::debug!(account = %claims.email, book_id, patron_id, "Borrow requested");

    let cmd = BorrowBook {
        book_id,
        patron_id,
        requested_at: Utc::now(),
    };

    let loan = request_borrow(&state.service_deps, cmd).await?;

    Ok(Json(LendingResponse::ok(loan)))
}

/// PUT /api/return/:book_id/patron/:patron_id - 書籍を返却する
///
/// (書籍, 利用者)の貸出中の記録のうち最新のものを返却済みにする。
/// 貸出中の記録がなければ404。
pub async fn return_book(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((book_id, patron_id)): Path<(i64, i64)>,
) -> Result<Json<LendingResponse>, ApiError> {
    tracing::debug!(account = %claims.email, book_id, patron_id, "Return requested");

    let cmd = ReturnBook {
        book_id,
        patron_id,
        requested_at: Utc::now(),
    };

    let loan = request_return(&state.service_deps, cmd).await?;

    Ok(Json(LendingResponse::ok(loan)))
}
