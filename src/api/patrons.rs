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
    types::{LoanResponse, PatronRequest, PatronResponse},
};

/// GET /api/patrons - 全利用者を取得
pub async fn list_patrons(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<PatronResponse>>, ApiError> {
    let patrons = catalog::list_patrons(&state.service_deps).await?;
    Ok(Json(patrons.into_iter().map(PatronResponse::from).collect()))
}

pub async fn get_patron(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<PatronResponse>, ApiError> {
    let patron = catalog::get_patron(&state.service_deps, id).await?;
    Ok(Json(PatronResponse::from(patron)))
}

/// POST /api/patrons - 利用者を登録
pub async fn create_patron(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    body: Result<Json<PatronRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PatronResponse>), ApiError> {
    let Json(req) = body?;
    req.validate()?;

    let patron = catalog::create_patron(&state.service_deps, req.into_details()).await?;
    Ok((StatusCode::CREATED, Json(PatronResponse::from(patron))))
}

/// PUT /api/patrons/:id - 利用者を更新（全属性の置き換え）
pub async fn update_patron(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    body: Result<Json<PatronRequest>, JsonRejection>,
) -> Result<Json<PatronResponse>, ApiError> {
    let Json(req) = body?;
    req.validate()?;

    let patron = catalog::update_patron(&state.service_deps, id, req.into_details()).await?;
    Ok(Json(PatronResponse::from(patron)))
}

/// DELETE /api/patrons/:id - 利用者を削除（Adminのみ）
pub async fn delete_patron(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    user.require_admin()?;

    catalog::delete_patron(&state.service_deps, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/patrons/:id/loans - 利用者の貸出履歴（新しい順）
pub async fn list_patron_loans(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<LoanResponse>>, ApiError> {
    let loans = lending::loan_history_for_patron(&state.service_deps, id).await?;
    Ok(Json(loans.into_iter().map(LoanResponse::from).collect()))
}
