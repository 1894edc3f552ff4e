use crate::application::accounts::{self, RegisterAccount};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

use super::{
    auth::AuthenticatedUser,
    error::ApiError,
    handlers::AppState,
    types::{AccountResponse, LoginRequest, RegisterRequest, TokenResponse},
};

/// POST /api/accounts/register - アカウントを登録
///
/// 認証は任意。Adminロールでの登録にはAdminのトークンが必要。
pub async fn register(
    State(state): State<Arc<AppState>>,
    caller: Option<AuthenticatedUser>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let Json(req) = body?;
    req.validate()?;

    let cmd = RegisterAccount {
        email: req.email,
        password: req.password,
        role: req.role,
    };

    let caller = caller.map(|AuthenticatedUser(claims)| claims);
    let account = accounts::register(&state.service_deps, cmd, caller.as_ref(), Utc::now()).await?;

    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

/// POST /api/accounts/login - ログインしてJWTを取得
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(req) = body?;
    req.validate()?;

    let issued = accounts::login(&state.service_deps, &req.email, &req.password, Utc::now()).await?;

    Ok(Json(TokenResponse::from(issued)))
}
