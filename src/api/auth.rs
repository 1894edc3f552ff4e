use crate::application::accounts::{AccountError, Claims};
use crate::domain::Role;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;

use super::{error::ApiError, handlers::AppState};

/// JWTから取り出した認証済みユーザー
pub struct AuthenticatedUser(pub Claims);

impl AuthenticatedUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        self.0.require_role(Role::Admin).map_err(ApiError::from)
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                AccountError::Unauthorized("Missing authorization header".to_string())
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AccountError::Unauthorized("Invalid authorization header format".to_string())
        })?;

        let claims = state.service_deps.token_issuer.verify(token)?;

        Ok(AuthenticatedUser(claims))
    }
}
