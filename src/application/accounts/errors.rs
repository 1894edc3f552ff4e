use crate::ports::StoreError;
use thiserror::Error;

/// 認証・アカウント管理のエラー
#[derive(Debug, Error)]
pub enum AccountError {
    /// emailまたはパスワードが正しくない（どちらかは区別しない）
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// トークンがない・不正・期限切れ
    #[error("{0}")]
    Unauthorized(String),

    /// ロールが不足している
    #[error("{0}")]
    Forbidden(String),

    #[error("Email is already registered")]
    EmailTaken,

    /// パスワードハッシュ・トークン生成の失敗
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Failed to access account storage")]
    PersistenceFailure(#[source] StoreError),
}

impl AccountError {
    pub fn code(&self) -> &'static str {
        match self {
            AccountError::InvalidCredentials => "INVALID_CREDENTIALS",
            AccountError::Unauthorized(_) => "UNAUTHORIZED",
            AccountError::Forbidden(_) => "FORBIDDEN",
            AccountError::EmailTaken => "EMAIL_TAKEN",
            AccountError::Internal(_) => "INTERNAL_ERROR",
            AccountError::PersistenceFailure(_) => "PERSISTENCE_FAILURE",
        }
    }
}

pub type Result<T> = std::result::Result<T, AccountError>;
