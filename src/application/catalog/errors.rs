use crate::domain::InvalidId;
use crate::ports::StoreError;
use thiserror::Error;

/// 書籍・利用者管理のエラー
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("Book Not Found")]
    BookNotFound,

    #[error("Patron Not Found")]
    PatronNotFound,

    /// 貸出記録から参照されているため削除できない
    #[error("{0}")]
    InUse(String),

    #[error("Failed to access catalog storage")]
    PersistenceFailure(#[source] StoreError),
}

impl CatalogError {
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::InvalidArgument(_) => "INVALID_ARGUMENT",
            CatalogError::BookNotFound => "BOOK_NOT_FOUND",
            CatalogError::PatronNotFound => "PATRON_NOT_FOUND",
            CatalogError::InUse(_) => "IN_USE",
            CatalogError::PersistenceFailure(_) => "PERSISTENCE_FAILURE",
        }
    }
}

impl From<InvalidId> for CatalogError {
    fn from(err: InvalidId) -> Self {
        CatalogError::InvalidArgument(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
