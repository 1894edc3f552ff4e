use crate::domain::InvalidId;
use crate::ports::StoreError;
use thiserror::Error;

/// 貸出・返却エンジンのエラー
///
/// すべて戻り値として返される。自動リトライは行わない。
#[derive(Debug, Error)]
pub enum LendingError {
    /// IDが正の整数でない
    #[error("{0}")]
    InvalidArgument(String),

    /// 書籍が存在しない
    #[error("Book not found")]
    BookNotFound,

    /// 利用者が存在しない
    #[error("Patron not found")]
    PatronNotFound,

    /// (書籍, 利用者)に貸出中の記録がない
    #[error("Borrowed book not found")]
    LoanNotFound,

    /// 書籍が既に貸出中
    #[error("Book is already borrowed")]
    BookAlreadyBorrowed,

    /// ストレージの読み書き・コミットの失敗
    #[error("Failed to persist lending changes")]
    PersistenceFailure(#[source] StoreError),
}

impl LendingError {
    /// HTTPステータスへのマッピングに使う分類コード
    pub fn code(&self) -> &'static str {
        match self {
            LendingError::InvalidArgument(_) => "INVALID_ARGUMENT",
            LendingError::BookNotFound => "BOOK_NOT_FOUND",
            LendingError::PatronNotFound => "PATRON_NOT_FOUND",
            LendingError::LoanNotFound => "LOAN_NOT_FOUND",
            LendingError::BookAlreadyBorrowed => "BOOK_ALREADY_BORROWED",
            LendingError::PersistenceFailure(_) => "PERSISTENCE_FAILURE",
        }
    }
}

impl From<InvalidId> for LendingError {
    fn from(err: InvalidId) -> Self {
        LendingError::InvalidArgument(err.to_string())
    }
}

/// 貸出管理アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LendingError>;
