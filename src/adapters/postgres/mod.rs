pub mod accounts;
pub mod books;
pub mod lending;
pub mod loans;
pub mod patrons;

use crate::ports::{ForeignKeyTarget, StoreError};

// パブリックに型を再エクスポート
pub use accounts::AccountRepository as PostgresAccountRepository;
pub use books::BookRepository as PostgresBookRepository;
pub use lending::LendingStore as PostgresLendingStore;
pub use loans::LoanQueries as PostgresLoanQueries;
pub use patrons::PatronRepository as PostgresPatronRepository;

/// sqlxのエラーをStoreErrorに変換する
///
/// 一意制約違反はConflict、外部キー制約違反はForeignKeyとして扱い、
/// 呼び出し側でドメインのエラーに読み替えられるようにする。
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::Conflict(db_err.message().to_string());
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::ForeignKey {
                    target: foreign_key_target(db_err.constraint()),
                    detail: db_err.message().to_string(),
                };
            }
        }
        StoreError::backend(err)
    }
}

/// マイグレーションで名前を付けた外部キー制約から参照先を判別する
fn foreign_key_target(constraint: Option<&str>) -> Option<ForeignKeyTarget> {
    match constraint? {
        "borrows_book_fk" => Some(ForeignKeyTarget::Book),
        "borrows_patron_fk" => Some(ForeignKeyTarget::Patron),
        _ => None,
    }
}
