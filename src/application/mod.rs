pub mod accounts;
pub mod catalog;
pub mod lending;

use crate::ports::*;
use std::sync::Arc;

use self::accounts::TokenIssuer;

/// サービスの依存関係
///
/// 起動時に一度だけ組み立てられ、各サービス関数に引数として渡される。
/// 振る舞いは持たず、依存をすべて明示するためのデータ構造。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub lending_store: Arc<dyn LendingStore>,
    pub loan_queries: Arc<dyn LoanQueries>,
    pub book_repository: Arc<dyn BookRepository>,
    pub patron_repository: Arc<dyn PatronRepository>,
    pub account_repository: Arc<dyn AccountRepository>,
    pub token_issuer: Arc<TokenIssuer>,
}
