use crate::domain::{
    loan::Loan,
    value_objects::{BookId, PatronId},
};
use async_trait::async_trait;

use super::store_error::Result;

/// 貸出履歴の読み取りポート
///
/// 書籍・利用者が持つ貸出記録の一覧（読み取り専用ビュー）。
#[async_trait]
pub trait LoanQueries: Send + Sync {
    /// 書籍の貸出履歴を新しい順に取得する
    async fn find_by_book_id(&self, book_id: BookId) -> Result<Vec<Loan>>;

    /// 利用者の貸出履歴を新しい順に取得する
    async fn find_by_patron_id(&self, patron_id: PatronId) -> Result<Vec<Loan>>;
}
