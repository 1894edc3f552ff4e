use crate::domain::{
    book::Book,
    loan::{Loan, NewLoan},
    patron::Patron,
    value_objects::{BookId, PatronId},
};
use async_trait::async_trait;

use super::store_error::Result;

/// 貸出・返却エンジンが使うストレージゲートウェイ
///
/// 1回の貸出・返却リクエストにつき1つのセッション（トランザクション）を開く。
#[async_trait]
pub trait LendingStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn LendingSession>>;
}

/// 1トランザクション分のゲートウェイ
///
/// `commit`せずにdropされたセッションの変更は破棄される。
#[async_trait]
pub trait LendingSession: Send {
    async fn find_book_by_id(&mut self, book_id: BookId) -> Result<Option<Book>>;

    async fn find_patron_by_id(&mut self, patron_id: PatronId) -> Result<Option<Patron>>;

    /// (書籍, 利用者)の貸出中の記録を取得する
    ///
    /// 複数ある場合は`domain::loan::select_outstanding`と同じ規則で1件に絞る。
    async fn find_outstanding_loan(
        &mut self,
        book_id: BookId,
        patron_id: PatronId,
    ) -> Result<Option<Loan>>;

    /// 書籍の貸出中の記録を利用者を問わず取得する
    async fn find_outstanding_loan_for_book(&mut self, book_id: BookId) -> Result<Option<Loan>>;

    /// 貸出記録を追加し、採番されたIDを含めて返す
    ///
    /// 書籍に貸出中の記録が既にある場合は`StoreError::Conflict`
    /// （この時点またはcommit時）。書籍か利用者がコミットまでに削除された場合は
    /// `StoreError::ForeignKey`。
    async fn add_loan(&mut self, loan: NewLoan) -> Result<Loan>;

    /// 貸出記録を更新する
    ///
    /// 対象が既に返却済みになっていた場合は`StoreError::Conflict`。
    async fn update_loan(&mut self, loan: &Loan) -> Result<()>;

    /// 変更を確定し、影響を受けた行数を返す
    async fn commit(self: Box<Self>) -> Result<u64>;
}
