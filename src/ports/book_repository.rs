use crate::domain::{
    book::{Book, BookDetails},
    value_objects::BookId,
};
use async_trait::async_trait;

use super::store_error::Result;

/// 書籍リポジトリポート
///
/// 書籍のCRUDのみを扱う。貸出の状態はLendingStore側の責務。
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// 全書籍をID順に取得する
    async fn list(&self) -> Result<Vec<Book>>;

    async fn find_by_id(&self, book_id: BookId) -> Result<Option<Book>>;

    /// 書籍を追加し、採番されたIDを含めて返す
    async fn insert(&self, details: BookDetails) -> Result<Book>;

    /// 書籍を更新する
    ///
    /// 対象が存在しなければ`false`を返す。
    async fn update(&self, book: &Book) -> Result<bool>;

    /// 書籍を削除する
    ///
    /// 対象が存在しなければ`false`。貸出記録から参照されている場合は
    /// `StoreError::ForeignKey`。
    async fn delete(&self, book_id: BookId) -> Result<bool>;
}
