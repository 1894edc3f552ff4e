use crate::domain::{
    patron::{Patron, PatronDetails},
    value_objects::PatronId,
};
use async_trait::async_trait;

use super::store_error::Result;

/// 利用者リポジトリポート
#[async_trait]
pub trait PatronRepository: Send + Sync {
    /// 全利用者をID順に取得する
    async fn list(&self) -> Result<Vec<Patron>>;

    async fn find_by_id(&self, patron_id: PatronId) -> Result<Option<Patron>>;

    async fn insert(&self, details: PatronDetails) -> Result<Patron>;

    /// 対象が存在しなければ`false`を返す。
    async fn update(&self, patron: &Patron) -> Result<bool>;

    /// 対象が存在しなければ`false`。貸出記録から参照されている場合は
    /// `StoreError::ForeignKey`。
    async fn delete(&self, patron_id: PatronId) -> Result<bool>;
}
