use crate::domain::account::Account;
use async_trait::async_trait;

use super::store_error::Result;

/// アカウントリポジトリポート
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// emailは大文字小文字を区別せずに照合する
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// emailが既に使われている場合は`StoreError::Conflict`
    async fn insert(&self, account: &Account) -> Result<()>;
}
