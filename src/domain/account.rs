use chrono::{DateTime, Utc};

use super::{AccountId, Role};

/// 認証用アカウント
///
/// emailがユーザー名を兼ねる。password_hashはargon2のPHC文字列。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub account_id: AccountId,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}
