use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// コマンド：書籍を貸し出す
///
/// IDは検証前の生の値のまま運ぶ。0以下の値はアプリケーション層で
/// InvalidArgumentとして拒否される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowBook {
    pub book_id: i64,
    pub patron_id: i64,
    pub requested_at: DateTime<Utc>,
}

/// コマンド：書籍を返却する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnBook {
    pub book_id: i64,
    pub patron_id: i64,
    pub requested_at: DateTime<Utc>,
}
