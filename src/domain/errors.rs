use thiserror::Error;

/// ID値オブジェクトの生成エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidId {
    /// 0以下の値
    #[error("{kind} id should be greater than 0 (got {value})")]
    NotPositive { kind: &'static str, value: i64 },

    /// i32に収まらない値
    #[error("{kind} id is out of range (got {value})")]
    OutOfRange { kind: &'static str, value: i64 },
}

/// 返却のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnLoanError {
    /// 既に返却済み
    AlreadyReturned,
}
