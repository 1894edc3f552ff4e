use thiserror::Error;

/// 外部キー違反で参照先として見つからなかったエンティティ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignKeyTarget {
    Book,
    Patron,
}

/// ストレージゲートウェイ共通のエラー
///
/// Conflictは一意制約違反と条件付き更新の空振り、ForeignKeyは外部キー制約違反を表し、
/// 呼び出し側がドメインのエラーに読み替える。それ以外はBackendとして運ぶ。
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage conflict: {0}")]
    Conflict(String),

    /// 参照先が存在しない、または参照されている行を削除しようとした
    ///
    /// `target`は違反した制約から参照先が判別できた場合のみ設定される。
    #[error("Foreign key violation: {detail}")]
    ForeignKey {
        target: Option<ForeignKeyTarget>,
        detail: String,
    },

    #[error("Storage backend error")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn backend(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        StoreError::Backend(err.into())
    }

    pub fn foreign_key(target: ForeignKeyTarget, detail: impl Into<String>) -> Self {
        StoreError::ForeignKey {
            target: Some(target),
            detail: detail.into(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }

    pub fn is_foreign_key(&self) -> bool {
        matches!(self, StoreError::ForeignKey { .. })
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
