use serde::{Deserialize, Serialize};

use super::BookId;

/// 書籍
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    #[serde(flatten)]
    pub details: BookDetails,
}

/// 書籍の属性（IDを除く）
///
/// 作成・更新の両方で使われる。IDはストレージが採番する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDetails {
    pub title: String,
    pub author: String,
    pub publication_year: i32,
    pub isbn: String,
}

impl std::ops::Deref for Book {
    type Target = BookDetails;

    fn deref(&self) -> &Self::Target {
        &self.details
    }
}
