use crate::domain::{
    loan::Loan,
    value_objects::{BookId, PatronId},
};
use crate::ports::{LoanQueries as LoanQueriesTrait, Result};
use async_trait::async_trait;
use sqlx::PgPool;

use super::lending::map_row_to_loan;

/// LoanQueriesのPostgreSQL実装
///
/// borrowsテーブルを直接読む読み取り専用ビュー。
pub struct LoanQueries {
    pool: PgPool,
}

impl LoanQueries {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanQueriesTrait for LoanQueries {
    async fn find_by_book_id(&self, book_id: BookId) -> Result<Vec<Loan>> {
        let rows = sqlx::query(
            r#"
            SELECT id, book_id, patron_id, borrowed_at, returned_at
            FROM borrows
            WHERE book_id = $1
            ORDER BY borrowed_at DESC, id DESC
            "#,
        )
        .bind(book_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_loan).collect()
    }

    async fn find_by_patron_id(&self, patron_id: PatronId) -> Result<Vec<Loan>> {
        let rows = sqlx::query(
            r#"
            SELECT id, book_id, patron_id, borrowed_at, returned_at
            FROM borrows
            WHERE patron_id = $1
            ORDER BY borrowed_at DESC, id DESC
            "#,
        )
        .bind(patron_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_loan).collect()
    }
}
