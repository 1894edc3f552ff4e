use crate::domain::{
    book::Book,
    loan::{Loan, NewLoan},
    patron::Patron,
    value_objects::{BookId, LoanId, PatronId},
};
use crate::ports::{
    LendingSession, LendingStore as LendingStoreTrait, Result, StoreError,
};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use super::{books::map_row_to_book, patrons::map_row_to_patron};

/// PostgreSQLの行データをLoanに変換する
pub(crate) fn map_row_to_loan(row: &PgRow) -> Result<Loan> {
    let id: i32 = row.try_get("id")?;
    let book_id: i32 = row.try_get("book_id")?;
    let patron_id: i32 = row.try_get("patron_id")?;

    Ok(Loan {
        loan_id: LoanId::new(i64::from(id)).map_err(StoreError::backend)?,
        book_id: BookId::new(i64::from(book_id)).map_err(StoreError::backend)?,
        patron_id: PatronId::new(i64::from(patron_id)).map_err(StoreError::backend)?,
        borrowed_at: row.try_get("borrowed_at")?,
        returned_at: row.try_get("returned_at")?,
    })
}

/// LendingStoreのPostgreSQL実装
///
/// 1回の貸出・返却につき1つのトランザクションを開く。
/// 二重貸出はborrows(book_id) WHERE returned_at IS NULLの部分一意インデックスで防ぐ。
pub struct LendingStore {
    pool: PgPool,
}

impl LendingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LendingStoreTrait for LendingStore {
    async fn begin(&self) -> Result<Box<dyn LendingSession>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresSession { tx, affected: 0 }))
    }
}

/// トランザクション1つ分のセッション
///
/// commitされずにdropされた場合、sqlxがロールバックする。
struct PostgresSession {
    tx: Transaction<'static, Postgres>,
    affected: u64,
}

#[async_trait]
impl LendingSession for PostgresSession {
    async fn find_book_by_id(&mut self, book_id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, author, publication_year, isbn
            FROM books
            WHERE id = $1
            "#,
        )
        .bind(book_id.value())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(map_row_to_book).transpose()
    }

    async fn find_patron_by_id(&mut self, patron_id: PatronId) -> Result<Option<Patron>> {
        let row = sqlx::query(
            r#"
            SELECT
                id,
                first_name,
                last_name,
                email,
                phone_number,
                date_of_birth,
                address,
                membership_start_date,
                membership_end_date,
                is_active
            FROM patrons
            WHERE id = $1
            "#,
        )
        .bind(patron_id.value())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(map_row_to_patron).transpose()
    }

    /// 返却対象の行をロックして取得する
    ///
    /// 並行した返却はロック解放後に条件付きUPDATEが空振りし、Conflictになる。
    async fn find_outstanding_loan(
        &mut self,
        book_id: BookId,
        patron_id: PatronId,
    ) -> Result<Option<Loan>> {
        let row = sqlx::query(
            r#"
            SELECT id, book_id, patron_id, borrowed_at, returned_at
            FROM borrows
            WHERE book_id = $1 AND patron_id = $2 AND returned_at IS NULL
            ORDER BY borrowed_at DESC, id DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(book_id.value())
        .bind(patron_id.value())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(map_row_to_loan).transpose()
    }

    async fn find_outstanding_loan_for_book(&mut self, book_id: BookId) -> Result<Option<Loan>> {
        let row = sqlx::query(
            r#"
            SELECT id, book_id, patron_id, borrowed_at, returned_at
            FROM borrows
            WHERE book_id = $1 AND returned_at IS NULL
            ORDER BY borrowed_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(book_id.value())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(map_row_to_loan).transpose()
    }

    async fn add_loan(&mut self, loan: NewLoan) -> Result<Loan> {
        let row = sqlx::query(
            r#"
            INSERT INTO borrows (book_id, patron_id, borrowed_at, returned_at)
            VALUES ($1, $2, $3, NULL)
            RETURNING id, book_id, patron_id, borrowed_at, returned_at
            "#,
        )
        .bind(loan.book_id.value())
        .bind(loan.patron_id.value())
        .bind(loan.borrowed_at)
        .fetch_one(&mut *self.tx)
        .await?;

        self.affected += 1;
        map_row_to_loan(&row)
    }

    /// returned_atのみを更新する（貸出中の行に限る）
    async fn update_loan(&mut self, loan: &Loan) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE borrows
            SET returned_at = $2
            WHERE id = $1 AND returned_at IS NULL
            "#,
        )
        .bind(loan.loan_id.value())
        .bind(loan.returned_at)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(format!(
                "loan {} is no longer outstanding",
                loan.loan_id
            )));
        }

        self.affected += result.rows_affected();
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<u64> {
        let PostgresSession { tx, affected } = *self;
        tx.commit().await?;
        Ok(affected)
    }
}
