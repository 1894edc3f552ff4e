use crate::domain::{
    book::{Book, BookDetails},
    value_objects::BookId,
};
use crate::ports::{BookRepository as BookRepositoryTrait, Result, StoreError};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

/// PostgreSQLの行データをBookに変換する
pub(crate) fn map_row_to_book(row: &PgRow) -> Result<Book> {
    let id: i32 = row.try_get("id")?;

    Ok(Book {
        id: BookId::new(i64::from(id)).map_err(StoreError::backend)?,
        details: BookDetails {
            title: row.try_get("title")?,
            author: row.try_get("author")?,
            publication_year: row.try_get("publication_year")?,
            isbn: row.try_get("isbn")?,
        },
    })
}

/// BookRepositoryのPostgreSQL実装
pub struct BookRepository {
    pool: PgPool,
}

impl BookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepositoryTrait for BookRepository {
    async fn list(&self) -> Result<Vec<Book>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, author, publication_year, isbn
            FROM books
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_book).collect()
    }

    async fn find_by_id(&self, book_id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, author, publication_year, isbn
            FROM books
            WHERE id = $1
            "#,
        )
        .bind(book_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_book).transpose()
    }

    async fn insert(&self, details: BookDetails) -> Result<Book> {
        let row = sqlx::query(
            r#"
            INSERT INTO books (title, author, publication_year, isbn)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, author, publication_year, isbn
            "#,
        )
        .bind(&details.title)
        .bind(&details.author)
        .bind(details.publication_year)
        .bind(&details.isbn)
        .fetch_one(&self.pool)
        .await?;

        map_row_to_book(&row)
    }

    async fn update(&self, book: &Book) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = $2, author = $3, publication_year = $4, isbn = $5
            WHERE id = $1
            "#,
        )
        .bind(book.id.value())
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.publication_year)
        .bind(&book.isbn)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 貸出記録から参照されている場合は外部キー制約違反（ForeignKey）になる
    async fn delete(&self, book_id: BookId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(book_id.value())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
