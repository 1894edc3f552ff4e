use crate::application::ServiceDependencies;
use crate::domain::{
    book::{Book, BookDetails},
    value_objects::BookId,
};

use super::errors::{CatalogError, Result};

/// 全書籍を取得する
pub async fn list_books(deps: &ServiceDependencies) -> Result<Vec<Book>> {
    deps.book_repository
        .list()
        .await
        .map_err(CatalogError::PersistenceFailure)
}

/// IDで書籍を取得する
pub async fn get_book(deps: &ServiceDependencies, book_id: i64) -> Result<Book> {
    let book_id = BookId::new(book_id)?;

    deps.book_repository
        .find_by_id(book_id)
        .await
        .map_err(CatalogError::PersistenceFailure)?
        .ok_or(CatalogError::BookNotFound)
}

/// 書籍を登録する
///
/// 入力値の検証はAPI層で済んでいる前提。
pub async fn create_book(deps: &ServiceDependencies, details: BookDetails) -> Result<Book> {
    let book = deps
        .book_repository
        .insert(details)
        .await
        .map_err(CatalogError::PersistenceFailure)?;

    tracing::info!(book_id = %book.id, "Book created");
    Ok(book)
}

/// 書籍を更新する（全属性の置き換え）
pub async fn update_book(
    deps: &ServiceDependencies,
    book_id: i64,
    details: BookDetails,
) -> Result<Book> {
    let book = Book {
        id: BookId::new(book_id)?,
        details,
    };

    let updated = deps
        .book_repository
        .update(&book)
        .await
        .map_err(CatalogError::PersistenceFailure)?;

    if !updated {
        return Err(CatalogError::BookNotFound);
    }

    tracing::info!(book_id = %book.id, "Book updated");
    Ok(book)
}

/// 書籍を削除する
///
/// 貸出記録から参照されている書籍は削除できない（`InUse`）。
pub async fn delete_book(deps: &ServiceDependencies, book_id: i64) -> Result<()> {
    let book_id = BookId::new(book_id)?;

    let deleted = deps
        .book_repository
        .delete(book_id)
        .await
        .map_err(|e| {
            if e.is_foreign_key() {
                CatalogError::InUse("Book has loan records and cannot be deleted".to_string())
            } else {
                CatalogError::PersistenceFailure(e)
            }
        })?;

    if !deleted {
        return Err(CatalogError::BookNotFound);
    }

    tracing::info!(book_id = %book_id, "Book deleted");
    Ok(())
}
