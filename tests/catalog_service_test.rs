use rusty_library_lending::application::catalog::{
    self, CatalogError, create_book, create_patron, delete_book, delete_patron, get_book,
    get_patron, list_books, update_book, update_patron,
};
use rusty_library_lending::application::lending::request_borrow;
use rusty_library_lending::domain::commands::BorrowBook;

mod common;

#[tokio::test]
async fn test_book_lifecycle() {
    let (_, deps) = common::memory_deps();

    let created = create_book(&deps, common::sample_book_details())
        .await
        .unwrap();
    let id: i64 = created.id.value().into();
    assert_eq!(get_book(&deps, id).await.unwrap(), created);

    let mut details = common::sample_book_details();
    details.publication_year = 2004;
    let updated = update_book(&deps, id, details).await.unwrap();
    assert_eq!(updated.publication_year, 2004);
    assert_eq!(list_books(&deps).await.unwrap(), vec![updated]);

    delete_book(&deps, id).await.unwrap();
    assert!(matches!(
        get_book(&deps, id).await,
        Err(CatalogError::BookNotFound)
    ));
}

#[tokio::test]
async fn test_missing_entities_are_not_found() {
    let (_, deps) = common::memory_deps();

    assert!(matches!(
        update_book(&deps, 5, common::sample_book_details()).await,
        Err(CatalogError::BookNotFound)
    ));
    assert!(matches!(
        delete_book(&deps, 5).await,
        Err(CatalogError::BookNotFound)
    ));
    assert!(matches!(
        update_patron(&deps, 5, common::sample_patron_details()).await,
        Err(CatalogError::PatronNotFound)
    ));
    assert!(matches!(
        delete_patron(&deps, 5).await,
        Err(CatalogError::PatronNotFound)
    ));
}

#[tokio::test]
async fn test_non_positive_ids_are_invalid() {
    let (_, deps) = common::memory_deps();

    assert!(matches!(
        get_book(&deps, 0).await,
        Err(CatalogError::InvalidArgument(_))
    ));
    assert!(matches!(
        get_patron(&deps, -3).await,
        Err(CatalogError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn test_entities_with_loans_cannot_be_deleted() {
    let (_, deps) = common::memory_deps();
    let book = create_book(&deps, common::sample_book_details())
        .await
        .unwrap();
    let patron = create_patron(&deps, common::sample_patron_details())
        .await
        .unwrap();
    let (book_id, patron_id): (i64, i64) = (book.id.value().into(), patron.id.value().into());

    request_borrow(
        &deps,
        BorrowBook {
            book_id,
            patron_id,
            requested_at: chrono::Utc::now(),
        },
    )
    .await
    .unwrap();

    assert!(matches!(
        delete_book(&deps, book_id).await,
        Err(CatalogError::InUse(_))
    ));
    assert!(matches!(
        delete_patron(&deps, patron_id).await,
        Err(CatalogError::InUse(_))
    ));
    assert_eq!(catalog::list_patrons(&deps).await.unwrap(), vec![patron]);
}
