use crate::application::ServiceDependencies;
use crate::domain::{self, commands::*, loan::Loan, value_objects::*};
use crate::ports::{ForeignKeyTarget, LendingSession, StoreError};

use super::errors::{LendingError, Result};

/// 生のIDを値オブジェクトに変換する
///
/// 書籍ID、利用者IDの順に検証し、ストレージに触れる前に失敗させる。
fn parse_ids(book_id: i64, patron_id: i64) -> Result<(BookId, PatronId)> {
    let book_id = BookId::new(book_id)?;
    let patron_id = PatronId::new(patron_id)?;
    Ok((book_id, patron_id))
}

/// ストレージのエラーをドメインエラーに読み替える
///
/// 一意制約違反は指定のエラーに、外部キー違反は参照先の不在に対応させる。
/// 途中で書籍や利用者が削除された場合もNotFoundとして返る。
fn map_store_error(err: StoreError, on_conflict: LendingError) -> LendingError {
    match err {
        StoreError::Conflict(_) => on_conflict,
        StoreError::ForeignKey {
            target: Some(ForeignKeyTarget::Book),
            ..
        } => LendingError::BookNotFound,
        StoreError::ForeignKey {
            target: Some(ForeignKeyTarget::Patron),
            ..
        } => LendingError::PatronNotFound,
        err => LendingError::PersistenceFailure(err),
    }
}

/// 書籍と利用者の存在確認（書籍 → 利用者の順）
async fn ensure_book_and_patron(
    session: &mut dyn LendingSession,
    book_id: BookId,
    patron_id: PatronId,
) -> Result<()> {
    session
        .find_book_by_id(book_id)
        .await
        .map_err(LendingError::PersistenceFailure)?
        .ok_or(LendingError::BookNotFound)?;

    session
        .find_patron_by_id(patron_id)
        .await
        .map_err(LendingError::PersistenceFailure)?
        .ok_or(LendingError::PatronNotFound)?;

    Ok(())
}

/// 書籍を貸し出す
///
/// ビジネスルール（この順に検証）：
/// - 書籍ID・利用者IDが正の整数であること
/// - 書籍が存在すること
/// - 利用者が存在すること
/// - 書籍に貸出中の記録がないこと（1冊を同時に2人へ貸すことはできない）
///
/// 検証と書き込みは1つのセッション内で行い、最後にコミットする。
/// 同時リクエストによる二重貸出はストレージの一意制約で検出され、
/// `BookAlreadyBorrowed`として返る。
///
/// # 引数
/// * `deps` - サービスの依存関係
/// * `cmd` - 貸出コマンド
///
/// # 戻り値
/// 成功時は作成された貸出記録
pub async fn request_borrow(deps: &ServiceDependencies, cmd: BorrowBook) -> Result<Loan> {
    // 1. IDの検証
    let (book_id, patron_id) = parse_ids(cmd.book_id, cmd.patron_id)?;

    let mut session = deps
        .lending_store
        .begin()
        .await
        .map_err(LendingError::PersistenceFailure)?;

    // 2. 書籍・利用者の存在確認
    ensure_book_and_patron(session.as_mut(), book_id, patron_id).await?;

    // 3. 書籍の貸出状況確認
    let existing = session
        .find_outstanding_loan_for_book(book_id)
        .await
        .map_err(LendingError::PersistenceFailure)?;

    if let Some(existing) = existing {
        tracing::warn!(
            book_id = %book_id,
            patron_id = %patron_id,
            loan_id = %existing.loan_id,
            "Borrow rejected: book already has an outstanding loan"
        );
        return Err(LendingError::BookAlreadyBorrowed);
    }

    // 4. ドメイン層の純粋関数で貸出記録を作成
    let new_loan = domain::loan::borrow_book(book_id, patron_id, cmd.requested_at);

    // 5. 追加とコミット
    let loan = session
        .add_loan(new_loan)
        .await
        .map_err(|e| map_store_error(e, LendingError::BookAlreadyBorrowed))?;

    let affected = session
        .commit()
        .await
        .map_err(|e| map_store_error(e, LendingError::BookAlreadyBorrowed))?;

    tracing::info!(
        loan_id = %loan.loan_id,
        book_id = %book_id,
        patron_id = %patron_id,
        affected,
        "Book borrowed"
    );

    Ok(loan)
}

/// 書籍を返却する
///
/// ビジネスルール（この順に検証）：
/// - 書籍ID・利用者IDが正の整数であること
/// - 書籍が存在すること
/// - 利用者が存在すること
/// - (書籍, 利用者)に貸出中の記録があること
///
/// 貸出中の記録が複数ある場合は、borrowed_atが最新のもの（同時刻ならIDが大きいもの）を返却する。
/// 返却済みの記録は対象にならないため、2回目の返却は`LoanNotFound`になる。
///
/// # 引数
/// * `deps` - サービスの依存関係
/// * `cmd` - 返却コマンド
///
/// # 戻り値
/// 成功時は返却日時が設定された貸出記録
pub async fn request_return(deps: &ServiceDependencies, cmd: ReturnBook) -> Result<Loan> {
    // 1. IDの検証
    let (book_id, patron_id) = parse_ids(cmd.book_id, cmd.patron_id)?;

    let mut session = deps
        .lending_store
        .begin()
        .await
        .map_err(LendingError::PersistenceFailure)?;

    // 2. 書籍・利用者の存在確認
    ensure_book_and_patron(session.as_mut(), book_id, patron_id).await?;

    // 3. 貸出中の記録を取得
    let loan = session
        .find_outstanding_loan(book_id, patron_id)
        .await
        .map_err(LendingError::PersistenceFailure)?
        .ok_or(LendingError::LoanNotFound)?;

    // 4. ドメイン層の純粋関数で返却
    let returned = domain::loan::return_book(&loan, cmd.requested_at)
        .map_err(|_| LendingError::LoanNotFound)?;

    // 5. 更新とコミット（並行した返却に負けた場合はLoanNotFound）
    session
        .update_loan(&returned)
        .await
        .map_err(|e| map_store_error(e, LendingError::LoanNotFound))?;

    let affected = session
        .commit()
        .await
        .map_err(|e| map_store_error(e, LendingError::LoanNotFound))?;

    tracing::info!(
        loan_id = %returned.loan_id,
        book_id = %book_id,
        patron_id = %patron_id,
        affected,
        "Book returned"
    );

    Ok(returned)
}

/// 書籍の貸出履歴を取得する（新しい順）
pub async fn loan_history_for_book(deps: &ServiceDependencies, book_id: i64) -> Result<Vec<Loan>> {
    let book_id = BookId::new(book_id)?;

    deps.book_repository
        .find_by_id(book_id)
        .await
        .map_err(LendingError::PersistenceFailure)?
        .ok_or(LendingError::BookNotFound)?;

    deps.loan_queries
        .find_by_book_id(book_id)
        .await
        .map_err(LendingError::PersistenceFailure)
}

/// 利用者の貸出履歴を取得する（新しい順）
pub async fn loan_history_for_patron(
    deps: &ServiceDependencies,
    patron_id: i64,
) -> Result<Vec<Loan>> {
    let patron_id = PatronId::new(patron_id)?;

    deps.patron_repository
        .find_by_id(patron_id)
        .await
        .map_err(LendingError::PersistenceFailure)?
        .ok_or(LendingError::PatronNotFound)?;

    deps.loan_queries
        .find_by_patron_id(patron_id)
        .await
        .map_err(LendingError::PersistenceFailure)
}
