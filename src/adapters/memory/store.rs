use crate::domain::{
    InvalidId,
    account::Account,
    book::{Book, BookDetails},
    loan::{self, Loan, NewLoan},
    patron::{Patron, PatronDetails},
    value_objects::{BookId, LoanId, PatronId},
};
use crate::ports::{
    AccountRepository, BookRepository, ForeignKeyTarget, LendingSession, LendingStore,
    LoanQueries, PatronRepository, Result, StoreError,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct State {
    books: BTreeMap<BookId, BookDetails>,
    patrons: BTreeMap<PatronId, PatronDetails>,
    loans: BTreeMap<LoanId, Loan>,
    accounts: Vec<Account>,
    last_book_id: i64,
    last_patron_id: i64,
    last_loan_id: i64,
}

impl State {
    fn outstanding_for_book(&self, book_id: BookId) -> Option<&Loan> {
        loan::select_outstanding(self.loans.values().filter(|l| l.book_id == book_id))
    }

    fn is_book_referenced(&self, book_id: BookId) -> bool {
        self.loans.values().any(|l| l.book_id == book_id)
    }

    fn is_patron_referenced(&self, patron_id: PatronId) -> bool {
        self.loans.values().any(|l| l.patron_id == patron_id)
    }
}

fn next_id<T>(counter: &mut i64, make: fn(i64) -> std::result::Result<T, InvalidId>) -> Result<T> {
    *counter += 1;
    make(*counter).map_err(StoreError::backend)
}

/// すべてのストレージポートのインメモリ実装
///
/// `memory`ストレージバックエンドとテストで使用する。
/// クローンは同じ状態を共有する。
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        lock_state(&self.state)
    }

    /// コミット済みの貸出記録の件数
    pub fn loan_count(&self) -> Result<usize> {
        Ok(self.lock()?.loans.len())
    }

    /// コミット済みの貸出記録（ID順）
    pub fn loans(&self) -> Result<Vec<Loan>> {
        Ok(self.lock()?.loans.values().cloned().collect())
    }
}

fn lock_state(state: &Mutex<State>) -> Result<MutexGuard<'_, State>> {
    state
        .lock()
        .map_err(|e| StoreError::backend(format!("memory store lock poisoned: {}", e)))
}

#[async_trait]
impl BookRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Book>> {
        let state = self.lock()?;
        Ok(state
            .books
            .iter()
            .map(|(id, details)| Book {
                id: *id,
                details: details.clone(),
            })
            .collect())
    }

    async fn find_by_id(&self, book_id: BookId) -> Result<Option<Book>> {
        let state = self.lock()?;
        Ok(state.books.get(&book_id).map(|details| Book {
            id: book_id,
            details: details.clone(),
        }))
    }

    async fn insert(&self, details: BookDetails) -> Result<Book> {
        let mut state = self.lock()?;
        let id = next_id(&mut state.last_book_id, BookId::new)?;
        state.books.insert(id, details.clone());
        Ok(Book { id, details })
    }

    async fn update(&self, book: &Book) -> Result<bool> {
        let mut state = self.lock()?;
        match state.books.get_mut(&book.id) {
            Some(details) => {
                *details = book.details.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, book_id: BookId) -> Result<bool> {
        let mut state = self.lock()?;
        if state.is_book_referenced(book_id) {
            return Err(StoreError::foreign_key(
                ForeignKeyTarget::Book,
                format!("book {} is referenced by loan records", book_id),
            ));
        }
        Ok(state.books.remove(&book_id).is_some())
    }
}

#[async_trait]
impl PatronRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Patron>> {
        let state = self.lock()?;
        Ok(state
            .patrons
            .iter()
            .map(|(id, details)| Patron {
                id: *id,
                details: details.clone(),
            })
            .collect())
    }

    async fn find_by_id(&self, patron_id: PatronId) -> Result<Option<Patron>> {
        let state = self.lock()?;
        Ok(state.patrons.get(&patron_id).map(|details| Patron {
            id: patron_id,
            details: details.clone(),
        }))
    }

    async fn insert(&self, details: PatronDetails) -> Result<Patron> {
        let mut state = self.lock()?;
        let id = next_id(&mut state.last_patron_id, PatronId::new)?;
        state.patrons.insert(id, details.clone());
        Ok(Patron { id, details })
    }

    async fn update(&self, patron: &Patron) -> Result<bool> {
        let mut state = self.lock()?;
        match state.patrons.get_mut(&patron.id) {
            Some(details) => {
                *details = patron.details.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, patron_id: PatronId) -> Result<bool> {
        let mut state = self.lock()?;
        if state.is_patron_referenced(patron_id) {
            return Err(StoreError::foreign_key(
                ForeignKeyTarget::Patron,
                format!("patron {} is referenced by loan records", patron_id),
            ));
        }
        Ok(state.patrons.remove(&patron_id).is_some())
    }
}

#[async_trait]
impl LoanQueries for MemoryStore {
    async fn find_by_book_id(&self, book_id: BookId) -> Result<Vec<Loan>> {
        let state = self.lock()?;
        Ok(newest_first(
            state.loans.values().filter(|l| l.book_id == book_id),
        ))
    }

    async fn find_by_patron_id(&self, patron_id: PatronId) -> Result<Vec<Loan>> {
        let state = self.lock()?;
        Ok(newest_first(
            state.loans.values().filter(|l| l.patron_id == patron_id),
        ))
    }
}

fn newest_first<'a>(loans: impl Iterator<Item = &'a Loan>) -> Vec<Loan> {
    let mut loans: Vec<Loan> = loans.cloned().collect();
    loans.sort_by(|a, b| (b.borrowed_at, b.loan_id).cmp(&(a.borrowed_at, a.loan_id)));
    loans
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let state = self.lock()?;
        Ok(state
            .accounts
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn insert(&self, account: &Account) -> Result<()> {
        let mut state = self.lock()?;
        if state
            .accounts
            .iter()
            .any(|a| a.email.eq_ignore_ascii_case(&account.email))
        {
            return Err(StoreError::Conflict(format!(
                "email {} is already registered",
                account.email
            )));
        }
        state.accounts.push(account.clone());
        Ok(())
    }
}

#[async_trait]
impl LendingStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn LendingSession>> {
        Ok(Box::new(MemorySession {
            state: Arc::clone(&self.state),
            inserted: Vec::new(),
            updated: Vec::new(),
        }))
    }
}

/// インメモリストアのセッション
///
/// 書き込みはセッション内に保持し、コミット時にまとめて反映する。
/// コミット時にストアのロック下で制約を再検証するため、先にコミットした
/// 並行セッションがあればこちらは失敗する。
struct MemorySession {
    state: Arc<Mutex<State>>,
    inserted: Vec<Loan>,
    updated: Vec<Loan>,
}

impl MemorySession {
    /// コミット済みの記録にこのセッションの未反映の書き込みを重ねたもの
    fn visible_loans(&self, state: &State) -> Vec<Loan> {
        let mut loans: BTreeMap<LoanId, Loan> = state.loans.clone();
        for loan in self.inserted.iter().chain(self.updated.iter()) {
            loans.insert(loan.loan_id, loan.clone());
        }
        loans.into_values().collect()
    }
}

#[async_trait]
impl LendingSession for MemorySession {
    async fn find_book_by_id(&mut self, book_id: BookId) -> Result<Option<Book>> {
        let state = lock_state(&self.state)?;
        Ok(state.books.get(&book_id).map(|details| Book {
            id: book_id,
            details: details.clone(),
        }))
    }

    async fn find_patron_by_id(&mut self, patron_id: PatronId) -> Result<Option<Patron>> {
        let state = lock_state(&self.state)?;
        Ok(state.patrons.get(&patron_id).map(|details| Patron {
            id: patron_id,
            details: details.clone(),
        }))
    }

    async fn find_outstanding_loan(
        &mut self,
        book_id: BookId,
        patron_id: PatronId,
    ) -> Result<Option<Loan>> {
        let state = lock_state(&self.state)?;
        let loans = self.visible_loans(&state);
        Ok(loan::select_outstanding(
            loans
                .iter()
                .filter(|l| l.book_id == book_id && l.patron_id == patron_id),
        )
        .cloned())
    }

    async fn find_outstanding_loan_for_book(&mut self, book_id: BookId) -> Result<Option<Loan>> {
        let state = lock_state(&self.state)?;
        let loans = self.visible_loans(&state);
        Ok(loan::select_outstanding(loans.iter().filter(|l| l.book_id == book_id)).cloned())
    }

    async fn add_loan(&mut self, new_loan: NewLoan) -> Result<Loan> {
        let mut state = lock_state(&self.state)?;

        let staged_conflict = self
            .inserted
            .iter()
            .any(|l| l.book_id == new_loan.book_id && l.is_outstanding());
        if staged_conflict || state.outstanding_for_book(new_loan.book_id).is_some() {
            return Err(StoreError::Conflict(format!(
                "book {} already has an outstanding loan",
                new_loan.book_id
            )));
        }

        // シーケンスと同様、ロールバックされても採番済みのIDは戻さない
        let loan_id = next_id(&mut state.last_loan_id, LoanId::new)?;
        let loan = new_loan.with_id(loan_id);
        self.inserted.push(loan.clone());
        Ok(loan)
    }

    async fn update_loan(&mut self, loan: &Loan) -> Result<()> {
        if let Some(staged) = self.inserted.iter_mut().find(|l| l.loan_id == loan.loan_id) {
            *staged = loan.clone();
            return Ok(());
        }

        let state = lock_state(&self.state)?;
        match state.loans.get(&loan.loan_id) {
            Some(current) if current.is_outstanding() => {
                self.updated.retain(|l| l.loan_id != loan.loan_id);
                self.updated.push(loan.clone());
                Ok(())
            }
            Some(_) => Err(StoreError::Conflict(format!(
                "loan {} has already been returned",
                loan.loan_id
            ))),
            None => Err(StoreError::Conflict(format!(
                "loan {} does not exist",
                loan.loan_id
            ))),
        }
    }

    async fn commit(self: Box<Self>) -> Result<u64> {
        let mut state = lock_state(&self.state)?;

        for loan in &self.inserted {
            if !state.books.contains_key(&loan.book_id) {
                return Err(StoreError::foreign_key(
                    ForeignKeyTarget::Book,
                    format!("book {} does not exist", loan.book_id),
                ));
            }
            if !state.patrons.contains_key(&loan.patron_id) {
                return Err(StoreError::foreign_key(
                    ForeignKeyTarget::Patron,
                    format!("patron {} does not exist", loan.patron_id),
                ));
            }
            if loan.is_outstanding() && state.outstanding_for_book(loan.book_id).is_some() {
                return Err(StoreError::Conflict(format!(
                    "book {} already has an outstanding loan",
                    loan.book_id
                )));
            }
        }
        for loan in &self.updated {
            let still_outstanding = state
                .loans
                .get(&loan.loan_id)
                .is_some_and(|current| current.is_outstanding());
            if !still_outstanding {
                return Err(StoreError::Conflict(format!(
                    "loan {} has already been returned",
                    loan.loan_id
                )));
            }
        }

        let affected = (self.inserted.len() + self.updated.len()) as u64;
        for loan in self.inserted.iter().chain(self.updated.iter()) {
            state.loans.insert(loan.loan_id, loan.clone());
        }

        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn book_details() -> BookDetails {
        BookDetails {
            title: "The Rust Programming Language".to_string(),
            author: "Steve Klabnik".to_string(),
            publication_year: 2019,
            isbn: "9781718500440".to_string(),
        }
    }

    fn patron_details() -> PatronDetails {
        PatronDetails {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone_number: "0123456789".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 12, 10).unwrap(),
            address: "12 St James's Square".to_string(),
            membership_start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            membership_end_date: None,
            is_active: true,
        }
    }

    async fn seeded() -> (MemoryStore, BookId, PatronId) {
        let store = MemoryStore::new();
        let book = BookRepository::insert(&store, book_details()).await.unwrap();
        let patron = PatronRepository::insert(&store, patron_details())
            .await
            .unwrap();
        (store, book.id, patron.id)
    }

    #[tokio::test]
    async fn test_ids_are_assigned_sequentially() {
        let store = MemoryStore::new();
        let first = BookRepository::insert(&store, book_details()).await.unwrap();
        let second = BookRepository::insert(&store, book_details()).await.unwrap();

        assert_eq!(first.id.value(), 1);
        assert_eq!(second.id.value(), 2);
    }

    #[tokio::test]
    async fn test_uncommitted_session_leaves_no_trace() {
        let (store, book_id, patron_id) = seeded().await;

        let mut session = store.begin().await.unwrap();
        session
            .add_loan(loan::borrow_book(book_id, patron_id, Utc::now()))
            .await
            .unwrap();
        drop(session);

        assert_eq!(store.loan_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_second_session_conflicts_on_commit() {
        let (store, book_id, patron_id) = seeded().await;

        let mut first = store.begin().await.unwrap();
        let mut second = store.begin().await.unwrap();

        first
            .add_loan(loan::borrow_book(book_id, patron_id, Utc::now()))
            .await
            .unwrap();
        second
            .add_loan(loan::borrow_book(book_id, patron_id, Utc::now()))
            .await
            .unwrap();

        assert_eq!(first.commit().await.unwrap(), 1);
        assert!(second.commit().await.unwrap_err().is_conflict());
        assert_eq!(store.loan_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_referenced_book_is_foreign_key_violation() {
        let (store, book_id, patron_id) = seeded().await;

        let mut session = store.begin().await.unwrap();
        session
            .add_loan(loan::borrow_book(book_id, patron_id, Utc::now()))
            .await
            .unwrap();
        session.commit().await.unwrap();

        let result = BookRepository::delete(&store, book_id).await;
        assert!(result.unwrap_err().is_foreign_key());

        let result = PatronRepository::delete(&store, patron_id).await;
        assert!(result.unwrap_err().is_foreign_key());
    }

    #[tokio::test]
    async fn test_commit_fails_when_book_was_deleted_meanwhile() {
        let (store, book_id, patron_id) = seeded().await;

        let mut session = store.begin().await.unwrap();
        session
            .add_loan(loan::borrow_book(book_id, patron_id, Utc::now()))
            .await
            .unwrap();

        // セッションのコミット前に書籍が削除される
        assert!(BookRepository::delete(&store, book_id).await.unwrap());

        let err = session.commit().await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::ForeignKey {
                target: Some(ForeignKeyTarget::Book),
                ..
            }
        ));
        assert_eq!(store.loan_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_account_email_is_case_insensitive() {
        let store = MemoryStore::new();
        let account = Account {
            account_id: crate::domain::AccountId::new(),
            email: "admin@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: crate::domain::Role::Admin,
            created_at: Utc::now(),
        };
        AccountRepository::insert(&store, &account).await.unwrap();

        let found = store.find_by_email("ADMIN@example.com").await.unwrap();
        assert_eq!(found, Some(account.clone()));

        let duplicate = Account {
            email: "Admin@Example.com".to_string(),
            ..account
        };
        let result = AccountRepository::insert(&store, &duplicate).await;
        assert!(result.unwrap_err().is_conflict());
    }
}
