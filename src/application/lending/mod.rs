mod errors;
mod lending_service;

pub use errors::{LendingError, Result};
pub use lending_service::{
    loan_history_for_book, loan_history_for_patron, request_borrow, request_return,
};
