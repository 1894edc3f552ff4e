pub mod account_repository;
pub mod book_repository;
pub mod lending_store;
pub mod loan_queries;
pub mod patron_repository;
pub mod store_error;

pub use account_repository::*;
pub use book_repository::*;
pub use lending_store::*;
pub use loan_queries::*;
pub use patron_repository::*;
pub use store_error::{ForeignKeyTarget, Result, StoreError};
