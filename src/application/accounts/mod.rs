mod account_service;
mod errors;
mod token;

pub use account_service::{RegisterAccount, ensure_admin, hash_password, login, register};
pub use errors::{AccountError, Result};
pub use token::{Claims, IssuedToken, TokenIssuer};
