pub mod accounts;
pub mod auth;
pub mod books;
pub mod error;
pub mod handlers;
pub mod patrons;
pub mod router;
pub mod types;

pub use auth::AuthenticatedUser;
pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use types::*;
