use crate::application::{accounts::AccountError, catalog::CatalogError, lending::LendingError};
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use validator::ValidationErrors;

use super::types::{ErrorResponse, validation_messages};

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub enum ApiError {
    Lending(LendingError),
    Catalog(CatalogError),
    Account(AccountError),
    /// リクエストボディの検証エラー（全メッセージ）
    Validation(Vec<String>),
    /// JSONとして読めないリクエストボディ
    MalformedBody(String),
}

impl From<LendingError> for ApiError {
    fn from(err: LendingError) -> Self {
        ApiError::Lending(err)
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::Catalog(err)
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        ApiError::Account(err)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(validation_messages(&errors))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody(rejection.body_text())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Lending(err) => match err {
                LendingError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
                LendingError::BookNotFound
                | LendingError::PatronNotFound
                | LendingError::LoanNotFound => StatusCode::NOT_FOUND,
                LendingError::BookAlreadyBorrowed => StatusCode::CONFLICT,
                LendingError::PersistenceFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Catalog(err) => match err {
                CatalogError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
                CatalogError::BookNotFound | CatalogError::PatronNotFound => StatusCode::NOT_FOUND,
                CatalogError::InUse(_) => StatusCode::CONFLICT,
                CatalogError::PersistenceFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Account(err) => match err {
                AccountError::InvalidCredentials | AccountError::Unauthorized(_) => {
                    StatusCode::UNAUTHORIZED
                }
                AccountError::Forbidden(_) => StatusCode::FORBIDDEN,
                AccountError::EmailTaken => StatusCode::CONFLICT,
                AccountError::Internal(_) | AccountError::PersistenceFailure(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Validation(_) | ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Lending(err) => err.code(),
            ApiError::Catalog(err) => err.code(),
            ApiError::Account(err) => err.code(),
            ApiError::Validation(_) | ApiError::MalformedBody(_) => "INVALID_ARGUMENT",
        }
    }

    /// クライアントに返すメッセージ
    ///
    /// 500系は詳細をログにのみ残し、一般的なメッセージを返す。
    fn messages(&self) -> Vec<String> {
        match self {
            ApiError::Validation(messages) => messages.clone(),
            ApiError::MalformedBody(message) => vec![message.clone()],
            ApiError::Lending(LendingError::PersistenceFailure(_))
            | ApiError::Catalog(CatalogError::PersistenceFailure(_))
            | ApiError::Account(AccountError::PersistenceFailure(_))
            | ApiError::Account(AccountError::Internal(_)) => {
                vec!["An internal error occurred".to_string()]
            }
            ApiError::Lending(err) => vec![err.to_string()],
            ApiError::Catalog(err) => vec![err.to_string()],
            ApiError::Account(err) => vec![err.to_string()],
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            match &self {
                ApiError::Lending(LendingError::PersistenceFailure(e))
                | ApiError::Catalog(CatalogError::PersistenceFailure(e))
                | ApiError::Account(AccountError::PersistenceFailure(e)) => {
                    tracing::error!(error = ?e, code = self.code(), "Storage failure");
                }
                other => {
                    tracing::error!(error = ?other, code = self.code(), "Internal error");
                }
            }
        }

        let body = Json(ErrorResponse::new(self.code(), self.messages()));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::StoreError;

    #[test]
    fn test_lending_errors_map_to_expected_statuses() {
        let cases = [
            (LendingError::InvalidArgument("bad".into()), StatusCode::BAD_REQUEST),
            (LendingError::BookNotFound, StatusCode::NOT_FOUND),
            (LendingError::PatronNotFound, StatusCode::NOT_FOUND),
            (LendingError::LoanNotFound, StatusCode::NOT_FOUND),
            (LendingError::BookAlreadyBorrowed, StatusCode::CONFLICT),
            (
                LendingError::PersistenceFailure(StoreError::backend("down")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_persistence_failure_detail_is_not_exposed() {
        let err = ApiError::from(CatalogError::PersistenceFailure(StoreError::backend(
            "connection refused to 10.0.0.1",
        )));

        assert_eq!(err.code(), "PERSISTENCE_FAILURE");
        assert_eq!(err.messages(), vec!["An internal error occurred".to_string()]);
    }

    #[test]
    fn test_account_errors_map_to_auth_statuses() {
        assert_eq!(
            ApiError::from(AccountError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AccountError::Forbidden("Admin role required".into())).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(AccountError::EmailTaken).status(),
            StatusCode::CONFLICT
        );
    }
}
