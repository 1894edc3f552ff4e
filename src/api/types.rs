use chrono::{DateTime, Datelike, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::application::accounts::IssuedToken;
use crate::domain::{
    Role,
    account::Account,
    book::{Book, BookDetails},
    loan::Loan,
    patron::{Patron, PatronDetails},
};

static ISBN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d{13}|\d{10})$").expect("ISBN pattern is valid"));
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{10}$").expect("phone pattern is valid"));

/// 出版年の下限
pub const MIN_PUBLICATION_YEAR: i32 = 1800;

fn validation_error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// ValidationErrorsを表示用のメッセージ一覧に平坦化する（フィールド名順）
pub fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| match &err.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect()
}

// ============================================================================
// Books
// ============================================================================

/// 書籍の登録・更新リクエスト
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_publication_year", skip_on_field_errors = false))]
pub struct BookRequest {
    #[validate(
        custom(function = "validate_not_blank", message = "Title is required"),
        length(max = 100, message = "Title must be at most 100 characters")
    )]
    pub title: String,
    #[validate(
        custom(function = "validate_not_blank", message = "Author is required"),
        length(max = 100, message = "Author must be at most 100 characters")
    )]
    pub author: String,
    pub publication_year: i32,
    #[validate(regex(path = *ISBN_RE, message = "ISBN must be exactly 10 or 13 digits"))]
    pub isbn: String,
}

/// 空白のみの文字列も未入力として扱う
fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(validation_error("required", "Value is required"))
    } else {
        Ok(())
    }
}

fn validate_publication_year(req: &BookRequest) -> Result<(), ValidationError> {
    let current_year = Utc::now().year();
    if (MIN_PUBLICATION_YEAR..=current_year).contains(&req.publication_year) {
        Ok(())
    } else {
        Err(validation_error(
            "publication_year",
            format!(
                "Publication year must be between {} and {}",
                MIN_PUBLICATION_YEAR, current_year
            ),
        ))
    }
}

impl BookRequest {
    pub fn into_details(self) -> BookDetails {
        BookDetails {
            title: self.title,
            author: self.author,
            publication_year: self.publication_year,
            isbn: self.isbn,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub publication_year: i32,
    pub isbn: String,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id.value(),
            title: book.details.title,
            author: book.details.author,
            publication_year: book.details.publication_year,
            isbn: book.details.isbn,
        }
    }
}

// ============================================================================
// Patrons
// ============================================================================

fn default_active() -> bool {
    true
}

/// 利用者の登録・更新リクエスト
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_membership_period", skip_on_field_errors = false))]
pub struct PatronRequest {
    #[validate(
        custom(function = "validate_not_blank", message = "First name is required"),
        length(max = 50, message = "First name must be at most 50 characters")
    )]
    pub first_name: String,
    #[validate(
        custom(function = "validate_not_blank", message = "Last name is required"),
        length(max = 50, message = "Last name must be at most 50 characters")
    )]
    pub last_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(regex(path = *PHONE_RE, message = "Phone number must be exactly 10 digits"))]
    pub phone_number: String,
    #[validate(custom(function = "validate_past_date", message = "Date of birth must be in the past"))]
    pub date_of_birth: NaiveDate,
    #[validate(
        custom(function = "validate_not_blank", message = "Address is required"),
        length(max = 200, message = "Address must be at most 200 characters")
    )]
    pub address: String,
    pub membership_start_date: NaiveDate,
    pub membership_end_date: Option<NaiveDate>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// 今日より前の日付であること
fn validate_past_date(date: &NaiveDate) -> Result<(), ValidationError> {
    if *date < Utc::now().date_naive() {
        Ok(())
    } else {
        Err(validation_error("past_date", "Date must be in the past"))
    }
}

/// 会員期間の終了日が開始日より前でないこと
fn validate_membership_period(req: &PatronRequest) -> Result<(), ValidationError> {
    match req.membership_end_date {
        Some(end) if end < req.membership_start_date => Err(validation_error(
            "membership_end_date",
            "Membership end date must not be before the start date",
        )),
        _ => Ok(()),
    }
}

impl PatronRequest {
    pub fn into_details(self) -> PatronDetails {
        PatronDetails {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone_number: self.phone_number,
            date_of_birth: self.date_of_birth,
            address: self.address,
            membership_start_date: self.membership_start_date,
            membership_end_date: self.membership_end_date,
            is_active: self.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatronResponse {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub date_of_birth: NaiveDate,
    pub address: String,
    pub membership_start_date: NaiveDate,
    pub membership_end_date: Option<NaiveDate>,
    pub is_active: bool,
}

impl From<Patron> for PatronResponse {
    fn from(patron: Patron) -> Self {
        let details = patron.details;
        Self {
            id: patron.id.value(),
            first_name: details.first_name,
            last_name: details.last_name,
            email: details.email,
            phone_number: details.phone_number,
            date_of_birth: details.date_of_birth,
            address: details.address,
            membership_start_date: details.membership_start_date,
            membership_end_date: details.membership_end_date,
            is_active: details.is_active,
        }
    }
}

// ============================================================================
// Loans
// ============================================================================

/// 貸出記録レスポンス
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanResponse {
    pub loan_id: i32,
    pub book_id: i32,
    pub patron_id: i32,
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: String,
}

impl From<Loan> for LoanResponse {
    fn from(loan: Loan) -> Self {
        Self {
            loan_id: loan.loan_id.value(),
            book_id: loan.book_id.value(),
            patron_id: loan.patron_id.value(),
            borrowed_at: loan.borrowed_at,
            returned_at: loan.returned_at,
            status: loan.status().as_str().to_string(),
        }
    }
}

/// 貸出・返却の成功レスポンス
#[derive(Debug, Serialize)]
pub struct LendingResponse {
    pub success: bool,
    pub errors: Vec<String>,
    pub loan: LoanResponse,
}

impl LendingResponse {
    pub fn ok(loan: Loan) -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            loan: LoanResponse::from(loan),
        }
    }
}

// ============================================================================
// Accounts
// ============================================================================

/// アカウント登録リクエスト
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

/// 8文字以上で、大文字・小文字・数字・記号をそれぞれ含むこと
fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let long_enough = password.chars().count() >= 8;
    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace());

    if long_enough && has_upper && has_lower && has_digit && has_symbol {
        Ok(())
    } else {
        Err(validation_error(
            "password",
            "Password must be at least 8 characters and contain an upper-case letter, \
             a lower-case letter, a digit and a symbol",
        ))
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub account_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            account_id: account.account_id.value(),
            email: account.email,
            role: account.role,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
}

impl From<IssuedToken> for TokenResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            token: issued.token,
            token_type: "Bearer",
            expires_at: issued.expires_at,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub code: String,
    pub errors: Vec<String>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            success: false,
            code: code.into(),
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book_request() -> BookRequest {
        BookRequest {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            publication_year: 1965,
            isbn: "9780441013593".to_string(),
        }
    }

    fn patron_request() -> PatronRequest {
        PatronRequest {
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

    #[test]
    fn test_valid_book_request_passes() {
        assert!(book_request().validate().is_ok());
    }

    #[test]
    fn test_book_request_collects_every_message() {
        let req = BookRequest {
            title: String::new(),
            isbn: "12345".to_string(),
            publication_year: 1700,
            ..book_request()
        };

        let errors = req.validate().unwrap_err();
        let messages = validation_messages(&errors);

        assert_eq!(messages.len(), 3);
        assert!(messages.iter().any(|m| m.starts_with("Title")));
        assert!(messages.iter().any(|m| m.starts_with("ISBN")));
        assert!(messages.iter().any(|m| m.starts_with("Publication year")));
    }

    #[test]
    fn test_whitespace_only_text_is_required() {
        let req = BookRequest {
            title: "   ".to_string(),
            author: "\t".to_string(),
            ..book_request()
        };

        let messages = validation_messages(&req.validate().unwrap_err());
        assert_eq!(
            messages,
            vec!["Author is required".to_string(), "Title is required".to_string()]
        );
    }

    #[test]
    fn test_blank_patron_names_and_address_are_required() {
        let req = PatronRequest {
            first_name: " ".to_string(),
            last_name: String::new(),
            address: "\n".to_string(),
            ..patron_request()
        };

        let messages = validation_messages(&req.validate().unwrap_err());
        assert_eq!(
            messages,
            vec![
                "Address is required".to_string(),
                "First name is required".to_string(),
                "Last name is required".to_string(),
            ]
        );
    }

    #[test]
    fn test_long_title_reports_length_only() {
        let req = BookRequest {
            title: "x".repeat(101),
            ..book_request()
        };

        let messages = validation_messages(&req.validate().unwrap_err());
        assert_eq!(messages, vec!["Title must be at most 100 characters".to_string()]);
    }

    #[test]
    fn test_isbn_accepts_ten_digits() {
        let req = BookRequest {
            isbn: "0441013597".to_string(),
            ..book_request()
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_valid_patron_request_passes() {
        assert!(patron_request().validate().is_ok());
    }

    #[test]
    fn test_patron_birth_date_must_be_in_the_past() {
        let req = PatronRequest {
            date_of_birth: Utc::now().date_naive(),
            ..patron_request()
        };

        let messages = validation_messages(&req.validate().unwrap_err());
        assert_eq!(messages, vec!["Date of birth must be in the past".to_string()]);
    }

    #[test]
    fn test_membership_end_before_start_is_rejected() {
        let req = PatronRequest {
            membership_end_date: NaiveDate::from_ymd_opt(2023, 12, 31),
            ..patron_request()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_every_patron_date_error_is_reported() {
        let req = PatronRequest {
            date_of_birth: NaiveDate::from_ymd_opt(2999, 1, 1).unwrap(),
            membership_start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            membership_end_date: NaiveDate::from_ymd_opt(2023, 1, 1),
            ..patron_request()
        };

        let messages = validation_messages(&req.validate().unwrap_err());
        assert_eq!(messages.len(), 2);
        assert!(messages.contains(&"Date of birth must be in the past".to_string()));
        assert!(messages.contains(&"Membership end date must not be before the start date".to_string()));
    }

    #[test]
    fn test_patron_phone_and_email_are_checked() {
        let req = PatronRequest {
            email: "not-an-email".to_string(),
            phone_number: "12-34".to_string(),
            ..patron_request()
        };

        let messages = validation_messages(&req.validate().unwrap_err());
        assert_eq!(
            messages,
            vec![
                "Invalid email format".to_string(),
                "Phone number must be exactly 10 digits".to_string(),
            ]
        );
    }

    #[test]
    fn test_password_strength() {
        assert!(validate_password_strength("Admin@123").is_ok());
        assert!(validate_password_strength("admin@123").is_err());
        assert!(validate_password_strength("ADMIN@123").is_err());
        assert!(validate_password_strength("Admin1234").is_err());
        assert!(validate_password_strength("Ad@1").is_err());
    }

    #[test]
    fn test_register_request_defaults_to_user_role() {
        let req: RegisterRequest =
            serde_json::from_str(r#"{"email":"a@example.com","password":"Admin@123"}"#).unwrap();
        assert_eq!(req.role, Role::User);
    }
}
