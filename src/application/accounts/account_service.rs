use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

use crate::application::ServiceDependencies;
use crate::domain::{AccountId, Role, account::Account};

use super::errors::{AccountError, Result};
use super::token::{Claims, IssuedToken};

/// アカウント登録の入力
#[derive(Debug, Clone)]
pub struct RegisterAccount {
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// emailは小文字に正規化して保存・照合する
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// 存在しないemailでのログイン時に照合するハッシュ
///
/// 登録済みかどうかで応答時間が変わらないよう、アカウントがなくても
/// 同じコストの検証を1回行う。
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_password("dummy-password-for-unknown-accounts").ok());

/// Argon2でパスワードをハッシュ化する
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AccountError::Internal(format!("Failed to hash password: {}", e)))
}

fn verify_password(password_hash: &str, password: &str) -> Result<bool> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|_| AccountError::Internal("Invalid password hash".to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// アカウントを登録する
///
/// ビジネスルール：
/// - emailは一意（大文字小文字を区別しない）
/// - Adminロールの登録には、呼び出し元がAdminであること
///
/// 入力値の形式（email形式、パスワード強度）はAPI層で検証済みの前提。
pub async fn register(
    deps: &ServiceDependencies,
    cmd: RegisterAccount,
    caller: Option<&Claims>,
    now: DateTime<Utc>,
) -> Result<Account> {
    if cmd.role == Role::Admin {
        match caller {
            Some(claims) => claims.require_role(Role::Admin)?,
            None => {
                return Err(AccountError::Forbidden(
                    "Admin role required to register an administrator".to_string(),
                ));
            }
        }
    }

    let email = normalize_email(&cmd.email);

    let existing = deps
        .account_repository
        .find_by_email(&email)
        .await
        .map_err(AccountError::PersistenceFailure)?;

    if existing.is_some() {
        return Err(AccountError::EmailTaken);
    }

    let account = Account {
        account_id: AccountId::new(),
        email,
        password_hash: hash_password(&cmd.password)?,
        role: cmd.role,
        created_at: now,
    };

    deps.account_repository
        .insert(&account)
        .await
        .map_err(|e| {
            // 同時登録で一意制約に負けた場合
            if e.is_conflict() {
                AccountError::EmailTaken
            } else {
                AccountError::PersistenceFailure(e)
            }
        })?;

    tracing::info!(email = %account.email, role = %account.role, "Account registered");
    Ok(account)
}

/// ログインしてトークンを発行する
pub async fn login(
    deps: &ServiceDependencies,
    email: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<IssuedToken> {
    let account = deps
        .account_repository
        .find_by_email(&normalize_email(email))
        .await
        .map_err(AccountError::PersistenceFailure)?;

    let Some(account) = account else {
        if let Some(dummy) = DUMMY_HASH.as_deref() {
            let _ = verify_password(dummy, password);
        }
        return Err(AccountError::InvalidCredentials);
    };

    if !verify_password(&account.password_hash, password)? {
        tracing::warn!(email = %account.email, "Login rejected: wrong password");
        return Err(AccountError::InvalidCredentials);
    }

    deps.token_issuer.issue(&account, now)
}

/// 管理者アカウントがなければ作成する（起動時のシード）
///
/// # 戻り値
/// 新しく作成した場合は`true`
pub async fn ensure_admin(
    deps: &ServiceDependencies,
    email: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<bool> {
    let email = normalize_email(email);

    let existing = deps
        .account_repository
        .find_by_email(&email)
        .await
        .map_err(AccountError::PersistenceFailure)?;

    if existing.is_some() {
        return Ok(false);
    }

    let account = Account {
        account_id: AccountId::new(),
        email,
        password_hash: hash_password(password)?,
        role: Role::Admin,
        created_at: now,
    };

    deps.account_repository
        .insert(&account)
        .await
        .map_err(AccountError::PersistenceFailure)?;

    tracing::info!(email = %account.email, "Seeded administrator account");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::accounts::TokenIssuer;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("Admin@123").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "Admin@123").unwrap());
        assert!(!verify_password(&hash, "admin@123").unwrap());
    }

    #[test]
    fn test_verify_password_rejects_malformed_hash() {
        let result = verify_password("not-a-hash", "whatever");
        assert!(matches!(result, Err(AccountError::Internal(_))));
    }

    #[test]
    fn test_dummy_hash_is_a_valid_hash_that_matches_nothing_submitted() {
        let dummy = DUMMY_HASH.as_deref().unwrap();

        assert!(dummy.starts_with("$argon2"));
        assert!(!verify_password(dummy, "Admin@123").unwrap());
        assert!(!verify_password(dummy, "").unwrap());
    }

    #[tokio::test]
    async fn test_login_with_unknown_email_is_invalid_credentials() {
        let store = std::sync::Arc::new(crate::adapters::memory::MemoryStore::new());
        let deps = ServiceDependencies {
            lending_store: store.clone(),
            loan_queries: store.clone(),
            book_repository: store.clone(),
            patron_repository: store.clone(),
            account_repository: store,
            token_issuer: std::sync::Arc::new(TokenIssuer::new("secret", "issuer", 1)),
        };

        let result = login(&deps, "nobody@example.com", "Admin@123", Utc::now()).await;
        assert!(matches!(result, Err(AccountError::InvalidCredentials)));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Admin@Example.COM "), "admin@example.com");
    }
}
