use crate::domain::{account::Account, value_objects::AccountId};
use crate::ports::{AccountRepository as AccountRepositoryTrait, Result, StoreError};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

fn map_row_to_account(row: &PgRow) -> Result<Account> {
    let role: String = row.try_get("role")?;

    Ok(Account {
        account_id: AccountId::from_uuid(row.try_get("account_id")?),
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: role.parse().map_err(StoreError::backend)?,
        created_at: row.try_get("created_at")?,
    })
}

/// AccountRepositoryのPostgreSQL実装
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepositoryTrait for AccountRepository {
    /// lower(email)の一意インデックスを使って照合する
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT account_id, email, password_hash, role, created_at
            FROM accounts
            WHERE lower(email) = lower($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_account).transpose()
    }

    async fn insert(&self, account: &Account) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (account_id, email, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(account.account_id.value())
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
