use crate::domain::{
    patron::{Patron, PatronDetails},
    value_objects::PatronId,
};
use crate::ports::{PatronRepository as PatronRepositoryTrait, Result, StoreError};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

/// PostgreSQLの行データをPatronに変換する
pub(crate) fn map_row_to_patron(row: &PgRow) -> Result<Patron> {
    let id: i32 = row.try_get("id")?;

    Ok(Patron {
        id: PatronId::new(i64::from(id)).map_err(StoreError::backend)?,
        details: PatronDetails {
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
            phone_number: row.try_get("phone_number")?,
            date_of_birth: row.try_get("date_of_birth")?,
            address: row.try_get("address")?,
            membership_start_date: row.try_get("membership_start_date")?,
            membership_end_date: row.try_get("membership_end_date")?,
            is_active: row.try_get("is_active")?,
        },
    })
}

/// PatronRepositoryのPostgreSQL実装
pub struct PatronRepository {
    pool: PgPool,
}

impl PatronRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PatronRepositoryTrait for PatronRepository {
    async fn list(&self) -> Result<Vec<Patron>> {
        let rows = sqlx::query(
            r#"
            SELECT
                id,
                first_name,
                last_name,
                email,
                phone_number,
                date_of_birth,
                address,
                membership_start_date,
                membership_end_date,
                is_active
            FROM patrons
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_patron).collect()
    }

    async fn find_by_id(&self, patron_id: PatronId) -> Result<Option<Patron>> {
        let row = sqlx::query(
            r#"
            SELECT
                id,
                first_name,
                last_name,
                email,
                phone_number,
                date_of_birth,
                address,
                membership_start_date,
                membership_end_date,
                is_active
            FROM patrons
            WHERE id = $1
            "#,
        )
        .bind(patron_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_patron).transpose()
    }

    async fn insert(&self, details: PatronDetails) -> Result<Patron> {
        let row = sqlx::query(
            r#"
            INSERT INTO patrons (
                first_name,
                last_name,
                email,
                phone_number,
                date_of_birth,
                address,
                membership_start_date,
                membership_end_date,
                is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING
                id,
                first_name,
                last_name,
                email,
                phone_number,
                date_of_birth,
                address,
                membership_start_date,
                membership_end_date,
                is_active
            "#,
        )
        .bind(&details.first_name)
        .bind(&details.last_name)
        .bind(&details.email)
        .bind(&details.phone_number)
        .bind(details.date_of_birth)
        .bind(&details.address)
        .bind(details.membership_start_date)
        .bind(details.membership_end_date)
        .bind(details.is_active)
        .fetch_one(&self.pool)
        .await?;

        map_row_to_patron(&row)
    }

    async fn update(&self, patron: &Patron) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE patrons
            SET
                first_name = $2,
                last_name = $3,
                email = $4,
                phone_number = $5,
                date_of_birth = $6,
                address = $7,
                membership_start_date = $8,
                membership_end_date = $9,
                is_active = $10
            WHERE id = $1
            "#,
        )
        .bind(patron.id.value())
        .bind(&patron.first_name)
        .bind(&patron.last_name)
        .bind(&patron.email)
        .bind(&patron.phone_number)
        .bind(patron.date_of_birth)
        .bind(&patron.address)
        .bind(patron.membership_start_date)
        .bind(patron.membership_end_date)
        .bind(patron.is_active)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, patron_id: PatronId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM patrons WHERE id = $1")
            .bind(patron_id.value())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
