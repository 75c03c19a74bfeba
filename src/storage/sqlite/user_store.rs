//! SQLite implementation of UserStore.

use async_trait::async_trait;
use sea_query::{Expr, Query, SelectStatement, SqliteQueryBuilder};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;

use super::is_unique_violation;
use crate::interfaces::{NewUser, Result, StorageError, UserRecord, UserStore};
use crate::storage::schema::Users;

const EMAIL_TAKEN: &str = "Email already exists";

/// SQLite-backed user store.
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    /// Create a new SQLite user store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn select_user() -> SelectStatement {
        Query::select()
            .columns([
                Users::UserId,
                Users::Email,
                Users::Password,
                Users::FirstName,
                Users::LastName,
                Users::PhoneNumber,
                Users::Address,
                Users::CreatedAt,
            ])
            .from(Users::Table)
            .to_owned()
    }

    fn from_row(row: &SqliteRow) -> UserRecord {
        UserRecord {
            user_id: row.get("user_id"),
            email: row.get("email"),
            password_hash: row.get("password"),
            first_name: row.get("first_name"),
            last_name: row.get("last_name"),
            phone_number: row.get("phone_number"),
            address: row.get("address"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let query = Self::select_user()
            .and_where(Expr::col(Users::Email).eq(email))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        Ok(row.as_ref().map(Self::from_row))
    }

    async fn find_by_id(&self, user_id: i64) -> Result<Option<UserRecord>> {
        let query = Self::select_user()
            .and_where(Expr::col(Users::UserId).eq(user_id))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        Ok(row.as_ref().map(Self::from_row))
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord> {
        let query = Query::insert()
            .into_table(Users::Table)
            .columns([
                Users::Email,
                Users::Password,
                Users::FirstName,
                Users::LastName,
                Users::PhoneNumber,
                Users::Address,
                Users::CreatedAt,
            ])
            .values_panic([
                user.email.as_str().into(),
                user.password_hash.as_str().into(),
                user.first_name.as_str().into(),
                user.last_name.as_str().into(),
                user.phone_number.as_str().into(),
                user.address.as_str().into(),
                user.created_at.as_str().into(),
            ])
            .to_string(SqliteQueryBuilder);

        let user_id = match sqlx::query(&query).execute(&self.pool).await {
            Ok(result) => result.last_insert_rowid(),
            Err(e) if is_unique_violation(&e) => {
                return Err(StorageError::Conflict(EMAIL_TAKEN.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        info!(user_id, "user created");

        Ok(UserRecord {
            user_id,
            email: user.email,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            phone_number: Some(user.phone_number),
            address: Some(user.address),
            created_at: user.created_at,
        })
    }

    async fn update_contact(&self, user_id: i64, address: &str, phone_number: &str) -> Result<()> {
        let query = Query::update()
            .table(Users::Table)
            .values([
                (Users::Address, address.into()),
                (Users::PhoneNumber, phone_number.into()),
            ])
            .and_where(Expr::col(Users::UserId).eq(user_id))
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&query).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound("User not found".to_string()));
        }

        info!(user_id, "delivery contact updated");
        Ok(())
    }
}
