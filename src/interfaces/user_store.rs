//! User storage interface.

use async_trait::async_trait;

use super::Result;

/// Stored user row, password hash included.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: i64,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub created_at: String,
}

/// Fields for a new account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub address: String,
    pub created_at: String,
}

/// Interface for user persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    async fn find_by_id(&self, user_id: i64) -> Result<Option<UserRecord>>;

    /// Insert a user. Fails with `Conflict` when the email is taken.
    async fn create(&self, user: NewUser) -> Result<UserRecord>;

    /// Overwrite the stored address and phone number.
    ///
    /// Fails with `NotFound` when the user does not exist.
    async fn update_contact(&self, user_id: i64, address: &str, phone_number: &str) -> Result<()>;
}
