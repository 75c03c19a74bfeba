//! Account signup, login and profile lookup.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{hash_password, verify_password, AuthError, TokenSigner};
use crate::error::{AppError, Result};
use crate::interfaces::{NewUser, UserRecord, UserStore};

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl SignupRequest {
    fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.email.trim().is_empty() {
            problems.push("email should not be empty");
        }
        if self.password.chars().count() < 6 {
            problems.push("password must be longer than or equal to 6 characters");
        }
        if self.phone_number.chars().count() < 6 {
            problems.push("phone_number must be longer than or equal to 6 characters");
        }
        if self.address.chars().count() < 10 {
            problems.push("address must be longer than or equal to 10 characters");
        }
        if self.first_name.trim().is_empty() {
            problems.push("first_name should not be empty");
        }
        if self.last_name.trim().is_empty() {
            problems.push("last_name should not be empty");
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(problems.join("; ")))
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Account as shown to its owner. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserView {
    pub user_id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub created_at: String,
}

impl From<UserRecord> for UserView {
    fn from(user: UserRecord) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone_number: user.phone_number,
            address: user.address,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub access_token: String,
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    signer: TokenSigner,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, signer: TokenSigner) -> Self {
        Self { users, signer }
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    pub async fn signup(&self, request: SignupRequest) -> Result<UserView> {
        request.validate()?;

        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let password_hash = hash_password(request.password).await?;
        let user = self
            .users
            .create(NewUser {
                email: request.email,
                password_hash,
                first_name: request.first_name,
                last_name: request.last_name,
                phone_number: request.phone_number,
                address: request.address,
                created_at: chrono::Utc::now().to_rfc3339(),
            })
            .await?;

        Ok(user.into())
    }

    /// Exchange credentials for a bearer token.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, request: LoginRequest) -> Result<AccessToken> {
        let Some(user) = self.users.find_by_email(&request.email).await? else {
            return Err(AuthError::InvalidCredentials.into());
        };

        if !verify_password(request.password, user.password_hash).await? {
            return Err(AuthError::InvalidCredentials.into());
        }

        let access_token = self.signer.issue(user.user_id, &user.email)?;
        info!(user_id = user.user_id, "user logged in");

        Ok(AccessToken { access_token })
    }

    pub async fn profile(&self, user_id: i64) -> Result<UserView> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(UserView::from)
            .ok_or_else(|| AppError::not_found("User not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::memory_stores;

    fn signup_request(email: &str) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            password: "secret123".to_string(),
            phone_number: "0901234567".to_string(),
            address: "12 Nguyen Hue, District 1".to_string(),
            first_name: "Lan".to_string(),
            last_name: "Tran".to_string(),
        }
    }

    async fn service() -> AuthService {
        let (_pool, stores) = memory_stores().await;
        AuthService::new(stores.users, TokenSigner::new("test-secret", 3600))
    }

    #[tokio::test]
    async fn test_signup_login_profile() {
        let service = service().await;

        let user = service.signup(signup_request("lan@example.com")).await.unwrap();
        assert_eq!(user.email, "lan@example.com");
        assert_eq!(user.first_name, "Lan");

        let token = service
            .login(LoginRequest {
                email: "lan@example.com".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .unwrap();
        let claims = service.signer().verify(&token.access_token).unwrap();
        assert_eq!(claims.sub, user.user_id);

        let profile = service.profile(claims.sub).await.unwrap();
        assert_eq!(profile, user);

        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let service = service().await;
        service.signup(signup_request("dup@example.com")).await.unwrap();

        assert!(matches!(
            service.signup(signup_request("dup@example.com")).await,
            Err(AppError::Conflict(ref m)) if m == "Email already exists"
        ));
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let service = service().await;

        let mut short_address = signup_request("a@example.com");
        short_address.address = "Hanoi".to_string();
        assert!(matches!(
            service.signup(short_address).await,
            Err(AppError::Validation(ref m)) if m.contains("address")
        ));

        let mut short_password = signup_request("a@example.com");
        short_password.password = "12345".to_string();
        assert!(matches!(
            service.signup(short_password).await,
            Err(AppError::Validation(_))
        ));

        let mut no_name = signup_request("a@example.com");
        no_name.last_name = "  ".to_string();
        assert!(matches!(
            service.signup(no_name).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let service = service().await;
        service.signup(signup_request("lan@example.com")).await.unwrap();

        for (email, password) in [
            ("lan@example.com", "wrong-pass"),
            ("nobody@example.com", "secret123"),
        ] {
            let result = service
                .login(LoginRequest {
                    email: email.to_string(),
                    password: password.to_string(),
                })
                .await;
            assert!(matches!(result, Err(AppError::Auth(ref m)) if m == "Invalid credentials"));
        }
    }

    #[tokio::test]
    async fn test_profile_of_missing_user() {
        let service = service().await;
        assert!(matches!(service.profile(42).await, Err(AppError::NotFound(_))));
    }
}
