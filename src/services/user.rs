//! User service
//!
//! Implements business logic for accounts and authentication:
//! - Signup with credential validation and duplicate checks
//! - Signin with password verification
//! - OAuth-federated signin (provisions an account on first contact)
//! - Profile update and account deletion, owner only

use crate::db::repositories::UserRepository;
use crate::models::{UpdateUserInput, User};
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use std::sync::Arc;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// User already exists
    #[error("User already exists: {0}")]
    UserExists(String),

    /// Caller is not the account owner
    #[error("You can only manage your own account")]
    Forbidden,

    /// User not found
    #[error("User not found")]
    NotFound,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Signup input
#[derive(Debug, Deserialize)]
pub struct SignupInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Signin input
#[derive(Debug, Deserialize)]
pub struct SigninInput {
    pub email: String,
    pub password: String,
}

/// OAuth-federated signin input (profile asserted by the provider)
#[derive(Debug, Deserialize)]
pub struct GoogleInput {
    pub name: String,
    pub email: String,
    pub photo: Option<String>,
}

/// User service for account management and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
}

impl UserService {
    /// Create a new user service
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    /// Register a new account
    ///
    /// # Errors
    ///
    /// - `ValidationError` if a field is empty or malformed
    /// - `UserExists` if the username or email is already taken
    /// - `InternalError` for database errors
    pub async fn signup(&self, input: SignupInput) -> Result<User, UserServiceError> {
        validate_username(&input.username)?;
        validate_email(&input.email)?;
        validate_password(&input.password)?;

        self.ensure_username_free(&input.username).await?;
        self.ensure_email_free(&input.email).await?;

        let password_hash =
            hash_password(&input.password).context("Failed to hash password")?;
        let user = User::new(input.username, input.email, password_hash);

        let created = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;

        tracing::info!(user_id = created.id, username = %created.username, "User signed up");
        Ok(created)
    }

    /// Authenticate with email and password.
    ///
    /// Unknown emails and wrong passwords return the same error so the
    /// response does not reveal which accounts exist.
    pub async fn signin(&self, input: SigninInput) -> Result<User, UserServiceError> {
        let user = self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to look up user")?
            .ok_or_else(|| {
                UserServiceError::AuthenticationError("Invalid credentials".to_string())
            })?;

        let valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;
        if !valid {
            return Err(UserServiceError::AuthenticationError(
                "Invalid credentials".to_string(),
            ));
        }

        tracing::info!(user_id = user.id, "User signed in");
        Ok(user)
    }

    /// Sign in with a provider-asserted profile.
    ///
    /// An existing account with the same email signs straight in.
    /// Otherwise an account is provisioned with a username derived from
    /// the display name plus a random suffix, and a random password the
    /// user never sees (they can set one later via profile update).
    pub async fn google(&self, input: GoogleInput) -> Result<User, UserServiceError> {
        validate_email(&input.email)?;

        if let Some(existing) = self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to look up user")?
        {
            tracing::info!(user_id = existing.id, "Federated sign-in for existing user");
            return Ok(existing);
        }

        let username = derive_username(&input.name);
        let password: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();
        let password_hash = hash_password(&password).context("Failed to hash password")?;

        let mut user = User::new(username, input.email, password_hash);
        user.avatar = input.photo;

        let created = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to provision user")?;

        tracing::info!(user_id = created.id, "Provisioned account via federated sign-in");
        Ok(created)
    }

    /// Get a user by ID
    pub async fn get(&self, id: i64) -> Result<User, UserServiceError> {
        self.user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user")?
            .ok_or(UserServiceError::NotFound)
    }

    /// Update a profile. Only the account owner may do this.
    ///
    /// Uniqueness is re-checked when the username or email changes; a
    /// new password is re-hashed before storage.
    pub async fn update_profile(
        &self,
        caller_id: i64,
        target_id: i64,
        input: UpdateUserInput,
    ) -> Result<User, UserServiceError> {
        if caller_id != target_id {
            return Err(UserServiceError::Forbidden);
        }

        let mut user = self.get(target_id).await?;

        if let Some(username) = input.username {
            if username != user.username {
                validate_username(&username)?;
                self.ensure_username_free(&username).await?;
                user.username = username;
            }
        }

        if let Some(email) = input.email {
            if email != user.email {
                validate_email(&email)?;
                self.ensure_email_free(&email).await?;
                user.email = email;
            }
        }

        if let Some(password) = input.password {
            validate_password(&password)?;
            user.password_hash =
                hash_password(&password).context("Failed to hash password")?;
        }

        if let Some(avatar) = input.avatar {
            user.avatar = Some(avatar);
        }

        let updated = self
            .user_repo
            .update(&user)
            .await
            .context("Failed to update user")?;

        tracing::info!(user_id = updated.id, "Profile updated");
        Ok(updated)
    }

    /// Delete an account. Only the account owner may do this.
    ///
    /// The owner's listings go with it via the foreign key cascade.
    pub async fn delete_account(
        &self,
        caller_id: i64,
        target_id: i64,
    ) -> Result<(), UserServiceError> {
        if caller_id != target_id {
            return Err(UserServiceError::Forbidden);
        }

        // 404 before delete so a repeat request is distinguishable
        self.get(target_id).await?;

        self.user_repo
            .delete(target_id)
            .await
            .context("Failed to delete user")?;

        tracing::info!(user_id = target_id, "Account deleted");
        Ok(())
    }

    async fn ensure_username_free(&self, username: &str) -> Result<(), UserServiceError> {
        if self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Username '{}' is already taken",
                username
            )));
        }
        Ok(())
    }

    async fn ensure_email_free(&self, email: &str) -> Result<(), UserServiceError> {
        if self
            .user_repo
            .get_by_email(email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Email '{}' is already registered",
                email
            )));
        }
        Ok(())
    }
}

fn validate_username(username: &str) -> Result<(), UserServiceError> {
    if username.trim().is_empty() {
        return Err(UserServiceError::ValidationError(
            "Username cannot be empty".to_string(),
        ));
    }
    if username.len() > 30 {
        return Err(UserServiceError::ValidationError(
            "Username cannot exceed 30 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), UserServiceError> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err(UserServiceError::ValidationError(
            "A valid email address is required".to_string(),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), UserServiceError> {
    if password.len() < 6 {
        return Err(UserServiceError::ValidationError(
            "Password must be at least 6 characters".to_string(),
        ));
    }
    Ok(())
}

/// Derive a username from a display name: lowercase, spaces removed,
/// with a random suffix to dodge collisions.
fn derive_username(name: &str) -> String {
    let base: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    let base = if base.is_empty() { "user".to_string() } else { base };

    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(4)
        .map(char::from)
        .collect::<String>()
        .to_lowercase();

    format!("{}{}", base, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxUserRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> UserService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        UserService::new(SqlxUserRepository::boxed(pool))
    }

    fn signup_input(username: &str, email: &str) -> SignupInput {
        SignupInput {
            username: username.to_string(),
            email: email.to_string(),
            password: "secret123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_signup_creates_user() {
        let service = setup().await;
        let user = service
            .signup(signup_input("alice", "alice@example.com"))
            .await
            .expect("Signup should succeed");

        assert_eq!(user.username, "alice");
        assert!(user.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_signup_rejects_duplicate_username() {
        let service = setup().await;
        service
            .signup(signup_input("alice", "alice@example.com"))
            .await
            .expect("First signup should succeed");

        let result = service
            .signup(signup_input("alice", "other@example.com"))
            .await;
        assert!(matches!(result, Err(UserServiceError::UserExists(_))));
    }

    #[tokio::test]
    async fn test_signup_rejects_duplicate_email() {
        let service = setup().await;
        service
            .signup(signup_input("alice", "alice@example.com"))
            .await
            .expect("First signup should succeed");

        let result = service
            .signup(signup_input("bob", "alice@example.com"))
            .await;
        assert!(matches!(result, Err(UserServiceError::UserExists(_))));
    }

    #[tokio::test]
    async fn test_signup_rejects_short_password() {
        let service = setup().await;
        let result = service
            .signup(SignupInput {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password: "abc".to_string(),
            })
            .await;
        assert!(matches!(result, Err(UserServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_signin_success() {
        let service = setup().await;
        service
            .signup(signup_input("alice", "alice@example.com"))
            .await
            .expect("Signup should succeed");

        let user = service
            .signin(SigninInput {
                email: "alice@example.com".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .expect("Signin should succeed");
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn test_signin_wrong_password() {
        let service = setup().await;
        service
            .signup(signup_input("alice", "alice@example.com"))
            .await
            .expect("Signup should succeed");

        let result = service
            .signin(SigninInput {
                email: "alice@example.com".to_string(),
                password: "wrong-password".to_string(),
            })
            .await;
        assert!(matches!(
            result,
            Err(UserServiceError::AuthenticationError(_))
        ));
    }

    #[tokio::test]
    async fn test_signin_unknown_email_same_error() {
        let service = setup().await;
        let result = service
            .signin(SigninInput {
                email: "nobody@example.com".to_string(),
                password: "whatever".to_string(),
            })
            .await;
        assert!(matches!(
            result,
            Err(UserServiceError::AuthenticationError(_))
        ));
    }

    #[tokio::test]
    async fn test_google_provisions_account() {
        let service = setup().await;
        let user = service
            .google(GoogleInput {
                name: "Grace Hopper".to_string(),
                email: "grace@example.com".to_string(),
                photo: Some("https://img.example/grace.jpg".to_string()),
            })
            .await
            .expect("Federated signin should succeed");

        assert!(user.username.starts_with("gracehopper"));
        assert_eq!(user.avatar.as_deref(), Some("https://img.example/grace.jpg"));
    }

    #[tokio::test]
    async fn test_google_reuses_existing_account() {
        let service = setup().await;
        let first = service
            .signup(signup_input("alice", "alice@example.com"))
            .await
            .expect("Signup should succeed");

        let again = service
            .google(GoogleInput {
                name: "Alice Elsewhere".to_string(),
                email: "alice@example.com".to_string(),
                photo: None,
            })
            .await
            .expect("Federated signin should succeed");

        assert_eq!(again.id, first.id);
        assert_eq!(again.username, "alice");
    }

    #[tokio::test]
    async fn test_update_profile_owner_only() {
        let service = setup().await;
        let alice = service
            .signup(signup_input("alice", "alice@example.com"))
            .await
            .expect("Signup should succeed");

        let result = service
            .update_profile(
                alice.id + 1,
                alice.id,
                UpdateUserInput {
                    username: Some("intruder".to_string()),
                    email: None,
                    password: None,
                    avatar: None,
                },
            )
            .await;
        assert!(matches!(result, Err(UserServiceError::Forbidden)));
    }

    #[tokio::test]
    async fn test_update_profile_changes_fields() {
        let service = setup().await;
        let alice = service
            .signup(signup_input("alice", "alice@example.com"))
            .await
            .expect("Signup should succeed");

        let updated = service
            .update_profile(
                alice.id,
                alice.id,
                UpdateUserInput {
                    username: Some("alice2".to_string()),
                    email: None,
                    password: Some("new-password".to_string()),
                    avatar: Some("https://img.example/a.png".to_string()),
                },
            )
            .await
            .expect("Update should succeed");

        assert_eq!(updated.username, "alice2");
        assert_eq!(updated.avatar.as_deref(), Some("https://img.example/a.png"));

        // New password works, old one does not
        let signin = service
            .signin(SigninInput {
                email: "alice@example.com".to_string(),
                password: "new-password".to_string(),
            })
            .await;
        assert!(signin.is_ok());
    }

    #[tokio::test]
    async fn test_update_profile_rejects_taken_username() {
        let service = setup().await;
        service
            .signup(signup_input("alice", "alice@example.com"))
            .await
            .expect("Signup should succeed");
        let bob = service
            .signup(signup_input("bob", "bob@example.com"))
            .await
            .expect("Signup should succeed");

        let result = service
            .update_profile(
                bob.id,
                bob.id,
                UpdateUserInput {
                    username: Some("alice".to_string()),
                    email: None,
                    password: None,
                    avatar: None,
                },
            )
            .await;
        assert!(matches!(result, Err(UserServiceError::UserExists(_))));
    }

    #[tokio::test]
    async fn test_delete_account() {
        let service = setup().await;
        let alice = service
            .signup(signup_input("alice", "alice@example.com"))
            .await
            .expect("Signup should succeed");

        service
            .delete_account(alice.id, alice.id)
            .await
            .expect("Delete should succeed");

        let result = service.get(alice.id).await;
        assert!(matches!(result, Err(UserServiceError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_account_owner_only() {
        let service = setup().await;
        let alice = service
            .signup(signup_input("alice", "alice@example.com"))
            .await
            .expect("Signup should succeed");

        let result = service.delete_account(alice.id + 1, alice.id).await;
        assert!(matches!(result, Err(UserServiceError::Forbidden)));
    }

    #[test]
    fn test_derive_username_strips_and_suffixes() {
        let name = derive_username("Grace Hopper");
        assert!(name.starts_with("gracehopper"));
        assert_eq!(name.len(), "gracehopper".len() + 4);

        let fallback = derive_username("   ");
        assert!(fallback.starts_with("user"));
    }
}
