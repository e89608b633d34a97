//! User model
//!
//! Defines the User entity: account identity, credentials, and the
//! avatar reference shown on the profile page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User entity representing a registered account.
///
/// The password is stored only as an Argon2id hash and is never
/// serialized into API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// Email address (unique)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Avatar URL reference
    pub avatar: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with the given parameters.
    ///
    /// The password must already be hashed; use
    /// `services::password::hash_password()`.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            username,
            email,
            password_hash,
            avatar: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether this user owns the given resource.
    ///
    /// Accounts and listings may only be modified by their owner.
    pub fn owns(&self, owner_id: i64) -> bool {
        self.id == owner_id
    }
}

/// Input for updating a user profile.
///
/// All fields are optional; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserInput {
    /// New username (optional)
    pub username: Option<String>,
    /// New email (optional)
    pub email: Option<String>,
    /// New password (optional, will be hashed)
    pub password: Option<String>,
    /// New avatar URL (optional)
    pub avatar: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_new() {
        let user = User::new(
            "testuser".to_string(),
            "test@example.com".to_string(),
            "hashed_password".to_string(),
        );

        assert_eq!(user.id, 0);
        assert_eq!(user.username, "testuser");
        assert_eq!(user.email, "test@example.com");
        assert!(user.avatar.is_none());
    }

    #[test]
    fn test_user_owns() {
        let mut user = User::new(
            "owner".to_string(),
            "owner@test.com".to_string(),
            "hash".to_string(),
        );
        user.id = 7;

        assert!(user.owns(7));
        assert!(!user.owns(8));
        assert!(!user.owns(0));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::new(
            "secret".to_string(),
            "secret@test.com".to_string(),
            "super_secret_hash".to_string(),
        );

        let json = serde_json::to_string(&user).expect("Failed to serialize user");
        assert!(!json.contains("super_secret_hash"));
        assert!(json.contains("secret@test.com"));
    }

    #[test]
    fn test_user_wire_shape_is_camel_case() {
        let user = User::new(
            "wire".to_string(),
            "wire@test.com".to_string(),
            "hash".to_string(),
        );

        let json = serde_json::to_value(&user).expect("Failed to serialize user");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("created_at").is_none());
        assert!(json.get("passwordHash").is_none());
    }
}
