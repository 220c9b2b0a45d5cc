//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use platter_core::{Email, UserId};

/// A registered user.
///
/// The password hash never leaves the server: it is skipped on
/// serialization.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email, unique across users.
    pub email: Email,
    /// Argon2id PHC string.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Default delivery address.
    pub address: Option<String>,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Avatar URL (set by Google sign-in).
    pub profile_picture: Option<String>,
    /// Whether the user holds the admin capability.
    pub is_admin: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// Data required to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub password_hash: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub profile_picture: Option<String>,
    pub is_admin: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_is_not_serialized() {
        let user = User {
            id: UserId::new(7),
            name: "Ada".to_owned(),
            email: Email::parse("ada@example.com").unwrap(),
            password_hash: "$argon2id$v=19$secret".to_owned(),
            address: None,
            phone: None,
            profile_picture: None,
            is_admin: false,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["isAdmin"], false);
        assert_eq!(json["email"], "ada@example.com");
    }
}
