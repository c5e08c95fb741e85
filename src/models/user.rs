use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account.
///
/// Records are created once at registration and never mutated afterwards;
/// the email is the store key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The user's email address, unique across the credential store.
    pub email: String,
    /// One-way digest of the password (hex SHA-256 or an Argon2 PHC string).
    pub password_digest: String,
    /// The timestamp when the user registered.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a new `User` registered now.
    pub fn new(email: String, password_digest: String) -> Self {
        Self {
            email,
            password_digest,
            created_at: Utc::now(),
        }
    }
}
