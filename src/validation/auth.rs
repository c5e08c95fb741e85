use garde::Validate;
use serde::Deserialize;

use crate::error::{AppError, Result};

/// The registration and login form.
#[derive(Deserialize, Validate, Debug)]
pub struct Credentials {
    #[garde(email)]
    #[serde(default)]
    pub email: String,
    #[garde(length(min = 1, max = 128))]
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    /// Trims surrounding whitespace from the email.
    pub fn normalized(mut self) -> Self {
        self.email = self.email.trim().to_string();
        self
    }
}

/// Validates a registration form.
///
/// # Returns
///
/// A `Result<()>` whose error lists every invalid field.
pub fn validate_registration(credentials: &Credentials) -> Result<()> {
    credentials.validate().map_err(|report| {
        let reasons: Vec<String> = report
            .iter()
            .map(|(path, error)| format!("{}: {}", path, error))
            .collect();
        AppError::Validation(reasons.join("; "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn accepts_a_plain_address_and_short_password() {
        assert!(validate_registration(&credentials("a@x.com", "pw1")).is_ok());
    }

    #[test]
    fn rejects_malformed_email() {
        let err = validate_registration(&credentials("not-an-email", "pw1")).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("email")));
    }

    #[test]
    fn rejects_empty_and_oversized_passwords() {
        assert!(validate_registration(&credentials("a@x.com", "")).is_err());
        assert!(validate_registration(&credentials("a@x.com", &"p".repeat(129))).is_err());
    }

    #[test]
    fn normalizing_trims_the_email() {
        let trimmed = credentials("  a@x.com\n", "pw1").normalized();
        assert_eq!(trimmed.email, "a@x.com");
    }
}
