use crate::crypto::password::{self, PasswordScheme};
use crate::error::{AppError, Result};
use crate::models::user::User;
use crate::repositories::user::CredentialStore;

/// Registers a new user.
///
/// # Arguments
///
/// * `users` - The credential store.
/// * `scheme` - The digest applied to the password.
/// * `email` - The user's email address, used as the key.
/// * `password` - The user's password.
///
/// # Returns
///
/// The created `User`, or `AppError::AlreadyExists` if the email is taken.
pub async fn register(
    users: &dyn CredentialStore,
    scheme: PasswordScheme,
    email: &str,
    password: &str,
) -> Result<User> {
    tracing::debug!("🔐 Registering user: {}", email);

    let user = User::new(email.to_string(), password::digest(scheme, password)?);

    if !users.insert_if_absent(&user).await? {
        tracing::info!("Registration refused, account exists: {}", email);
        return Err(AppError::AlreadyExists);
    }

    tracing::info!("✅ User registered: {}", user.email);
    Ok(user)
}

/// Authenticates a user.
///
/// Unknown emails and wrong passwords both yield
/// `AppError::InvalidCredentials`.
pub async fn authenticate(
    users: &dyn CredentialStore,
    email: &str,
    password: &str,
) -> Result<User> {
    tracing::debug!("🔐 Authenticating user: {}", email);

    let user = users
        .find_by_email(email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !password::verify(password, &user.password_digest)? {
        return Err(AppError::InvalidCredentials);
    }

    tracing::info!("✅ User authenticated: {}", user.email);
    Ok(user)
}
