use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use tower_cookies::Cookies;

use crate::{
    error::{AppError, Result},
    models::session::{FlashLevel, SessionState},
    services::{auth as auth_service, session as session_service},
    state::AppState,
    validation::auth::{Credentials, validate_registration},
    views::{Empty, render_public},
};

/// Body of the login page; echoes the email after a failed attempt.
#[derive(Serialize, Default)]
struct LoginBody {
    email: String,
}

/// Shows the registration form.
#[axum::debug_handler]
pub async fn register_page(State(state): State<AppState>, cookies: Cookies) -> Result<Response> {
    render_public(&state, &cookies, "register", "Register", Empty {}).await
}

/// Handles user registration.
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<Credentials>,
) -> Result<Response> {
    let credentials = form.normalized();
    tracing::info!("📝 Register attempt: {}", credentials.email);

    if let Err(AppError::Validation(reason)) = validate_registration(&credentials) {
        session_service::flash(&state, &cookies, FlashLevel::Error, reason).await?;
        return Ok(Redirect::to("/register").into_response());
    }

    let outcome = auth_service::register(
        state.users.as_ref(),
        state.config.password_scheme,
        &credentials.email,
        &credentials.password,
    )
    .await;

    let (level, message) = match outcome {
        Ok(_) => (FlashLevel::Info, "Account created! Please login."),
        Err(AppError::AlreadyExists) => (FlashLevel::Error, "Account already exists."),
        Err(e) => return Err(e),
    };

    session_service::flash(&state, &cookies, level, message).await?;
    Ok(Redirect::to("/login").into_response())
}

/// Shows the login form.
#[axum::debug_handler]
pub async fn login_page(State(state): State<AppState>, cookies: Cookies) -> Result<Response> {
    render_public(&state, &cookies, "login", "Log in", LoginBody::default()).await
}

/// Handles user login.
///
/// A successful login always starts a new session id.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<Credentials>,
) -> Result<Response> {
    let credentials = form.normalized();
    tracing::info!("🔐 Login attempt: {}", credentials.email);

    match auth_service::authenticate(
        state.users.as_ref(),
        &credentials.email,
        &credentials.password,
    )
    .await
    {
        Ok(user) => {
            if let Some(previous) = session_service::load(&state, &cookies).await? {
                session_service::destroy(&state, &previous).await?;
            }
            session_service::start(&state, &cookies, SessionState::logged_in(user.email)).await?;
            Ok(Redirect::to("/home").into_response())
        }
        Err(AppError::InvalidCredentials) => {
            session_service::flash(
                &state,
                &cookies,
                FlashLevel::Error,
                "Invalid email or password.",
            )
            .await?;
            let body = LoginBody {
                email: credentials.email,
            };
            render_public(&state, &cookies, "login", "Log in", body).await
        }
        Err(e) => Err(e),
    }
}

/// Handles user logout.
///
/// The whole session is dropped; a fresh anonymous one only carries the
/// goodbye message.
#[axum::debug_handler]
pub async fn logout(State(state): State<AppState>, cookies: Cookies) -> Result<Response> {
    if let Some(session) = session_service::load(&state, &cookies).await? {
        tracing::info!(
            "👋 Logout for user: {}",
            session.record.state.identity().unwrap_or("anonymous")
        );
        session_service::destroy(&state, &session).await?;
    }

    let mut farewell = session_service::start(&state, &cookies, SessionState::Anonymous).await?;
    farewell
        .record
        .push_flash(FlashLevel::Info, "You have been logged out.");
    session_service::save(&state, &farewell).await?;

    Ok(Redirect::to("/").into_response())
}
