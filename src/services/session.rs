use tower_cookies::cookie::SameSite;
use tower_cookies::cookie::time::Duration;
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use crate::{
    config::Config,
    crypto::csrf,
    error::Result,
    models::session::{FlashLevel, SessionRecord, SessionState},
    state::AppState,
};

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "session_id";

/// A loaded session and the id it is stored under.
#[derive(Clone, Debug)]
pub struct ActiveSession {
    pub id: Uuid,
    pub record: SessionRecord,
}

/// Creates the session cookie for `session_id`.
fn session_cookie(session_id: Uuid, config: &Config) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, session_id.to_string());

    cookie.set_http_only(true);
    if config.secure_cookies {
        cookie.set_secure(true);
    }
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(Duration::hours(config.session_duration_hours));
    cookie.set_path("/");

    cookie
}

/// Extracts the session id from the request cookies.
fn extract_session_id(cookies: &Cookies) -> Option<Uuid> {
    cookies
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

/// Loads the caller's session, if the cookie names a live one.
pub async fn load(state: &AppState, cookies: &Cookies) -> Result<Option<ActiveSession>> {
    let Some(id) = extract_session_id(cookies) else {
        return Ok(None);
    };

    let record = state.sessions.load(id).await?;
    if record.is_none() {
        tracing::debug!("🔑 Unknown or expired session: {}", id);
    }
    Ok(record.map(|record| ActiveSession { id, record }))
}

/// Starts a fresh session in `session_state` and points the cookie at it.
pub async fn start(
    state: &AppState,
    cookies: &Cookies,
    session_state: SessionState,
) -> Result<ActiveSession> {
    let id = Uuid::new_v4();
    let record = SessionRecord::new(
        session_state,
        csrf::generate_csrf_token(),
        chrono::Duration::hours(state.config.session_duration_hours),
    );

    state.sessions.save(id, &record).await?;
    cookies.add(session_cookie(id, &state.config));
    tracing::debug!("🔑 Session started: {}", id);

    Ok(ActiveSession { id, record })
}

/// Loads the caller's session, starting an anonymous one if there is none.
pub async fn load_or_start(state: &AppState, cookies: &Cookies) -> Result<ActiveSession> {
    match load(state, cookies).await? {
        Some(session) => Ok(session),
        None => start(state, cookies, SessionState::Anonymous).await,
    }
}

/// Replaces `session.record` with what is currently stored under its id.
///
/// Keeps the in-hand record if the stored one is gone.
pub async fn refresh(state: &AppState, session: &mut ActiveSession) -> Result<()> {
    if let Some(record) = state.sessions.load(session.id).await? {
        session.record = record;
    }
    Ok(())
}

pub async fn save(state: &AppState, session: &ActiveSession) -> Result<()> {
    state.sessions.save(session.id, &session.record).await
}

pub async fn destroy(state: &AppState, session: &ActiveSession) -> Result<()> {
    state.sessions.delete(session.id).await?;
    tracing::debug!("🔑 Session destroyed: {}", session.id);
    Ok(())
}

/// Queues a flash message on the caller's session.
pub async fn flash(
    state: &AppState,
    cookies: &Cookies,
    level: FlashLevel,
    message: impl Into<String>,
) -> Result<()> {
    let mut session = load_or_start(state, cookies).await?;
    session.record.push_flash(level, message);
    save(state, &session).await
}
