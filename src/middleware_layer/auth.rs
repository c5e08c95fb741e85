use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_cookies::Cookies;

use crate::{
    models::session::{FlashLevel, FlowError},
    services::session as session_service,
    state::AppState,
};

/// A middleware that requires an authenticated session.
///
/// Anonymous, expired or unknown sessions are redirected to the login page
/// with a flash message; otherwise the `ActiveSession` is inserted into the
/// request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Response {
    tracing::debug!("🔐 Checking authentication...");

    let session = match session_service::load(&state, &cookies).await {
        Ok(session) => session,
        Err(e) => return e.into_response(),
    };

    match session {
        Some(session) if session.record.state.identity().is_some() => {
            tracing::debug!(
                "✅ User authenticated: {}",
                session.record.state.identity().unwrap_or_default()
            );
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        _ => {
            tracing::debug!("❌ No authenticated session for {}", request.uri().path());
            let error = FlowError::Unauthenticated;
            match session_service::flash(&state, &cookies, FlashLevel::Error, error.to_string())
                .await
            {
                Ok(()) => Redirect::to(error.redirect_target()).into_response(),
                Err(e) => e.into_response(),
            }
        }
    }
}
