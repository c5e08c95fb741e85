use axum::response::{Html, IntoResponse, Response};
use handlebars::Handlebars;
use serde::Serialize;
use tower_cookies::Cookies;

use crate::error::{AppError, Result};
use crate::models::session::Flash;
use crate::services::session::{self as session_service, ActiveSession};
use crate::state::AppState;

const PARTIALS: &[(&str, &str)] = &[
    ("header", include_str!("../templates/header.hbs")),
    ("footer", include_str!("../templates/footer.hbs")),
];

const PAGES: &[(&str, &str)] = &[
    ("index", include_str!("../templates/index.hbs")),
    ("register", include_str!("../templates/register.hbs")),
    ("login", include_str!("../templates/login.hbs")),
    ("home", include_str!("../templates/home.hbs")),
    ("booking", include_str!("../templates/booking.hbs")),
    ("payment", include_str!("../templates/payment.hbs")),
    ("confirmation", include_str!("../templates/confirmation.hbs")),
];

/// Data shared by every page plus the page-specific `body`.
#[derive(Serialize)]
pub struct Page<'a, T: Serialize> {
    pub title: &'a str,
    pub user: Option<&'a str>,
    pub flashes: Vec<Flash>,
    #[serde(flatten)]
    pub body: T,
}

/// Body for pages that need nothing beyond the shared data.
#[derive(Serialize)]
pub struct Empty {}

/// The compiled page templates. Output is HTML-escaped.
pub struct Views {
    registry: Handlebars<'static>,
}

impl Views {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();

        for (name, source) in PARTIALS {
            registry
                .register_partial(name, *source)
                .map_err(|e| AppError::Internal(format!("Partial {}: {}", name, e)))?;
        }
        for (name, source) in PAGES {
            registry
                .register_template_string(name, *source)
                .map_err(|e| AppError::Internal(format!("Template {}: {}", name, e)))?;
        }

        Ok(Self { registry })
    }

    pub fn render<T: Serialize>(&self, template: &str, page: &Page<'_, T>) -> Result<Html<String>> {
        Ok(Html(self.registry.render(template, page)?))
    }
}

/// Renders `template` with the caller's queued flash messages.
pub(crate) async fn render_public<T: Serialize>(
    state: &AppState,
    cookies: &Cookies,
    template: &str,
    title: &str,
    body: T,
) -> Result<Response> {
    let mut session = session_service::load(state, cookies).await?;

    let flashes = match session.as_mut() {
        Some(active) if !active.record.flashes.is_empty() => {
            let flashes = active.record.take_flashes();
            session_service::save(state, active).await?;
            flashes
        }
        _ => Vec::new(),
    };

    let user = session
        .as_ref()
        .and_then(|active| active.record.state.identity());

    let page = Page {
        title,
        user,
        flashes,
        body,
    };
    Ok(state.views.render(template, &page)?.into_response())
}

/// Renders a page for an authenticated session, draining its flash messages.
pub(crate) async fn render_private<T: Serialize>(
    state: &AppState,
    session: &mut ActiveSession,
    template: &str,
    title: &str,
    body: T,
) -> Result<Response> {
    let flashes = session.record.take_flashes();
    if !flashes.is_empty() {
        session_service::save(state, session).await?;
    }

    let page = Page {
        title,
        user: session.record.state.identity(),
        flashes,
        body,
    };
    Ok(state.views.render(template, &page)?.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::FlashLevel;

    #[test]
    fn flashes_and_user_content_are_escaped() {
        let views = Views::new().unwrap();
        let page = Page {
            title: "Welcome",
            user: Some("<b>a@x.com</b>"),
            flashes: vec![Flash {
                level: FlashLevel::Error,
                message: "<script>alert(1)</script>".to_string(),
            }],
            body: Empty {},
        };

        let html = views.render("index", &page).unwrap().0;
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;b&gt;a@x.com&lt;/b&gt;"));
        assert!(html.contains("flash error"));
    }

    #[tokio::test]
    async fn private_render_drains_stored_flashes() {
        use crate::config::Config;
        use crate::models::session::{SessionRecord, SessionState};

        let state = AppState::in_memory(Config::default()).unwrap();
        let mut record = SessionRecord::new(
            SessionState::logged_in("a@x.com".to_string()),
            "csrf".to_string(),
            chrono::Duration::hours(1),
        );
        record.push_flash(FlashLevel::Info, "Payment successful. Ticket booked!");
        let mut session = ActiveSession {
            id: uuid::Uuid::new_v4(),
            record,
        };
        session_service::save(&state, &session).await.unwrap();

        let response = render_private(&state, &mut session, "index", "Welcome", Empty {})
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("Payment successful. Ticket booked!"));
        assert!(html.contains("a@x.com"));

        let stored = state.sessions.load(session.id).await.unwrap().unwrap();
        assert!(stored.flashes.is_empty());
    }
}
