#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use http_body_util::BodyExt;
use moviemagic::{
    AppState, app,
    config::Config,
    error::{AppError, Result},
    services::notify::Notifier,
};
use tokio::sync::mpsc;
use tower::ServiceExt;
use tower_cookies::Cookie;
use tower_cookies::cookie::time::Duration;
use uuid::Uuid;

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone)]
pub struct Sent {
    pub topic: String,
    pub subject: String,
    pub message: String,
}

/// Forwards every published notification to a channel.
pub struct RecordingNotifier {
    sent: mpsc::UnboundedSender<Sent>,
}

impl RecordingNotifier {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Sent>) {
        let (sent, received) = mpsc::unbounded_channel();
        (Arc::new(Self { sent }), received)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, topic: &str, subject: &str, message: &str) -> Result<()> {
        let _ = self.sent.send(Sent {
            topic: topic.to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }
}

/// Always fails, like an unreachable notification service.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn publish(&self, _topic: &str, _subject: &str, _message: &str) -> Result<()> {
        Err(AppError::Notification("service unavailable".to_string()))
    }
}

/// Drives the router in-process, carrying cookies like a browser would.
///
/// Requests take `&self`, so one client can send several at once like a
/// double-clicked form.
pub struct TestClient {
    pub state: AppState,
    router: Router,
    cookies: Mutex<HashMap<String, Cookie<'static>>>,
}

impl TestClient {
    pub fn new(state: AppState) -> Self {
        Self {
            router: app(state.clone()),
            state,
            cookies: Mutex::new(HashMap::new()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(AppState::in_memory(Config::default()).unwrap())
    }

    /// A second browser against the same application.
    pub fn fresh_browser(&self) -> Self {
        Self::new(self.state.clone())
    }

    pub async fn get(&self, uri: &str) -> Response {
        let request = Request::builder().method("GET").uri(uri);
        self.send(request, Body::empty()).await
    }

    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)]) -> Response {
        let body = serde_urlencoded::to_string(fields).unwrap();
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        self.send(request, Body::from(body)).await
    }

    async fn send(&self, mut request: axum::http::request::Builder, body: Body) -> Response {
        let cookie_header = {
            let cookies = self.cookies.lock().unwrap();
            cookies
                .values()
                .map(|cookie| cookie.stripped().to_string())
                .collect::<Vec<_>>()
                .join("; ")
        };
        if !cookie_header.is_empty() {
            request = request.header(header::COOKIE, cookie_header);
        }

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        let mut cookies = self.cookies.lock().unwrap();
        for set_cookie in response.headers().get_all(header::SET_COOKIE) {
            let cookie = Cookie::parse(set_cookie.to_str().unwrap().to_owned()).unwrap();
            if cookie.value().is_empty() || cookie.max_age() == Some(Duration::ZERO) {
                cookies.remove(cookie.name());
            } else {
                cookies.insert(cookie.name().to_owned(), cookie);
            }
        }
        drop(cookies);

        response
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.cookies
            .lock()
            .unwrap()
            .get("session_id")
            .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
    }

    /// The CSRF token the booking forms of the current session carry.
    pub async fn csrf_token(&self) -> String {
        let id = self.session_id().expect("no session cookie");
        self.state
            .sessions
            .load(id)
            .await
            .unwrap()
            .expect("session not stored")
            .csrf_token
    }

    pub async fn register(&self, email: &str, password: &str) -> Response {
        self.post_form("/register", &[("email", email), ("password", password)])
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.post_form("/login", &[("email", email), ("password", password)])
            .await
    }

    pub async fn submit_booking(&self, seat: &str, date: &str, time: &str) -> Response {
        let csrf = self.csrf_token().await;
        self.post_form(
            "/booking",
            &[
                ("seat", seat),
                ("date", date),
                ("time", time),
                ("csrf_token", &csrf),
            ],
        )
        .await
    }

    pub async fn submit_payment(&self) -> Response {
        let csrf = self.csrf_token().await;
        self.post_form("/payment", &[("csrf_token", &csrf)]).await
    }
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("no Location header")
        .to_str()
        .unwrap()
}

pub fn assert_redirect(response: &Response, to: &str) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(response), to);
}

pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
