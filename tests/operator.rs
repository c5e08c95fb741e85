mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use common::{TestClient, body_text};
use moviemagic::{AppState, app, config::Config};
use tower::ServiceExt;
use zeroize::Zeroizing;

fn operator_config(token: &str) -> Config {
    Config {
        operator_token: Some(Zeroizing::new(token.to_string())),
        ..Config::default()
    }
}

fn listing(token: Option<&str>) -> Request<Body> {
    let mut request = Request::builder().uri("/debug/bookings");
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    request.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn listing_is_not_mounted_without_a_token() {
    let state = AppState::in_memory(Config::default()).unwrap();

    let response = app(state).oneshot(listing(Some("anything"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_rejects_missing_or_wrong_tokens() {
    let state = AppState::in_memory(operator_config("s3cret")).unwrap();

    let response = app(state.clone()).oneshot(listing(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app(state).oneshot(listing(Some("guess"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn listing_returns_confirmed_bookings_as_json() {
    let state = AppState::in_memory(operator_config("s3cret")).unwrap();
    let client = TestClient::new(state.clone());
    client.register("a@x.com", "pw1").await;
    client.login("a@x.com", "pw1").await;
    client.submit_booking("C12", "2024-05-01", "19:00").await;
    client.submit_payment().await;

    let response = app(state.clone())
        .oneshot(listing(Some("s3cret")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );

    let body = body_text(response).await;
    let listed: Vec<sonic_rs::Value> = sonic_rs::from_str(&body).unwrap();
    assert_eq!(listed.len(), 1);

    let booking = &state.ledger.list().await.unwrap()[0];
    assert!(body.contains(&booking.id.to_string()));
    assert!(body.contains("\"seat\":\"C12\""));
    assert!(body.contains("\"user\":\"a@x.com\""));
}
