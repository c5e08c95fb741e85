//! Runs against a live Redis. Start one and run with `--ignored`:
//!
//! REDIS_URL=redis://127.0.0.1:6379 cargo test --test redis_backend -- --ignored

mod common;

use std::sync::Arc;

use common::{TestClient, assert_redirect};
use moviemagic::{
    AppState,
    config::{Config, StoreBackend},
    db,
    repositories::{
        booking::RedisBookingLedger, session::RedisSessionStore, user::RedisCredentialStore,
    },
};
use uuid::Uuid;

async fn redis_state() -> AppState {
    let config = Config {
        store_backend: StoreBackend::Redis,
        redis_url: std::env::var("REDIS_URL")
            .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
        ..Config::default()
    };
    let conn = db::connect(&config.redis_url).await.unwrap();

    AppState::with_stores(
        config,
        Arc::new(RedisCredentialStore::new(conn.clone())),
        Arc::new(RedisBookingLedger::new(conn.clone())),
        Arc::new(RedisSessionStore::new(conn)),
    )
    .unwrap()
}

#[tokio::test]
#[ignore]
async fn booking_survives_a_new_connection() {
    let email = format!("{}@x.com", Uuid::new_v4().simple());
    let client = TestClient::new(redis_state().await);

    assert_redirect(&client.register(&email, "pw1").await, "/login");
    assert_redirect(&client.login(&email, "pw1").await, "/home");
    client.submit_booking("C12", "2024-05-01", "19:00").await;
    assert_redirect(&client.submit_payment().await, "/confirmation");

    let reconnected = redis_state().await;
    let bookings = reconnected.ledger.list().await.unwrap();
    assert!(
        bookings
            .iter()
            .any(|b| b.user == email && b.seat == "C12" && b.time == "19:00")
    );
    assert!(reconnected.users.find_by_email(&email).await.unwrap().is_some());
}

#[tokio::test]
#[ignore]
async fn duplicate_registration_is_refused_across_clients() {
    let email = format!("{}@x.com", Uuid::new_v4().simple());
    let state = redis_state().await;
    let first = TestClient::new(state.clone());
    let second = TestClient::new(state);

    first.register(&email, "pw1").await;
    second.register(&email, "pw2").await;

    assert_redirect(&second.login(&email, "pw1").await, "/home");
    assert_eq!(
        second.login(&email, "pw2").await.status(),
        axum::http::StatusCode::OK
    );
}
