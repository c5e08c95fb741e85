use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::{error::Result, state::AppState};

/// Lists every confirmed booking as JSON, oldest first.
#[axum::debug_handler]
pub async fn list_bookings(State(state): State<AppState>) -> Result<Response> {
    let bookings = state.ledger.list().await?;
    tracing::info!("🔍 Operator listed {} bookings", bookings.len());

    let body = sonic_rs::to_string(&bookings)?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response())
}
