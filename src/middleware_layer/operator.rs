use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http::header;
use subtle::ConstantTimeEq;

use crate::{error::AppError, state::AppState};

/// A middleware that admits only requests bearing the operator token.
pub async fn require_operator(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.config.operator_token.as_ref() else {
        return AppError::NotFound.into_response();
    };

    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .unwrap_or_default();

    if presented.is_empty() || !bool::from(presented.as_bytes().ct_eq(expected.as_bytes())) {
        tracing::warn!("❌ Operator token rejected for {}", request.uri().path());
        return AppError::Unauthorized.into_response();
    }

    next.run(request).await
}
