use axum::{
    Extension, Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, Result},
    models::booking::{ConfirmedBooking, PendingBooking},
    models::session::{FlashLevel, FlowError},
    services::{
        booking as booking_service,
        session::{self as session_service, ActiveSession},
    },
    state::AppState,
    validation::booking::{resolve_movie, validate_date, validate_seat, validate_time},
    views::render_private,
};

/// The query parameters of the booking page.
#[derive(Deserialize, Debug)]
pub struct BookingQuery {
    #[serde(default)]
    pub movie: Option<String>,
}

/// The booking form.
#[derive(Deserialize, Debug)]
pub struct BookingForm {
    #[serde(default)]
    pub movie: Option<String>,
    #[serde(default)]
    pub seat: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub csrf_token: String,
}

/// The mock payment form. Card fields are never submitted.
#[derive(Deserialize, Debug)]
pub struct PaymentForm {
    #[serde(default)]
    pub csrf_token: String,
}

#[derive(Serialize)]
struct BookingBody {
    movie: String,
    csrf_token: String,
}

#[derive(Serialize)]
struct PaymentBody {
    pending: PendingBooking,
    csrf_token: String,
}

#[derive(Serialize)]
struct ConfirmationBody {
    booking: ConfirmedBooking,
}

fn verify_csrf(session: &ActiveSession, presented: &str) -> Result<()> {
    if session.record.verify_csrf(presented) {
        Ok(())
    } else {
        Err(AppError::Csrf)
    }
}

/// Flashes `error` and sends the client to where the flow can resume.
async fn redirect_for(
    state: &AppState,
    session: &mut ActiveSession,
    error: FlowError,
) -> Result<Response> {
    tracing::debug!("↩️ {} ({})", error, session.id);
    session.record.push_flash(FlashLevel::Error, error.to_string());
    session_service::save(state, session).await?;
    Ok(Redirect::to(error.redirect_target()).into_response())
}

/// Shows the booking form.
#[axum::debug_handler]
pub async fn booking_page(
    State(state): State<AppState>,
    Extension(mut session): Extension<ActiveSession>,
    Query(query): Query<BookingQuery>,
) -> Result<Response> {
    let movie = match resolve_movie(query.movie.as_deref()) {
        Ok(movie) => movie,
        Err(AppError::Validation(reason)) => {
            session.record.push_flash(FlashLevel::Error, reason);
            session_service::save(&state, &session).await?;
            return Ok(Redirect::to("/home").into_response());
        }
        Err(e) => return Err(e),
    };

    let body = BookingBody {
        movie,
        csrf_token: session.record.csrf_token.clone(),
    };
    render_private(&state, &mut session, "booking", "Book a seat", body).await
}

/// Stores the submitted booking as the session's pending draft.
#[axum::debug_handler]
pub async fn submit_booking(
    State(state): State<AppState>,
    Extension(mut session): Extension<ActiveSession>,
    Form(form): Form<BookingForm>,
) -> Result<Response> {
    verify_csrf(&session, &form.csrf_token)?;

    let validated = resolve_movie(form.movie.as_deref()).and_then(|movie| {
        Ok(PendingBooking::new(
            movie,
            validate_seat(&form.seat)?,
            validate_date(&form.date)?,
            validate_time(&form.time)?,
        ))
    });

    let pending = match validated {
        Ok(pending) => pending,
        Err(AppError::Validation(reason)) => {
            session.record.push_flash(FlashLevel::Error, reason);
            session_service::save(&state, &session).await?;
            return Ok(Redirect::to("/booking").into_response());
        }
        Err(e) => return Err(e),
    };

    tracing::info!(
        "📝 Pending booking {} for {}: {} seat {} on {} at {}",
        pending.draft_id,
        session.record.state.identity().unwrap_or_default(),
        pending.movie,
        pending.seat,
        pending.date,
        pending.time
    );

    if let Err(error) = session.record.state.submit_booking(pending) {
        return redirect_for(&state, &mut session, error).await;
    }
    session_service::save(&state, &session).await?;

    Ok(Redirect::to("/payment").into_response())
}

/// Shows the pending booking and the mock payment form.
#[axum::debug_handler]
pub async fn payment_page(
    State(state): State<AppState>,
    Extension(mut session): Extension<ActiveSession>,
) -> Result<Response> {
    let pending = match session.record.state.pending() {
        Ok((_, pending)) => pending.clone(),
        Err(error) => return redirect_for(&state, &mut session, error).await,
    };

    let body = PaymentBody {
        pending,
        csrf_token: session.record.csrf_token.clone(),
    };
    render_private(&state, &mut session, "payment", "Payment", body).await
}

/// Takes the mock payment and confirms the pending booking.
#[axum::debug_handler]
pub async fn submit_payment(
    State(state): State<AppState>,
    Extension(mut session): Extension<ActiveSession>,
    Form(form): Form<PaymentForm>,
) -> Result<Response> {
    verify_csrf(&session, &form.csrf_token)?;
    let draft_id = session
        .record
        .state
        .pending()
        .ok()
        .map(|(_, pending)| pending.draft_id);

    match booking_service::pay(&state, &mut session.record.state).await {
        Ok(booking) => {
            tracing::info!("💳 Payment accepted for booking {}", booking.id);
            session
                .record
                .push_flash(FlashLevel::Info, "Payment successful. Ticket booked!");
            session_service::save(&state, &session).await?;
            Ok(Redirect::to("/confirmation").into_response())
        }
        Err(AppError::Flow(FlowError::AlreadyConfirmed)) => {
            // A concurrent request on this session may have confirmed the
            // draft; build on the stored record, not this request's copy.
            session_service::refresh(&state, &mut session).await?;
            if let Some(draft_id) = draft_id {
                booking_service::settle_replay(&state, &mut session.record.state, draft_id)
                    .await?;
            }
            redirect_for(&state, &mut session, FlowError::AlreadyConfirmed).await
        }
        Err(AppError::Flow(error)) => redirect_for(&state, &mut session, error).await,
        Err(e) => Err(e),
    }
}

/// Shows the session's most recent confirmed booking.
#[axum::debug_handler]
pub async fn confirmation(
    State(state): State<AppState>,
    Extension(mut session): Extension<ActiveSession>,
) -> Result<Response> {
    let booking = match session.record.state.last_booking() {
        Ok(booking) => booking.clone(),
        Err(error) => return redirect_for(&state, &mut session, error).await,
    };

    render_private(
        &state,
        &mut session,
        "confirmation",
        "Booking confirmed",
        ConfirmationBody { booking },
    )
    .await
}
