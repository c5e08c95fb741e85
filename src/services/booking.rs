use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::booking::{ConfirmedBooking, PendingBooking},
    models::session::{FlowError, SessionState},
    repositories::booking::{AppendOutcome, BookingLedger},
    services::notify,
    state::AppState,
};

/// How many fresh ids are tried before giving up on a ledger append.
const MAX_ID_ATTEMPTS: usize = 3;

/// Records `pending` for `identity` in the ledger under a fresh booking id.
///
/// # Returns
///
/// The `ConfirmedBooking`, or `FlowError::AlreadyConfirmed` if this draft
/// was confirmed before.
pub async fn confirm(
    ledger: &dyn BookingLedger,
    identity: &str,
    pending: &PendingBooking,
) -> Result<ConfirmedBooking> {
    for attempt in 1..=MAX_ID_ATTEMPTS {
        let booking = ConfirmedBooking::from_pending(Uuid::new_v4(), identity, pending);

        match ledger.append(&booking).await? {
            AppendOutcome::Recorded => {
                tracing::info!("🎟️ Booking {} confirmed for {}", booking.id, identity);
                return Ok(booking);
            }
            AppendOutcome::IdTaken => {
                tracing::warn!("Booking id {} already taken (attempt {})", booking.id, attempt);
            }
            AppendOutcome::DraftConsumed => {
                tracing::warn!("Draft {} was already confirmed", pending.draft_id);
                return Err(FlowError::AlreadyConfirmed.into());
            }
        }
    }

    Err(AppError::Internal(format!(
        "No free booking id after {} attempts",
        MAX_ID_ATTEMPTS
    )))
}

/// Completes the mock payment for the session's pending booking.
///
/// Confirms the draft, moves the session back to `Authenticated` with the
/// booking as `last_booking` and dispatches the confirmation notice. The
/// caller persists the session.
///
/// On `FlowError::AlreadyConfirmed` the session is left untouched: another
/// request may have confirmed the draft and saved a newer record.
pub async fn pay(state: &AppState, session_state: &mut SessionState) -> Result<ConfirmedBooking> {
    let (identity, pending) = session_state
        .pending()
        .map(|(identity, pending)| (identity.to_string(), pending.clone()))?;

    let booking = confirm(state.ledger.as_ref(), &identity, &pending).await?;

    session_state.confirm_payment(booking.clone())?;

    notify::dispatch_confirmation(
        Arc::clone(&state.notifier),
        state.config.notification_topic.clone(),
        state.config.notification_timeout,
        &booking,
    );

    Ok(booking)
}

/// Brings `session_state` in line with the ledger after `draft_id` turned
/// out to be confirmed already.
///
/// If the session still holds that draft, the recorded booking becomes its
/// `last_booking`. A session that has moved on is left as it is.
pub async fn settle_replay(
    state: &AppState,
    session_state: &mut SessionState,
    draft_id: Uuid,
) -> Result<()> {
    match state.ledger.find_by_draft(draft_id).await? {
        Some(booking) => {
            if session_state.confirm_payment(booking).is_ok() {
                tracing::debug!("Session caught up with confirmed draft {}", draft_id);
            }
        }
        None => session_state.discard_draft(draft_id),
    }
    Ok(())
}
