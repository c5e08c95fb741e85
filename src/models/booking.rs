use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A booking draft held in the session until payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingBooking {
    /// Identifies this draft; the ledger refuses to confirm it twice.
    pub draft_id: Uuid,
    pub movie: String,
    pub seat: String,
    pub date: String,
    pub time: String,
}

impl PendingBooking {
    /// Creates a new draft with a fresh `draft_id`.
    pub fn new(movie: String, seat: String, date: String, time: String) -> Self {
        Self {
            draft_id: Uuid::new_v4(),
            movie,
            seat,
            date,
            time,
        }
    }
}

/// A paid booking as recorded in the ledger. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedBooking {
    /// The booking reference shown to the customer.
    pub id: Uuid,
    /// Email of the account that paid.
    pub user: String,
    /// The draft this booking was confirmed from.
    pub draft_id: Uuid,
    pub movie: String,
    pub seat: String,
    pub date: String,
    pub time: String,
    /// The timestamp when payment completed.
    pub confirmed_at: DateTime<Utc>,
}

impl ConfirmedBooking {
    /// Builds the confirmed form of `pending` for `user` under booking `id`.
    pub fn from_pending(id: Uuid, user: &str, pending: &PendingBooking) -> Self {
        Self {
            id,
            user: user.to_string(),
            draft_id: pending.draft_id,
            movie: pending.movie.clone(),
            seat: pending.seat.clone(),
            date: pending.date.clone(),
            time: pending.time.clone(),
            confirmed_at: Utc::now(),
        }
    }
}
