use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;
use uuid::Uuid;

use crate::models::booking::{ConfirmedBooking, PendingBooking};

/// Severity of a flash message, used as a CSS class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Info,
    Error,
}

/// A one-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

/// A booking-flow step attempted out of order.
///
/// The `Display` text is what the user sees as a flash message.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FlowError {
    #[error("Please log in to continue.")]
    Unauthenticated,

    #[error("No booking is awaiting payment.")]
    NoPendingBooking,

    #[error("There is no confirmed booking to show.")]
    NoConfirmedBooking,

    #[error("This booking has already been confirmed.")]
    AlreadyConfirmed,
}

impl FlowError {
    /// Where the client is sent after this error.
    pub fn redirect_target(&self) -> &'static str {
        match self {
            FlowError::AlreadyConfirmed => "/home",
            _ => "/login",
        }
    }
}

/// Where a client is in the login and booking flow.
///
/// `Anonymous -> Authenticated -> AuthenticatedPending -> Authenticated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Anonymous,
    Authenticated {
        identity: String,
        last_booking: Option<ConfirmedBooking>,
    },
    AuthenticatedPending {
        identity: String,
        pending: PendingBooking,
        last_booking: Option<ConfirmedBooking>,
    },
}

impl SessionState {
    /// The state right after a successful login.
    pub fn logged_in(identity: String) -> Self {
        SessionState::Authenticated {
            identity,
            last_booking: None,
        }
    }

    /// The authenticated email, if any.
    pub fn identity(&self) -> Option<&str> {
        match self {
            SessionState::Anonymous => None,
            SessionState::Authenticated { identity, .. }
            | SessionState::AuthenticatedPending { identity, .. } => Some(identity),
        }
    }

    /// Stores `pending` as the draft awaiting payment, replacing any earlier draft.
    pub fn submit_booking(&mut self, pending: PendingBooking) -> Result<(), FlowError> {
        match std::mem::replace(self, SessionState::Anonymous) {
            SessionState::Anonymous => Err(FlowError::Unauthenticated),
            SessionState::Authenticated {
                identity,
                last_booking,
            }
            | SessionState::AuthenticatedPending {
                identity,
                last_booking,
                ..
            } => {
                *self = SessionState::AuthenticatedPending {
                    identity,
                    pending,
                    last_booking,
                };
                Ok(())
            }
        }
    }

    /// The identity and draft awaiting payment.
    pub fn pending(&self) -> Result<(&str, &PendingBooking), FlowError> {
        match self {
            SessionState::Anonymous => Err(FlowError::Unauthenticated),
            SessionState::Authenticated { .. } => Err(FlowError::NoPendingBooking),
            SessionState::AuthenticatedPending {
                identity, pending, ..
            } => Ok((identity, pending)),
        }
    }

    /// Consumes the pending draft that `booking` was confirmed from.
    pub fn confirm_payment(&mut self, booking: ConfirmedBooking) -> Result<(), FlowError> {
        match self {
            SessionState::Anonymous => Err(FlowError::Unauthenticated),
            SessionState::Authenticated { .. } => Err(FlowError::NoPendingBooking),
            SessionState::AuthenticatedPending {
                identity, pending, ..
            } => {
                if pending.draft_id != booking.draft_id || *identity != booking.user {
                    return Err(FlowError::NoPendingBooking);
                }
                *self = SessionState::Authenticated {
                    identity: std::mem::take(identity),
                    last_booking: Some(booking),
                };
                Ok(())
            }
        }
    }

    /// Drops the pending draft without confirming it, if it is `draft_id`.
    ///
    /// A newer draft submitted in the meantime is kept.
    pub fn discard_draft(&mut self, draft_id: Uuid) {
        if let SessionState::AuthenticatedPending {
            identity,
            pending,
            last_booking,
        } = self
        {
            if pending.draft_id != draft_id {
                return;
            }
            *self = SessionState::Authenticated {
                identity: std::mem::take(identity),
                last_booking: last_booking.take(),
            };
        }
    }

    /// The most recently confirmed booking of this session.
    pub fn last_booking(&self) -> Result<&ConfirmedBooking, FlowError> {
        match self {
            SessionState::Anonymous => Err(FlowError::Unauthenticated),
            SessionState::Authenticated { last_booking, .. }
            | SessionState::AuthenticatedPending { last_booking, .. } => {
                last_booking.as_ref().ok_or(FlowError::NoConfirmedBooking)
            }
        }
    }
}

/// Everything stored server-side for one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub state: SessionState,
    pub flashes: Vec<Flash>,
    /// Token every state-changing booking form must echo back.
    pub csrf_token: String,
    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the session expires.
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Creates a record that lives for `lifetime` from now.
    pub fn new(state: SessionState, csrf_token: String, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            state,
            flashes: Vec::new(),
            csrf_token,
            created_at: now,
            expires_at: now + lifetime,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn push_flash(&mut self, level: FlashLevel, message: impl Into<String>) {
        self.flashes.push(Flash {
            level,
            message: message.into(),
        });
    }

    /// Removes and returns all queued flash messages.
    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.flashes)
    }

    /// Constant-time comparison against the session's CSRF token.
    pub fn verify_csrf(&self, presented: &str) -> bool {
        !presented.is_empty() && bool::from(presented.as_bytes().ct_eq(self.csrf_token.as_bytes()))
    }
}
