use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{error::Result, models::booking::ConfirmedBooking};

/// Result of appending to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The booking is now part of the ledger.
    Recorded,
    /// Another booking already uses this id; nothing was written.
    IdTaken,
    /// The draft behind this booking was confirmed before; nothing was written.
    DraftConsumed,
}

/// Append-only record of confirmed bookings.
#[async_trait]
pub trait BookingLedger: Send + Sync {
    /// Appends `booking` if both its id and its draft are unused.
    async fn append(&self, booking: &ConfirmedBooking) -> Result<AppendOutcome>;

    /// All bookings in the order they were confirmed.
    async fn list(&self) -> Result<Vec<ConfirmedBooking>>;

    /// The booking confirmed from `draft_id`, if any.
    async fn find_by_draft(&self, draft_id: Uuid) -> Result<Option<ConfirmedBooking>>;
}

#[derive(Default)]
struct LedgerEntries {
    bookings: Vec<ConfirmedBooking>,
    ids: HashSet<Uuid>,
    /// Draft id to position in `bookings`.
    drafts: HashMap<Uuid, usize>,
}

/// Ledger held in process memory.
#[derive(Default)]
pub struct MemoryBookingLedger {
    entries: RwLock<LedgerEntries>,
}

impl MemoryBookingLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingLedger for MemoryBookingLedger {
    async fn append(&self, booking: &ConfirmedBooking) -> Result<AppendOutcome> {
        let mut entries = self.entries.write().await;

        if entries.drafts.contains_key(&booking.draft_id) {
            return Ok(AppendOutcome::DraftConsumed);
        }
        if entries.ids.contains(&booking.id) {
            return Ok(AppendOutcome::IdTaken);
        }

        let position = entries.bookings.len();
        entries.ids.insert(booking.id);
        entries.drafts.insert(booking.draft_id, position);
        entries.bookings.push(booking.clone());
        Ok(AppendOutcome::Recorded)
    }

    async fn list(&self) -> Result<Vec<ConfirmedBooking>> {
        Ok(self.entries.read().await.bookings.clone())
    }

    async fn find_by_draft(&self, draft_id: Uuid) -> Result<Option<ConfirmedBooking>> {
        let entries = self.entries.read().await;
        Ok(entries
            .drafts
            .get(&draft_id)
            .and_then(|&position| entries.bookings.get(position))
            .cloned())
    }
}

/// Key of the list holding booking ids in confirmation order.
const BOOKING_INDEX_KEY: &str = "bookings";

/// Checks draft and id, then writes the booking, its draft marker and the
/// index entry in one atomic step.
///
/// KEYS: booking, draft marker, index. ARGV: booking JSON, booking id.
/// Returns 0 when recorded, 1 when the id is taken, 2 when the draft is consumed.
const APPEND_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[2]) == 1 then
    return 2
end
if redis.call('EXISTS', KEYS[1]) == 1 then
    return 1
end
redis.call('SET', KEYS[1], ARGV[1])
redis.call('SET', KEYS[2], ARGV[2])
redis.call('RPUSH', KEYS[3], ARGV[2])
return 0
"#;

/// Ledger stored in Redis: `booking:{id}` JSON records, `booking:draft:{draft_id}`
/// markers and the `bookings` index list.
#[derive(Clone)]
pub struct RedisBookingLedger {
    redis: ConnectionManager,
    append_script: redis::Script,
}

impl RedisBookingLedger {
    pub fn new(redis: ConnectionManager) -> Self {
        Self {
            redis,
            append_script: redis::Script::new(APPEND_SCRIPT),
        }
    }
}

fn booking_key(id: &str) -> String {
    format!("booking:{}", id)
}

fn draft_key(draft_id: &Uuid) -> String {
    format!("booking:draft:{}", draft_id)
}

#[async_trait]
impl BookingLedger for RedisBookingLedger {
    async fn append(&self, booking: &ConfirmedBooking) -> Result<AppendOutcome> {
        let booking_json = sonic_rs::to_string(booking)?;
        let id = booking.id.to_string();

        let code: i64 = self
            .append_script
            .key(booking_key(&id))
            .key(draft_key(&booking.draft_id))
            .key(BOOKING_INDEX_KEY)
            .arg(&booking_json)
            .arg(&id)
            .invoke_async(&mut self.redis.clone())
            .await?;

        Ok(match code {
            0 => AppendOutcome::Recorded,
            1 => AppendOutcome::IdTaken,
            _ => AppendOutcome::DraftConsumed,
        })
    }

    async fn list(&self) -> Result<Vec<ConfirmedBooking>> {
        let mut conn = self.redis.clone();
        let ids: Vec<String> = conn.lrange(BOOKING_INDEX_KEY, 0, -1).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for id in &ids {
            pipe.get(booking_key(id));
        }
        let records: Vec<Option<String>> = pipe.query_async(&mut conn).await?;

        records
            .into_iter()
            .flatten()
            .map(|json| sonic_rs::from_str::<ConfirmedBooking>(&json).map_err(Into::into))
            .collect()
    }

    async fn find_by_draft(&self, draft_id: Uuid) -> Result<Option<ConfirmedBooking>> {
        let mut conn = self.redis.clone();
        let id: Option<String> = conn.get(draft_key(&draft_id)).await?;
        let Some(id) = id else {
            return Ok(None);
        };

        let booking_json: Option<String> = conn.get(booking_key(&id)).await?;
        booking_json
            .map(|json| sonic_rs::from_str(&json).map_err(Into::into))
            .transpose()
    }
}
