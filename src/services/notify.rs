use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tokio::task::JoinHandle;

use crate::{
    error::{AppError, Result},
    models::booking::ConfirmedBooking,
};

/// An external channel booking confirmations are published to.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Publishes one message under `topic`.
    async fn publish(&self, topic: &str, subject: &str, message: &str) -> Result<()>;
}

/// Writes notifications to the log instead of delivering them.
#[derive(Clone, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn publish(&self, topic: &str, subject: &str, message: &str) -> Result<()> {
        tracing::info!(
            topic = %topic,
            subject = %subject,
            "📧 [MOCK EMAIL]\n{}",
            message
        );
        Ok(())
    }
}

/// Publishes notifications on a Redis pub/sub channel named after the topic.
#[derive(Clone)]
pub struct RedisNotifier {
    redis: ConnectionManager,
}

impl RedisNotifier {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl Notifier for RedisNotifier {
    async fn publish(&self, topic: &str, subject: &str, message: &str) -> Result<()> {
        let payload = sonic_rs::to_string(&sonic_rs::json!({
            "subject": subject,
            "message": message,
        }))?;

        let receivers: i64 = self
            .redis
            .clone()
            .publish(topic, payload)
            .await
            .map_err(|e| AppError::Notification(format!("PUBLISH to {} failed: {}", topic, e)))?;

        tracing::debug!("📨 Published to {} ({} receivers)", topic, receivers);
        Ok(())
    }
}

/// Subject line for a confirmed booking.
pub fn confirmation_subject(booking: &ConfirmedBooking) -> String {
    format!("Booking confirmed: {}", booking.movie)
}

/// Human-readable body for a confirmed booking.
pub fn confirmation_message(booking: &ConfirmedBooking) -> String {
    format!(
        "Hello {},\n\nYour booking for {} is confirmed.\nSeat: {}, Date: {}, Time: {}\nBooking ID: {}\n",
        booking.user, booking.movie, booking.seat, booking.date, booking.time, booking.id
    )
}

/// Sends the confirmation for `booking` on a background task.
///
/// The send is attempted once and abandoned after `timeout`. Failures are
/// logged and never reach the caller.
pub fn dispatch_confirmation(
    notifier: Arc<dyn Notifier>,
    topic: String,
    timeout: Duration,
    booking: &ConfirmedBooking,
) -> JoinHandle<()> {
    let booking_id = booking.id;
    let subject = confirmation_subject(booking);
    let message = confirmation_message(booking);

    tokio::spawn(async move {
        match tokio::time::timeout(timeout, notifier.publish(&topic, &subject, &message)).await {
            Ok(Ok(())) => {
                tracing::info!("✅ Confirmation sent for booking {}", booking_id);
            }
            Ok(Err(e)) => {
                tracing::warn!("⚠️ Confirmation for booking {} not sent: {}", booking_id, e);
            }
            Err(_) => {
                tracing::warn!(
                    "⚠️ Confirmation for booking {} timed out after {:?}",
                    booking_id,
                    timeout
                );
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::PendingBooking;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    fn booking() -> ConfirmedBooking {
        let pending = PendingBooking::new(
            "Laugh Riot".to_string(),
            "C12".to_string(),
            "2024-05-01".to_string(),
            "19:00".to_string(),
        );
        ConfirmedBooking::from_pending(Uuid::new_v4(), "a@x.com", &pending)
    }

    struct SlowNotifier {
        finished: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Notifier for SlowNotifier {
        async fn publish(&self, _topic: &str, _subject: &str, _message: &str) -> Result<()> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn publish(&self, _topic: &str, _subject: &str, _message: &str) -> Result<()> {
            Err(AppError::Notification("channel down".to_string()))
        }
    }

    #[test]
    fn message_names_every_booking_detail() {
        let booking = booking();
        let message = confirmation_message(&booking);

        for detail in ["a@x.com", "Laugh Riot", "C12", "2024-05-01", "19:00"] {
            assert!(message.contains(detail), "missing {}", detail);
        }
        assert!(message.contains(&booking.id.to_string()));
        assert_eq!(confirmation_subject(&booking), "Booking confirmed: Laugh Riot");
    }

    #[tokio::test]
    async fn hanging_notifier_is_abandoned_at_the_timeout() {
        let finished = Arc::new(AtomicUsize::new(0));
        let notifier = Arc::new(SlowNotifier {
            finished: Arc::clone(&finished),
        });

        let handle = dispatch_confirmation(
            notifier,
            "topic".to_string(),
            Duration::from_millis(20),
            &booking(),
        );

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("dispatch outlived its timeout")
            .unwrap();
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failing_notifier_does_not_panic_the_task() {
        let handle = dispatch_confirmation(
            Arc::new(FailingNotifier),
            "topic".to_string(),
            Duration::from_secs(1),
            &booking(),
        );
        assert!(handle.await.is_ok());
    }

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        assert!(LogNotifier.publish("t", "s", "m").await.is_ok());
    }
}
