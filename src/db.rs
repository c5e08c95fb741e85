use redis::aio::ConnectionManager;

use crate::error::Result;

/// Opens a managed, auto-reconnecting connection to the Redis server.
///
/// # Arguments
///
/// * `redis_url` - The URL of the Redis server.
///
/// # Returns
///
/// A `Result` containing the `ConnectionManager`.
pub async fn connect(redis_url: &str) -> Result<ConnectionManager> {
    let client = redis::Client::open(redis_url)?;
    let manager = ConnectionManager::new(client).await?;
    tracing::info!("✅ Redis Connection Manager initialized");
    Ok(manager)
}
