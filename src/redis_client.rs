//! Process-wide datastore connection.
//!
//! A single `ConnectionManager` is shared across every request; it reconnects
//! transparently on its own, so callers never hold a connection longer than
//! one command.

use redis::aio::ConnectionManager;

use crate::error::QueueError;

/// Opens the datastore connection used for the lifetime of the process.
pub async fn connect(redis_url: &str) -> Result<ConnectionManager, QueueError> {
    let client = redis::Client::open(redis_url)?;
    let manager = ConnectionManager::new(client).await?;
    Ok(manager)
}

/// Pings the datastore, used by the health endpoint.
pub async fn ping(redis: &mut ConnectionManager) -> Result<(), QueueError> {
    redis::cmd("PING").query_async(redis).await?;
    Ok(())
}
