//! Background sweep that reclaims or dead-letters stale pending entries.
//!
//! Runs as a single cooperative task, started at service init and cancelled
//! at shutdown via a broadcast channel — the same pattern the rest of this
//! codebase uses for worker lifecycles.

use std::collections::HashMap;
use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::job::complete::dead_letter;
use crate::keyspace;

const PENDING_SCAN_COUNT: usize = 100;

/// Handle to the running reclaimer task. Dropping it does not stop the task;
/// call [`Reclaimer::shutdown`] for a clean cancellation.
pub struct Reclaimer {
    shutdown_tx: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

impl Reclaimer {
    /// Spawns the reclaimer, sweeping every `interval` until shut down.
    pub fn spawn(redis: ConnectionManager, interval: Duration, job_meta_ttl_secs: u64) -> Self {
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = shutdown_rx.recv() => {
                        info!("reclaimer shutting down");
                        break;
                    }
                }

                let mut redis = redis.clone();
                if let Err(e) = sweep(&mut redis, job_meta_ttl_secs).await {
                    error!(error = %e, "reclaim sweep failed");
                }
            }
        });

        Self { shutdown_tx, handle }
    }

    /// Signals the task to stop and waits for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.handle.await {
            error!(error = %e, "reclaimer task panicked during shutdown");
        }
    }
}

async fn sweep(redis: &mut ConnectionManager, job_meta_ttl_secs: u64) -> Result<(), redis::RedisError> {
    let names: Vec<String> = redis.smembers(keyspace::queue_set()).await?;

    for name in names {
        if let Err(e) = sweep_queue(redis, &name, job_meta_ttl_secs).await {
            error!(queue = %name, error = %e, "reclaim sweep failed for queue");
        }
    }

    Ok(())
}

async fn sweep_queue(
    redis: &mut ConnectionManager,
    queue: &str,
    job_meta_ttl_secs: u64,
) -> Result<(), redis::RedisError> {
    let meta: HashMap<String, String> = redis.hgetall(keyspace::queue_meta(queue)).await?;
    let claim_timeout_ms: u64 = meta
        .get("claim_timeout")
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(300)
        * 1000;
    let max_retries: u32 = meta.get("max_retries").and_then(|v| v.parse().ok()).unwrap_or(3);

    let pending: Vec<(String, String, i64, i64)> = redis::cmd("XPENDING")
        .arg(keyspace::stream(queue))
        .arg(keyspace::consumer_group(queue))
        .arg("-")
        .arg("+")
        .arg(PENDING_SCAN_COUNT)
        .query_async(redis)
        .await
        .unwrap_or_default();

    for (entry_id, _consumer, idle_ms, _delivery_count) in pending {
        if (idle_ms as u64) < claim_timeout_ms {
            continue;
        }

        let meta_key = keyspace::job_meta(queue, &entry_id);
        let retries: u32 = redis
            .hget::<_, _, Option<String>>(&meta_key, "retries")
            .await?
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        if retries >= max_retries {
            if let Err(e) = dead_letter(
                redis,
                queue,
                &entry_id,
                &meta_key,
                "max retries exceeded (stale reclaim)",
                job_meta_ttl_secs,
            )
            .await
            {
                error!(queue = %queue, job_id = %entry_id, error = %e, "failed to dead-letter stale entry");
            }
        } else {
            redis
                .hset_multiple::<_, _, _, ()>(
                    &meta_key,
                    &[("status", "pending"), ("claimed_at", "")],
                )
                .await?;
            debug!(queue = %queue, job_id = %entry_id, "reset stale entry to pending");
        }
    }

    Ok(())
}
