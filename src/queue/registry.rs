//! Queue lifecycle: create, delete, info, list.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::debug;

use crate::error::QueueError;
use crate::keyspace;

use super::model::{is_valid_queue_name, QueueCreate, QueueInfo};

const DELETE_SCAN_BATCH: usize = 500;

/// Creates a queue: its consumer group, metadata hash, and queue-set membership.
///
/// The consumer-group-creation step tolerates `BUSYGROUP` (the group already
/// exists), since stream auto-creation on a name that was previously deleted
/// can race with a fresh `XGROUP CREATE`.
pub async fn create(redis: &mut ConnectionManager, req: QueueCreate) -> Result<QueueInfo, QueueError> {
    if !is_valid_queue_name(&req.name) {
        return Err(QueueError::InvalidName(req.name));
    }

    if redis.sismember(keyspace::queue_set(), &req.name).await? {
        return Err(QueueError::Conflict(req.name));
    }

    let group_result: Result<(), redis::RedisError> = redis::cmd("XGROUP")
        .arg("CREATE")
        .arg(keyspace::stream(&req.name))
        .arg(keyspace::consumer_group(&req.name))
        .arg("0")
        .arg("MKSTREAM")
        .query_async(redis)
        .await;
    match group_result {
        Ok(()) => {}
        Err(e) if e.to_string().contains("BUSYGROUP") => {
            debug!(queue = %req.name, "consumer group already exists");
        }
        Err(e) => return Err(e.into()),
    }

    redis
        .hset_multiple::<_, _, _, ()>(
            keyspace::queue_meta(&req.name),
            &[
                ("description", req.description.clone()),
                ("max_retries", req.max_retries.to_string()),
                ("claim_timeout", req.claim_timeout.to_string()),
                ("dedupe", if req.dedupe { "1" } else { "0" }.to_string()),
            ],
        )
        .await?;

    redis.sadd::<_, _, ()>(keyspace::queue_set(), &req.name).await?;

    info(redis, &req.name).await
}

/// Reads a queue's metadata, counters, stream length, and pending count.
pub async fn info(redis: &mut ConnectionManager, name: &str) -> Result<QueueInfo, QueueError> {
    if !redis.sismember(keyspace::queue_set(), name).await? {
        return Err(QueueError::NotFound(name.to_string()));
    }

    let meta: std::collections::HashMap<String, String> =
        redis.hgetall(keyspace::queue_meta(name)).await?;

    let length: u64 = redis.xlen(keyspace::stream(name)).await.unwrap_or(0);

    let pending = pending_count(redis, name).await.unwrap_or(0);

    let completed: u64 = redis
        .get::<_, Option<u64>>(keyspace::stats_completed(name))
        .await?
        .unwrap_or(0);
    let failed: u64 = redis
        .get::<_, Option<u64>>(keyspace::stats_failed(name))
        .await?
        .unwrap_or(0);

    Ok(QueueInfo {
        name: name.to_string(),
        description: meta.get("description").cloned().unwrap_or_default(),
        max_retries: meta
            .get("max_retries")
            .and_then(|v| v.parse().ok())
            .unwrap_or(3),
        claim_timeout: meta
            .get("claim_timeout")
            .and_then(|v| v.parse().ok())
            .unwrap_or(300),
        dedupe: meta.get("dedupe").map(|v| v == "1").unwrap_or(false),
        pending,
        length,
        completed,
        failed,
    })
}

/// `XPENDING <stream> <group>` summary form, first field is the total count.
async fn pending_count(redis: &mut ConnectionManager, name: &str) -> Result<u64, QueueError> {
    let reply: Vec<redis::Value> = redis::cmd("XPENDING")
        .arg(keyspace::stream(name))
        .arg(keyspace::consumer_group(name))
        .query_async(redis)
        .await?;

    match reply.first() {
        Some(redis::Value::Int(count)) => Ok((*count).max(0) as u64),
        _ => Ok(0),
    }
}

/// Lists every queue, sorted by name.
pub async fn list(redis: &mut ConnectionManager) -> Result<Vec<QueueInfo>, QueueError> {
    let mut names: Vec<String> = redis.smembers(keyspace::queue_set()).await?;
    names.sort();

    let mut queues = Vec::with_capacity(names.len());
    for name in names {
        queues.push(info(redis, &name).await?);
    }
    Ok(queues)
}

/// Deletes a queue and every key it owns.
///
/// Job-metadata keys are removed via an incremental `SCAN` + `UNLINK` sweep so
/// a crash partway through leaves only orphaned keys, not a visible queue.
pub async fn delete(redis: &mut ConnectionManager, name: &str) -> Result<(), QueueError> {
    if !redis.sismember(keyspace::queue_set(), name).await? {
        return Err(QueueError::NotFound(name.to_string()));
    }

    redis.srem::<_, _, ()>(keyspace::queue_set(), name).await?;

    redis
        .unlink::<_, ()>((
            keyspace::stream(name),
            keyspace::queue_meta(name),
            keyspace::stats_completed(name),
            keyspace::stats_failed(name),
            keyspace::dedupe_set(name),
        ))
        .await?;

    let pattern = keyspace::job_meta_scan_pattern(name);
    let mut cursor: u64 = 0;
    loop {
        let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(&pattern)
            .arg("COUNT")
            .arg(DELETE_SCAN_BATCH)
            .query_async(redis)
            .await?;

        if !keys.is_empty() {
            redis.unlink::<_, ()>(keys).await?;
        }

        if next_cursor == 0 {
            break;
        }
        cursor = next_cursor;
    }

    Ok(())
}
