//! Completion and failure handling, including the dead-letter transition.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::error::JobError;
use crate::keyspace;
use crate::util::now_unix_string;

use super::model::JobStatus;

/// Marks a job completed: records its result, acks the stream entry, bumps
/// the counter, and applies the metadata TTL so the job's hash (and, for a
/// dedupe-enabled queue, its dedupe-set entry) eventually expires.
pub async fn complete(
    redis: &mut ConnectionManager,
    queue: &str,
    job_id: &str,
    result: serde_json::Value,
    ttl_secs: u64,
) -> Result<(), JobError> {
    let meta_key = keyspace::job_meta(queue, job_id);
    if !redis.exists(&meta_key).await? {
        return Err(JobError::JobNotFound(job_id.to_string()));
    }

    let result_json = serde_json::to_string(&result)?;
    let now = now_unix_string();

    redis
        .hset_multiple::<_, _, _, ()>(
            &meta_key,
            &[
                ("status", JobStatus::Completed.as_str().to_string()),
                ("result", result_json),
                ("completed_at", now),
            ],
        )
        .await?;

    redis::cmd("XACK")
        .arg(keyspace::stream(queue))
        .arg(keyspace::consumer_group(queue))
        .arg(job_id)
        .query_async::<()>(redis)
        .await?;

    redis
        .incr::<_, _, ()>(keyspace::stats_completed(queue), 1)
        .await?;

    redis.expire::<_, ()>(&meta_key, ttl_secs as i64).await?;

    Ok(())
}

/// Reports a job failure. Re-queues it for retry if under the queue's budget,
/// otherwise dead-letters it.
///
/// Returns the job's `retries` count as observed before this call.
pub async fn fail(
    redis: &mut ConnectionManager,
    queue: &str,
    job_id: &str,
    error: &str,
    ttl_secs: u64,
) -> Result<u32, JobError> {
    let meta_key = keyspace::job_meta(queue, job_id);
    if !redis.exists(&meta_key).await? {
        return Err(JobError::JobNotFound(job_id.to_string()));
    }

    let max_retries: u32 = redis
        .hget::<_, _, Option<String>>(keyspace::queue_meta(queue), "max_retries")
        .await?
        .and_then(|v| v.parse().ok())
        .unwrap_or(3);
    let retries: u32 = redis
        .hget::<_, _, Option<String>>(&meta_key, "retries")
        .await?
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    if retries < max_retries {
        redis
            .hset_multiple::<_, _, _, ()>(
                &meta_key,
                &[
                    ("status", JobStatus::Pending.as_str().to_string()),
                    ("error", error.to_string()),
                    ("claimed_at", String::new()),
                ],
            )
            .await?;
    } else {
        dead_letter(redis, queue, job_id, &meta_key, error, ttl_secs).await?;
    }

    Ok(retries)
}

/// Terminal failure path shared by `fail` and the background reclaimer.
pub async fn dead_letter(
    redis: &mut ConnectionManager,
    queue: &str,
    job_id: &str,
    meta_key: &str,
    error: &str,
    ttl_secs: u64,
) -> Result<(), JobError> {
    let now = now_unix_string();

    let dedupe_hash: Option<String> = redis.hget(meta_key, "dedupe_hash").await?;

    redis
        .hset_multiple::<_, _, _, ()>(
            meta_key,
            &[
                ("status", JobStatus::Failed.as_str().to_string()),
                ("error", error.to_string()),
                ("completed_at", now),
            ],
        )
        .await?;

    redis::cmd("XACK")
        .arg(keyspace::stream(queue))
        .arg(keyspace::consumer_group(queue))
        .arg(job_id)
        .query_async::<()>(redis)
        .await?;

    redis.incr::<_, _, ()>(keyspace::stats_failed(queue), 1).await?;

    if let Some(hash) = dedupe_hash {
        redis
            .srem::<_, _, ()>(keyspace::dedupe_set(queue), hash)
            .await?;
    }

    redis.expire::<_, ()>(meta_key, ttl_secs as i64).await?;

    Ok(())
}
