//! Claim engine: stale reclaim leg followed by a fresh-read leg.

use std::collections::HashMap;

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::warn;

use crate::error::JobError;
use crate::keyspace;
use crate::util::now_unix_string;

use super::model::{JobClaim, JobInfo, JobStatus};

/// Claims up to `count` jobs, first reassigning stale pending entries, then
/// reading undelivered entries from the group's `>` cursor.
pub async fn claim(
    redis: &mut ConnectionManager,
    queue: &str,
    req: JobClaim,
) -> Result<Vec<JobInfo>, JobError> {
    if !redis.sismember(keyspace::queue_set(), queue).await? {
        return Err(JobError::QueueNotFound(queue.to_string()));
    }

    let claim_timeout_secs: u64 = redis
        .hget::<_, _, Option<String>>(keyspace::queue_meta(queue), "claim_timeout")
        .await?
        .and_then(|v| v.parse().ok())
        .unwrap_or(300);
    let claim_timeout_ms = claim_timeout_secs * 1000;

    // Each leg is isolated: a failure reclaiming stale entries must not deny
    // service to fresh work, and vice versa.
    let mut claimed = match stale_reclaim_leg(redis, queue, claim_timeout_ms, req.count).await {
        Ok(jobs) => jobs,
        Err(e) => {
            warn!(queue = %queue, error = %e, "stale-reclaim leg failed, continuing with fresh leg only");
            Vec::new()
        }
    };

    let remaining = req.count.saturating_sub(claimed.len() as u32);
    if remaining > 0 {
        match fresh_read_leg(redis, queue, remaining, req.block_ms).await {
            Ok(fresh) => claimed.extend(fresh),
            Err(e) => {
                warn!(queue = %queue, error = %e, "fresh-read leg failed");
            }
        }
    }

    Ok(claimed)
}

/// `XAUTOCLAIM key group consumer min-idle-time start COUNT n` reassigns
/// entries idle past `min_idle_ms` to this process's fixed consumer identity.
async fn stale_reclaim_leg(
    redis: &mut ConnectionManager,
    queue: &str,
    min_idle_ms: u64,
    count: u32,
) -> Result<Vec<JobInfo>, JobError> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let reply: redis::Value = redis::cmd("XAUTOCLAIM")
        .arg(keyspace::stream(queue))
        .arg(keyspace::consumer_group(queue))
        .arg(keyspace::consumer_name())
        .arg(min_idle_ms)
        .arg("0-0")
        .arg("COUNT")
        .arg(count)
        .query_async(redis)
        .await?;

    let entry_ids = parse_autoclaim_ids(&reply);
    let mut claimed = Vec::with_capacity(entry_ids.len());
    let now = now_unix_string();

    for entry_id in entry_ids {
        let meta_key = keyspace::job_meta(queue, &entry_id);
        let retries: u32 = redis
            .hget::<_, _, Option<String>>(&meta_key, "retries")
            .await?
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        redis
            .hset_multiple::<_, _, _, ()>(
                &meta_key,
                &[
                    ("status".to_string(), JobStatus::Claimed.as_str().to_string()),
                    ("claimed_at".to_string(), now.clone()),
                    ("retries".to_string(), (retries + 1).to_string()),
                ],
            )
            .await?;

        let meta: HashMap<String, String> = redis.hgetall(&meta_key).await?;
        claimed.push(JobInfo::from_meta(queue, &entry_id, &meta));
    }

    Ok(claimed)
}

/// `XREADGROUP ... STREAMS key >` reads entries never delivered to any consumer.
async fn fresh_read_leg(
    redis: &mut ConnectionManager,
    queue: &str,
    count: u32,
    block_ms: u64,
) -> Result<Vec<JobInfo>, JobError> {
    let mut cmd = redis::cmd("XREADGROUP");
    cmd.arg("GROUP")
        .arg(keyspace::consumer_group(queue))
        .arg(keyspace::consumer_name())
        .arg("COUNT")
        .arg(count);
    if block_ms > 0 {
        cmd.arg("BLOCK").arg(block_ms);
    }
    cmd.arg("STREAMS").arg(keyspace::stream(queue)).arg(">");

    let reply: Option<redis::streams::StreamReadReply> = cmd.query_async(redis).await?;

    let Some(reply) = reply else {
        return Ok(Vec::new());
    };

    let mut claimed = Vec::new();
    let now = now_unix_string();

    for stream_key in reply.keys {
        for entry in stream_key.ids {
            let meta_key = keyspace::job_meta(queue, &entry.id);
            redis
                .hset_multiple::<_, _, _, ()>(
                    &meta_key,
                    &[
                        ("status".to_string(), JobStatus::Claimed.as_str().to_string()),
                        ("claimed_at".to_string(), now.clone()),
                    ],
                )
                .await?;

            let meta: HashMap<String, String> = redis.hgetall(&meta_key).await?;
            claimed.push(JobInfo::from_meta(queue, &entry.id, &meta));
        }
    }

    Ok(claimed)
}

/// `XAUTOCLAIM`'s reply is `[next_cursor, entries, deleted_ids]`; entries are
/// `[id, [field, value, ...]]` pairs. Only the IDs are needed here since the
/// job's authoritative state lives in its metadata hash, not the stream entry.
fn parse_autoclaim_ids(reply: &redis::Value) -> Vec<String> {
    let redis::Value::Array(top) = reply else {
        return Vec::new();
    };
    let Some(redis::Value::Array(entries)) = top.get(1) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let redis::Value::Array(fields) = entry else {
                return None;
            };
            match fields.first() {
                Some(redis::Value::BulkString(bytes)) => String::from_utf8(bytes.clone()).ok(),
                Some(redis::Value::SimpleString(s)) => Some(s.clone()),
                _ => None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ids_out_of_a_well_formed_autoclaim_reply() {
        let reply = redis::Value::Array(vec![
            redis::Value::BulkString(b"0-0".to_vec()),
            redis::Value::Array(vec![
                redis::Value::Array(vec![
                    redis::Value::BulkString(b"1700000000000-0".to_vec()),
                    redis::Value::Array(vec![
                        redis::Value::BulkString(b"payload".to_vec()),
                        redis::Value::BulkString(b"{}".to_vec()),
                    ]),
                ]),
                redis::Value::Array(vec![
                    redis::Value::BulkString(b"1700000000001-0".to_vec()),
                    redis::Value::Array(vec![]),
                ]),
            ]),
            redis::Value::Array(vec![]),
        ]);

        assert_eq!(
            parse_autoclaim_ids(&reply),
            vec!["1700000000000-0".to_string(), "1700000000001-0".to_string()]
        );
    }

    #[test]
    fn returns_empty_vec_for_a_malformed_reply() {
        assert!(parse_autoclaim_ids(&redis::Value::Nil).is_empty());
    }
}
