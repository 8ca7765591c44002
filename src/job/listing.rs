//! Newest-first, cursor-paginated job listing.

use std::collections::HashMap;

use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::error::JobError;
use crate::keyspace;

use super::model::{JobInfo, JobListResponse, JobStatus};

/// Lists up to `count` jobs strictly older than `cursor` (exclusive), newest first.
pub async fn list_jobs(
    redis: &mut ConnectionManager,
    queue: &str,
    status: Option<&str>,
    count: u32,
    cursor: Option<&str>,
) -> Result<JobListResponse, JobError> {
    if !redis.sismember(keyspace::queue_set(), queue).await? {
        return Err(JobError::QueueNotFound(queue.to_string()));
    }

    let start = match cursor {
        Some(id) => previous_page_bound(id),
        None => "+".to_string(),
    };

    // Fetch one extra entry to detect whether another page follows.
    let fetch_count = count as usize + 1;
    let entries: Vec<(String, HashMap<String, String>)> = redis::cmd("XREVRANGE")
        .arg(keyspace::stream(queue))
        .arg(&start)
        .arg("-")
        .arg("COUNT")
        .arg(fetch_count)
        .query_async(redis)
        .await?;

    let has_more = entries.len() > count as usize;
    let window = &entries[..entries.len().min(count as usize)];

    let status_filter = status.and_then(JobStatus::parse);
    let mut jobs = Vec::with_capacity(window.len());

    for (entry_id, stream_fields) in window {
        let meta_key = keyspace::job_meta(queue, entry_id);
        let meta: HashMap<String, String> = redis.hgetall(&meta_key).await?;

        let meta = if meta.is_empty() {
            // Metadata may have been cleaned up or never written; fall back
            // to the stream entry's own payload field, defaulting to pending.
            let mut fallback = HashMap::new();
            fallback.insert("status".to_string(), "pending".to_string());
            fallback.insert(
                "payload".to_string(),
                stream_fields.get("payload").cloned().unwrap_or_else(|| "{}".to_string()),
            );
            fallback
        } else {
            meta
        };

        let job = JobInfo::from_meta(queue, entry_id, &meta);
        if status_filter.is_none() || Some(job.status) == status_filter {
            jobs.push(job);
        }
    }

    let next_cursor = if has_more {
        window.last().map(|(id, _)| id.clone()).unwrap_or_default()
    } else {
        String::new()
    };

    Ok(JobListResponse {
        jobs,
        cursor: next_cursor,
        has_more,
    })
}

/// Maximum sequence number within a millisecond, per the documented cursor format.
const MAX_SEQ: u64 = i64::MAX as u64;

/// Computes the exclusive upper bound for the page following `last_id`.
///
/// Given `<ts>-<seq>`, the next page starts just below it: `<ts>-<seq-1>` if
/// `seq>0`, else `<ts-1>-<MAX_SEQ>` (stepping down into the previous
/// millisecond's sequence space).
fn previous_page_bound(last_id: &str) -> String {
    let Some((ts_str, seq_str)) = last_id.split_once('-') else {
        return last_id.to_string();
    };
    let (Ok(ts), Ok(seq)) = (ts_str.parse::<u64>(), seq_str.parse::<u64>()) else {
        return last_id.to_string();
    };

    if seq > 0 {
        format!("{ts}-{}", seq - 1)
    } else if ts > 0 {
        format!("{}-{}", ts - 1, MAX_SEQ)
    } else {
        "0-0".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decrements_sequence_when_nonzero() {
        assert_eq!(previous_page_bound("1700000000000-5"), "1700000000000-4");
    }

    #[test]
    fn steps_down_a_millisecond_when_sequence_is_zero() {
        assert_eq!(
            previous_page_bound("1700000000000-0"),
            format!("1699999999999-{}", MAX_SEQ)
        );
    }

    #[test]
    fn clamps_at_the_very_first_possible_id() {
        assert_eq!(previous_page_bound("0-0"), "0-0");
    }
}
