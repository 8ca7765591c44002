//! Job submission, with optional per-queue dedupe.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::error::JobError;
use crate::keyspace;
use crate::util::{now_unix_string, payload_digest};

use super::model::{JobInfo, JobStatus, JobSubmit, SubmitResponse};

/// Submits 1..N jobs to a queue, skipping any whose payload digest is already
/// present in the queue's dedupe set (when dedupe is enabled).
pub async fn submit(
    redis: &mut ConnectionManager,
    queue: &str,
    jobs: Vec<JobSubmit>,
) -> Result<SubmitResponse, JobError> {
    if !redis.sismember(keyspace::queue_set(), queue).await? {
        return Err(JobError::QueueNotFound(queue.to_string()));
    }
    if jobs.is_empty() {
        return Err(JobError::Validation("at least one job is required".to_string()));
    }

    let dedupe_enabled: bool = redis
        .hget::<_, _, Option<String>>(keyspace::queue_meta(queue), "dedupe")
        .await?
        .map(|v| v == "1")
        .unwrap_or(false);

    let mut accepted = Vec::with_capacity(jobs.len());
    let mut skipped = 0usize;

    for job in jobs {
        let digest = dedupe_enabled.then(|| payload_digest(&job.payload));

        if let Some(digest) = &digest {
            let already_present: bool = redis.sismember(keyspace::dedupe_set(queue), digest).await?;
            if already_present {
                skipped += 1;
                continue;
            }
        }

        accepted.push((job, digest));
    }

    let mut created = Vec::with_capacity(accepted.len());
    let now = now_unix_string();

    for (job, digest) in accepted {
        let payload_json = serde_json::to_string(&job.payload)?;

        let job_id: String = redis::cmd("XADD")
            .arg(keyspace::stream(queue))
            .arg("*")
            .arg("payload")
            .arg(&payload_json)
            .arg("priority")
            .arg(job.priority)
            .query_async(redis)
            .await?;

        let mut fields = vec![
            ("status".to_string(), JobStatus::Pending.as_str().to_string()),
            ("payload".to_string(), payload_json.clone()),
            ("created_at".to_string(), now.clone()),
            ("retries".to_string(), "0".to_string()),
        ];
        if let Some(digest) = &digest {
            fields.push(("dedupe_hash".to_string(), digest.clone()));
            redis
                .sadd::<_, _, ()>(keyspace::dedupe_set(queue), digest)
                .await?;
        }

        redis
            .hset_multiple::<_, _, _, ()>(keyspace::job_meta(queue, &job_id), &fields)
            .await?;

        created.push(JobInfo {
            id: job_id,
            queue: queue.to_string(),
            status: JobStatus::Pending,
            payload: job.payload,
            result: serde_json::Value::Null,
            error: String::new(),
            retries: 0,
            created_at: now.clone(),
            claimed_at: String::new(),
            completed_at: String::new(),
        });
    }

    Ok(SubmitResponse {
        submitted: created.len(),
        skipped,
        jobs: created,
    })
}
