//! Request/response bodies for job submission, claiming, and listing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_priority() -> i64 {
    0
}

fn default_claim_count() -> u32 {
    1
}

fn default_list_count() -> u32 {
    50
}

/// A single job to submit.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobSubmit {
    #[serde(default)]
    pub payload: Value,
    #[serde(default = "default_priority")]
    pub priority: i64,
}

/// Batch submission body, accepted on the same route as a bare [`JobSubmit`].
#[derive(Debug, Clone, Deserialize)]
pub struct JobSubmitBatch {
    pub jobs: Vec<JobSubmit>,
}

/// A submit body is either a single job or a batch; normalized to a `Vec` before dispatch.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SubmitBody {
    Batch(JobSubmitBatch),
    Single(JobSubmit),
}

impl SubmitBody {
    pub fn into_jobs(self) -> Vec<JobSubmit> {
        match self {
            SubmitBody::Batch(batch) => batch.jobs,
            SubmitBody::Single(job) => vec![job],
        }
    }
}

/// Response of `POST /api/v1/queues/{name}/jobs`.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    pub jobs: Vec<JobInfo>,
    pub submitted: usize,
    pub skipped: usize,
}

/// Body of `POST /api/v1/queues/{name}/jobs/claim`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobClaim {
    #[serde(default = "default_claim_count")]
    pub count: u32,
    #[serde(default)]
    pub block_ms: u64,
}

/// Body of `PUT .../complete`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobComplete {
    #[serde(default)]
    pub result: Value,
}

/// Body of `PUT .../fail`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct JobFail {
    #[serde(default)]
    pub error: String,
}

/// Status of a job, mirrored directly from its metadata hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Claimed,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Claimed => "claimed",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(JobStatus::Pending),
            "claimed" => Some(JobStatus::Claimed),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

/// A job's full state, as surfaced by claim/list/submit responses.
#[derive(Debug, Clone, Serialize)]
pub struct JobInfo {
    pub id: String,
    pub queue: String,
    pub status: JobStatus,
    pub payload: Value,
    pub result: Value,
    pub error: String,
    pub retries: u32,
    pub created_at: String,
    pub claimed_at: String,
    pub completed_at: String,
}

impl JobInfo {
    /// Reconstructs a `JobInfo` from a job-metadata hash, defaulting absent
    /// fields the way a freshly-appended, not-yet-written entry would read.
    pub fn from_meta(queue: &str, id: &str, meta: &std::collections::HashMap<String, String>) -> Self {
        let payload = meta
            .get("payload")
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or(Value::Null);
        let result = meta
            .get("result")
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or(Value::Null);

        Self {
            id: id.to_string(),
            queue: queue.to_string(),
            status: meta
                .get("status")
                .and_then(|s| JobStatus::parse(s))
                .unwrap_or(JobStatus::Pending),
            payload,
            result,
            error: meta.get("error").cloned().unwrap_or_default(),
            retries: meta
                .get("retries")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            created_at: meta.get("created_at").cloned().unwrap_or_default(),
            claimed_at: meta.get("claimed_at").cloned().unwrap_or_default(),
            completed_at: meta.get("completed_at").cloned().unwrap_or_default(),
        }
    }
}

/// Response of `GET /api/v1/queues/{name}/jobs`.
#[derive(Debug, Clone, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobInfo>,
    pub cursor: String,
    pub has_more: bool,
}

/// Query parameters of `GET /api/v1/queues/{name}/jobs`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobListQuery {
    pub status: Option<String>,
    #[serde(default = "default_list_count")]
    pub count: u32,
    pub cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_body_normalizes_single_job_to_one_element_vec() {
        let body: SubmitBody = serde_json::from_str(r#"{"payload":{"x":1}}"#).unwrap();
        assert_eq!(body.into_jobs().len(), 1);
    }

    #[test]
    fn submit_body_normalizes_batch_to_its_jobs() {
        let body: SubmitBody =
            serde_json::from_str(r#"{"jobs":[{"payload":{"x":1}},{"payload":{"x":2}}]}"#).unwrap();
        assert_eq!(body.into_jobs().len(), 2);
    }

    #[test]
    fn job_status_round_trips_through_its_wire_string() {
        for status in [
            JobStatus::Pending,
            JobStatus::Claimed,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
        }
    }
}
