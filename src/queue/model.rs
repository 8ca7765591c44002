//! Request/response bodies for the queue registry.

use serde::{Deserialize, Serialize};

fn default_max_retries() -> u32 {
    3
}

fn default_claim_timeout() -> u64 {
    300
}

/// Body of `POST /api/v1/queues`.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueCreate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_claim_timeout")]
    pub claim_timeout: u64,
    #[serde(default)]
    pub dedupe: bool,
}

/// A queue's configuration plus its live counters, as returned by `info`/`list`.
#[derive(Debug, Clone, Serialize)]
pub struct QueueInfo {
    pub name: String,
    pub description: String,
    pub max_retries: u32,
    pub claim_timeout: u64,
    pub dedupe: bool,
    /// Unacknowledged entries in the consumer group's pending list.
    pub pending: u64,
    /// Total entries ever appended to the stream.
    pub length: u64,
    pub completed: u64,
    pub failed: u64,
}

/// Body of `GET /api/v1/queues`.
#[derive(Debug, Clone, Serialize)]
pub struct QueueList {
    pub queues: Vec<QueueInfo>,
}

/// Name validation pattern: `^[a-z0-9][a-z0-9._-]{0,127}$`.
pub fn is_valid_queue_name(name: &str) -> bool {
    if name.is_empty() || name.len() > 128 {
        return false;
    }
    let mut chars = name.chars();
    let first = chars.next().unwrap();
    if !(first.is_ascii_lowercase() || first.is_ascii_digit()) {
        return false;
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_lowercase_alnum_and_separators() {
        assert!(is_valid_queue_name("q1"));
        assert!(is_valid_queue_name("my-queue.v2_final"));
    }

    #[test]
    fn rejects_empty_uppercase_and_leading_separator() {
        assert!(!is_valid_queue_name(""));
        assert!(!is_valid_queue_name("Queue"));
        assert!(!is_valid_queue_name("-queue"));
        assert!(!is_valid_queue_name("_queue"));
    }

    #[test]
    fn rejects_names_over_128_chars() {
        let long_name = "a".repeat(129);
        assert!(!is_valid_queue_name(&long_name));
        let ok_name = "a".repeat(128);
        assert!(is_valid_queue_name(&ok_name));
    }
}
