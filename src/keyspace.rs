//! Pure functions mapping (queue, job) identifiers to datastore key names.
//!
//! Keeping the layout in one place is compatibility-critical: any change here
//! changes the on-disk keyspace for every deployed queue.

/// Set of all queue names.
pub fn queue_set() -> &'static str {
    "starq:queues"
}

/// Hash of queue metadata (string-valued fields).
pub fn queue_meta(queue: &str) -> String {
    format!("starq:queue:{queue}")
}

/// The stream backing a queue.
pub fn stream(queue: &str) -> String {
    format!("starq:stream:{queue}")
}

/// The consumer-group name on a queue's stream.
pub fn consumer_group(queue: &str) -> String {
    format!("starq:cg:{queue}")
}

/// Per-job metadata hash.
pub fn job_meta(queue: &str, job_id: &str) -> String {
    format!("starq:job:{queue}:{job_id}")
}

/// Glob pattern matching every job-metadata key for a queue, for the deletion scan.
pub fn job_meta_scan_pattern(queue: &str) -> String {
    format!("starq:job:{queue}:*")
}

/// Monotonic completed-job counter for a queue.
pub fn stats_completed(queue: &str) -> String {
    format!("starq:stats:{queue}:completed")
}

/// Monotonic failed-job counter for a queue.
pub fn stats_failed(queue: &str) -> String {
    format!("starq:stats:{queue}:failed")
}

/// Set of payload digests currently admitted (non-terminal) in a dedupe-enabled queue.
pub fn dedupe_set(queue: &str) -> String {
    format!("starq:dedupe:{queue}")
}

/// Fixed consumer identity used by this process when reading from consumer groups.
///
/// Multi-worker fairness is delegated to the datastore: every entry is still
/// delivered to exactly one consumer regardless of which process reads it.
pub fn consumer_name() -> &'static str {
    "starq-worker"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_follow_the_documented_layout() {
        assert_eq!(queue_set(), "starq:queues");
        assert_eq!(queue_meta("q1"), "starq:queue:q1");
        assert_eq!(stream("q1"), "starq:stream:q1");
        assert_eq!(consumer_group("q1"), "starq:cg:q1");
        assert_eq!(job_meta("q1", "123-0"), "starq:job:q1:123-0");
        assert_eq!(job_meta_scan_pattern("q1"), "starq:job:q1:*");
        assert_eq!(stats_completed("q1"), "starq:stats:q1:completed");
        assert_eq!(stats_failed("q1"), "starq:stats:q1:failed");
        assert_eq!(dedupe_set("q1"), "starq:dedupe:q1");
    }
}
