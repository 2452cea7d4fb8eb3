use crate::types::Response;
use redis::{AsyncCommands, RedisResult};

/// Redis queue semantics - defines only semantics, not runtime logic.
/// Ensures the API server and the workers never drift on queue names or
/// payload encoding. Both payloads are plain JSON text; each task is
/// delivered to exactly one waiting consumer by BLPOP.

pub const TASK_QUEUE: &str = "tasks_queue";
pub const RESULT_QUEUE: &str = "results_queue";

/// Pop the next task payload from the head of the task queue.
/// Uses BLPOP with a bounded wait so the worker can re-check shutdown;
/// `Ok(None)` means the wait timed out with nothing queued.
///
/// The raw JSON is returned undecoded: a malformed payload is a
/// worker-policy concern (log and discard), not a transport error.
pub async fn pop_task(
    conn: &mut redis::aio::ConnectionManager,
    timeout_seconds: f64,
) -> RedisResult<Option<String>> {
    let result: Option<(String, String)> = conn.blpop(TASK_QUEUE, timeout_seconds).await?;
    Ok(result.map(|(_key, payload)| payload))
}

/// Push a finished response to the tail of the result queue.
/// Uses RPUSH for FIFO semantics; the worker retains no reference to the
/// response after this returns.
pub async fn push_response(
    conn: &mut redis::aio::ConnectionManager,
    response: &Response,
) -> RedisResult<()> {
    let payload = serde_json::to_string(response).map_err(|e| {
        redis::RedisError::from((
            redis::ErrorKind::TypeError,
            "serialization error",
            e.to_string(),
        ))
    })?;

    conn.rpush(RESULT_QUEUE, payload).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExecutionType, Status, TestResult};

    #[test]
    fn test_queue_names_are_stable() {
        // The API server hardcodes both names; changing either breaks the
        // producer/consumer contract.
        assert_eq!(TASK_QUEUE, "tasks_queue");
        assert_eq!(RESULT_QUEUE, "results_queue");
    }

    #[test]
    fn test_response_payload_is_plain_json() {
        let response = Response {
            submission_id: 9,
            results: vec![TestResult {
                id: 1,
                status: Status::WrongAnswer,
                input: "1\n".to_string(),
                expected_output: "2".to_string(),
                output: "3".to_string(),
                runtime_ms: 4,
                memory_kb: 512,
            }],
            execution_type: ExecutionType::Run,
            score_delta: 0,
        };

        let payload = serde_json::to_string(&response).unwrap();
        assert!(payload.contains("\"SubmissionID\":9"));
        assert!(payload.contains("\"Status\":\"wrong answer\""));
    }
}
