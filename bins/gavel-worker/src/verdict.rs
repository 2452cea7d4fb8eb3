/// Verdict Mapper - Language-Agnostic Judging Logic
///
/// **Core Responsibility:**
/// Turn a raw process outcome plus the case's expected output into the
/// final per-case verdict.
///
/// **Critical Properties:**
/// - Knows nothing about processes or languages
/// - Pure function: (test case, raw outcome) → verdict record
/// - The sole place output correctness is judged
///
/// **Comparison Rules:**
/// - Exact string comparison after trimming leading/trailing whitespace
/// - Internal whitespace preserved, case sensitive
/// - No floating-point tolerance
use gavel_common::types::{Status, TestCase, TestResult};

use crate::runner::{RawStatus, RunOutcome};

impl From<RawStatus> for Status {
    fn from(raw: RawStatus) -> Self {
        match raw {
            RawStatus::Accepted => Status::Accepted,
            RawStatus::TimeLimitExceeded => Status::TimeLimitExceeded,
            RawStatus::MemoryLimitExceeded => Status::MemoryLimitExceeded,
            RawStatus::RuntimeError => Status::RuntimeError,
        }
    }
}

/// Judge one test case. An accepted run whose trimmed output differs from
/// the trimmed expected output becomes `wrong answer`; every other raw
/// status passes through unchanged regardless of output.
pub fn judge(tc: &TestCase, outcome: RunOutcome) -> TestResult {
    let expected = tc.expected_output.trim().to_string();
    let output = outcome.output.trim().to_string();

    let status = if outcome.status == RawStatus::Accepted && output != expected {
        Status::WrongAnswer
    } else {
        outcome.status.into()
    };

    TestResult {
        id: tc.id,
        status,
        input: tc.input.clone(),
        expected_output: expected,
        output,
        runtime_ms: outcome.runtime_ms,
        memory_kb: outcome.peak_memory_kb,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(id: i64, input: &str, expected: &str) -> TestCase {
        TestCase {
            id,
            input: input.to_string(),
            expected_output: expected.to_string(),
        }
    }

    fn outcome(status: RawStatus, output: &str, runtime_ms: u64, memory_kb: u64) -> RunOutcome {
        RunOutcome {
            output: output.to_string(),
            runtime_ms,
            peak_memory_kb: memory_kb,
            status,
        }
    }

    #[test]
    fn test_matching_output_is_accepted() {
        let result = judge(
            &case(1, "5\n", "5"),
            outcome(RawStatus::Accepted, "5", 12, 1600),
        );

        assert_eq!(result.status, Status::Accepted);
        assert_eq!(result.id, 1);
        assert_eq!(result.output, "5");
        assert_eq!(result.runtime_ms, 12);
        assert_eq!(result.memory_kb, 1600);
    }

    #[test]
    fn test_edge_whitespace_is_ignored() {
        let result = judge(
            &case(1, "", "hello world"),
            outcome(RawStatus::Accepted, "  hello world  \n", 5, 100),
        );

        assert_eq!(result.status, Status::Accepted);
        assert_eq!(result.output, "hello world");
    }

    #[test]
    fn test_internal_whitespace_is_significant() {
        let result = judge(
            &case(1, "", "a b"),
            outcome(RawStatus::Accepted, "a  b", 5, 100),
        );

        assert_eq!(result.status, Status::WrongAnswer);
    }

    #[test]
    fn test_mismatch_overrides_accepted() {
        let result = judge(
            &case(1, "5\n", "6"),
            outcome(RawStatus::Accepted, "5", 12, 1600),
        );

        assert_eq!(result.status, Status::WrongAnswer);
        assert_eq!(result.output, "5");
        assert_eq!(result.expected_output, "6");
    }

    #[test]
    fn test_case_sensitivity() {
        let result = judge(
            &case(1, "", "Hello"),
            outcome(RawStatus::Accepted, "hello", 1, 1),
        );

        assert_eq!(result.status, Status::WrongAnswer);
    }

    #[test]
    fn test_time_limit_passes_through() {
        let result = judge(
            &case(1, "", "irrelevant"),
            outcome(RawStatus::TimeLimitExceeded, "", 2001, 900),
        );

        assert_eq!(result.status, Status::TimeLimitExceeded);
        assert_eq!(result.runtime_ms, 2001);
    }

    #[test]
    fn test_memory_limit_overrides_correct_looking_output() {
        // Memory breach wins even if the partial output happened to match.
        let result = judge(
            &case(1, "", ""),
            outcome(RawStatus::MemoryLimitExceeded, "", 40, 70000),
        );

        assert_eq!(result.status, Status::MemoryLimitExceeded);
        assert_eq!(result.memory_kb, 70000);
    }

    #[test]
    fn test_runtime_error_passes_through() {
        let result = judge(
            &case(1, "", "5"),
            outcome(RawStatus::RuntimeError, "Traceback: boom", 9, 800),
        );

        assert_eq!(result.status, Status::RuntimeError);
        assert_eq!(result.output, "Traceback: boom");
    }
}
