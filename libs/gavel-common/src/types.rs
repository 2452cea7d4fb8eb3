use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// One unit of code-execution work, produced by the API server and consumed
/// exactly once by a worker. Field names on the wire are the capitalized
/// names the API server emits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Language")]
    pub language: String,
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "TestCases")]
    pub test_cases: Vec<TestCase>,
    #[serde(rename = "TimeLimitMS")]
    pub time_limit_ms: u64,
    #[serde(rename = "MemoryLimitKB")]
    pub memory_limit_kb: u64,
    #[serde(rename = "ExecutionType")]
    pub execution_type: ExecutionType,
    #[serde(rename = "Points", default)]
    pub points: i64,
    #[serde(rename = "Penalty", default)]
    pub penalty: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Input")]
    pub input: String,
    #[serde(rename = "ExpectedOutput")]
    pub expected_output: String,
}

/// Per-case verdict record. Emitted in the same order as the task's
/// test-case sequence regardless of internal completion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Status")]
    pub status: Status,
    #[serde(rename = "Input")]
    pub input: String,
    #[serde(rename = "ExpectedOutput")]
    pub expected_output: String,
    #[serde(rename = "Output")]
    pub output: String,
    #[serde(rename = "RuntimeMS")]
    pub runtime_ms: u64,
    #[serde(rename = "MemoryKB")]
    pub memory_kb: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "SubmissionID")]
    pub submission_id: i64,
    #[serde(rename = "Results")]
    pub results: Vec<TestResult>,
    #[serde(rename = "ExecutionType")]
    pub execution_type: ExecutionType,
    #[serde(rename = "ScoreDelta")]
    pub score_delta: i64,
}

/// Why a task was submitted. The API server uses this to decide whether to
/// persist the submission, strip I/O fields, or update validation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionType {
    Run,
    Submit,
    Validate,
}

/// Final classification of a single test case. Serialized as the plain
/// status string the API server matches on; setup failures carry their own
/// description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    RuntimeError,
    CompilationError,
    Failed(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::Accepted => "accepted",
            Status::WrongAnswer => "wrong answer",
            Status::TimeLimitExceeded => "time limit exceeded",
            Status::MemoryLimitExceeded => "memory limit exceeded",
            Status::RuntimeError => "runtime error",
            Status::CompilationError => "compilation error",
            Status::Failed(reason) => reason,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Status {
    fn from(s: &str) -> Self {
        match s {
            "accepted" => Status::Accepted,
            "wrong answer" => Status::WrongAnswer,
            "time limit exceeded" => Status::TimeLimitExceeded,
            "memory limit exceeded" => Status::MemoryLimitExceeded,
            "runtime error" => Status::RuntimeError,
            "compilation error" => Status::CompilationError,
            other => Status::Failed(other.to_string()),
        }
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StatusVisitor;

        impl de::Visitor<'_> for StatusVisitor {
            type Value = Status;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a status string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Status, E> {
                Ok(Status::from(v))
            }
        }

        deserializer.deserialize_str(StatusVisitor)
    }
}
