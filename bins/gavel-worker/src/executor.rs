/// Language Executor - Per-Task Orchestration
///
/// **Responsibility:**
/// Drive one task through the same state machine for every language:
///
///   create workspace → write source → [compile] → fan out test cases
///   through the process runner → map verdicts → destroy workspace
///
/// Languages differ only in the command data they contribute
/// (language.rs); the machine itself never branches per language.
///
/// **Failure policy:**
/// No error leaves this module as `Err`. Setup failures and compilation
/// errors become a uniform status on every test case; per-case failures
/// stay local to their case.
use std::sync::Arc;
use std::time::Duration;

use gavel_common::types::{ExecutionType, Response, Status, Task, TestCase, TestResult};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::fanout;
use crate::language::Language;
use crate::runner::{self, RawStatus};
use crate::verdict;
use crate::workspace::Workspace;

/// Execute one task end to end. The workspace lives for the duration of
/// this call and is removed on every exit path.
pub async fn execute(task: &Task, settings: &Settings) -> Response {
    let language = match Language::from_tag(&task.language) {
        Some(language) => language,
        None => {
            // Availability over strict validation: an unknown tag runs
            // under the default toolchain instead of failing the task.
            warn!(
                task_id = task.id,
                language = %task.language,
                fallback = Language::DEFAULT.tag(),
                "Unknown language tag, using default executor"
            );
            Language::DEFAULT
        }
    };

    let workspace = match Workspace::create(language) {
        Ok(ws) => ws,
        Err(e) => {
            warn!(task_id = task.id, error = %e, "Workspace creation failed");
            return failure_response(task, "failed to create temp dir");
        }
    };

    if let Err(e) = workspace.write_source(language, &task.code) {
        warn!(task_id = task.id, error = %e, "Source write failed");
        return failure_response(task, "failed to write source file");
    }

    // Compile step: no memory ceiling, fixed deadline. A diagnostic from a
    // failed compile is attached to every case.
    if let Some(compile_argv) = language.compile_command(workspace.path()) {
        debug!(task_id = task.id, language = language.tag(), "Compiling");
        let compiled = runner::run_command(&compile_argv, "", settings.compile_timeout, 0).await;
        if compiled.status != RawStatus::Accepted {
            info!(task_id = task.id, language = language.tag(), "Compilation failed");
            return compile_error_response(task, &compiled.output);
        }
    }

    // The compiled artifact is shared read-only by all parallel case runs;
    // the workspace outlives the fan-out because we only return after it.
    let run_argv = Arc::new(language.run_command(workspace.path()));
    let time_limit = Duration::from_millis(task.time_limit_ms);
    let memory_limit_kb = task.memory_limit_kb;

    let results = fanout::bounded_map(
        task.test_cases.clone(),
        settings.max_concurrent_cases,
        move |tc: TestCase| {
            let run_argv = Arc::clone(&run_argv);
            async move {
                let outcome =
                    runner::run_command(&run_argv, &tc.input, time_limit, memory_limit_kb).await;
                verdict::judge(&tc, outcome)
            }
        },
    )
    .await;

    let score_delta = score_delta(task, &results);

    Response {
        submission_id: task.id,
        results,
        execution_type: task.execution_type,
        score_delta,
    }
}

/// A graded submission earns its points only when every case is accepted,
/// and costs its penalty otherwise. Ad hoc runs and validations never
/// move the score, and neither do worker-side setup faults: a `Failed`
/// status means the submission was never actually judged.
fn score_delta(task: &Task, results: &[TestResult]) -> i64 {
    if task.execution_type != ExecutionType::Submit {
        return 0;
    }
    if results.is_empty() || results.iter().any(|r| matches!(r.status, Status::Failed(_))) {
        return 0;
    }
    let solved = results.iter().all(|r| r.status == Status::Accepted);
    if solved {
        task.points
    } else {
        -task.penalty
    }
}

/// Setup failure: the same descriptive status on every case, nothing run.
fn failure_response(task: &Task, reason: &str) -> Response {
    let results: Vec<TestResult> = task
        .test_cases
        .iter()
        .map(|tc| TestResult {
            id: tc.id,
            status: Status::Failed(reason.to_string()),
            input: String::new(),
            expected_output: String::new(),
            output: String::new(),
            runtime_ms: 0,
            memory_kb: 0,
        })
        .collect();

    let score_delta = score_delta(task, &results);
    Response {
        submission_id: task.id,
        results,
        execution_type: task.execution_type,
        score_delta,
    }
}

/// Compilation failure: every case carries the compiler diagnostic, no
/// runtime or memory recorded because nothing ran.
fn compile_error_response(task: &Task, diagnostic: &str) -> Response {
    let results: Vec<TestResult> = task
        .test_cases
        .iter()
        .map(|tc| TestResult {
            id: tc.id,
            status: Status::CompilationError,
            input: String::new(),
            expected_output: String::new(),
            output: diagnostic.to_string(),
            runtime_ms: 0,
            memory_kb: 0,
        })
        .collect();

    let score_delta = score_delta(task, &results);
    Response {
        submission_id: task.id,
        results,
        execution_type: task.execution_type,
        score_delta,
    }
}
