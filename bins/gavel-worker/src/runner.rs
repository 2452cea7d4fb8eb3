/// Process Runner - Single-Process Lifecycle Management
///
/// **Core Responsibility:**
/// Run one external process to completion or abort it, and report captured
/// output, wall-clock runtime, observed peak memory, and a raw status.
///
/// **Critical Architectural Boundary:**
/// - Knows HOW to spawn, monitor, and kill a process
/// - Does NOT know what a test case is
/// - Does NOT judge output correctness (verdict mapper's job)
///
/// **Memory accounting:**
/// Resident memory is polled from /proc/<pid>/status every 10ms. A spike
/// between two ticks can be missed, so the measured peak is a best-effort
/// signal, not a hard guarantee. Kernel cgroup enforcement could replace
/// the polling without changing this module's contract.
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::debug;

const MEMORY_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Raw classification of a process run, before output comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawStatus {
    Accepted,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    RuntimeError,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub output: String,
    pub runtime_ms: u64,
    pub peak_memory_kb: u64,
    pub status: RawStatus,
}

impl RunOutcome {
    fn aborted(status: RawStatus, started: Instant, peak_memory_kb: u64) -> Self {
        // Unilateral cancellation: the process was killed, its output is
        // discarded rather than partially recovered.
        RunOutcome {
            output: String::new(),
            runtime_ms: started.elapsed().as_millis() as u64,
            peak_memory_kb,
            status,
        }
    }
}

/// Run `argv` with `stdin` fed to the process, racing completion against
/// a deadline and a memory ceiling.
///
/// A `memory_limit_kb` of zero disables memory enforcement (compile runs
/// pass zero; no limit applies to compilers).
pub async fn run_command(
    argv: &[String],
    stdin: &str,
    time_limit: Duration,
    memory_limit_kb: u64,
) -> RunOutcome {
    let (program, args) = match argv.split_first() {
        Some(parts) => parts,
        None => {
            return RunOutcome {
                output: "empty command".to_string(),
                runtime_ms: 0,
                peak_memory_kb: 0,
                status: RawStatus::RuntimeError,
            }
        }
    };

    let mut child = match Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            // Launch failure: no process ever ran.
            return RunOutcome {
                output: e.to_string(),
                runtime_ms: 0,
                peak_memory_kb: 0,
                status: RawStatus::RuntimeError,
            };
        }
    };

    let started = Instant::now();
    let pid = child.id();

    // Feed stdin from a detached task; dropping the handle closes the pipe
    // so interpreters reading to EOF terminate.
    if let Some(mut sink) = child.stdin.take() {
        let input = stdin.to_owned();
        tokio::spawn(async move {
            let _ = sink.write_all(input.as_bytes()).await;
        });
    }

    // Drain both output streams concurrently so the child never blocks on
    // a full pipe buffer.
    let mut stdout_pipe = child.stdout.take();
    let stdout_task = tokio::spawn(async move {
        let mut buf = String::new();
        if let Some(pipe) = stdout_pipe.as_mut() {
            let _ = pipe.read_to_string(&mut buf).await;
        }
        buf
    });
    let mut stderr_pipe = child.stderr.take();
    let stderr_task = tokio::spawn(async move {
        let mut buf = String::new();
        if let Some(pipe) = stderr_pipe.as_mut() {
            let _ = pipe.read_to_string(&mut buf).await;
        }
        buf
    });

    let deadline = tokio::time::Instant::now() + time_limit;
    let mut poll = tokio::time::interval(MEMORY_POLL_INTERVAL);
    poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut peak_memory_kb = 0u64;

    loop {
        tokio::select! {
            exit = child.wait() => {
                let runtime_ms = started.elapsed().as_millis() as u64;
                let stdout = stdout_task.await.unwrap_or_default();
                let stderr = stderr_task.await.unwrap_or_default();
                return classify_exit(exit, stdout, stderr, runtime_ms, peak_memory_kb);
            }
            _ = poll.tick() => {
                let Some(pid) = pid else { continue };
                let Some(mem_kb) = resident_memory_kb(pid) else { continue };
                if mem_kb > peak_memory_kb {
                    peak_memory_kb = mem_kb;
                    if memory_limit_kb > 0 && peak_memory_kb > memory_limit_kb {
                        debug!(pid, peak_memory_kb, memory_limit_kb, "Memory ceiling breached, killing process");
                        kill_and_reap(&mut child).await;
                        return RunOutcome::aborted(RawStatus::MemoryLimitExceeded, started, peak_memory_kb);
                    }
                }
            }
            _ = tokio::time::sleep_until(deadline) => {
                debug!(?pid, time_limit_ms = time_limit.as_millis() as u64, "Deadline fired, killing process");
                kill_and_reap(&mut child).await;
                return RunOutcome::aborted(RawStatus::TimeLimitExceeded, started, peak_memory_kb);
            }
        }
    }
}

fn classify_exit(
    exit: std::io::Result<std::process::ExitStatus>,
    stdout: String,
    stderr: String,
    runtime_ms: u64,
    peak_memory_kb: u64,
) -> RunOutcome {
    let stdout = stdout.trim().to_string();
    let stderr = stderr.trim();

    match exit {
        Ok(status) if status.success() => RunOutcome {
            output: stdout,
            runtime_ms,
            peak_memory_kb,
            status: RawStatus::Accepted,
        },
        Ok(status) => {
            // Non-zero exit: surface whatever the process said, falling
            // back to the exit-status text when it said nothing.
            let mut combined = stdout;
            if !stderr.is_empty() {
                if !combined.is_empty() {
                    combined.push('\n');
                }
                combined.push_str(stderr);
            }
            if combined.is_empty() {
                combined = status.to_string();
            }
            RunOutcome {
                output: combined,
                runtime_ms,
                peak_memory_kb,
                status: RawStatus::RuntimeError,
            }
        }
        Err(e) => RunOutcome {
            output: e.to_string(),
            runtime_ms,
            peak_memory_kb,
            status: RawStatus::RuntimeError,
        },
    }
}

async fn kill_and_reap(child: &mut tokio::process::Child) {
    // start_kill can only fail if the process already exited; wait() then
    // reaps it either way.
    let _ = child.start_kill();
    let _ = child.wait().await;
}

/// Resident set size of `pid` in kilobytes, read from the VmRSS line of
/// /proc/<pid>/status. `None` once the process is gone (or off-Linux).
fn resident_memory_kb(pid: u32) -> Option<u64> {
    let status = std::fs::read_to_string(format!("/proc/{pid}/status")).ok()?;
    let line = status.lines().find(|l| l.starts_with("VmRSS:"))?;
    line.split_whitespace().nth(1)?.parse().ok()
}
