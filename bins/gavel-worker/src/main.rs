mod config;
mod executor;
mod fanout;
mod language;
mod runner;
mod verdict;
mod workspace;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use config::Settings;
use gavel_common::redis as queue;
use gavel_common::types::Task;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .init();

    info!("Gavel worker booting...");

    let settings = Settings::from_env();
    info!(
        max_concurrent_cases = settings.max_concurrent_cases,
        compile_timeout_secs = settings.compile_timeout.as_secs(),
        "Loaded settings"
    );

    // Connect to Redis; the broker is assumed reachable at startup.
    let client = ::redis::Client::open(settings.redis_addr.as_str())?;
    let mut redis_conn = ::redis::aio::ConnectionManager::new(client).await?;
    info!("Connected to Redis: {}", settings.redis_addr);

    // Shutdown is observed at the idle/dequeuing boundary; an in-flight
    // task always finishes before the loop exits.
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            shutdown_signal().await;
            shutdown.store(true, Ordering::SeqCst);
        });
    }

    worker_loop(&mut redis_conn, &settings, &shutdown).await;

    info!("Worker shutdown complete");
    Ok(())
}

/// Resolves on the first SIGINT (ctrl-c) or SIGTERM, whichever lands first.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    warn!("Received shutdown signal, finishing in-flight work...");
}

async fn worker_loop(
    redis_conn: &mut ::redis::aio::ConnectionManager,
    settings: &Settings,
    shutdown: &AtomicBool,
) {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        // BLPOP with a bounded wait so shutdown is re-checked regularly.
        match queue::pop_task(redis_conn, settings.dequeue_timeout_secs).await {
            Ok(Some(payload)) => {
                // A corrupt payload cannot be reprocessed successfully:
                // log and discard, never retry, never crash.
                let task: Task = match serde_json::from_str(&payload) {
                    Ok(task) => task,
                    Err(e) => {
                        error!(error = %e, "Discarding malformed task payload");
                        continue;
                    }
                };

                info!(
                    task_id = task.id,
                    language = %task.language,
                    test_cases = task.test_cases.len(),
                    time_limit_ms = task.time_limit_ms,
                    memory_limit_kb = task.memory_limit_kb,
                    "Received task"
                );

                let start = std::time::Instant::now();
                let response = executor::execute(&task, settings).await;
                info!(
                    task_id = task.id,
                    results = response.results.len(),
                    execution_ms = start.elapsed().as_millis() as u64,
                    "Task processed"
                );

                match queue::push_response(redis_conn, &response).await {
                    Ok(()) => info!(task_id = task.id, "Result pushed"),
                    Err(e) => {
                        // Accepted gap: the result is lost, the loop lives.
                        error!(task_id = task.id, error = %e, "Failed to push result");
                    }
                }
            }
            Ok(None) => {
                // Timeout - loop and re-check shutdown.
                continue;
            }
            Err(e) => {
                error!(error = %e, "Redis error");
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_sigterm_sets_shutdown_flag() {
        let shutdown = Arc::new(AtomicBool::new(false));
        let listener = {
            let shutdown = Arc::clone(&shutdown);
            tokio::spawn(async move {
                shutdown_signal().await;
                shutdown.store(true, Ordering::SeqCst);
            })
        };

        // Let the listener register its handlers before delivering the signal.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!shutdown.load(Ordering::SeqCst));

        let raise = std::process::Command::new("sh")
            .args(["-c", &format!("kill -TERM {}", std::process::id())])
            .status()
            .expect("failed to run sh");
        assert!(raise.success());

        tokio::time::timeout(Duration::from_secs(5), listener)
            .await
            .expect("shutdown listener never resolved")
            .expect("shutdown listener panicked");
        assert!(shutdown.load(Ordering::SeqCst));
    }
}
