// Runtime settings for the Gavel worker, read once from the environment
// at startup. The fan-out ceiling and compile deadline are policy knobs
// with the historical constants as defaults.

use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Redis broker location; assumed reachable at startup.
    pub redis_addr: String,
    /// Bounded BLPOP wait, so shutdown is observed between pops.
    pub dequeue_timeout_secs: f64,
    /// Maximum test cases of one task running concurrently.
    pub max_concurrent_cases: usize,
    /// Deadline for a single compiler invocation.
    pub compile_timeout: Duration,
}

impl Settings {
    pub fn from_env() -> Self {
        Settings {
            redis_addr: std::env::var("REDIS_ADDR")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            dequeue_timeout_secs: dequeue_timeout(std::env::var("DEQUEUE_TIMEOUT_SECS").ok()),
            max_concurrent_cases: parse_var(std::env::var("MAX_CONCURRENT_CASES").ok(), 50),
            compile_timeout: Duration::from_secs(parse_var(
                std::env::var("COMPILE_TIMEOUT_SECS").ok(),
                20,
            )),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            redis_addr: "redis://127.0.0.1:6379".to_string(),
            dequeue_timeout_secs: 5.0,
            max_concurrent_cases: 50,
            compile_timeout: Duration::from_secs(20),
        }
    }
}

/// Unset or unparseable values fall back to the default; a bad knob should
/// never keep the worker from starting.
fn parse_var<T: FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// BLPOP treats a zero timeout as "block forever", which would keep the
/// shutdown flag from ever being re-checked, so the wait is clamped to a
/// positive floor.
const MIN_DEQUEUE_TIMEOUT_SECS: f64 = 0.1;

fn dequeue_timeout(value: Option<String>) -> f64 {
    parse_var::<f64>(value, 5.0).max(MIN_DEQUEUE_TIMEOUT_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_accepts_valid_values() {
        assert_eq!(parse_var(Some("80".to_string()), 50usize), 80);
        assert_eq!(parse_var(Some("2.5".to_string()), 5.0f64), 2.5);
    }

    #[test]
    fn test_parse_var_falls_back_on_garbage() {
        assert_eq!(parse_var(Some("many".to_string()), 50usize), 50);
        assert_eq!(parse_var(None, 20u64), 20);
    }

    #[test]
    fn test_dequeue_timeout_never_blocks_forever() {
        assert_eq!(dequeue_timeout(Some("0".to_string())), 0.1);
        assert_eq!(dequeue_timeout(Some("-3".to_string())), 0.1);
        assert_eq!(dequeue_timeout(Some("2.5".to_string())), 2.5);
        assert_eq!(dequeue_timeout(None), 5.0);
    }

    #[test]
    fn test_defaults_match_historical_constants() {
        let settings = Settings::default();
        assert_eq!(settings.max_concurrent_cases, 50);
        assert_eq!(settings.compile_timeout, Duration::from_secs(20));
        assert_eq!(settings.dequeue_timeout_secs, 5.0);
    }
}
