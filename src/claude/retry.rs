//! Exponential backoff retry around the Claude CLI.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use tracing::warn;

use crate::error::ClaudeError;

use super::subprocess::run_claude;

/// Configuration: 3 total attempts, base 1s, max 30s.
pub const MAX_ATTEMPTS: u32 = 3;
const INITIAL_INTERVAL_SECS: u64 = 1;
const MAX_INTERVAL_SECS: u64 = 30;

/// Trait for executing Claude CLI commands.
///
/// This abstraction allows mocking the Claude subprocess in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClaudeExecutor: Send + Sync {
    /// Run Claude with the given prompt and return the raw stdout.
    async fn run(&self, prompt: &str) -> Result<String, ClaudeError>;
}

/// Executor that calls the real Claude CLI with a fixed timeout.
pub struct DefaultExecutor {
    pub timeout: Duration,
}

#[async_trait]
impl ClaudeExecutor for DefaultExecutor {
    async fn run(&self, prompt: &str) -> Result<String, ClaudeError> {
        run_claude(prompt, self.timeout).await
    }
}

/// Retry an async operation with exponential backoff.
///
/// `attempt` is called up to `MAX_ATTEMPTS` times. `wrap_exhausted` converts
/// the last error into the caller's exhausted variant.
pub async fn retry_with_backoff<T, E, Fut, F, W>(mut attempt: F, wrap_exhausted: W) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    W: FnOnce(E) -> E,
{
    let mut backoff = ExponentialBackoff {
        initial_interval: Duration::from_secs(INITIAL_INTERVAL_SECS),
        max_interval: Duration::from_secs(MAX_INTERVAL_SECS),
        max_elapsed_time: None,
        ..Default::default()
    };

    let mut attempts = 0;
    loop {
        attempts += 1;

        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) if attempts >= MAX_ATTEMPTS => return Err(wrap_exhausted(e)),
            Err(e) => {
                warn!("Attempt {}/{} failed: {}", attempts, MAX_ATTEMPTS, e);
                if let Some(wait_duration) = backoff.next_backoff() {
                    tokio::time::sleep(wait_duration).await;
                }
            }
        }
    }
}

/// Run Claude with retries and return the unwrapped response text.
pub async fn generate_with_retry<E: ClaudeExecutor + ?Sized>(
    prompt: &str,
    executor: &E,
) -> Result<String, ClaudeError> {
    retry_with_backoff(
        || async {
            let response = executor.run(prompt).await?;
            parse_claude_response(&response)
        },
        |e| ClaudeError::RetriesExhausted(Box::new(e)),
    )
    .await
}

/// Claude CLI JSON envelope when using --output-format json
#[derive(serde::Deserialize)]
struct ClaudeCliResponse {
    result: String,
    #[serde(default)]
    is_error: bool,
}

/// Unwrap the CLI envelope; text that is not an envelope is returned as-is.
fn parse_claude_response(response: &str) -> Result<String, ClaudeError> {
    match serde_json::from_str::<ClaudeCliResponse>(response) {
        Ok(envelope) if envelope.is_error => Err(ClaudeError::ExecutionFailed(envelope.result)),
        Ok(envelope) => Ok(envelope.result),
        Err(_) => Ok(response.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_parse_claude_cli_envelope() {
        let response = r#"{"type":"result","is_error":false,"result":"feat: Add login"}"#;
        assert_eq!(parse_claude_response(response).unwrap(), "feat: Add login");
    }

    #[test]
    fn test_parse_claude_cli_error_envelope() {
        let response = r#"{"type":"result","is_error":true,"result":"Credit balance too low"}"#;
        assert!(matches!(
            parse_claude_response(response),
            Err(ClaudeError::ExecutionFailed(msg)) if msg.contains("Credit")
        ));
    }

    #[test]
    fn test_parse_raw_text_passthrough() {
        assert_eq!(parse_claude_response("  docs: Update readme\n").unwrap(), "docs: Update readme");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhaustion() {
        let mut mock = MockClaudeExecutor::new();
        let call_count = Arc::new(AtomicU32::new(0));
        let call_count_clone = call_count.clone();

        mock.expect_run().times(3).returning(move |_| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
            Err(ClaudeError::ExecutionFailed("persistent error".to_string()))
        });

        let result = generate_with_retry("prompt", &mock).await;

        assert!(matches!(result, Err(ClaudeError::RetriesExhausted(_))));
        assert_eq!(call_count.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_after_failure() {
        let mut mock = MockClaudeExecutor::new();
        let call_count = Arc::new(AtomicU32::new(0));
        let call_count_clone = call_count.clone();

        mock.expect_run().times(2).returning(move |_| {
            if call_count_clone.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ClaudeError::Timeout(60))
            } else {
                Ok(r#"{"result":"chore: Bump deps","is_error":false}"#.to_string())
            }
        });

        let result = generate_with_retry("prompt", &mock).await;
        assert_eq!(result.unwrap(), "chore: Bump deps");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_preserves_last_error() {
        let mut mock = MockClaudeExecutor::new();
        let call_count = Arc::new(AtomicU32::new(0));
        let call_count_clone = call_count.clone();

        mock.expect_run().times(3).returning(move |_| {
            match call_count_clone.fetch_add(1, Ordering::SeqCst) {
                0 => Err(ClaudeError::Timeout(30)),
                1 => Err(ClaudeError::NonZeroExit {
                    code: 1,
                    stderr: "error".to_string(),
                }),
                _ => Err(ClaudeError::ExecutionFailed("final error".to_string())),
            }
        });

        match generate_with_retry("prompt", &mock).await {
            Err(ClaudeError::RetriesExhausted(inner)) => {
                assert!(matches!(*inner, ClaudeError::ExecutionFailed(_)));
            }
            other => panic!("Expected RetriesExhausted error, got {other:?}"),
        }
    }
}
