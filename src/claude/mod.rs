//! Claude CLI integration.

pub mod retry;
pub mod source;
pub mod subprocess;

pub use retry::{ClaudeExecutor, DefaultExecutor, generate_with_retry};
pub use source::ClaudeSource;
pub use subprocess::{check_claude_installed, run_claude};
