//! The two assistant-facing tools and a name-based dispatcher.

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::ToolError;
use crate::workflow::{CommitDriver, CommitResult, PreviewResult};
use crate::workspace::Workspace;

pub const GENERATE_COMMIT_MESSAGE: &str = "generate_commit_message";
pub const GIT_COMMIT_AND_PUSH: &str = "git_commit_and_push";

/// A tool invocation as received from a client.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PreviewArgs {
    repository_path: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CommitArgs {
    repository_path: Option<String>,
    #[serde(default)]
    confirm_push: bool,
}

/// Tool surface over one driver and one workspace.
pub struct Tools {
    driver: CommitDriver,
    workspace: Workspace,
}

impl Tools {
    pub fn new(config: Config) -> Self {
        let workspace = Workspace::new(config.workspace_dir.clone(), config.push_timeout);
        Self {
            driver: CommitDriver::new(config),
            workspace,
        }
    }

    pub fn with_parts(driver: CommitDriver, workspace: Workspace) -> Self {
        Self { driver, workspace }
    }

    fn default_path(&self) -> &str {
        &self.driver.config().default_repo_path
    }

    /// Read-only preview of the message for pending changes.
    pub async fn generate_commit_message(&self, repository_path: Option<&str>) -> PreviewResult {
        let target = repository_path.unwrap_or(self.default_path());
        match self.workspace.resolve(target).await {
            Ok(path) => self.driver.generate_preview(&path).await,
            Err(e) => PreviewResult::failure("Could not resolve repository", e),
        }
    }

    /// Commit pending changes with a changelog entry; push when confirmed.
    pub async fn git_commit_and_push(
        &self,
        repository_path: Option<&str>,
        confirm_push: bool,
    ) -> CommitResult {
        let target = repository_path.unwrap_or(self.default_path());
        let path = match self.workspace.resolve(target).await {
            Ok(path) => path,
            Err(e) => return CommitResult::failure("Could not resolve repository", e),
        };
        let result = self.driver.commit_and_push(&path, confirm_push).await;
        info!(
            success = result.success,
            pushed = result.pushed,
            files = result.files_changed,
            "git_commit_and_push finished"
        );
        result
    }

    /// Run a decoded tool call and return its JSON result.
    pub async fn call(&self, call: ToolCall) -> Result<Value, ToolError> {
        debug!("Dispatching tool {}", call.name);
        let arguments = match call.arguments {
            Value::Null => json!({}),
            other => other,
        };

        match call.name.as_str() {
            GENERATE_COMMIT_MESSAGE => {
                let args: PreviewArgs =
                    serde_json::from_value(arguments).map_err(|source| {
                        ToolError::InvalidArguments {
                            tool: call.name.clone(),
                            source,
                        }
                    })?;
                let result = self
                    .generate_commit_message(args.repository_path.as_deref())
                    .await;
                Ok(to_value(&result))
            }
            GIT_COMMIT_AND_PUSH => {
                let args: CommitArgs =
                    serde_json::from_value(arguments).map_err(|source| {
                        ToolError::InvalidArguments {
                            tool: call.name.clone(),
                            source,
                        }
                    })?;
                let result = self
                    .git_commit_and_push(args.repository_path.as_deref(), args.confirm_push)
                    .await;
                Ok(to_value(&result))
            }
            _ => Err(ToolError::UnknownTool(call.name)),
        }
    }

    /// Decode one JSON line, run it, and always produce a JSON reply.
    pub async fn dispatch(&self, line: &str) -> Value {
        let outcome = match serde_json::from_str::<ToolCall>(line) {
            Ok(call) => self.call(call).await,
            Err(e) => Err(ToolError::MalformedCall(e)),
        };
        outcome.unwrap_or_else(|e| error_value(&e))
    }
}

fn to_value<T: serde::Serialize>(result: &T) -> Value {
    serde_json::to_value(result).unwrap_or_else(|e| {
        json!({ "success": false, "message": "Could not encode result", "error": e.to_string() })
    })
}

fn error_value(error: &ToolError) -> Value {
    json!({
        "success": false,
        "message": "Tool call rejected",
        "error": error.to_string(),
    })
}
