//! Dispatches parsed calls to registered handlers with bounded execution.

use std::sync::Arc;
use std::time::Duration;

use crate::actions::ToolCall;

use super::registry::{ToolClass, ToolRegistry};

/// Why a tool invocation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The model emitted an action block we could not decode.
    MalformedCall,
    /// The named tool is not in the registry.
    UnknownTool,
    /// The payload did not match the tool's argument convention.
    InvalidArgs,
    /// The handler was denied access to a resource.
    PermissionDenied,
    /// The handler exceeded its execution budget and was cancelled.
    Timeout,
    /// A transient transport fault; retried once before surfacing.
    TransientIo,
    /// Any other I/O or handler fault.
    Io,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::MalformedCall => "malformed_call",
            FailureKind::UnknownTool => "unknown_tool",
            FailureKind::InvalidArgs => "invalid_args",
            FailureKind::PermissionDenied => "permission_denied",
            FailureKind::Timeout => "timeout",
            FailureKind::TransientIo => "transient_io",
            FailureKind::Io => "io",
        }
    }
}

/// A classified tool failure. Rendered into the conversation log as text;
/// the model decides what to do about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classify a raw I/O fault, keeping access violations distinct.
    pub fn from_io(error: &std::io::Error) -> Self {
        let kind = match error.kind() {
            std::io::ErrorKind::PermissionDenied => FailureKind::PermissionDenied,
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted => {
                FailureKind::TransientIo
            }
            _ => FailureKind::Io,
        };
        Failure::new(kind, error.to_string())
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

impl std::error::Error for Failure {}

/// What a dispatch produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(String),
    Failure(Failure),
}

/// One completed dispatch: the call that was made and what came of it.
/// Constructed once, never mutated; it only lives until it is rendered
/// into the conversation log.
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub call: ToolCall,
    pub outcome: Outcome,
}

impl ToolResult {
    /// Render the result as the payload text appended to the log.
    pub fn render(&self) -> String {
        let result = match &self.outcome {
            Outcome::Success(text) => serde_json::json!({ "ok": text }),
            Outcome::Failure(failure) => serde_json::json!({
                "error": { "kind": failure.kind.as_str(), "message": failure.message },
            }),
        };
        serde_json::json!({
            "tool": self.call.name,
            "args": self.call.args,
            "result": result,
        })
        .to_string()
    }
}

/// Execution budgets per tool class, plus the transient retry allowance.
#[derive(Debug, Clone)]
pub struct Budgets {
    pub file_timeout: Duration,
    pub net_timeout: Duration,
    pub cmd_timeout: Duration,
    /// Extra attempts after a transient network fault. Kept small on
    /// purpose; persistent retrying is the model's call, not ours.
    pub net_retries: u32,
}

impl Budgets {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            file_timeout: config.file_timeout,
            net_timeout: config.net_timeout,
            cmd_timeout: config.cmd_timeout,
            net_retries: 1,
        }
    }

    fn timeout_for(&self, class: ToolClass) -> Duration {
        match class {
            ToolClass::File => self.file_timeout,
            ToolClass::Network => self.net_timeout,
            ToolClass::Command => self.cmd_timeout,
        }
    }
}

/// Resolves calls against the registry and runs handlers under a timeout.
/// Holds no mutable state; everything interesting happens in the handlers.
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    budgets: Budgets,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>, budgets: Budgets) -> Self {
        Self { registry, budgets }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run one call to completion, however it ends.
    ///
    /// On timeout the handler future is dropped, which aborts whatever it
    /// was doing (in-flight requests are cancelled, spawned children are
    /// killed on drop); nothing keeps running behind the loop's back.
    pub async fn execute(&self, call: ToolCall) -> ToolResult {
        let Some(entry) = self.registry.resolve(&call.name) else {
            let failure = Failure::new(
                FailureKind::UnknownTool,
                format!("{} is not a recognized tool", call.name),
            );
            return ToolResult {
                call,
                outcome: Outcome::Failure(failure),
            };
        };

        let timeout = self.budgets.timeout_for(entry.class);
        let retries = match entry.class {
            ToolClass::Network => self.budgets.net_retries,
            _ => 0,
        };

        let mut attempt = 0;
        let outcome = loop {
            let work = entry.invoke(call.args.clone());
            let result = tokio::time::timeout(timeout, work).await;
            match result {
                Err(_elapsed) => {
                    break Outcome::Failure(Failure::new(
                        FailureKind::Timeout,
                        format!("{} gave no result within {:?}", call.name, timeout),
                    ));
                }
                Ok(Ok(text)) => break Outcome::Success(text),
                Ok(Err(failure)) => {
                    if failure.kind == FailureKind::TransientIo && attempt < retries {
                        attempt += 1;
                        tracing::debug!(tool = %call.name, attempt, "retrying after transient fault");
                        continue;
                    }
                    break Outcome::Failure(failure);
                }
            }
        };

        ToolResult { call, outcome }
    }
}
