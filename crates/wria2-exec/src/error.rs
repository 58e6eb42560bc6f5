//! Errors produced while invoking external tools.

/// Failure of an external tool invocation.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{command} exited with code {code}")]
    Failed {
        command: String,
        code: i32,
        /// Captured diagnostic output of the failing tool.
        stderr: String,
    },

    /// The tool was killed by a signal before it could exit.
    #[error("{command} was terminated by signal {signal}")]
    Signaled {
        command: String,
        signal: i32,
        stderr: String,
    },

    #[error("failed to start {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("tool {0} has empty command")]
    EmptyCommand(String),
}

impl ToolError {
    /// Exit code forwarded to the caller. A signalled tool reports
    /// `128 + signal` like a shell; spawn problems report `1`.
    pub fn code(&self) -> i32 {
        match self {
            ToolError::Failed { code, .. } => *code,
            ToolError::Signaled { signal, .. } => 128 + signal,
            ToolError::Spawn { .. } | ToolError::EmptyCommand(_) => 1,
        }
    }

    /// Diagnostic output captured from the tool, if any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            ToolError::Failed { stderr, .. } | ToolError::Signaled { stderr, .. }
                if !stderr.is_empty() =>
            {
                Some(stderr)
            }
            _ => None,
        }
    }
}

/// Result type for tool invocations.
pub type ToolResult<T> = std::result::Result<T, ToolError>;
