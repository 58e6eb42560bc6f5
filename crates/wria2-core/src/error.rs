//! Error taxonomy and result codes for wria2 runs.

use std::path::PathBuf;
use wria2_exec::ToolError;

/// Fatal failures of a wria2 run.
///
/// Cancellation is not an error: it travels as `Flow::Cancelled` or
/// `RunOutcome::Cancelled`.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("The current path cannot be built. Is it a wria2 path? ({})", .0.display())]
    InvalidSourcePath(PathBuf),

    #[error("Unable to find the current branch of the git repository: {0}")]
    Vcs(String),

    #[error("missing {what}: {}", .path.display())]
    MissingSource { what: &'static str, path: PathBuf },

    #[error("invalid configuration {}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("{0} is deprecated and no longer available")]
    Deprecated(&'static str),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}

impl BuildError {
    /// Code reported to the caller. Tool failures forward the tool's own code
    /// unless it would read as success or cancellation.
    pub fn code(&self) -> i32 {
        match self {
            BuildError::Tool(err) => match err.code() {
                0 | ResultCode::CANCELLED => 1,
                code => code,
            },
            _ => 1,
        }
    }

    /// Diagnostic output captured from a failing tool, if any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            BuildError::Tool(err) => err.diagnostics(),
            _ => None,
        }
    }
}

/// Result type for wria2 operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Numeric result of a run, as seen by thin callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Success,
    /// Missing build descriptor (1), metadata dir (2) or aggregate dir (3).
    Classification(u8),
    Cancelled,
    Failure(i32),
}

impl ResultCode {
    pub const CANCELLED: i32 = -1;

    pub fn as_i32(self) -> i32 {
        match self {
            ResultCode::Success => 0,
            ResultCode::Classification(code) => i32::from(code),
            ResultCode::Cancelled => Self::CANCELLED,
            ResultCode::Failure(code) => code,
        }
    }

    /// Whether the caller should report this code as an error.
    pub fn is_failure(self) -> bool {
        matches!(self, ResultCode::Failure(_))
    }
}

impl From<&BuildError> for ResultCode {
    fn from(err: &BuildError) -> Self {
        ResultCode::Failure(err.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_is_forwarded_unchanged() {
        let err = BuildError::from(ToolError::Failed {
            command: "shifter --lint-stderr".to_string(),
            code: 9,
            stderr: "foo.js: missing semicolon".to_string(),
        });
        assert_eq!(err.code(), 9);
        assert_eq!(err.diagnostics(), Some("foo.js: missing semicolon"));
        assert_eq!(err.to_string(), "shifter --lint-stderr exited with code 9");
    }

    #[test]
    fn test_invalid_source_path_message() {
        let err = BuildError::InvalidSourcePath(PathBuf::from("/tmp/nowhere"));
        assert!(err.to_string().contains("Is it a wria2 path?"));
        assert_eq!(err.code(), 1);
        assert!(err.diagnostics().is_none());
    }

    #[test]
    fn test_result_codes() {
        assert_eq!(ResultCode::Success.as_i32(), 0);
        assert_eq!(ResultCode::Classification(2).as_i32(), 2);
        assert_eq!(ResultCode::Cancelled.as_i32(), -1);
        assert_eq!(ResultCode::Failure(42).as_i32(), 42);
        assert!(!ResultCode::Cancelled.is_failure());
        assert!(!ResultCode::Classification(3).is_failure());
        assert!(ResultCode::Failure(1).is_failure());
    }

    #[test]
    fn test_signaled_tool_is_not_a_cancel() {
        let err = BuildError::from(ToolError::Signaled {
            command: "shifter --lint-stderr".to_string(),
            signal: 9,
            stderr: String::new(),
        });
        assert_eq!(ResultCode::from(&err), ResultCode::Failure(137));
        assert_ne!(ResultCode::from(&err).as_i32(), ResultCode::Cancelled.as_i32());
    }

    #[test]
    fn test_tool_code_colliding_with_cancel_reports_failure() {
        let err = BuildError::from(ToolError::Failed {
            command: "node wf2_templates.js".to_string(),
            code: -1,
            stderr: String::new(),
        });
        assert_eq!(err.code(), 1);
        assert!(ResultCode::from(&err).is_failure());
    }

    #[test]
    fn test_result_code_from_error() {
        let err = BuildError::Vcs("not a git repository".to_string());
        assert_eq!(ResultCode::from(&err), ResultCode::Failure(1));
    }
}
