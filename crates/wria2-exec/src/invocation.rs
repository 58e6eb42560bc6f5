//! External tool invocations.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A single call to an external build tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Human-readable name used in logs.
    pub name: String,

    /// Command to execute (first element is executable).
    pub command: Vec<String>,

    /// Working directory; the runner's own cwd when `None`.
    pub cwd: Option<PathBuf>,

    /// Echo the tool's output while it runs.
    pub verbose: bool,

    /// Log a start/finish status line around the call.
    pub status: bool,
}

impl ToolInvocation {
    /// Build an invocation from a whitespace-separated command line.
    pub fn new(name: impl Into<String>, cmdline: &str) -> Self {
        Self {
            name: name.into(),
            command: cmdline.split_whitespace().map(str::to_string).collect(),
            cwd: None,
            verbose: false,
            status: true,
        }
    }

    /// Run in the given directory.
    pub fn in_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn status(mut self, status: bool) -> Self {
        self.status = status;
        self
    }

    /// The command line as a single string, for logs and errors.
    pub fn cmdline(&self) -> String {
        self.command.join(" ")
    }
}

impl std::fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.cwd {
            Some(dir) => write!(f, "{} (in {})", self.cmdline(), dir.display()),
            None => write!(f, "{}", self.cmdline()),
        }
    }
}
