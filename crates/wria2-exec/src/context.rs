//! Per-run execution context handed to every subprocess.
//!
//! The context is built once at the start of a run. It carries the search
//! path the tools are resolved against and the platform's foreground
//! capability, so nothing downstream mutates process-wide state.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use tracing::warn;

/// Whether spawned processes can run attached to the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Foreground {
    /// The child inherits stdin; output is still piped and scanned.
    Available,
    /// The child is fully detached from the terminal; output is piped and scanned.
    Unavailable,
}

impl Foreground {
    /// Resolve the capability for the current platform.
    pub fn detect() -> Self {
        if cfg!(windows) {
            Foreground::Unavailable
        } else {
            Foreground::Available
        }
    }

    pub fn is_available(self) -> bool {
        matches!(self, Foreground::Available)
    }
}

/// Immutable environment for every tool invocation of a run.
#[derive(Debug, Clone)]
pub struct ExecContext {
    search_path: Option<OsString>,
    foreground: Foreground,
}

impl ExecContext {
    /// Context using the inherited `PATH`, optionally with `tool_bin` prepended.
    pub fn new(tool_bin: Option<&Path>) -> Self {
        let search_path = tool_bin.and_then(|dir| {
            let inherited = std::env::var_os("PATH").unwrap_or_default();
            prepend_path(dir, &inherited)
        });

        Self {
            search_path,
            foreground: Foreground::detect(),
        }
    }

    /// Override the detected foreground capability.
    pub fn with_foreground(mut self, foreground: Foreground) -> Self {
        self.foreground = foreground;
        self
    }

    /// The `PATH` value given to children, if it differs from the inherited one.
    pub fn search_path(&self) -> Option<&OsStr> {
        self.search_path.as_deref()
    }

    pub fn foreground(&self) -> Foreground {
        self.foreground
    }

    /// Apply the context to a command before it is spawned.
    pub fn apply(&self, cmd: &mut tokio::process::Command) {
        if let Some(path) = &self.search_path {
            cmd.env("PATH", path);
        }
    }
}

impl Default for ExecContext {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Join `dir` in front of an existing search path using the platform separator.
fn prepend_path(dir: &Path, existing: &OsStr) -> Option<OsString> {
    let mut entries: Vec<PathBuf> = vec![dir.to_path_buf()];
    entries.extend(std::env::split_paths(existing));
    match std::env::join_paths(entries) {
        Ok(joined) => Some(joined),
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Cannot add tool directory to PATH");
            None
        }
    }
}
