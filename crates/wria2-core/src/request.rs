//! Build requests and their one-time normalisation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use wria2_exec::Foreground;

/// What the caller asked for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BuildType {
    Build,
    Watch,
    /// Packaging, handled by the packaging collaborator.
    War,
    /// Soy template compilation for the whole tree.
    Soy,
    /// Deprecated local server.
    Server,
}

impl BuildType {
    pub fn name(&self) -> &'static str {
        match self {
            BuildType::Build => "build",
            BuildType::Watch => "watch",
            BuildType::War => "war",
            BuildType::Soy => "soy",
            BuildType::Server => "server",
        }
    }
}

impl std::fmt::Display for BuildType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A raw request as received from the CLI or another caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildRequest {
    /// Defaults to [`BuildType::Build`].
    pub build_type: Option<BuildType>,

    /// Directory the run starts from; the process cwd when `None`.
    pub cwd: Option<PathBuf>,

    pub verbose: bool,

    pub silent: bool,

    /// Ask before mutating configuration. Defaults to `true`.
    pub prompt: Option<bool>,

    /// Explicit combo-loader flag, applied without prompting.
    pub combo: Option<bool>,

    /// Clear generated CSS before a component build.
    pub clean: bool,

    /// Package remotely instead of locally.
    pub remote: bool,
}

impl BuildRequest {
    pub fn new(build_type: BuildType) -> Self {
        Self {
            build_type: Some(build_type),
            ..Self::default()
        }
    }

    pub fn in_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Resolve every optional field exactly once.
    ///
    /// Without foreground support tool output is always shown and status
    /// lines are suppressed.
    pub fn normalize(self, foreground: Foreground) -> std::io::Result<ResolvedRequest> {
        let cwd = match self.cwd {
            Some(dir) if dir.is_absolute() => dir,
            Some(dir) => std::env::current_dir()?.join(dir),
            None => std::env::current_dir()?,
        };

        let (verbose, silent) = if foreground.is_available() {
            (self.verbose, self.silent)
        } else {
            (true, true)
        };

        Ok(ResolvedRequest {
            build_type: self.build_type.unwrap_or(BuildType::Build),
            cwd,
            verbose,
            silent,
            prompt: self.prompt.unwrap_or(true),
            combo: self.combo,
            clean: self.clean,
            remote: self.remote,
        })
    }
}

/// A fully resolved request. Immutable for the rest of the run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedRequest {
    pub build_type: BuildType,
    pub cwd: PathBuf,
    pub verbose: bool,
    pub silent: bool,
    pub prompt: bool,
    pub combo: Option<bool>,
    pub clean: bool,
    pub remote: bool,
}

impl ResolvedRequest {
    /// "watch" for watch runs, "build" otherwise.
    pub fn action(&self) -> &'static str {
        if self.build_type == BuildType::Watch {
            "watch"
        } else {
            "build"
        }
    }

    /// Whether tools should log status lines.
    pub fn status(&self) -> bool {
        !self.silent
    }
}
