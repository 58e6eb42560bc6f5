//! Version-control queries and the branch guard.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{error, info};

use crate::error::{BuildError, Result};

/// Version-control layer consulted before a build starts.
pub trait Vcs: Send + Sync {
    /// Name of the checked-out branch of the repository containing `dir`.
    fn current_branch(&self, dir: &Path) -> Result<String>;

    /// Top-level directory of the repository containing `dir`.
    fn root_path(&self, dir: &Path) -> Result<PathBuf>;
}

/// [`Vcs`] backed by the `git` binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitCli;

impl GitCli {
    fn rev_parse(dir: &Path, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .arg("rev-parse")
            .args(args)
            .current_dir(dir)
            .output()
            .map_err(|e| BuildError::Vcs(format!("failed to run git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BuildError::Vcs(format!(
                "git rev-parse {} failed: {}",
                args.join(" "),
                stderr.trim()
            )));
        }

        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if value.is_empty() {
            return Err(BuildError::Vcs(format!(
                "git rev-parse {} returned empty output",
                args.join(" ")
            )));
        }
        Ok(value)
    }
}

impl Vcs for GitCli {
    fn current_branch(&self, dir: &Path) -> Result<String> {
        Self::rev_parse(dir, &["--abbrev-ref", "HEAD"])
    }

    fn root_path(&self, dir: &Path) -> Result<PathBuf> {
        Self::rev_parse(dir, &["--show-toplevel"]).map(PathBuf::from)
    }
}

/// Resolve the current branch or stop the run.
///
/// The branch is only reported; it never influences which pipeline runs.
pub fn guard_branch(vcs: &dyn Vcs, dir: &Path) -> Result<String> {
    match vcs.current_branch(dir) {
        Ok(branch) => {
            info!(branch = %branch, dir = %dir.display(), "Resolved current branch");
            Ok(branch)
        }
        Err(err) => {
            error!("Unable to find the current branch of the git repository!");
            error!(error = %err);
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command as StdCommand;

    fn run_git(repo_dir: &Path, args: &[&str]) {
        let output = StdCommand::new("git")
            .args(args)
            .current_dir(repo_dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    fn make_git_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        run_git(dir.path(), &["init"]);
        run_git(dir.path(), &["checkout", "-b", "feature/combo"]);
        run_git(dir.path(), &["config", "user.name", "test-user"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["commit", "--allow-empty", "-m", "initial"]);
        dir
    }

    #[test]
    fn current_branch_reads_checked_out_branch() {
        let repo = make_git_repo();
        let branch = GitCli.current_branch(repo.path()).unwrap();
        assert_eq!(branch, "feature/combo");
    }

    #[test]
    fn root_path_from_subdirectory() {
        let repo = make_git_repo();
        let nested = repo.path().join("wf2").join("src");
        std::fs::create_dir_all(&nested).unwrap();

        let root = GitCli.root_path(&nested).unwrap();
        assert_eq!(
            root.canonicalize().unwrap(),
            repo.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn guard_fails_outside_repo() {
        let dir = tempfile::tempdir().unwrap();
        let err = guard_branch(&GitCli, dir.path()).unwrap_err();
        assert!(matches!(err, BuildError::Vcs(_)));
    }

    #[test]
    fn guard_returns_branch() {
        let repo = make_git_repo();
        assert_eq!(guard_branch(&GitCli, repo.path()).unwrap(), "feature/combo");
    }
}
