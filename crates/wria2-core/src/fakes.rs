//! In-memory collaborators for tests and dry runs.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use wria2_exec::{
    CommandRunner, ExecContext, ToolError, ToolInvocation, ToolOutput, ToolResult, TriggerSet,
};

use crate::collab::{LegacyServer, Packager};
use crate::error::{BuildError, Result};
use crate::notify::{Notification, Notifier};
use crate::prompt::Prompter;
use crate::request::ResolvedRequest;
use crate::vcs::Vcs;
use crate::RunOutcome;

/// [`Prompter`] answering from a fixed script. An empty answer picks the
/// prompt's default; running out of answers is a prompt error.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Questions asked so far, in order.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }

    fn next(&self, message: &str) -> Result<String> {
        self.asked.lock().unwrap().push(message.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| BuildError::Prompt(format!("no scripted answer for: {message}")))
    }
}

impl Prompter for ScriptedPrompter {
    fn input(&self, message: &str, default: &str) -> Result<String> {
        let answer = self.next(message)?;
        if answer.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(answer)
        }
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        let answer = self.next(message)?;
        match answer.trim().to_lowercase().as_str() {
            "" => Ok(default),
            "y" | "yes" => Ok(true),
            "n" | "no" => Ok(false),
            other => Err(BuildError::Prompt(format!("unexpected answer: {other}"))),
        }
    }
}

/// One call seen by [`RecordingRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub invocation: ToolInvocation,
    pub watch: bool,
}

/// [`CommandRunner`] that records invocations instead of spawning processes.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<RecordedCall>>,
    failures: Vec<(String, i32, String)>,
    watch_output: Vec<(String, Vec<String>)>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every invocation whose command line contains `needle`.
    pub fn fail_on(mut self, needle: &str, code: i32, stderr: &str) -> Self {
        self.failures
            .push((needle.to_string(), code, stderr.to_string()));
        self
    }

    /// Lines a watched invocation containing `needle` prints before exiting.
    pub fn watch_prints<I, S>(mut self, needle: &str, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.watch_output
            .push((needle.to_string(), lines.into_iter().map(Into::into).collect()));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Command lines of all calls, in order.
    pub fn cmdlines(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|c| c.invocation.cmdline())
            .collect()
    }

    fn record(&self, invocation: &ToolInvocation, watch: bool) -> ToolResult<()> {
        self.calls.lock().unwrap().push(RecordedCall {
            invocation: invocation.clone(),
            watch,
        });
        let cmdline = invocation.cmdline();
        match self
            .failures
            .iter()
            .find(|(needle, _, _)| cmdline.contains(needle.as_str()))
        {
            Some((_, code, stderr)) => Err(ToolError::Failed {
                command: cmdline,
                code: *code,
                stderr: stderr.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, invocation: &ToolInvocation, _ctx: &ExecContext) -> ToolResult<ToolOutput> {
        self.record(invocation, false)?;
        Ok(ToolOutput {
            name: invocation.name.clone(),
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
            duration_ms: 0,
        })
    }

    async fn watch(
        &self,
        invocation: &ToolInvocation,
        _ctx: &ExecContext,
        mut triggers: TriggerSet,
    ) -> ToolResult<()> {
        let cmdline = invocation.cmdline();
        for (needle, lines) in &self.watch_output {
            if cmdline.contains(needle.as_str()) {
                for line in lines {
                    triggers.scan(line);
                }
            }
        }
        self.record(invocation, true)
    }
}

/// [`Vcs`] with a fixed answer.
#[derive(Debug, Clone)]
pub struct StaticVcs {
    branch: Option<String>,
    root: Option<PathBuf>,
}

impl StaticVcs {
    pub fn on_branch(branch: &str) -> Self {
        Self {
            branch: Some(branch.to_string()),
            root: None,
        }
    }

    /// A directory that is not under version control.
    pub fn not_a_repository() -> Self {
        Self {
            branch: None,
            root: None,
        }
    }

    pub fn with_root(mut self, root: impl AsRef<Path>) -> Self {
        self.root = Some(root.as_ref().to_path_buf());
        self
    }
}

impl Vcs for StaticVcs {
    fn current_branch(&self, _dir: &Path) -> Result<String> {
        self.branch
            .clone()
            .ok_or_else(|| BuildError::Vcs("not a git repository".to_string()))
    }

    fn root_path(&self, _dir: &Path) -> Result<PathBuf> {
        self.root
            .clone()
            .ok_or_else(|| BuildError::Vcs("not a git repository".to_string()))
    }
}

/// [`Notifier`] keeping every notification.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) {
        self.sent.lock().unwrap().push(notification.clone());
    }
}

/// Packaging and legacy-server collaborator recording the requests it saw.
#[derive(Debug, Default)]
pub struct RecordingDelegate {
    seen: Mutex<Vec<(&'static str, ResolvedRequest)>>,
}

impl RecordingDelegate {
    /// `(entry point, request)` pairs in call order.
    pub fn seen(&self) -> Vec<(&'static str, ResolvedRequest)> {
        self.seen.lock().unwrap().clone()
    }

    fn record(&self, entry: &'static str, request: &ResolvedRequest) -> Result<RunOutcome> {
        self.seen.lock().unwrap().push((entry, request.clone()));
        Ok(RunOutcome::Completed {
            steps: vec![entry.to_string()],
        })
    }
}

#[async_trait]
impl Packager for RecordingDelegate {
    async fn package_local(&self, request: &ResolvedRequest, _ctx: &ExecContext) -> Result<RunOutcome> {
        self.record("package_local", request)
    }

    async fn package_remote(&self, request: &ResolvedRequest, _ctx: &ExecContext) -> Result<RunOutcome> {
        self.record("package_remote", request)
    }
}

#[async_trait]
impl LegacyServer for RecordingDelegate {
    async fn start(&self, request: &ResolvedRequest, _ctx: &ExecContext) -> Result<RunOutcome> {
        self.record("server", request)
    }
}
