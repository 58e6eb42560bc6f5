//! Build steps shared by the component and full-tree pipelines.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use wria2_exec::{CommandRunner, ExecContext, Flow, Step, ToolInvocation, TriggerSet};

use crate::error::{BuildError, Result};
use crate::notify::{Notification, Notifier};
use crate::prompt::Prompter;
use crate::request::ResolvedRequest;
use crate::settings::Settings;
use crate::shifter::{ComboDecision, ConfigMutator};

/// Everything a step may use during one run. Built once, shared read-only.
pub struct RunEnv {
    pub request: ResolvedRequest,
    pub settings: Settings,
    pub exec: ExecContext,
    pub runner: Arc<dyn CommandRunner>,
    pub prompter: Arc<dyn Prompter>,
    pub notifier: Arc<dyn Notifier>,
}

impl RunEnv {
    /// An invocation honouring the request's verbosity.
    pub fn tool(&self, name: &str, cmdline: &str) -> ToolInvocation {
        ToolInvocation::new(name, cmdline)
            .verbose(self.request.verbose)
            .status(self.request.status())
    }

    /// Ask a yes/no question, or take `default` when prompting is off.
    pub fn confirm(&self, question: &str, default: bool) -> Result<bool> {
        if self.request.prompt {
            self.prompter.confirm(question, default)
        } else {
            debug!(question, default, "Prompting disabled, using default answer");
            Ok(default)
        }
    }
}

/// State threaded through a build pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildState {
    /// Names of the steps that completed, in order.
    pub completed: Vec<String>,
    /// Combo flag decision, once the gate ran.
    pub combo: Option<ComboDecision>,
}

impl BuildState {
    fn done(mut self, step: &str) -> Flow<Self> {
        self.completed.push(step.to_string());
        Flow::Continue(self)
    }
}

/// Run an external tool to completion.
pub struct ToolStep {
    env: Arc<RunEnv>,
    invocation: ToolInvocation,
    only_if_exists: Option<PathBuf>,
    enabled: bool,
}

impl ToolStep {
    pub fn new(env: &Arc<RunEnv>, invocation: ToolInvocation) -> Self {
        Self {
            env: env.clone(),
            invocation,
            only_if_exists: None,
            enabled: true,
        }
    }

    /// Skip the tool at run time when `path` does not exist.
    pub fn only_if_exists(mut self, path: impl Into<PathBuf>) -> Self {
        self.only_if_exists = Some(path.into());
        self
    }

    pub fn when(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

#[async_trait]
impl Step<BuildState, BuildError> for ToolStep {
    fn name(&self) -> &str {
        &self.invocation.name
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    async fn run(&self, state: BuildState) -> Result<Flow<BuildState>> {
        if let Some(path) = &self.only_if_exists {
            if !path.exists() {
                debug!(step = %self.invocation.name, path = %path.display(), "Nothing to do");
                return Ok(Flow::Continue(state));
            }
        }
        self.env.runner.run(&self.invocation, &self.env.exec).await?;
        Ok(state.done(&self.invocation.name))
    }
}

/// Fail unless a file the build depends on exists.
pub struct RequireFile {
    name: String,
    what: &'static str,
    path: PathBuf,
}

impl RequireFile {
    pub fn new(name: &str, what: &'static str, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            what,
            path: path.into(),
        }
    }
}

#[async_trait]
impl Step<BuildState, BuildError> for RequireFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, state: BuildState) -> Result<Flow<BuildState>> {
        if !self.path.exists() {
            warn!("Ooops! It looks like you're missing {}!", self.what);
            return Err(BuildError::MissingSource {
                what: self.what,
                path: self.path.clone(),
            });
        }
        Ok(state.done(&self.name))
    }
}

/// Delete a file or directory tree if present.
pub struct RemovePath {
    name: String,
    path: PathBuf,
    best_effort: bool,
}

impl RemovePath {
    pub fn new(name: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            path: path.into(),
            best_effort: false,
        }
    }

    /// Log removal errors and carry on.
    pub fn best_effort(mut self) -> Self {
        self.best_effort = true;
        self
    }

    async fn remove(&self) -> std::io::Result<()> {
        match tokio::fs::symlink_metadata(&self.path).await {
            Ok(meta) if meta.is_dir() => tokio::fs::remove_dir_all(&self.path).await,
            Ok(_) => tokio::fs::remove_file(&self.path).await,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Step<BuildState, BuildError> for RemovePath {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, state: BuildState) -> Result<Flow<BuildState>> {
        match self.remove().await {
            Ok(()) => debug!(path = %self.path.display(), "Removed"),
            Err(e) if self.best_effort => {
                warn!(path = %self.path.display(), error = %e, "Unable to remove... moving on...");
            }
            Err(e) => return Err(e.into()),
        }
        Ok(state.done(&self.name))
    }
}

/// Create a directory (and parents) if missing.
pub struct EnsureDir {
    name: String,
    path: PathBuf,
}

impl EnsureDir {
    pub fn new(name: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            path: path.into(),
        }
    }
}

#[async_trait]
impl Step<BuildState, BuildError> for EnsureDir {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, state: BuildState) -> Result<Flow<BuildState>> {
        tokio::fs::create_dir_all(&self.path).await?;
        Ok(state.done(&self.name))
    }
}

/// Install the build scripts' npm packages when they are not there yet.
pub struct InstallPackages {
    env: Arc<RunEnv>,
    dir: PathBuf,
}

impl InstallPackages {
    pub fn new(env: &Arc<RunEnv>, dir: impl Into<PathBuf>) -> Self {
        Self {
            env: env.clone(),
            dir: dir.into(),
        }
    }
}

#[async_trait]
impl Step<BuildState, BuildError> for InstallPackages {
    fn name(&self) -> &str {
        "npm_install"
    }

    async fn run(&self, state: BuildState) -> Result<Flow<BuildState>> {
        let manifest = self.dir.join("package.json");
        let modules = self.dir.join("node_modules");
        if !manifest.exists() || modules.exists() {
            debug!(dir = %self.dir.display(), "npm packages already in place");
            return Ok(Flow::Continue(state));
        }

        info!(dir = %self.dir.display(), "Installing npm packages");
        let cmdline = format!("{} install", self.env.settings.npm);
        let invocation = self.env.tool("npm_install", &cmdline).in_dir(&self.dir);
        self.env.runner.run(&invocation, &self.env.exec).await?;
        Ok(state.done("npm_install"))
    }
}

/// Confirm or apply the combo-loader flag before a full build.
pub struct ComboGate {
    env: Arc<RunEnv>,
    shifter_json: PathBuf,
}

impl ComboGate {
    pub fn new(env: &Arc<RunEnv>, shifter_json: impl Into<PathBuf>) -> Self {
        Self {
            env: env.clone(),
            shifter_json: shifter_json.into(),
        }
    }
}

#[async_trait]
impl Step<BuildState, BuildError> for ComboGate {
    fn name(&self) -> &str {
        "combo_gate"
    }

    async fn run(&self, mut state: BuildState) -> Result<Flow<BuildState>> {
        let decision = if self.env.request.prompt {
            match ConfigMutator::new(self.env.prompter.as_ref()).confirm(&self.shifter_json)? {
                Flow::Continue(decision) => decision,
                Flow::Cancelled => return Ok(Flow::Cancelled),
            }
        } else {
            ConfigMutator::apply_override(&self.shifter_json, self.env.request.combo)?
        };
        state.combo = Some(decision);
        Ok(state.done("combo_gate"))
    }
}

/// Ask whether to go on; "no" ends the run as cancelled.
pub struct ConfirmStep {
    env: Arc<RunEnv>,
    name: String,
    question: String,
    default: bool,
    notification: Option<Notification>,
}

impl ConfirmStep {
    pub fn new(env: &Arc<RunEnv>, name: &str, question: &str, default: bool) -> Self {
        Self {
            env: env.clone(),
            name: name.to_string(),
            question: question.to_string(),
            default,
            notification: None,
        }
    }

    /// Send a notification before asking.
    pub fn announce(mut self, notification: Notification) -> Self {
        self.notification = Some(notification);
        self
    }
}

#[async_trait]
impl Step<BuildState, BuildError> for ConfirmStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, state: BuildState) -> Result<Flow<BuildState>> {
        if let Some(notification) = &self.notification {
            self.env.notifier.notify(notification);
        }
        if self.env.confirm(&self.question, self.default)? {
            Ok(state.done(&self.name))
        } else {
            info!("Bye then...");
            Ok(Flow::Cancelled)
        }
    }
}

/// A long-running tool inside a supervised pipeline.
pub struct WatchStep {
    env: Arc<RunEnv>,
    invocation: ToolInvocation,
    triggers: TriggerSet,
}

impl WatchStep {
    pub fn new(env: &Arc<RunEnv>, invocation: ToolInvocation) -> Self {
        Self {
            env: env.clone(),
            invocation: invocation.verbose(true).status(false),
            triggers: TriggerSet::default(),
        }
    }

    pub fn with_triggers(mut self, triggers: TriggerSet) -> Self {
        self.triggers = triggers;
        self
    }
}

#[async_trait]
impl Step<(), BuildError> for WatchStep {
    fn name(&self) -> &str {
        &self.invocation.name
    }

    async fn run(&self, _: ()) -> Result<Flow<()>> {
        self.env
            .runner
            .watch(&self.invocation, &self.env.exec, self.triggers.clone())
            .await?;
        Ok(Flow::Continue(()))
    }
}
