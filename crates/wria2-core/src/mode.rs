//! Mode selection and run orchestration.
//!
//! A [`BuildRequest`] is normalised once, mapped to a [`Plan`] and the plan
//! is executed against the configured [`Services`].

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, Instrument};
use wria2_exec::{CommandRunner, ExecContext, Flow, ProcessRunner, SupervisedReport};

use crate::classify::{classify, Classification, MissingArtifact};
use crate::collab::{CommandPackager, LegacyServer, Packager, RetiredServer};
use crate::error::{BuildError, Result, ResultCode};
use crate::layout::{FullPaths, SoloPaths};
use crate::locate::{AncestorLocator, SourceLocator};
use crate::notify::{LogNotifier, Notifier};
use crate::plans;
use crate::prompt::{Prompter, TerminalPrompter};
use crate::request::{BuildRequest, BuildType, ResolvedRequest};
use crate::settings::Settings;
use crate::steps::{BuildState, RunEnv};
use crate::telemetry::{emit_run_finished, emit_run_started, RunSpan};
use crate::vcs::{guard_branch, GitCli, Vcs};

/// How a run ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every step ran (or was skipped); names of the steps that did work.
    Completed { steps: Vec<String> },
    /// The user declined to go on.
    Cancelled,
}

impl RunOutcome {
    pub fn code(&self) -> ResultCode {
        match self {
            RunOutcome::Completed { .. } => ResultCode::Success,
            RunOutcome::Cancelled => ResultCode::Cancelled,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunOutcome::Cancelled)
    }
}

impl From<Flow<BuildState>> for RunOutcome {
    fn from(flow: Flow<BuildState>) -> Self {
        match flow {
            Flow::Continue(state) => RunOutcome::Completed {
                steps: state.completed,
            },
            Flow::Cancelled => RunOutcome::Cancelled,
        }
    }
}

/// Collaborators a run talks to.
#[derive(Clone)]
pub struct Services {
    pub runner: Arc<dyn CommandRunner>,
    pub vcs: Arc<dyn Vcs>,
    pub locator: Arc<dyn SourceLocator>,
    pub prompter: Arc<dyn Prompter>,
    pub notifier: Arc<dyn Notifier>,
    pub packager: Arc<dyn Packager>,
    pub legacy: Arc<dyn LegacyServer>,
}

impl Services {
    /// Real processes, git, the terminal and the log.
    pub fn system(settings: &Settings) -> Self {
        let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner::new());
        Self {
            packager: Arc::new(CommandPackager::new(runner.clone(), settings.packager.clone())),
            runner,
            vcs: Arc::new(GitCli),
            locator: Arc::new(AncestorLocator),
            prompter: Arc::new(TerminalPrompter),
            notifier: Arc::new(LogNotifier),
            legacy: Arc::new(RetiredServer),
        }
    }
}

/// What a request resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Package { remote: bool },
    LegacyServer,
    Soy { root: PathBuf },
    /// The working directory is a component.
    Solo(SoloPaths),
    /// The working directory is not a component; `missing` is why.
    Full {
        paths: FullPaths,
        missing: MissingArtifact,
    },
}

pub struct Orchestrator {
    services: Services,
    settings: Settings,
    exec: ExecContext,
}

impl Orchestrator {
    pub fn new(services: Services, settings: Settings) -> Self {
        let exec = settings.exec_context();
        Self {
            services,
            settings,
            exec,
        }
    }

    /// Replace the execution context derived from the settings.
    pub fn with_exec_context(mut self, exec: ExecContext) -> Self {
        self.exec = exec;
        self
    }

    pub fn exec_context(&self) -> &ExecContext {
        &self.exec
    }

    /// Normalise `request` and run it inside its own span.
    pub async fn run(&self, request: BuildRequest) -> Result<RunOutcome> {
        let request = request.normalize(self.exec.foreground())?;
        let span = RunSpan::new(&request);

        async move {
            emit_run_started(&request);
            let result = self.execute(request).await;
            emit_run_finished(match &result {
                Ok(outcome) => outcome.code().as_i32(),
                Err(err) => err.code(),
            });
            result
        }
        .instrument(span.span())
        .await
    }

    /// Pick the plan for an already normalised request.
    pub fn select(&self, request: &ResolvedRequest) -> Result<Plan> {
        match request.build_type {
            BuildType::War => Ok(Plan::Package {
                remote: request.remote,
            }),
            BuildType::Server => Ok(Plan::LegacyServer),
            BuildType::Soy => match self.services.vcs.root_path(&request.cwd) {
                Ok(root) => Ok(Plan::Soy { root }),
                Err(err) => {
                    debug!(error = %err, "No repository root for Soy templates");
                    Err(BuildError::InvalidSourcePath(request.cwd.clone()))
                }
            },
            BuildType::Build | BuildType::Watch => match classify(&request.cwd) {
                Classification::Component => Ok(Plan::Solo(SoloPaths::new(&request.cwd))),
                Classification::Missing(missing) => {
                    info!(
                        code = missing.code(),
                        missing = missing.describe(),
                        "Not a component, looking for the source root"
                    );
                    let src_root = self.services.locator.locate(&request.cwd)?;
                    Ok(Plan::Full {
                        paths: FullPaths::new(&src_root),
                        missing,
                    })
                }
            },
        }
    }

    /// Select and run the plan for `request`.
    pub async fn execute(&self, request: ResolvedRequest) -> Result<RunOutcome> {
        let plan = self.select(&request)?;
        let services = &self.services;

        match plan {
            Plan::Package { remote: true } => {
                services.packager.package_remote(&request, &self.exec).await
            }
            Plan::Package { remote: false } => {
                services.packager.package_local(&request, &self.exec).await
            }
            Plan::LegacyServer => services.legacy.start(&request, &self.exec).await,
            Plan::Soy { root } => {
                let env = self.env(request);
                Ok(plans::soy(&env, &root).run(BuildState::default()).await?.into())
            }
            Plan::Solo(paths) => {
                let branch = guard_branch(services.vcs.as_ref(), &paths.component)?;
                info!(
                    "About to {} component '{}' on branch '{}'",
                    request.action(),
                    paths.component_name(),
                    branch
                );
                let env = self.env(request);
                match env.request.build_type {
                    BuildType::Watch => {
                        if !env.confirm("Continue?", true)? {
                            info!("Bye then...");
                            return Ok(RunOutcome::Cancelled);
                        }
                        finish_supervised(plans::solo_watch(&env, &paths).run().await)
                    }
                    _ => Ok(plans::solo_build(&env, &paths)
                        .run(BuildState::default())
                        .await?
                        .into()),
                }
            }
            Plan::Full { paths, .. } => {
                let branch = guard_branch(services.vcs.as_ref(), &paths.src_root)?;
                info!(
                    "About to start a full {} for branch '{}'",
                    request.action(),
                    branch
                );
                let env = self.env(request);
                match env.request.build_type {
                    BuildType::Watch => {
                        finish_supervised(plans::full_watch(&env, &paths).run().await)
                    }
                    _ => Ok(plans::full_build(&env, &paths)
                        .run(BuildState::default())
                        .await?
                        .into()),
                }
            }
        }
    }

    fn env(&self, request: ResolvedRequest) -> Arc<RunEnv> {
        Arc::new(RunEnv {
            request,
            settings: self.settings.clone(),
            exec: self.exec.clone(),
            runner: self.services.runner.clone(),
            prompter: self.services.prompter.clone(),
            notifier: self.services.notifier.clone(),
        })
    }
}

/// Completed once every member exited cleanly, else the first failure.
fn finish_supervised(report: SupervisedReport<BuildError>) -> Result<RunOutcome> {
    let steps = report
        .outcomes
        .iter()
        .filter(|o| o.result.is_ok())
        .map(|o| o.name.clone())
        .collect();
    match report.into_first_error() {
        Some(err) => Err(err),
        None => Ok(RunOutcome::Completed { steps }),
    }
}
