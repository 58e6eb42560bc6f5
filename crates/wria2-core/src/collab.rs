//! Collaborators the orchestrator delegates whole requests to.

use async_trait::async_trait;
use std::sync::Arc;
use wria2_exec::{CommandRunner, ExecContext, ToolInvocation};

use crate::error::{BuildError, Result};
use crate::request::ResolvedRequest;
use crate::RunOutcome;

/// Builds deployable packages (War requests).
#[async_trait]
pub trait Packager: Send + Sync {
    async fn package_local(&self, request: &ResolvedRequest, ctx: &ExecContext) -> Result<RunOutcome>;

    async fn package_remote(&self, request: &ResolvedRequest, ctx: &ExecContext) -> Result<RunOutcome>;
}

/// Starts the deprecated local server.
#[async_trait]
pub trait LegacyServer: Send + Sync {
    async fn start(&self, request: &ResolvedRequest, ctx: &ExecContext) -> Result<RunOutcome>;
}

/// [`Packager`] running an external packaging command with `--local` or
/// `--remote`.
pub struct CommandPackager {
    runner: Arc<dyn CommandRunner>,
    command: Option<String>,
}

impl CommandPackager {
    pub fn new(runner: Arc<dyn CommandRunner>, command: Option<String>) -> Self {
        Self { runner, command }
    }

    async fn package(
        &self,
        flag: &str,
        request: &ResolvedRequest,
        ctx: &ExecContext,
    ) -> Result<RunOutcome> {
        let command = self.command.as_deref().ok_or_else(|| {
            BuildError::Collaborator(anyhow::anyhow!(
                "no packaging command configured (set WRIA2_PACKAGER)"
            ))
        })?;

        let invocation = ToolInvocation::new("package", &format!("{command} {flag}"))
            .in_dir(&request.cwd)
            .verbose(request.verbose)
            .status(request.status());
        self.runner.run(&invocation, ctx).await?;

        Ok(RunOutcome::Completed {
            steps: vec![invocation.name],
        })
    }
}

#[async_trait]
impl Packager for CommandPackager {
    async fn package_local(&self, request: &ResolvedRequest, ctx: &ExecContext) -> Result<RunOutcome> {
        self.package("--local", request, ctx).await
    }

    async fn package_remote(&self, request: &ResolvedRequest, ctx: &ExecContext) -> Result<RunOutcome> {
        self.package("--remote", request, ctx).await
    }
}

/// The server was retired; requests for it are refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetiredServer;

#[async_trait]
impl LegacyServer for RetiredServer {
    async fn start(&self, _request: &ResolvedRequest, _ctx: &ExecContext) -> Result<RunOutcome> {
        Err(BuildError::Deprecated("server"))
    }
}
