//! Tracing setup and run-scoped spans.
//!
//! [`init_tracing`] configures the global subscriber once per process;
//! later calls are ignored.

use tracing::{info, Level, Span};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

use crate::request::ResolvedRequest;

/// Initialise the global tracing subscriber.
///
/// `RUST_LOG` wins over `level` when set. With `json`, lines are emitted as
/// newline-delimited JSON.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).without_time())
            .try_init()
            .ok();
    }
}

/// Identity of one orchestrator run, carried by every log line it emits.
#[derive(Debug, Clone)]
pub struct RunSpan {
    run_id: Uuid,
    span: Span,
}

impl RunSpan {
    pub fn new(request: &ResolvedRequest) -> Self {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "wria2.run",
            run_id = %run_id,
            build_type = %request.build_type,
        );
        Self { run_id, span }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// The span to instrument the run's future with.
    pub fn span(&self) -> Span {
        self.span.clone()
    }
}

pub fn emit_run_started(request: &ResolvedRequest) {
    info!(
        event = "run.started",
        build_type = %request.build_type,
        cwd = %request.cwd.display(),
        prompt = request.prompt,
    );
}

pub fn emit_run_finished(code: i32) {
    info!(event = "run.finished", code);
}
