//! wria2-exec - pipelines and tool execution for wria2 builds
//!
//! Provides:
//! - Sequential step pipelines that stop at the first failure
//! - Supervised pipelines for long-running watch processes
//! - The process-spawn collaborator and its per-run execution context
//! - Output-pattern triggers for watched processes

pub mod context;
pub mod error;
pub mod invocation;
pub mod pipeline;
pub mod runner;
pub mod trigger;

// Re-export key types
pub use context::{ExecContext, Foreground};
pub use error::{ToolError, ToolResult};
pub use invocation::ToolInvocation;
pub use pipeline::{
    Flow, FnStep, MemberOutcome, SequentialPipeline, Step, StepFuture, SupervisedPipeline,
    SupervisedReport,
};
pub use runner::{CommandRunner, ProcessRunner, ToolOutput};
pub use trigger::{TriggerAction, TriggerRule, TriggerSet};
