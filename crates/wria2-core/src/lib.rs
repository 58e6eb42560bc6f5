//! wria2 Core Library
//!
//! Decides how a wria2 source tree is built or watched and drives the
//! external build tools through `wria2-exec` pipelines.

pub mod classify;
pub mod collab;
pub mod error;
pub mod fakes;
pub mod layout;
pub mod locate;
pub mod mode;
pub mod notify;
pub mod plans;
pub mod prompt;
pub mod request;
pub mod settings;
pub mod shifter;
pub mod steps;
pub mod telemetry;
pub mod vcs;

pub use classify::{classify, Classification, MissingArtifact};
pub use collab::{CommandPackager, LegacyServer, Packager, RetiredServer};
pub use error::{BuildError, Result, ResultCode};
pub use layout::{FullPaths, SoloPaths};
pub use locate::{AncestorLocator, SourceLocator};
pub use mode::{Orchestrator, Plan, RunOutcome, Services};
pub use notify::{LogNotifier, Notification, Notifier};
pub use prompt::{Prompter, TerminalPrompter};
pub use request::{BuildRequest, BuildType, ResolvedRequest};
pub use settings::Settings;
pub use shifter::{ComboChoice, ComboDecision, ConfigMutator, ShifterConfig};
pub use telemetry::{init_tracing, RunSpan};
pub use vcs::{guard_branch, GitCli, Vcs};
