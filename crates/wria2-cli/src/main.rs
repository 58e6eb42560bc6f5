//! wria2 - build orchestrator CLI
//!
//! Builds or watches the wria2 component (or whole source tree) the command
//! is run from.
//!
//! ## Commands
//!
//! - `build` (default): build the current component, or the whole tree
//! - `watch`: rebuild on change until interrupted
//! - `soy`: compile the Soy templates of the checkout
//! - `war`: package the checkout
//! - `server`: deprecated

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, warn, Level};

use wria2_core::{
    init_tracing, BuildError, BuildRequest, BuildType, Orchestrator, ResultCode, RunOutcome,
    Services, Settings,
};

#[derive(Parser)]
#[command(name = "wria2")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build, watch and package wria2 source trees", long_about = None)]
struct Cli {
    /// Show the output of every build tool
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress tool status lines
    #[arg(short, long, global = true)]
    silent: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Directory to build from (default: current directory)
    #[arg(long, global = true)]
    cwd: Option<PathBuf>,

    /// Never ask questions; take the default answers
    #[arg(long, global = true)]
    no_prompt: bool,

    /// Force the combo-loader flag in .shifter.json (with --no-prompt)
    #[arg(long, global = true, value_name = "true|false")]
    combo: Option<bool>,

    #[command(flatten)]
    tools: ToolArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct ToolArgs {
    /// Directory searched for build tools before PATH
    #[arg(long, env = "WRIA2_TOOL_BIN")]
    tool_bin: Option<PathBuf>,

    /// Packaging command used by `war`
    #[arg(long, env = "WRIA2_PACKAGER")]
    packager: Option<String>,

    #[arg(long, env = "WRIA2_SHIFTER", default_value = "shifter")]
    shifter: String,

    #[arg(long, env = "WRIA2_COMPASS", default_value = "compass")]
    compass: String,

    #[arg(long, env = "WRIA2_NODE", default_value = "node")]
    node: String,

    #[arg(long, env = "WRIA2_NPM", default_value = "npm")]
    npm: String,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Build the current component, or the whole tree outside of one
    Build {
        /// Run `compass clean` first
        #[arg(long)]
        clean: bool,
    },

    /// Rebuild on every change
    Watch,

    /// Compile Soy templates
    Soy,

    /// Package the checkout
    War {
        /// Package on the remote build host
        #[arg(long)]
        remote: bool,
    },

    /// Start the local server (deprecated)
    Server,
}

impl Cli {
    fn request(&self) -> BuildRequest {
        let (build_type, clean, remote) = match &self.command {
            None => (None, false, false),
            Some(Commands::Build { clean }) => (Some(BuildType::Build), *clean, false),
            Some(Commands::Watch) => (Some(BuildType::Watch), false, false),
            Some(Commands::Soy) => (Some(BuildType::Soy), false, false),
            Some(Commands::War { remote }) => (Some(BuildType::War), false, *remote),
            Some(Commands::Server) => (Some(BuildType::Server), false, false),
        };

        BuildRequest {
            build_type,
            cwd: self.cwd.clone(),
            verbose: self.verbose,
            silent: self.silent,
            prompt: self.no_prompt.then_some(false),
            combo: self.combo,
            clean,
            remote,
        }
    }

    fn settings(&self) -> Settings {
        Settings {
            shifter: self.tools.shifter.clone(),
            compass: self.tools.compass.clone(),
            node: self.tools.node.clone(),
            npm: self.tools.npm.clone(),
            tool_bin: self.tools.tool_bin.clone(),
            packager: self.tools.packager.clone(),
        }
    }
}

/// Process exit code for a finished run. Cancelling is not a failure.
fn exit_code(result: &wria2_core::Result<RunOutcome>) -> i32 {
    match result {
        Ok(outcome) => match outcome.code() {
            ResultCode::Cancelled => 0,
            code => code.as_i32(),
        },
        Err(err) => ResultCode::from(err).as_i32(),
    }
}

fn report(err: &BuildError) {
    error!("{err}");
    if let Some(diagnostics) = err.diagnostics() {
        eprintln!("{diagnostics}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json, level);

    if let Some(dir) = &cli.cwd {
        if !dir.is_dir() {
            bail!("{} is not a directory", dir.display());
        }
    }
    if cli.command == Some(Commands::Server) {
        warn!("The server command is deprecated");
    }

    let settings = cli.settings();
    let orchestrator = Orchestrator::new(Services::system(&settings), settings);
    let result = orchestrator.run(cli.request()).await;

    if let Err(err) = &result {
        report(err);
    }
    match exit_code(&result) {
        0 => Ok(()),
        code => std::process::exit(code),
    }
}
