//! Tool execution: the process-spawn collaborator.

use crate::context::ExecContext;
use crate::error::{ToolError, ToolResult};
use crate::invocation::ToolInvocation;
use crate::trigger::TriggerSet;
use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Output of a finished tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Invocation name.
    pub name: String,

    /// Exit code (0 = success).
    pub exit_code: i32,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl ToolOutput {
    pub fn passed(&self) -> bool {
        self.exit_code == 0
    }
}

/// Spawns external tools on behalf of the pipelines.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a tool to completion. A non-zero exit is a [`ToolError::Failed`]
    /// and a kill by signal a [`ToolError::Signaled`], both carrying the
    /// tool's stderr.
    async fn run(&self, invocation: &ToolInvocation, ctx: &ExecContext) -> ToolResult<ToolOutput>;

    /// Run a long-lived tool, scanning each output line against `triggers`.
    /// Resolves only when the process exits.
    async fn watch(
        &self,
        invocation: &ToolInvocation,
        ctx: &ExecContext,
        triggers: TriggerSet,
    ) -> ToolResult<()>;
}

/// [`CommandRunner`] backed by real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(invocation: &ToolInvocation, ctx: &ExecContext) -> ToolResult<Command> {
        let (exe, args) = invocation
            .command
            .split_first()
            .ok_or_else(|| ToolError::EmptyCommand(invocation.name.clone()))?;

        let mut cmd = Command::new(exe);
        cmd.args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &invocation.cwd {
            cmd.current_dir(dir);
        }
        ctx.apply(&mut cmd);
        Ok(cmd)
    }

    fn spawn(mut cmd: Command, invocation: &ToolInvocation) -> ToolResult<Child> {
        cmd.spawn().map_err(|source| ToolError::Spawn {
            command: invocation.cmdline(),
            source,
        })
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &ToolInvocation, ctx: &ExecContext) -> ToolResult<ToolOutput> {
        let start = Instant::now();
        let mut cmd = Self::command(invocation, ctx)?;
        cmd.stdin(Stdio::null());

        if invocation.status {
            info!(tool = %invocation.name, "Running {}", invocation);
        } else {
            debug!(tool = %invocation.name, "Running {}", invocation);
        }

        let mut child = Self::spawn(cmd, invocation)?;
        let mut no_triggers = TriggerSet::default();
        let (stdout, stderr) = drain_output(&mut child, invocation.verbose, &mut no_triggers).await;
        let status = child.wait().await.map_err(|source| ToolError::Spawn {
            command: invocation.cmdline(),
            source,
        })?;

        if !status.success() {
            return Err(exit_failure(invocation, status, stderr));
        }

        let output = ToolOutput {
            name: invocation.name.clone(),
            exit_code: 0,
            stdout,
            stderr,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        if invocation.status {
            info!(tool = %invocation.name, duration_ms = output.duration_ms, "Done");
        }
        Ok(output)
    }

    async fn watch(
        &self,
        invocation: &ToolInvocation,
        ctx: &ExecContext,
        mut triggers: TriggerSet,
    ) -> ToolResult<()> {
        let mut cmd = Self::command(invocation, ctx)?;
        if ctx.foreground().is_available() {
            cmd.stdin(Stdio::inherit());
        } else {
            cmd.stdin(Stdio::null());
        }

        debug!(tool = %invocation.name, foreground = ?ctx.foreground(), "Watching {}", invocation);

        let mut child = Self::spawn(cmd, invocation)?;
        let (_, stderr) = drain_output(&mut child, true, &mut triggers).await;
        let status = child.wait().await.map_err(|source| ToolError::Spawn {
            command: invocation.cmdline(),
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(exit_failure(invocation, status, stderr))
        }
    }
}

/// Error for a tool that did not exit successfully.
fn exit_failure(invocation: &ToolInvocation, status: ExitStatus, stderr: String) -> ToolError {
    let command = invocation.cmdline();
    if let Some(code) = status.code() {
        return ToolError::Failed {
            command,
            code,
            stderr,
        };
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return ToolError::Signaled {
                command,
                signal,
                stderr,
            };
        }
    }
    ToolError::Failed {
        command,
        code: 1,
        stderr,
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Read both output streams line by line until they close.
async fn drain_output(child: &mut Child, echo: bool, triggers: &mut TriggerSet) -> (String, String) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    if let Some(out) = child.stdout.take() {
        tokio::spawn(forward_lines(out, Stream::Stdout, tx.clone()));
    }
    if let Some(err) = child.stderr.take() {
        tokio::spawn(forward_lines(err, Stream::Stderr, tx.clone()));
    }
    drop(tx);

    let mut stdout = String::new();
    let mut stderr = String::new();
    while let Some((stream, line)) = rx.recv().await {
        triggers.scan(&line);
        let buf = match stream {
            Stream::Stdout => {
                if echo {
                    println!("{line}");
                }
                &mut stdout
            }
            Stream::Stderr => {
                if echo {
                    eprintln!("{line}");
                }
                &mut stderr
            }
        };
        buf.push_str(&line);
        buf.push('\n');
    }
    (stdout, stderr)
}

async fn forward_lines<R>(reader: R, stream: Stream, tx: mpsc::UnboundedSender<(Stream, String)>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    // Tools may print bytes that are not UTF-8; decode lossily and keep
    // draining so the child never sees a closed pipe.
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let raw = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = String::from_utf8_lossy(raw).into_owned();
        if tx.send((stream, line)).is_err() {
            break;
        }
    }
}
