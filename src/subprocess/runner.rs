use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use super::error::ProcessError;

/// Interpreter every command line is handed to
pub const SHELL: &str = "/bin/sh";

#[derive(Debug, Clone)]
pub struct ShellCommand {
    pub command_line: String,
    pub echo: bool,
    pub stdin: Option<String>,
    pub working_dir: Option<PathBuf>,
    pub trim_whitespace: bool,
}

/// Outcome of one command execution.
///
/// Built once after the child has exited and never mutated. A nonzero exit
/// code is an ordinary value here; callers decide what it means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    exit_code: i32,
    stdout: String,
    stderr: String,
    stdin: String,
    trim_whitespace: bool,
    duration: Duration,
}

impl Default for CommandResult {
    fn default() -> Self {
        Self {
            exit_code: Self::NOT_RUN,
            stdout: String::new(),
            stderr: String::new(),
            stdin: String::new(),
            trim_whitespace: true,
            duration: Duration::ZERO,
        }
    }
}

impl CommandResult {
    /// Exit code of a result whose command never ran
    pub const NOT_RUN: i32 = -1;

    pub fn new(
        exit_code: i32,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
        stdin: impl Into<String>,
    ) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            stdin: stdin.into(),
            ..Self::default()
        }
    }

    /// Same result with a different whitespace trimming policy
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim_whitespace = trim;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    pub fn trims_whitespace(&self) -> bool {
        self.trim_whitespace
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn stdout(&self) -> &str {
        self.view(&self.stdout)
    }

    pub fn stderr(&self) -> &str {
        self.view(&self.stderr)
    }

    /// Input that was written to the child, empty if none was sent
    pub fn stdin(&self) -> &str {
        self.view(&self.stdin)
    }

    pub fn raw_stdout(&self) -> &str {
        &self.stdout
    }

    pub fn raw_stderr(&self) -> &str {
        &self.stderr
    }

    pub fn raw_stdin(&self) -> &str {
        &self.stdin
    }

    fn view<'a>(&self, field: &'a str) -> &'a str {
        if self.trim_whitespace {
            field.trim()
        } else {
            field
        }
    }
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, command: ShellCommand) -> Result<CommandResult, ProcessError>;
}

/// Runs command lines through `/bin/sh -c`, buffering all output.
///
/// There is no timeout: `run` resolves only once the child exits and both
/// pipes are drained.
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    /// Log command execution details
    fn log_command_start(command: &ShellCommand) {
        tracing::debug!("Executing shell command: {}", command.command_line);

        if let Some(ref dir) = command.working_dir {
            tracing::trace!("Working directory: {:?}", dir);
        }

        if let Some(ref stdin) = command.stdin {
            tracing::trace!("Stdin provided: {} bytes", stdin.len());
        }
    }

    /// Configure the shell invocation and its stdio pipes
    fn configure_command(shell: &str, command: &ShellCommand) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(shell);
        cmd.arg("-c").arg(&command.command_line);

        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }

        if command.stdin.is_some() {
            cmd.stdin(Stdio::piped());
        } else {
            cmd.stdin(Stdio::null());
        }
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        cmd
    }

    /// Write stdin data to the child process and close the pipe
    async fn write_stdin(
        pipe: Option<tokio::process::ChildStdin>,
        stdin_data: Option<&str>,
    ) -> Result<(), ProcessError> {
        let (Some(mut stdin), Some(data)) = (pipe, stdin_data) else {
            return Ok(());
        };

        use tokio::io::AsyncWriteExt;
        match stdin.write_all(data.as_bytes()).await {
            Ok(()) => {}
            // The child may exit without reading its input; that is its business
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                tracing::trace!("Child closed stdin before all input was written");
                return Ok(());
            }
            Err(e) => return Err(ProcessError::Io(e)),
        }
        stdin.shutdown().await.map_err(ProcessError::Io)
    }

    /// Convert process exit status to a plain integer code
    fn parse_exit_code(status: std::process::ExitStatus) -> i32 {
        match status.code() {
            Some(code) => code,
            None => Self::parse_signal_code(status),
        }
    }

    /// Killed by a signal: report it the way shells do
    #[cfg(unix)]
    fn parse_signal_code(status: std::process::ExitStatus) -> i32 {
        use std::os::unix::process::ExitStatusExt;
        status.signal().map(|signal| 128 + signal).unwrap_or(1)
    }

    #[cfg(not(unix))]
    fn parse_signal_code(_status: std::process::ExitStatus) -> i32 {
        1
    }

    /// Replay captured output on the console, stdout first
    fn echo_output(result: &CommandResult) -> Result<(), ProcessError> {
        let mut out = std::io::stdout().lock();
        for captured in [result.raw_stdout(), result.raw_stderr()] {
            if captured.is_empty() {
                continue;
            }
            out.write_all(captured.as_bytes())?;
            if !captured.ends_with('\n') {
                out.write_all(b"\n")?;
            }
        }
        out.flush()?;
        Ok(())
    }

    /// Log the process execution result
    fn log_result(result: &CommandResult, command: &ShellCommand) {
        if result.succeeded() {
            tracing::debug!(
                "Shell command completed successfully in {:?}: {}",
                result.duration(),
                command.command_line
            );
        } else {
            tracing::debug!(
                "Shell command exited with code {} in {:?}: {}",
                result.exit_code(),
                result.duration(),
                command.command_line
            );
        }
        tracing::trace!("Stdout length: {} bytes", result.raw_stdout().len());
        tracing::trace!("Stderr length: {} bytes", result.raw_stderr().len());
    }

    /// Run `command` with `shell` standing in for `/bin/sh`
    pub(crate) async fn run_with_shell(
        shell: &str,
        command: ShellCommand,
    ) -> Result<CommandResult, ProcessError> {
        let start = std::time::Instant::now();

        Self::log_command_start(&command);

        let mut cmd = Self::configure_command(shell, &command);
        let mut child = cmd.spawn().map_err(|e| {
            tracing::error!("Failed to spawn {} for '{}': {}", shell, command.command_line, e);
            ProcessError::SpawnFailed {
                command: command.command_line.clone(),
                source: e,
            }
        })?;

        // Feed stdin while draining stdout/stderr so a chatty child cannot
        // fill its output pipe and stall waiting on us
        let stdin_pipe = child.stdin.take();
        let (written, output) = tokio::join!(
            Self::write_stdin(stdin_pipe, command.stdin.as_deref()),
            child.wait_with_output()
        );
        written?;
        let output = output.map_err(ProcessError::Io)?;

        let result = CommandResult::new(
            Self::parse_exit_code(output.status),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
            command.stdin.clone().unwrap_or_default(),
        )
        .with_trim(command.trim_whitespace)
        .with_duration(start.elapsed());

        Self::log_result(&result, &command);

        if command.echo {
            Self::echo_output(&result)?;
        }

        Ok(result)
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, command: ShellCommand) -> Result<CommandResult, ProcessError> {
        Self::run_with_shell(SHELL, command).await
    }
}
