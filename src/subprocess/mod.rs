//! Shell command execution with fully captured output.
//!
//! Every command line is handed to `/bin/sh -c`. Output is buffered until the
//! child exits; there is no streaming and no timeout.

pub mod builder;
pub mod error;
pub mod mock;
pub mod runner;


pub use builder::ShellCommandBuilder;
pub use error::ProcessError;
pub use mock::{MockCommandConfig, MockProcessRunner};
pub use runner::{CommandResult, ProcessRunner, ShellCommand, TokioProcessRunner, SHELL};

use std::sync::Arc;

#[derive(Clone)]
pub struct SubprocessManager {
    runner: Arc<dyn ProcessRunner>,
}

impl SubprocessManager {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    pub fn production() -> Self {
        Self::new(Arc::new(TokioProcessRunner))
    }

    #[cfg(test)]
    pub fn mock() -> (Self, MockProcessRunner) {
        let mock = MockProcessRunner::new();
        let runner = Arc::new(mock.clone()) as Arc<dyn ProcessRunner>;
        (Self::new(runner), mock)
    }

    pub fn runner(&self) -> Arc<dyn ProcessRunner> {
        Arc::clone(&self.runner)
    }
}

/// Run `command_line` through the shell and capture its result.
///
/// With `echo` set, captured stdout then stderr are written to the console
/// after the child exits. `input`, when given, becomes the child's stdin.
pub async fn run(
    command_line: &str,
    echo: bool,
    input: Option<&str>,
) -> Result<CommandResult, ProcessError> {
    let mut builder = ShellCommandBuilder::new(command_line).echo(echo);
    if let Some(input) = input {
        builder = builder.stdin(input.to_string());
    }
    TokioProcessRunner.run(builder.build()).await
}
