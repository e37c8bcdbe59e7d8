use std::path::Path;

use crate::subprocess::ShellCommand;

pub struct ShellCommandBuilder {
    command: ShellCommand,
}

impl ShellCommandBuilder {
    pub fn new(command_line: &str) -> Self {
        Self {
            command: ShellCommand {
                command_line: command_line.to_string(),
                echo: true,
                stdin: None,
                working_dir: None,
                trim_whitespace: true,
            },
        }
    }

    /// Echo captured stdout/stderr to the console once the child exits
    pub fn echo(mut self, echo: bool) -> Self {
        self.command.echo = echo;
        self
    }

    pub fn stdin(mut self, input: String) -> Self {
        self.command.stdin = Some(input);
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.command.working_dir = Some(dir.to_path_buf());
        self
    }

    pub fn trim_whitespace(mut self, trim: bool) -> Self {
        self.command.trim_whitespace = trim;
        self
    }

    pub fn build(self) -> ShellCommand {
        self.command
    }
}
