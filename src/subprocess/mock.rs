use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::error::ProcessError;
use super::runner::{CommandResult, ProcessRunner, ShellCommand};

#[derive(Clone)]
pub struct MockProcessRunner {
    expectations: Arc<Mutex<Vec<MockExpectation>>>,
    call_history: Arc<Mutex<Vec<ShellCommand>>>,
}

struct MockExpectation {
    prefix: String,
    exit_code: i32,
    stdout: String,
    stderr: String,
    spawn_failure: bool,
    times_called: usize,
    expected_times: Option<usize>,
}

pub struct MockCommandConfig {
    runner: MockProcessRunner,
    expectation: MockExpectation,
}

impl MockProcessRunner {
    pub fn new() -> Self {
        Self {
            expectations: Arc::new(Mutex::new(Vec::new())),
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Expect a command line starting with `prefix`
    pub fn expect_command(&mut self, prefix: &str) -> MockCommandConfig {
        MockCommandConfig {
            runner: self.clone(),
            expectation: MockExpectation {
                prefix: prefix.to_string(),
                exit_code: 0,
                stdout: String::new(),
                stderr: String::new(),
                spawn_failure: false,
                times_called: 0,
                expected_times: None,
            },
        }
    }

    pub fn verify_called(&self, prefix: &str, times: usize) -> bool {
        let history = self.call_history.lock().unwrap();
        let count = history
            .iter()
            .filter(|cmd| cmd.command_line.starts_with(prefix))
            .count();
        count == times
    }

    pub fn get_call_history(&self) -> Vec<ShellCommand> {
        self.call_history.lock().unwrap().clone()
    }

    pub fn reset(&mut self) {
        self.expectations.lock().unwrap().clear();
        self.call_history.lock().unwrap().clear();
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    async fn run(&self, command: ShellCommand) -> Result<CommandResult, ProcessError> {
        self.call_history.lock().unwrap().push(command.clone());

        let mut expectations = self.expectations.lock().unwrap();

        for expectation in expectations.iter_mut() {
            if !command.command_line.starts_with(&expectation.prefix) {
                continue;
            }

            expectation.times_called += 1;

            if let Some(expected) = expectation.expected_times {
                if expectation.times_called > expected {
                    return Err(ProcessError::MockExpectationNotMet(format!(
                        "Command '{}' called {} times, expected {}",
                        command.command_line, expectation.times_called, expected
                    )));
                }
            }

            if expectation.spawn_failure {
                return Err(ProcessError::SpawnFailed {
                    command: command.command_line.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "mock spawn failure"),
                });
            }

            let result = CommandResult::new(
                expectation.exit_code,
                expectation.stdout.as_str(),
                expectation.stderr.as_str(),
                command.stdin.clone().unwrap_or_default(),
            )
            .with_trim(command.trim_whitespace);
            return Ok(result);
        }

        Err(ProcessError::MockExpectationNotMet(format!(
            "No expectation found for command: {}",
            command.command_line
        )))
    }
}

impl MockCommandConfig {
    pub fn returns_stdout(mut self, stdout: &str) -> Self {
        self.expectation.stdout = stdout.to_string();
        self
    }

    pub fn returns_stderr(mut self, stderr: &str) -> Self {
        self.expectation.stderr = stderr.to_string();
        self
    }

    pub fn returns_exit_code(mut self, code: i32) -> Self {
        self.expectation.exit_code = code;
        self
    }

    pub fn returns_success(mut self) -> Self {
        self.expectation.exit_code = 0;
        self
    }

    /// Fail as if the shell could not be started
    pub fn fails_to_spawn(mut self) -> Self {
        self.expectation.spawn_failure = true;
        self
    }

    pub fn times(mut self, n: usize) -> Self {
        self.expectation.expected_times = Some(n);
        self
    }

    pub fn finish(self) {
        self.runner
            .expectations
            .lock()
            .unwrap()
            .push(self.expectation);
    }
}

impl Default for MockProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}
