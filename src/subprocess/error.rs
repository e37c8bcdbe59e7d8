#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// The shell itself could not be started. Distinct from a command that
    /// ran and exited nonzero, which is an `Ok` result.
    #[error("Failed to spawn shell for '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Mock expectation not met: {0}")]
    MockExpectationNotMet(String),
}

impl ProcessError {
    /// True when the failure happened before the command could run at all
    pub fn is_spawn_failure(&self) -> bool {
        matches!(self, ProcessError::SpawnFailed { .. })
    }
}
