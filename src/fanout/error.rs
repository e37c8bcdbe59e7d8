use crate::subprocess::ProcessError;

#[derive(Debug, thiserror::Error)]
pub enum FanoutError {
    #[error("no {tool} in path. {tool} must appear in path or full path passed as arg 1")]
    ToolNotFound { tool: String },

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("Failed to spawn worker {worker}: {source}")]
    WorkerSpawn {
        worker: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot locate the running executable: {0}")]
    CurrentExe(#[source] std::io::Error),
}

impl FanoutError {
    /// Process exit status the binary reports for this error.
    ///
    /// Every fatal driver error maps to 1; per-file build failures never
    /// reach here.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_not_found_message() {
        let err = FanoutError::ToolNotFound {
            tool: "qmake".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no qmake in path. qmake must appear in path or full path passed as arg 1"
        );
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_process_error_is_transparent() {
        let err: FanoutError = ProcessError::MockExpectationNotMet("x".to_string()).into();
        assert_eq!(err.to_string(), "Mock expectation not met: x");
    }
}
