//! Parallel fan-out of a build tool over every matching project file.
//!
//! The driver resolves the tool, sizes the worker pool from the processor
//! count, discovers files, deals them round-robin into partitions and runs
//! one worker process per non-empty partition.

pub mod discovery;
pub mod error;
pub mod partition;
pub mod worker;

pub use error::FanoutError;
pub use partition::{partition_round_robin, WorkPartition};
pub use worker::{WorkerOutcome, WorkerReport, WORKER_FLAG};

use std::path::PathBuf;

use crate::config::Config;
use crate::subprocess::SubprocessManager;

/// What one driver run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanoutSummary {
    pub tool: String,
    pub worker_count: usize,
    pub items: usize,
    pub outcomes: Vec<WorkerOutcome>,
}

pub struct FanoutDriver {
    subprocess: SubprocessManager,
    config: Config,
    worker_program: Option<PathBuf>,
}

impl FanoutDriver {
    pub fn new(subprocess: SubprocessManager, config: Config) -> Self {
        Self {
            subprocess,
            config,
            worker_program: None,
        }
    }

    /// Executable launched for each worker, the running binary by default
    pub fn with_worker_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.worker_program = Some(program.into());
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve, discover, partition, launch and join.
    ///
    /// Fails before any worker starts when the tool cannot be found.
    /// Individual build failures are left to the workers' echoed output.
    pub async fn run(&self, explicit_tool: Option<&str>) -> Result<FanoutSummary, FanoutError> {
        let runner = self.subprocess.runner();

        let tool =
            discovery::resolve_tool(runner.as_ref(), explicit_tool, &self.config.tool_name).await?;

        let worker_count = match self.config.jobs {
            Some(jobs) => jobs,
            None => discovery::processor_count(runner.as_ref()).await?,
        };

        let items = discovery::discover_work_items(
            runner.as_ref(),
            self.config.root.as_deref(),
            &self.config.pattern,
        )
        .await?;
        let item_count = items.len();

        tracing::info!(
            "Building {} file(s) matching {} with {} across {} worker(s)",
            item_count,
            self.config.pattern,
            tool,
            worker_count
        );

        let partitions = partition_round_robin(items, worker_count);
        let outcomes = if item_count == 0 {
            Vec::new()
        } else {
            let program = self.worker_program()?;
            worker::spawn_and_join(&program, &tool, partitions).await?
        };

        Ok(FanoutSummary {
            tool,
            worker_count,
            items: item_count,
            outcomes,
        })
    }

    /// Body of a worker process: build each path read from `input`.
    pub async fn run_worker(&self, tool: &str, input: &str) -> Result<WorkerReport, FanoutError> {
        let runner = self.subprocess.runner();
        let paths = worker::parse_partition(input);
        Ok(worker::run_partition(runner.as_ref(), tool, paths).await?)
    }

    fn worker_program(&self) -> Result<PathBuf, FanoutError> {
        match &self.worker_program {
            Some(program) => Ok(program.clone()),
            None => std::env::current_exe().map_err(FanoutError::CurrentExe),
        }
    }
}
