use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing::{debug, trace};
use tracing_subscriber::EnvFilter;

use pqmake::config::{Config, DEFAULT_LOG_LEVEL};
use pqmake::fanout::{FanoutDriver, FanoutError};
use pqmake::subprocess::SubprocessManager;

/// Run qmake over every .pro file below the current directory, one worker
/// process per CPU
#[derive(Parser)]
#[command(name = "pqmake")]
#[command(about = "Runs qmake in parallel to benefit from multi core CPUs", long_about = None)]
struct Cli {
    /// Path to the build tool (looked up on PATH when omitted)
    tool_path: Option<String>,

    /// Internal: build the paths read from stdin with TOOL_PATH
    #[arg(long, hide = true, requires = "tool_path")]
    worker: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Subscriber first so warnings raised while reading the config are seen
    let filter = EnvFilter::try_new(Config::log_level_from_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    let config = Config::from_env();

    let driver = FanoutDriver::new(SubprocessManager::production(), config);

    let result = if cli.worker {
        run_worker(&driver, cli.tool_path.as_deref().unwrap_or_default()).await
    } else {
        run_driver(&driver, cli.tool_path.as_deref()).await
    };

    if let Err(e) = result {
        debug!("Fatal error: {:?}", e);
        eprintln!("{e}");
        std::process::exit(e.exit_code());
    }
}

async fn run_driver(driver: &FanoutDriver, tool_path: Option<&str>) -> Result<(), FanoutError> {
    let summary = driver.run(tool_path).await?;
    debug!(
        "Finished {} file(s) with {} worker process(es)",
        summary.items,
        summary.outcomes.len()
    );
    Ok(())
}

async fn run_worker(driver: &FanoutDriver, tool: &str) -> Result<(), FanoutError> {
    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .map_err(pqmake::subprocess::ProcessError::Io)?;

    let report = driver.run_worker(tool, &input).await?;
    debug!("Worker built {} file(s), {} failed", report.attempted, report.failed);
    Ok(())
}
