//! Worker processes.
//!
//! The driver re-executes its own binary with [`WORKER_FLAG`] once per
//! non-empty partition and writes that partition's paths to the child's
//! stdin, one per line. The child's stdout and stderr are inherited so tool
//! output reaches the console as each build finishes.

use std::io::Write;
use std::path::Path;
use std::process::Stdio;

use futures::future::join_all;
use tokio::io::AsyncWriteExt;

use super::error::FanoutError;
use super::partition::WorkPartition;
use crate::subprocess::{ProcessError, ProcessRunner, ShellCommandBuilder};

/// Hidden command-line flag selecting worker mode
pub const WORKER_FLAG: &str = "--worker";

/// Tally of one worker's builds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub attempted: usize,
    pub failed: usize,
}

/// How a spawned worker process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerOutcome {
    Exited(i32),
    Signaled,
    Lost,
}

/// Build command for one work item: `<tool> <path>`
pub fn build_command_line(tool: &str, path: &str) -> String {
    format!("{} {}", tool, shell_words::quote(path))
}

/// Line written ahead of each build: `<tool> <path>`
pub fn announce(out: &mut impl Write, tool: &str, path: &str) -> std::io::Result<()> {
    writeln!(out, "{} {}", tool, path)?;
    out.flush()
}

/// Worker side: build every path in order, one at a time.
///
/// A failing build is counted and the worker moves on. Only a shell that
/// cannot be started stops the worker.
pub async fn run_partition<I>(
    runner: &dyn ProcessRunner,
    tool: &str,
    paths: I,
) -> Result<WorkerReport, ProcessError>
where
    I: IntoIterator<Item = String>,
{
    let mut report = WorkerReport::default();

    for path in paths {
        announce(&mut std::io::stdout().lock(), tool, &path)?;

        let command = ShellCommandBuilder::new(&build_command_line(tool, &path))
            .echo(true)
            .build();
        let result = runner.run(command).await?;

        report.attempted += 1;
        if !result.succeeded() {
            report.failed += 1;
            tracing::debug!("{} failed for {} (exit {})", tool, path, result.exit_code());
        }
    }

    tracing::debug!(
        "Worker {} finished: {} built, {} failed",
        std::process::id(),
        report.attempted,
        report.failed
    );
    Ok(report)
}

/// Paths handed to a worker on its stdin
pub fn parse_partition(input: &str) -> Vec<String> {
    input
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Driver side: start one worker per non-empty partition, then wait for all.
///
/// Workers are launched before any is awaited. A worker that dies does not
/// affect its siblings. If a worker cannot be started the others still run
/// to completion before the first spawn error is returned.
pub async fn spawn_and_join(
    program: &Path,
    tool: &str,
    partitions: Vec<WorkPartition>,
) -> Result<Vec<WorkerOutcome>, FanoutError> {
    let mut running = Vec::new();
    let mut spawn_error = None;

    for (index, partition) in partitions.into_iter().enumerate() {
        if partition.is_empty() {
            continue;
        }

        let spawned = tokio::process::Command::new(program)
            .arg(WORKER_FLAG)
            .arg(tool)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn();

        match spawned {
            Ok(child) => {
                tracing::debug!(
                    "Started worker {} (pid {:?}) with {} items",
                    index,
                    child.id(),
                    partition.len()
                );
                running.push((index, child, partition));
            }
            Err(source) => {
                tracing::error!("Failed to start worker {}: {}", index, source);
                if spawn_error.is_none() {
                    spawn_error = Some(FanoutError::WorkerSpawn {
                        worker: index,
                        source,
                    });
                }
            }
        }
    }

    let outcomes = join_all(
        running
            .into_iter()
            .map(|(index, child, partition)| supervise(index, child, partition)),
    )
    .await;

    match spawn_error {
        Some(err) => Err(err),
        None => Ok(outcomes),
    }
}

async fn supervise(
    index: usize,
    mut child: tokio::process::Child,
    partition: WorkPartition,
) -> WorkerOutcome {
    if let Some(mut stdin) = child.stdin.take() {
        let mut listing = partition.into_items().join("\n");
        listing.push('\n');
        if let Err(e) = stdin.write_all(listing.as_bytes()).await {
            tracing::warn!("Could not hand work to worker {}: {}", index, e);
        }
        // Dropping stdin closes the pipe and signals end of work
    }

    match child.wait().await {
        Ok(status) => match status.code() {
            Some(code) => {
                if code != 0 {
                    tracing::warn!("Worker {} exited with code {}", index, code);
                }
                WorkerOutcome::Exited(code)
            }
            None => {
                tracing::warn!("Worker {} was terminated by a signal", index);
                WorkerOutcome::Signaled
            }
        },
        Err(e) => {
            tracing::warn!("Lost track of worker {}: {}", index, e);
            WorkerOutcome::Lost
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fanout::partition::partition_round_robin;
    use crate::subprocess::MockProcessRunner;

    #[test]
    fn test_build_command_line_quotes_path() {
        assert_eq!(build_command_line("qmake", "/a/b.pro"), "qmake /a/b.pro");
        assert_eq!(
            build_command_line("/usr/bin/qmake", "/my dir/b.pro"),
            "/usr/bin/qmake '/my dir/b.pro'"
        );
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_announce_writes_tool_and_raw_path() {
        let mut out = Vec::new();
        announce(&mut out, "/usr/bin/qmake", "/my dir/a.pro").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "/usr/bin/qmake /my dir/a.pro\n");
    }

    #[test]
    fn test_announce_to_closed_pipe_is_an_error() {
        let err = announce(&mut ClosedPipe, "qmake", "/a.pro").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);

        let err: ProcessError = err.into();
        assert!(matches!(err, ProcessError::Io(_)));
        assert!(!err.is_spawn_failure());
    }

    #[test]
    fn test_parse_partition() {
        assert_eq!(parse_partition("/a.pro\n\n/b c.pro\n"), ["/a.pro", "/b c.pro"]);
        assert!(parse_partition("").is_empty());
    }

    #[tokio::test]
    async fn test_run_partition_in_order_and_continues_after_failure() {
        let mut mock = MockProcessRunner::new();
        mock.expect_command("qmake /b.pro").returns_exit_code(2).finish();
        mock.expect_command("qmake").returns_success().finish();

        let paths = vec!["/a.pro".to_string(), "/b.pro".to_string(), "/c.pro".to_string()];
        let report = run_partition(&mock, "qmake", paths).await.unwrap();

        assert_eq!(report, WorkerReport { attempted: 3, failed: 1 });
        let lines: Vec<String> = mock
            .get_call_history()
            .into_iter()
            .map(|cmd| {
                assert!(cmd.echo);
                cmd.command_line
            })
            .collect();
        assert_eq!(lines, ["qmake /a.pro", "qmake /b.pro", "qmake /c.pro"]);
    }

    #[tokio::test]
    async fn test_run_partition_stops_on_spawn_failure() {
        let mut mock = MockProcessRunner::new();
        mock.expect_command("qmake").fails_to_spawn().finish();

        let result = run_partition(&mock, "qmake", vec!["/a.pro".to_string()]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_spawn_and_join_skips_empty_partitions() {
        let partitions = partition_round_robin(Vec::new(), 4);
        let outcomes = spawn_and_join(Path::new("/nonexistent/pqmake"), "qmake", partitions)
            .await
            .unwrap();
        assert!(outcomes.is_empty());
    }

    #[tokio::test]
    async fn test_spawn_and_join_reports_spawn_failure() {
        let partitions = partition_round_robin(vec!["/a.pro".to_string()], 2);
        let err = spawn_and_join(Path::new("/nonexistent/pqmake"), "qmake", partitions)
            .await
            .unwrap_err();
        assert!(matches!(err, FanoutError::WorkerSpawn { worker: 0, .. }));
    }

    #[tokio::test]
    async fn test_spawn_and_join_feeds_stdin() {
        // Stand-in worker that exits 0 only if it received /a.pro and /c.pro
        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("fake-worker");
        std::fs::write(
            &script,
            "#!/bin/sh\n[ \"$1\" = --worker ] || exit 9\n[ \"$(cat)\" = \"$(printf '/a.pro\\n/c.pro')\" ] || exit 8\nexit 0\n",
        )
        .unwrap();
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let items = ["/a.pro", "/b.pro", "/c.pro"].map(String::from);
        let partitions = partition_round_robin(items, 2);
        let outcomes = spawn_and_join(&script, "qmake", partitions).await.unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0], WorkerOutcome::Exited(0));
        // The second worker only got /b.pro
        assert_eq!(outcomes[1], WorkerOutcome::Exited(8));
    }
}
