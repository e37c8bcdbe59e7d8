//! Queries the driver makes through the shell before any worker starts:
//! where the tool lives, how many processors there are, and which files to
//! build.

use std::path::Path;

use super::error::FanoutError;
use crate::subprocess::{ProcessRunner, ShellCommandBuilder};

pub const CPU_COUNT_QUERY: &str = "grep -c ^processor /proc/cpuinfo";

/// Use `explicit` verbatim, otherwise ask `which` for `tool_name`.
pub async fn resolve_tool(
    runner: &dyn ProcessRunner,
    explicit: Option<&str>,
    tool_name: &str,
) -> Result<String, FanoutError> {
    if let Some(path) = explicit {
        tracing::debug!("Using tool path from command line: {}", path);
        return Ok(path.to_string());
    }

    let lookup = ShellCommandBuilder::new(&format!("which {}", shell_words::quote(tool_name)))
        .echo(false)
        .build();
    let result = runner.run(lookup).await?;

    if result.succeeded() && !result.stdout().is_empty() {
        let path = result.stdout().to_string();
        tracing::debug!("Found {} at {}", tool_name, path);
        Ok(path)
    } else {
        tracing::debug!(
            "Lookup for {} exited with code {}",
            tool_name,
            result.exit_code()
        );
        Err(FanoutError::ToolNotFound {
            tool: tool_name.to_string(),
        })
    }
}

/// Number of processing units, as reported by `/proc/cpuinfo`.
///
/// Falls back to the parallelism the OS reports when the query fails or
/// answers with something unusable. Never returns zero.
pub async fn processor_count(runner: &dyn ProcessRunner) -> Result<usize, FanoutError> {
    let query = ShellCommandBuilder::new(CPU_COUNT_QUERY).echo(false).build();
    let result = runner.run(query).await?;

    let parsed = if result.succeeded() {
        result.stdout().parse::<usize>().ok().filter(|n| *n > 0)
    } else {
        None
    };

    Ok(parsed.unwrap_or_else(|| {
        let fallback = std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(1);
        tracing::warn!(
            "Processor query gave no usable count ({:?}); using {}",
            result.stdout(),
            fallback
        );
        fallback
    }))
}

/// Recursively find files under `root` whose name matches `pattern`.
///
/// Paths come back absolute and in the order `find` reports them.
pub async fn discover_work_items(
    runner: &dyn ProcessRunner,
    root: Option<&Path>,
    pattern: &str,
) -> Result<Vec<String>, FanoutError> {
    let line = format!(
        "find \"$(pwd)\" -name {} -type f",
        shell_words::quote(pattern)
    );
    let mut builder = ShellCommandBuilder::new(&line).echo(false);
    if let Some(root) = root {
        builder = builder.current_dir(root);
    }

    let result = runner.run(builder.build()).await?;
    if !result.succeeded() {
        tracing::warn!(
            "find exited with code {}: {}",
            result.exit_code(),
            result.stderr()
        );
    }

    Ok(split_listing(result.stdout()))
}

fn split_listing(listing: &str) -> Vec<String> {
    listing
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
