//! Shared fixtures for driving the `pqmake` binary

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Log the fake tool appends each built path to
pub const LOG_VAR: &str = "FAKE_TOOL_LOG";

/// A project tree plus a stand-in build tool that records what it was
/// asked to build
pub struct Workspace {
    pub project: TempDir,
    bin: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let workspace = Self {
            project: TempDir::new().unwrap(),
            bin: TempDir::new().unwrap(),
        };
        workspace.write_tool(
            "fake-qmake",
            "#!/bin/sh\necho \"configured $1\"\necho \"$1\" >> \"$FAKE_TOOL_LOG\"\n",
        );
        workspace
    }

    /// Create an empty project file at `relative`
    pub fn add_project(&self, relative: &str) -> PathBuf {
        let path = self.project.path().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "TEMPLATE = app\n").unwrap();
        path
    }

    pub fn write_tool(&self, name: &str, script: &str) -> PathBuf {
        let path = self.bin.path().join(name);
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    pub fn tool(&self) -> PathBuf {
        self.bin.path().join("fake-qmake")
    }

    pub fn bin_dir(&self) -> &Path {
        self.bin.path()
    }

    pub fn log_path(&self) -> PathBuf {
        self.bin.path().join("built.log")
    }

    /// Paths the fake tool was run on, sorted
    pub fn built(&self) -> Vec<String> {
        let mut built: Vec<String> = std::fs::read_to_string(self.log_path())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect();
        built.sort();
        built
    }

    /// `pqmake` started inside the project tree with the log wired up
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("pqmake").unwrap();
        cmd.current_dir(self.project.path())
            .env(LOG_VAR, self.log_path())
            .env_remove("PQMAKE_TOOL")
            .env_remove("PQMAKE_PATTERN")
            .env_remove("PQMAKE_JOBS")
            .env_remove("PQMAKE_LOG_LEVEL");
        cmd
    }
}
