use std::path::PathBuf;

/// Tool looked up on `PATH` when none is passed on the command line
pub const DEFAULT_TOOL: &str = "qmake";
/// File-name pattern handed to `find -name`
pub const DEFAULT_PATTERN: &str = "*.pro";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub tool_name: String,
    pub pattern: String,
    pub jobs: Option<usize>,
    pub log_level: String,
    pub root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tool_name: DEFAULT_TOOL.to_string(),
            pattern: DEFAULT_PATTERN.to_string(),
            jobs: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            root: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `PQMAKE_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::new();
        config.merge_env_vars();
        config
    }

    /// `PQMAKE_LOG_LEVEL` alone, for installing logging before the rest
    /// of the config is read
    pub fn log_level_from_env() -> String {
        Self::log_level_from(|key| std::env::var(key).ok())
    }

    fn log_level_from<F>(lookup: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup("PQMAKE_LOG_LEVEL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
    }

    pub fn merge_env_vars(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    fn merge_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(tool) = lookup("PQMAKE_TOOL").filter(|v| !v.trim().is_empty()) {
            self.tool_name = tool;
        }

        if let Some(pattern) = lookup("PQMAKE_PATTERN").filter(|v| !v.trim().is_empty()) {
            self.pattern = pattern;
        }

        if let Some(jobs) = lookup("PQMAKE_JOBS") {
            match jobs.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.jobs = Some(n),
                _ => tracing::warn!("Ignoring invalid PQMAKE_JOBS value: {:?}", jobs),
            }
        }

        self.log_level = Self::log_level_from(&lookup);
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }
}
