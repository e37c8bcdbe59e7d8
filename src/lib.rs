//! # pqmake
//!
//! Runs qmake (or any build tool) over every project file below the current
//! directory, spreading the files across one worker process per CPU.
//!
//! ## Usage
//!
//! ```bash
//! pqmake [tool_path]
//! ```
//!
//! ## Modules
//!
//! - `subprocess` - Shell command execution with captured output and a mockable runner
//! - `fanout` - Tool lookup, file discovery, round-robin partitioning and worker processes
//! - `config` - Defaults and `PQMAKE_*` environment overrides
pub mod config;
pub mod fanout;
pub mod subprocess;
