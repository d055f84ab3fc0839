//! Run native commands on a remote build agent as if they ran locally.
//!
//! ```text
//! argv → split → resolve config → Session → control channel (HTTP)
//!                                         ↘ event channel (WebSocket) → stdout/stderr + exit code
//! ```

pub mod agent;
pub mod args;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod session;

/// Name of the wrapper binary, used in help output.
pub const APP_NAME: &str = "remexec";

/// Name under which the wrapper transparently shadows the native command.
pub const NATIVE_NAME: &str = "exec";

/// Version string reported in logs and `--version`.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
