//! Argument handling for the wrapper.
//!
//! ```text
//! argv → split at `--` → wrapper flags (clap) + native command line
//! ```

mod registry;
mod splitter;

pub use registry::{
    env_help, env_var, param_def, param_registry, Param, ParamDef, DEFAULT_AGENT_URL,
    DEFAULT_CMD_TIMEOUT, DEFAULT_LOG_LEVEL,
};
pub use splitter::{split_args, InvocationSpec, SEPARATOR};
