//! Configuration: flags, env config file and environment merged into one
//! immutable [`Configuration`].

pub mod loader;
pub mod resolver;
pub mod types;

pub use loader::{load_env_file, ConfigError};
pub use resolver::{parse_agent_url, EnvLayers};
pub use types::{Configuration, LogLevel, Resolved, Source, WrapperFlags};
