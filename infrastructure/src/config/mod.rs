//! Configuration file loading for atlas-console
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `--config <path>` specified file
//! 2. Project root: `./atlas.toml` or `./.atlas.toml`
//! 3. XDG config: `$XDG_CONFIG_HOME/atlas-console/config.toml`
//! 4. Fallback: `~/.config/atlas-console/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    BUILTIN_DEPLOYMENT_ID, ConfigValidationError, DEFAULT_DISCOVERY_BASE_URL, FileConfig,
    FileConsoleConfig, FileHttpConfig, FileLoggingConfig, builtin_deployment,
    validate_deployments,
};
pub use loader::ConfigLoader;
