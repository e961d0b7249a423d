//! Configuration management infrastructure: hierarchical loading via
//! `figment` (defaults -> project YAML -> local YAML overrides -> env).

pub mod loader;
pub mod trigger_seed;

pub use loader::{ConfigError, ConfigLoader};
pub use trigger_seed::{from_config_all, TriggerSeedError};
