//! Configuration for the cadence job store.
//!
//! Config files: `cadence.toml`, `cadence.yaml`, `cadence.yml` or `cadence.json`,
//! searched in `./` then the user config directory (`~/.config/cadence/` on Linux).
//!
//! `${ENV_VAR}` placeholders are substituted before parsing.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::ConfigError,
    loader::{config_dir, discover_and_load, load_config},
    schema::{CadenceConfig, JobStoreConfig},
};
