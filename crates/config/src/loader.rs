use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{ConfigError, env_subst::substitute_env, schema::CadenceConfig};

const CONFIG_FILENAMES: &[&str] = &[
    "cadence.toml",
    "cadence.yaml",
    "cadence.yml",
    "cadence.json",
];

/// Read, substitute, parse and validate the config at `path`.
pub fn load_config(path: &Path) -> Result<CadenceConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&substitute_env(&raw), path)?;
    config.validate()?;
    Ok(config)
}

/// Load the first config file found in `./` or [`config_dir`].
///
/// Falls back to [`CadenceConfig::default`] when none exists or it fails to load.
pub fn discover_and_load() -> CadenceConfig {
    let Some(path) = find_config_file() else {
        debug!("no config file found, using defaults");
        return CadenceConfig::default();
    };

    debug!(path = %path.display(), "loading config");
    load_config(&path).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
        CadenceConfig::default()
    })
}

pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "cadence").map(|d| d.config_dir().to_path_buf())
}

fn find_config_file() -> Option<PathBuf> {
    find_in(Path::new(".")).or_else(|| config_dir().and_then(|dir| find_in(&dir)))
}

fn find_in(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

fn parse_config(raw: &str, path: &Path) -> Result<CadenceConfig, ConfigError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => toml::from_str(raw).map_err(|e| ConfigError::parse(path, e)),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| ConfigError::parse(path, e)),
        "json" => serde_json::from_str(raw).map_err(|e| ConfigError::parse(path, e)),
        other => Err(ConfigError::UnsupportedFormat {
            extension: other.to_string(),
        }),
    }
}
