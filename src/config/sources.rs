use super::models::Config;
use config::{ConfigError, Environment, File, FileFormat};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CONFIG_ENV_VAR: &str = "WORKSHOP_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/workshop.toml";
const ENV_PREFIX: &str = "WORKSHOP";
const ENV_SEPARATOR: &str = "__";
const API_TOKEN_VAR: &str = "WORKSHOP_API_TOKEN";

/// Resolve the config file, read every layer and attach secrets.
///
/// Later layers win: struct defaults, the TOML file, `.env`, then the
/// process environment.
pub fn load() -> Result<Config, ConfigError> {
    if let Ok(path) = dotenvy::dotenv() {
        debug!(path = %path.display(), "Loaded .env");
    }

    let mut config = read_layers(&config_path())?;
    apply_secrets(&mut config);
    Ok(config)
}

fn config_path() -> PathBuf {
    env::var_os(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Read the TOML file at `path` (optional) with env overrides on top.
/// Secrets are not applied here.
pub fn read_layers(path: &Path) -> Result<Config, ConfigError> {
    if path.is_file() {
        info!(path = %path.display(), "Reading configuration file");
    } else {
        debug!(path = %path.display(), "No configuration file, using defaults");
    }

    let file_layer = File::from(path).format(FileFormat::Toml).required(false);

    // WORKSHOP__MOCK__STORE_PATH -> mock.store_path
    let env_layer = Environment::with_prefix(ENV_PREFIX)
        .separator(ENV_SEPARATOR)
        .try_parsing(true);

    config::Config::builder()
        .add_source(file_layer)
        .add_source(env_layer)
        .build()?
        .try_deserialize()
}

/// The bearer token only ever comes from the environment
fn apply_secrets(config: &mut Config) {
    config.client.api_token = env::var(API_TOKEN_VAR)
        .ok()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());
}
