use config::{Config, ConfigError, Environment, File, Map};
use fare_core::config::TrackerConfig;

/// Optional configuration file, looked up in the working directory.
pub const CONFIG_FILE: &str = "fare-tracker";
/// Prefix of environment overrides, e.g. `FARE_TRACKER__SEARCH__ADULTS=1`.
pub const ENV_PREFIX: &str = "FARE_TRACKER";

/// # Summary
/// Builds the tracker configuration from layered sources.
///
/// # Logic
/// 1. Built-in defaults (`TrackerConfig::default()`).
/// 2. Optional `fare-tracker.{toml,json,yaml}` file.
/// 3. `FARE_TRACKER__*` environment variables, `__` separating nested keys.
/// 4. `api_key` fills `api.key` when no other source set it.
///
/// # Arguments
/// * `file` - Config file name without extension.
/// * `env` - Environment snapshot; `None` reads the process environment.
/// * `api_key` - Value of `API_KEY`, if any.
///
/// # Returns
/// The merged configuration, or the first source or type error.
pub fn load(
    file: &str,
    env: Option<Map<String, String>>,
    api_key: Option<String>,
) -> Result<TrackerConfig, ConfigError> {
    let mut config: TrackerConfig = Config::builder()
        .add_source(Config::try_from(&TrackerConfig::default())?)
        .add_source(File::with_name(file).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .source(env),
        )
        .build()?
        .try_deserialize()?;

    if config.api.key.is_empty() {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            config.api.key = key;
        }
    }
    Ok(config)
}
