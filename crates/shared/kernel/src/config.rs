use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::Path;
use tracing::info;

/// Base name of the configuration file looked up when no path is given
/// (`workforce.toml`, `workforce.yaml`, `workforce.json`, ...).
pub const DEFAULT_CONFIG_FILE: &str = "workforce";
/// Prefix of environment overrides (`WF__DATABASE__URL` maps to `database.url`).
pub const ENV_PREFIX: &str = "WF";

/// Custom error type for config loading.
#[wf_derive::wf_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads configuration from an optional file overlaid with environment variables.
///
/// Layers, lowest precedence first:
/// 1. **Base File**: `path` when given (then it must exist), otherwise the
///    optional `workforce.*` file in the working directory.
/// 2. **Environment Overrides**: variables prefixed with `WF__`, nested keys
///    separated by double underscores (`WF__PERSISTENCE__STRICTNESS=lenient`).
///
/// Sections missing from every layer fall back to the `serde(default)` of `T`.
///
/// # Errors
/// * The explicitly requested file does not exist or cannot be parsed.
/// * The merged values do not match the structure of `T`.
///
/// # Example
/// ```rust
/// use wf_kernel::config::load_config;
/// use wf_kernel::domain::config::AppConfig;
///
/// let cfg: AppConfig = load_config(None::<&str>).unwrap_or_default();
/// assert_eq!(cfg.database.namespace, "workforce");
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let file = match &path {
        Some(path) => {
            info!("Loading config from {}", path.as_ref().display());
            File::from(path.as_ref()).required(true)
        },
        None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use wf_domain::config::{AppConfig, Strictness};

    #[test]
    fn explicit_file_is_required() {
        let err = load_config::<AppConfig>(Some("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Config { context: Some(_), .. }));
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workforce.toml");
        fs::write(
            &path,
            r#"
            [database]
            url = "rocksdb://data/workforce"

            [persistence]
            strictness = "lenient"
            modify_on_create = false
            "#,
        )
        .unwrap();

        let cfg: AppConfig = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.database.url, "rocksdb://data/workforce");
        assert_eq!(cfg.database.namespace, "workforce");
        assert_eq!(cfg.persistence.strictness, Strictness::Lenient);
        assert!(!cfg.persistence.modify_on_create);
        assert!(cfg.persistence.auditing);
    }

    #[test]
    fn json_file_is_supported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "logging": { "level": "trace", "json": true } }"#).unwrap();

        let cfg: AppConfig = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.logging.level, "trace");
        assert!(cfg.logging.json);
    }
}
