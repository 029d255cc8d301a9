//! CLI configuration loading
//!
//! Priority order (highest to lowest):
//! 1. `--database-url` flag
//! 2. Environment variables (after `.env` files: ./.env, then ~/.keepsync/.env)
//! 3. `[store]` table of ~/.keepsync/config.toml
//! 4. Built-in defaults

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use keepsync_store::StoreConfig;
use serde::Deserialize;
use tracing::debug;

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeepsyncConfig {
    #[serde(default)]
    pub store: StoreConfig,
}

/// The keepsync config directory (~/.keepsync)
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".keepsync"))
}

pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Load `.env` files; existing variables are never overwritten.
pub fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        debug!("Loaded .env from current directory: {}", path.display());
    }

    if let Some(env_file) = config_dir().map(|dir| dir.join(".env")) {
        if env_file.exists() {
            match dotenvy::from_path(&env_file) {
                Ok(()) => debug!("Loaded .env from {}", env_file.display()),
                Err(e) => debug!("Failed to load {}: {}", env_file.display(), e),
            }
        }
    }
}

/// Parse a config file. A missing file yields the defaults.
pub fn load_file(path: &Path) -> Result<KeepsyncConfig> {
    if !path.exists() {
        return Ok(KeepsyncConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("Invalid config file: {}", path.display()))
}

/// Layer file, environment and flag settings.
pub fn resolve(
    file: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
    database_url: Option<String>,
) -> Result<StoreConfig> {
    let base = match file {
        Some(path) => load_file(path)?.store,
        None => StoreConfig::default(),
    };

    let mut config = base
        .merge_env(lookup)
        .context("Invalid keepsync environment settings")?;

    if let Some(url) = database_url {
        config.database_url = url;
    }

    Ok(config)
}

/// Resolve the store configuration for this process.
pub fn load(database_url: Option<String>) -> Result<StoreConfig> {
    load_dotenv();
    let file = config_path();
    resolve(file.as_deref(), |key| std::env::var(key).ok(), database_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keepsync_store::MigrationPolicy;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = resolve(Some(Path::new("/nonexistent/keepsync.toml")), no_env, None).unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn reads_store_table() {
        let file = write_config(
            r#"
            [store]
            database_url = "postgres://file/db"
            max_connections = 12
            migration_policy = "fail-fast"
            "#,
        );
        let config = resolve(Some(file.path()), no_env, None).unwrap();
        assert_eq!(config.database_url, "postgres://file/db");
        assert_eq!(config.max_connections, 12);
        assert_eq!(config.acquire_timeout_secs, 5);
        assert_eq!(config.migration_policy, MigrationPolicy::FailFast);
    }

    #[test]
    fn flag_beats_env_beats_file() {
        let file = write_config("[store]\ndatabase_url = \"postgres://file/db\"\n");
        let env = |key: &str| (key == "KEEPSYNC_DATABASE_URL").then(|| "postgres://env/db".to_string());

        let config = resolve(Some(file.path()), env, None).unwrap();
        assert_eq!(config.database_url, "postgres://env/db");

        let config = resolve(Some(file.path()), env, Some("postgres://flag/db".into())).unwrap();
        assert_eq!(config.database_url, "postgres://flag/db");
    }

    #[test]
    fn invalid_file_is_reported() {
        let file = write_config("[store]\nmax_connections = \"many\"\n");
        let err = resolve(Some(file.path()), no_env, None).unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));
    }
}
