use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

const DEFAULT_VERSION: &str = "1.0.0";
const DEFAULT_COLOUR: &str = "blue";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,

    #[serde(default)]
    pub server: ServerSettings,
}

/// Identity labels shown by `/api/info`; v1=blue, v2=green in a traffic split.
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default = "default_colour")]
    pub colour: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            colour: default_colour(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Actix worker count; actix picks one per core when unset.
    #[serde(default)]
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

fn default_colour() -> String {
    DEFAULT_COLOUR.to_string()
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl AppConfig {
    /// Defaults, then the optional TOML file, then environment overrides.
    pub fn load(config_path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        log::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        if let Some(version) = env_string("APP_VERSION") {
            self.app.version = version;
        }
        if let Some(colour) = env_string("APP_COLOUR") {
            self.app.colour = colour;
        }
        if let Some(host) = env_string("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_parsed("SERVER_PORT")? {
            self.server.port = port;
        }
        if let Some(workers) = env_parsed("SERVER_WORKERS")? {
            self.server.workers = Some(workers);
        }
        Ok(())
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}

fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T>(name: &str) -> ConfigResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_string(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidEnv {
                name: name.to_string(),
                message: e.to_string(),
            }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cleared() -> Vec<(&'static str, Option<&'static str>)> {
        vec![
            ("APP_VERSION", None),
            ("APP_COLOUR", None),
            ("SERVER_HOST", None),
            ("SERVER_PORT", None),
            ("SERVER_WORKERS", None),
        ]
    }

    #[test]
    fn test_defaults() {
        temp_env::with_vars(cleared(), || {
            let config = AppConfig::load(None).unwrap();
            assert_eq!(config.app.version, "1.0.0");
            assert_eq!(config.app.colour, "blue");
            assert_eq!(config.bind_address(), ("0.0.0.0".to_string(), 8080));
            assert_eq!(config.server.workers, None);
        });
    }

    #[test]
    fn test_env_overrides() {
        temp_env::with_vars(
            vec![
                ("APP_VERSION", Some("2.0.0")),
                ("APP_COLOUR", Some("green")),
                ("SERVER_HOST", None),
                ("SERVER_PORT", Some("9090")),
                ("SERVER_WORKERS", Some("2")),
            ],
            || {
                let config = AppConfig::load(None).unwrap();
                assert_eq!(config.app.version, "2.0.0");
                assert_eq!(config.app.colour, "green");
                assert_eq!(config.server.port, 9090);
                assert_eq!(config.server.workers, Some(2));
            },
        );
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        temp_env::with_vars(
            vec![
                ("APP_VERSION", None),
                ("APP_COLOUR", None),
                ("SERVER_HOST", None),
                ("SERVER_PORT", Some("eighty")),
                ("SERVER_WORKERS", None),
            ],
            || match AppConfig::load(None) {
                Err(ConfigError::InvalidEnv { name, .. }) => assert_eq!(name, "SERVER_PORT"),
                other => panic!("expected InvalidEnv, got {:?}", other),
            },
        );
    }

    #[test]
    fn test_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[app]
colour = "green"

[server]
port = 8181
"#,
        )
        .unwrap();

        temp_env::with_vars(cleared(), || {
            let config = AppConfig::load(Some(&path)).unwrap();
            assert_eq!(config.app.version, "1.0.0");
            assert_eq!(config.app.colour, "green");
            assert_eq!(config.server.port, 8181);
            assert_eq!(config.server.host, "0.0.0.0");
        });
    }

    #[test]
    fn test_env_beats_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[app]\nversion = \"1.1.0\"\n").unwrap();

        temp_env::with_vars(
            vec![
                ("APP_VERSION", Some("3.0.0")),
                ("APP_COLOUR", None),
                ("SERVER_HOST", None),
                ("SERVER_PORT", None),
                ("SERVER_WORKERS", None),
            ],
            || {
                let config = AppConfig::load(Some(&path)).unwrap();
                assert_eq!(config.app.version, "3.0.0");
            },
        );
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = AppConfig::from_file(&temp_dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::FileRead(_))));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[server]\nport = \"not a number\"\n").unwrap();
        assert!(matches!(AppConfig::from_file(&path), Err(ConfigError::Parse(_))));
    }
}
