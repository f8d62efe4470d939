use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::paths::resolve_home_dir;

/// Home directory name used when `server.home_dir` is left empty.
const DEFAULT_SUBDIR: &str = ".userdir";

/// Prefix for environment overrides; `__` separates nesting levels.
const ENV_PREFIX: &str = "APP__";

/// Process configuration: fixed sections plus one free-form entry per module.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    /// Absent means the server falls back to in-memory SQLite.
    pub database: Option<DatabaseConfig>,
    /// Absent means `default_logging_config()`.
    pub logging: Option<LoggingConfig>,
    /// `modules.<name>` is handed to that module's own config type.
    #[serde(default)]
    pub modules: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Absolute after loading; relative paths elsewhere resolve against it.
    pub home_dir: String,
    pub host: String,
    pub port: u16,
    /// Whole-request limit in seconds; 0 selects the server default.
    #[serde(default)]
    pub timeout_sec: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// `sqlite://…`, `sqlite::memory:` or `postgres://…`.
    pub url: String,
    pub max_conns: Option<u32>,
    /// Seconds a caller waits for a pooled connection.
    pub acquire_timeout_sec: Option<u64>,
    pub busy_timeout_ms: Option<u32>,
}

/// Per-target logging sections; `"default"` covers every target without one.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Section {
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`.
    pub console_level: String,
    /// Relative to the home dir; empty turns the file sink off.
    pub file: String,
    #[serde(default)]
    pub file_level: String,
    #[serde(default)]
    pub max_backups: Option<usize>,
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            home_dir: String::new(),
            host: "127.0.0.1".to_string(),
            port: 8080,
            timeout_sec: 0,
        }
    }
}

impl ServerConfig {
    /// Replace `home_dir` with its absolute form, creating the directory.
    fn normalize_home_dir(&mut self) -> Result<()> {
        let configured = Some(self.home_dir.trim())
            .filter(|dir| !dir.is_empty())
            .map(str::to_owned);
        let resolved = resolve_home_dir(configured, DEFAULT_SUBDIR, true)
            .context("Failed to resolve server.home_dir")?;
        self.home_dir = resolved.to_string_lossy().into_owned();
        Ok(())
    }
}

pub fn default_logging_config() -> LoggingConfig {
    HashMap::from([(
        "default".to_string(),
        Section {
            console_level: "info".to_string(),
            file: "logs/userdir.log".to_string(),
            file_level: "debug".to_string(),
            max_backups: Some(3),
            max_size_mb: Some(100),
        },
    )])
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: Some(DatabaseConfig {
                url: "sqlite://database/users.db".to_string(),
                max_conns: Some(10),
                acquire_timeout_sec: Some(30),
                busy_timeout_ms: Some(5000),
            }),
            logging: Some(default_logging_config()),
            ..Self::bare()
        }
    }
}

impl AppConfig {
    /// Server section only; used as the lowest layer so that sections a file
    /// leaves out stay `None`.
    fn bare() -> Self {
        Self {
            server: ServerConfig::default(),
            database: None,
            logging: None,
            modules: HashMap::new(),
        }
    }

    /// Merge `bare()`, the YAML file and `APP__*` variables, in that order.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        let mut config: AppConfig = Figment::new()
            .merge(Serialized::defaults(Self::bare()))
            .merge(Yaml::file(config_path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| {
                format!("Invalid configuration in {}", config_path.as_ref().display())
            })?;

        config.server.normalize_home_dir()?;
        Ok(config)
    }

    /// `load_layered` for a given path, built-in defaults otherwise.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        let Some(path) = config_path else {
            let mut config = Self::default();
            config.server.normalize_home_dir()?;
            return Ok(config);
        };
        Self::load_layered(path)
    }

    /// Typed view of `modules.<name>`; `T::default()` when the entry is missing.
    pub fn module_config<T>(&self, name: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let Some(raw) = self.modules.get(name) else {
            return Ok(T::default());
        };
        serde_json::from_value(raw.clone())
            .with_context(|| format!("Invalid configuration for module '{name}'"))
    }

    pub fn resolve_under_home(&self, p: impl AsRef<Path>) -> PathBuf {
        Path::new(&self.server.home_dir).join(p)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to render configuration as YAML")
    }

    /// `--port` replaces `server.port`; each `-v` raises the default console level.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(port) = args.port {
            self.server.port = port;
        }

        let logging = self.logging.get_or_insert_with(default_logging_config);
        if let (Some(level), Some(section)) =
            (console_level_for(args.verbose), logging.get_mut("default"))
        {
            section.console_level = level.to_string();
        }
    }
}

fn console_level_for(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("debug"),
        _ => Some("trace"),
    }
}

/// Flags the binary forwards into configuration.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config: Option<String>,
    pub port: Option<u16>,
    pub print_config: bool,
    pub verbose: u8,
    pub mock: bool,
}
