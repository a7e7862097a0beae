//! Dashboard configuration
//!
//! Loads configuration from dashboard.yml, with environment overrides.

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::analytics::{RECENT_LIMIT, TOP_TOPICS_LIMIT};
use crate::{Error, Result};

/// Default constants (fallback if dashboard.yml not found)
pub const CONFIG_FILE: &str = "dashboard.yml";
pub const DEFAULT_DB_FILE: &str = "news_memory.db";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8501";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;

pub const ENV_DB_PATH: &str = "DASHBOARD_DB_PATH";
pub const ENV_LISTEN_ADDR: &str = "DASHBOARD_ADDR";
pub const ENV_CACHE_TTL: &str = "DASHBOARD_CACHE_TTL";

/// YAML config structures
#[derive(Debug, Deserialize)]
struct YamlConfig {
    database: Option<DatabaseConfig>,
    server: Option<ServerConfig>,
    view: Option<ViewConfig>,
}

#[derive(Debug, Deserialize)]
struct DatabaseConfig {
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServerConfig {
    listen_addr: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    cache_ttl_secs: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ViewConfig {
    top_topics: Option<usize>,
    recent_rows: Option<usize>,
}

/// Deserialize a value that can be either a string or a number
fn deserialize_string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: Option<serde_yaml::Value> = Option::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(serde_yaml::Value::String(s)) => Ok(Some(s)),
        Some(serde_yaml::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected string or number, got {:?}",
            other
        ))),
    }
}

/// Row limits of the rendered views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSettings {
    pub top_topics_limit: usize,
    pub recent_limit: usize,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            top_topics_limit: TOP_TOPICS_LIMIT,
            recent_limit: RECENT_LIMIT,
        }
    }
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub listen_addr: String,
    pub cache_ttl: Duration,
    pub view: ViewSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Load configuration from dashboard.yml or use defaults
    /// Environment variables take precedence over dashboard.yml values
    ///
    /// An unreadable or malformed file is logged and replaced by defaults;
    /// use [`Config::load`] to surface that error instead.
    pub fn new() -> Self {
        Self::load().unwrap_or_else(|err| {
            warn!("Ignoring {}: {}", CONFIG_FILE, err);
            Self::defaults().with_env_overrides()
        })
    }

    /// Load dashboard.yml from the current directory or its parent.
    ///
    /// Only a missing file falls back to defaults; a file that exists but
    /// cannot be read or parsed is an error.
    pub fn load() -> Result<Self> {
        Self::load_from_dir(Path::new("."))
    }

    /// Like [`Config::load`], searching `dir` and then `dir/..`.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        for candidate in [dir.join(CONFIG_FILE), dir.join("..").join(CONFIG_FILE)] {
            match fs::metadata(&candidate) {
                Ok(_) => return Self::load_from_file(&candidate),
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => {
                    return Err(Error::ConfigError(format!(
                        "Failed to stat {}: {}",
                        candidate.display(),
                        err
                    )))
                }
            }
        }

        debug!("No {} found, using defaults", CONFIG_FILE);
        Self::load_dotenv();
        Ok(Self::defaults().with_env_overrides())
    }

    /// Resolve a value: prefer env var if config value looks like ${VAR}
    fn resolve_env_string(value: Option<String>, env_key: &str) -> Option<String> {
        if let Some(ref v) = value {
            if v.starts_with("${") && v.ends_with('}') {
                let var_name = &v[2..v.len() - 1];
                return std::env::var(var_name)
                    .ok()
                    .or_else(|| std::env::var(env_key).ok());
            }
        }
        if let Ok(env_val) = std::env::var(env_key) {
            return Some(env_val);
        }
        value
    }

    /// Resolve a u64 from string config or env var
    fn resolve_env_u64(value: Option<String>, env_key: &str) -> Option<u64> {
        Self::resolve_env_string(value, env_key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    /// Load .env file into environment variables using dotenvy
    fn load_dotenv() {
        if dotenvy::dotenv().is_err() {
            let _ = dotenvy::from_filename("../.env");
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_dotenv();

        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::ConfigError(format!(
                "Failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let yaml: YamlConfig = serde_yaml::from_str(&content)?;

        let database = yaml.database.unwrap_or(DatabaseConfig { path: None });
        let server = yaml.server.unwrap_or(ServerConfig {
            listen_addr: None,
            cache_ttl_secs: None,
        });
        let view = yaml.view.unwrap_or(ViewConfig {
            top_topics: None,
            recent_rows: None,
        });

        let db_path = Self::resolve_env_string(database.path, ENV_DB_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_db_path);
        let listen_addr = Self::resolve_env_string(server.listen_addr, ENV_LISTEN_ADDR)
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let cache_ttl_secs = Self::resolve_env_u64(server.cache_ttl_secs, ENV_CACHE_TTL)
            .unwrap_or(DEFAULT_CACHE_TTL_SECS);

        let defaults = ViewSettings::default();
        Ok(Self {
            db_path,
            listen_addr,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            view: ViewSettings {
                top_topics_limit: view.top_topics.unwrap_or(defaults.top_topics_limit),
                recent_limit: view.recent_rows.unwrap_or(defaults.recent_limit),
            },
        })
    }

    /// Built-in defaults, no file or environment consulted
    pub fn defaults() -> Self {
        Self {
            db_path: Self::default_db_path(),
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            view: ViewSettings::default(),
        }
    }

    /// Apply environment variables on top of the current values
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var(ENV_DB_PATH) {
            self.db_path = PathBuf::from(path);
        }
        if let Ok(addr) = std::env::var(ENV_LISTEN_ADDR) {
            self.listen_addr = addr;
        }
        if let Some(secs) = std::env::var(ENV_CACHE_TTL)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.cache_ttl = Duration::from_secs(secs);
        }
        self
    }

    /// `news_memory.db` one directory above the executable's directory.
    pub fn default_db_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().and_then(Path::parent).map(Path::to_path_buf))
            .map(|base| base.join(DEFAULT_DB_FILE))
            .unwrap_or_else(|| Path::new("..").join(DEFAULT_DB_FILE))
    }
}
