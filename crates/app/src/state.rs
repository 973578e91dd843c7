use std::{fs, path::PathBuf};

use common::round::DEFAULT_SETTLE_CONCURRENCY;
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "lottery";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DB_FILE_NAME: &str = "db.sqlite";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default log level, overridden by `RUST_LOG` or `--log-level`
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for daily rolling log files (optional, stderr only if unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    /// How many user draws are settled at once
    #[serde(default = "default_settle_concurrency")]
    pub settle_concurrency: usize,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_settle_concurrency() -> usize {
    DEFAULT_SETTLE_CONCURRENCY
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_dir: None,
            settle_concurrency: default_settle_concurrency(),
        }
    }
}

impl AppConfig {
    pub fn level(&self) -> Result<tracing::Level, StateError> {
        self.log_level
            .parse()
            .map_err(|_| StateError::InvalidLogLevel(self.log_level.clone()))
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the lottery directory (~/.lottery)
    pub lottery_dir: PathBuf,
    /// Path to the SQLite database
    pub db_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the lottery directory path (custom or default ~/.lottery)
    pub fn lottery_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new lottery directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let lottery_dir = Self::lottery_dir(custom_path)?;

        if lottery_dir.join(CONFIG_FILE_NAME).exists() {
            return Err(StateError::AlreadyInitialized);
        }

        let config = config.unwrap_or_default();
        config.level()?;
        let contents = toml::to_string_pretty(&config)?;

        fs::create_dir_all(&lottery_dir)?;

        // Create empty database (just touch the file, migrations run when the service opens it)
        let db_path = lottery_dir.join(DB_FILE_NAME);
        fs::write(&db_path, "")?;

        // The config file marks the directory as initialized, so it goes last
        let config_path = lottery_dir.join(CONFIG_FILE_NAME);
        fs::write(&config_path, contents)?;

        Ok(Self {
            lottery_dir,
            db_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the lottery directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let lottery_dir = Self::lottery_dir(custom_path)?;

        if !lottery_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let db_path = lottery_dir.join(DB_FILE_NAME);
        let config_path = lottery_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }
        if !db_path.exists() {
            return Err(StateError::MissingFile(DB_FILE_NAME.to_string()));
        }

        let config: AppConfig = toml::from_str(&fs::read_to_string(&config_path)?)?;

        Ok(Self {
            lottery_dir,
            db_path,
            config_path,
            config,
        })
    }

    /// Undo a partial `init`: remove the files it created
    ///
    /// The directory itself is only removed when nothing else is left in it.
    pub fn discard(&self) -> Result<(), StateError> {
        fs::remove_file(&self.config_path)?;
        for suffix in ["", "-wal", "-shm"] {
            let path = PathBuf::from(format!("{}{}", self.db_path.display(), suffix));
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        let _ = fs::remove_dir(&self.lottery_dir);
        Ok(())
    }

    /// Service configuration for this directory's database
    pub fn service_config(&self) -> service::Config {
        service::Config {
            sqlite_path: Some(self.db_path.clone()),
            settle_concurrency: self.config.settle_concurrency,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("lottery directory not initialized. Run 'lottery init' first")]
    NotInitialized,

    #[error("lottery directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
