use url::Url;

use super::config::Config;
use super::database::{Database, DatabaseSetupError};

use common::lottery::Lottery;

/// Main service state: the lottery over its SQLite store
#[derive(Clone, Debug)]
pub struct State {
    lottery: Lottery<Database>,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        // 1. Setup database
        let sqlite_database_url = match config.sqlite_path {
            Some(ref path) => {
                // the parent directory has to exist, the file itself is created on demand
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        return Err(StateSetupError::DatabasePathDoesNotExist);
                    }
                }
                Url::parse(&format!("sqlite://{}", path.display()))
                    .map_err(|_| StateSetupError::InvalidDatabaseUrl)
            }
            // otherwise just set up an in-memory database
            None => Url::parse("sqlite::memory:").map_err(|_| StateSetupError::InvalidDatabaseUrl),
        }?;
        tracing::info!("Database URL: {:?}", sqlite_database_url);
        let database = Database::connect(&sqlite_database_url).await?;

        // 2. Wire up the lottery
        let lottery = Lottery::new(database).with_settle_concurrency(config.settle_concurrency);
        tracing::debug!(
            settle_concurrency = config.settle_concurrency,
            "State::from_config - lottery ready"
        );

        Ok(Self { lottery })
    }

    pub fn lottery(&self) -> &Lottery<Database> {
        &self.lottery
    }

    pub fn database(&self) -> &Database {
        self.lottery.store()
    }
}

impl AsRef<Lottery<Database>> for State {
    fn as_ref(&self) -> &Lottery<Database> {
        &self.lottery
    }
}

impl AsRef<Database> for State {
    fn as_ref(&self) -> &Database {
        self.database()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("Database path does not exist")]
    DatabasePathDoesNotExist,
    #[error("Database setup error: {0}")]
    DatabaseSetupError(#[from] DatabaseSetupError),
    #[error("Invalid database URL")]
    InvalidDatabaseUrl,
}
