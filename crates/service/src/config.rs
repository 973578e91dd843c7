use std::path::PathBuf;

use common::round::DEFAULT_SETTLE_CONCURRENCY;

#[derive(Debug, Clone)]
pub struct Config {
    // data store configuration
    /// a path to a sqlite database, if not set then an
    ///  in-memory database will be used
    pub sqlite_path: Option<PathBuf>,

    // settlement
    /// how many user draws are decrypted and settled at once
    pub settle_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sqlite_path: None,
            settle_concurrency: DEFAULT_SETTLE_CONCURRENCY,
        }
    }
}
