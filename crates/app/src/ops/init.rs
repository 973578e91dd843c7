use std::path::PathBuf;

use clap::Args;

use common::user::{Registration, User};
use service::{LotteryError, ServiceState, StateSetupError};

use crate::state::{AppConfig, AppState};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Email of the first administrator
    #[arg(long)]
    pub admin_email: String,

    #[arg(long)]
    pub admin_firstname: String,

    #[arg(long)]
    pub admin_lastname: String,

    /// Default log level written to config.toml
    #[arg(long, default_value = "warn")]
    pub default_log_level: String,

    /// Directory for rolling log files (optional)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Number of user draws settled concurrently
    #[arg(long, default_value_t = common::round::DEFAULT_SETTLE_CONCURRENCY)]
    pub settle_concurrency: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] crate::state::StateError),
    #[error("init failed: {0}")]
    ServiceFailed(#[from] StateSetupError),
    #[error("failed to create administrator: {0}")]
    Bootstrap(#[from] LotteryError),
}

impl Init {
    async fn bootstrap(&self, state: &AppState) -> Result<User, InitError> {
        let service = ServiceState::from_config(&state.service_config()).await?;
        Ok(service
            .lottery()
            .bootstrap_admin(Registration::new(
                &self.admin_email,
                &self.admin_firstname,
                &self.admin_lastname,
            ))
            .await?)
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            log_level: self.default_log_level.clone(),
            log_dir: self.log_dir.clone(),
            settle_concurrency: self.settle_concurrency.max(1),
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;
        let admin = match self.bootstrap(&state).await {
            Ok(admin) => admin,
            Err(e) => {
                // leave nothing behind so `init` can be retried
                if let Err(cleanup) = state.discard() {
                    tracing::warn!(error = %cleanup, "failed to remove partial lottery directory");
                }
                return Err(e);
            }
        };

        let output = format!(
            "Initialized lottery directory at: {}\n\
             - Database: {}\n\
             - Config: {}\n\
             - Administrator: {} (id: {})",
            state.lottery_dir.display(),
            state.db_path.display(),
            state.config_path.display(),
            admin.email,
            admin.id,
        );

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::{Op, OpContext};

    fn init_op() -> Init {
        Init {
            admin_email: "admin@email.com".to_string(),
            admin_firstname: "Alice".to_string(),
            admin_lastname: "Jones".to_string(),
            default_log_level: "warn".to_string(),
            log_dir: None,
            settle_concurrency: 2,
        }
    }

    #[tokio::test]
    async fn test_init_seeds_admin() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = OpContext::new(Some(dir.path().join("lottery")));

        init_op().execute(&ctx).await.unwrap();

        let service = ctx.service().await.unwrap();
        let admin = service.lottery().identity("admin@email.com").await.unwrap();
        assert!(admin.is_admin());
    }

    #[tokio::test]
    async fn test_second_init_keeps_existing_lottery() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = OpContext::new(Some(dir.path().join("lottery")));
        init_op().execute(&ctx).await.unwrap();

        // refusing to re-initialize must not clean up the live directory
        assert!(matches!(
            init_op().execute(&ctx).await,
            Err(InitError::StateFailed(crate::state::StateError::AlreadyInitialized))
        ));
        let service = ctx.service().await.unwrap();
        assert!(service.lottery().identity("admin@email.com").await.is_ok());
    }
}
