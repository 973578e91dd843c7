use std::error::Error;
use std::path::PathBuf;

use common::user::User;
use service::{LotteryError, ServiceState, StateSetupError};

use crate::state::{AppState, StateError};

/// Who a command runs as, selected by email
#[derive(clap::Args, Debug, Clone)]
pub struct Acting {
    /// Email of the registered user running this command
    #[arg(long = "as", value_name = "EMAIL")]
    pub email: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("failed to open the lottery database: {0}")]
    Service(#[from] StateSetupError),
    #[error(transparent)]
    Lottery(#[from] LotteryError),
}

#[derive(Clone, Debug)]
pub struct OpContext {
    /// Optional custom config path (defaults to ~/.lottery)
    pub config_path: Option<PathBuf>,
}

impl OpContext {
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self { config_path }
    }

    /// Open the initialized lottery directory and its database
    pub async fn service(&self) -> Result<ServiceState, ContextError> {
        let state = AppState::load(self.config_path.clone())?;
        Ok(ServiceState::from_config(&state.service_config()).await?)
    }

    /// Open the lottery and resolve who is acting
    pub async fn acting(&self, acting: &Acting) -> Result<(ServiceState, User), ContextError> {
        let service = self.service().await?;
        let user = service.lottery().identity(&acting.email).await?;
        tracing::debug!(user_id = user.id, role = %user.role, "acting user resolved");
        Ok((service, user))
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}
