use clap::{Args, Subcommand};

pub mod publish;
pub mod reveal;
pub mod settle;

use crate::op::{ContextError, Op};

crate::command_enum! {
    (Publish, publish::Publish),
    (Reveal, reveal::Reveal),
    (Settle, settle::Settle),
}

// Rename the generated Command to RoundCommand for clarity
pub type RoundCommand = Command;

/// Administer the winning draw: publish, reveal and settle rounds
#[derive(Args, Debug, Clone)]
pub struct Round {
    #[command(subcommand)]
    pub command: RoundCommand,
}

#[async_trait::async_trait]
impl Op for Round {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RoundOpError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Round(#[from] service::RoundError),
}
