use clap::Args;

use common::user::Role;

use crate::op::{Acting, ContextError};

#[derive(Args, Debug, Clone)]
pub struct Users {
    #[command(flatten)]
    pub acting: Acting,

    /// Only list users with this role (`user` or `admin`)
    #[arg(long)]
    pub role: Option<Role>,
}

#[derive(Debug, thiserror::Error)]
pub enum UsersError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error("failed to list users: {0}")]
    Lottery(#[from] service::LotteryError),
}

#[async_trait::async_trait]
impl crate::op::Op for Users {
    type Error = UsersError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (service, admin) = ctx.acting(&self.acting).await?;
        let users = service.lottery().users(&admin, self.role).await?;

        if users.is_empty() {
            return Ok("No users found".to_string());
        }
        Ok(users
            .iter()
            .map(|u| {
                format!(
                    "{} {} <{}> ({}, id: {})",
                    u.firstname, u.lastname, u.email, u.role, u.id
                )
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
