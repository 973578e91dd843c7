use clap::Args;

use super::{describe_all, DrawError};
use crate::op::Acting;

#[derive(Args, Debug, Clone)]
pub struct Playable {
    #[command(flatten)]
    pub acting: Acting,
}

#[async_trait::async_trait]
impl crate::op::Op for Playable {
    type Error = DrawError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (service, user) = ctx.acting(&self.acting).await?;
        let draws = service.lottery().playable_draws(&user).await?;
        Ok(describe_all(&draws, "No draws waiting for a round"))
    }
}
