use clap::Args;

use super::RoundOpError;
use crate::op::Acting;

#[derive(Args, Debug, Clone)]
pub struct Publish {
    #[command(flatten)]
    pub acting: Acting,
}

#[async_trait::async_trait]
impl crate::op::Op for Publish {
    type Error = RoundOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (service, admin) = ctx.acting(&self.acting).await?;
        let master = service.lottery().rounds().publish_round(&admin).await?;
        Ok(format!(
            "Published winning draw for round {} (draw #{})",
            master.round, master.id
        ))
    }
}
