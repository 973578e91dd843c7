use clap::Args;

use super::DrawError;
use crate::op::Acting;

#[derive(Args, Debug, Clone)]
pub struct Clear {
    #[command(flatten)]
    pub acting: Acting,
}

#[async_trait::async_trait]
impl crate::op::Op for Clear {
    type Error = DrawError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (service, user) = ctx.acting(&self.acting).await?;
        let removed = service.lottery().clear_played(&user).await?;
        Ok(format!("Removed {} played draw(s)", removed))
    }
}
