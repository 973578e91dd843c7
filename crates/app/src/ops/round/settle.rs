use clap::Args;

use super::RoundOpError;
use crate::op::Acting;

#[derive(Args, Debug, Clone)]
pub struct Settle {
    #[command(flatten)]
    pub acting: Acting,
}

#[async_trait::async_trait]
impl crate::op::Op for Settle {
    type Error = RoundOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (service, admin) = ctx.acting(&self.acting).await?;
        match service.lottery().rounds().settle_round(&admin).await {
            Ok(settlement) => Ok(settlement.to_string()),
            // nothing to settle is an answer, not a failure
            Err(e) if e.is_informational() => Ok(e.to_string()),
            Err(e) => Err(e.into()),
        }
    }
}
