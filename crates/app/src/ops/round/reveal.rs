use clap::Args;

use super::RoundOpError;
use crate::op::Acting;

#[derive(Args, Debug, Clone)]
pub struct Reveal {
    #[command(flatten)]
    pub acting: Acting,
}

#[async_trait::async_trait]
impl crate::op::Op for Reveal {
    type Error = RoundOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (service, admin) = ctx.acting(&self.acting).await?;
        match service.lottery().rounds().reveal_current(&admin).await? {
            Some(master) => Ok(format!(
                "Round {} winning numbers: {}",
                master.round, master.numbers
            )),
            None => Ok("No active round".to_string()),
        }
    }
}
