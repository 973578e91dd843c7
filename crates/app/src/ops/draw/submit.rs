use clap::Args;

use common::draw::DrawNumbers;

use super::DrawError;
use crate::op::Acting;

#[derive(Args, Debug, Clone)]
pub struct Submit {
    #[command(flatten)]
    pub acting: Acting,

    /// Six distinct numbers between 1 and 59, in any order
    #[arg(required = true, num_args = 1..)]
    pub numbers: Vec<u32>,
}

#[async_trait::async_trait]
impl crate::op::Op for Submit {
    type Error = DrawError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        // validate before touching the database
        let numbers = DrawNumbers::new(self.numbers.iter().copied())?;
        let (service, user) = ctx.acting(&self.acting).await?;
        let draw = service.lottery().submit_draw(&user, &numbers).await?;

        Ok(format!("Entered draw #{}: {}", draw.id, numbers))
    }
}
