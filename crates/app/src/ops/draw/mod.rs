use clap::{Args, Subcommand};

use common::draw::RevealedDraw;

pub mod clear;
pub mod playable;
pub mod results;
pub mod submit;

use crate::op::{ContextError, Op};

crate::command_enum! {
    (Submit, submit::Submit),
    (Playable, playable::Playable),
    (Results, results::Results),
    (Clear, clear::Clear),
}

// Rename the generated Command to DrawCommand for clarity
pub type DrawCommand = Command;

/// Enter draws and review their outcomes
#[derive(Args, Debug, Clone)]
pub struct Draw {
    #[command(subcommand)]
    pub command: DrawCommand,
}

#[async_trait::async_trait]
impl Op for Draw {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DrawError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Lottery(#[from] service::LotteryError),
    #[error("invalid draw: {0}")]
    Numbers(#[from] common::draw::DrawNumbersError),
}

fn describe(draw: &RevealedDraw) -> String {
    if draw.been_played {
        let outcome = if draw.matches_master { "WON" } else { "no match" };
        format!(
            "#{}: {} (round {}, {})",
            draw.id, draw.numbers, draw.round, outcome
        )
    } else {
        format!("#{}: {}", draw.id, draw.numbers)
    }
}

fn describe_all(draws: &[RevealedDraw], empty: &str) -> String {
    if draws.is_empty() {
        return empty.to_string();
    }
    draws.iter().map(describe).collect::<Vec<_>>().join("\n")
}
