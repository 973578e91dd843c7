use std::fmt;

use crate::draw::{DrawId, DrawNumbers};
use crate::user::UserId;

/// A user draw that matched the winning draw
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Winner {
    pub round: u64,
    pub numbers: DrawNumbers,
    pub user_id: UserId,
    pub email: String,
}

/// A user draw that could not be settled; it stays pending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementFailure {
    pub draw_id: DrawId,
    pub reason: String,
}

/// Outcome of settling one round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub round: u64,
    /// Winners in draw submission order
    pub winners: Vec<Winner>,
    /// Draws whose outcome was committed, winners included
    pub settled: usize,
    pub failures: Vec<SettlementFailure>,
}

impl Settlement {
    pub(crate) fn new(round: u64) -> Self {
        Self {
            round,
            winners: Vec::new(),
            settled: 0,
            failures: Vec::new(),
        }
    }

    pub fn has_winners(&self) -> bool {
        !self.winners.is_empty()
    }
}

impl fmt::Display for Settlement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Round {}: {} draw(s) settled", self.round, self.settled)?;
        if self.winners.is_empty() {
            writeln!(f, "No winners.")?;
        }
        for winner in &self.winners {
            writeln!(
                f,
                "  winner: user {} <{}> with {}",
                winner.user_id, winner.email, winner.numbers
            )?;
        }
        for failure in &self.failures {
            writeln!(
                f,
                "  unsettled draw {}: {}",
                failure.draw_id, failure.reason
            )?;
        }
        Ok(())
    }
}
