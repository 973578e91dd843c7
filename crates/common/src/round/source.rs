use crate::draw::DrawNumbers;

/// Where a round's winning numbers come from
///
/// Predictable winning numbers make the lottery forgeable, so production
/// code uses [`OsNumberSource`].
pub trait NumberSource: Send + Sync + 'static {
    fn draw(&self) -> Result<DrawNumbers, getrandom::Error>;
}

/// Draws winning numbers from the operating system's CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct OsNumberSource;

impl NumberSource for OsNumberSource {
    fn draw(&self) -> Result<DrawNumbers, getrandom::Error> {
        DrawNumbers::random()
    }
}

/// Always yields the same numbers. For tests and replaying a known round.
#[derive(Debug, Clone, Copy)]
pub struct FixedNumberSource(pub DrawNumbers);

impl NumberSource for FixedNumberSource {
    fn draw(&self) -> Result<DrawNumbers, getrandom::Error> {
        Ok(self.0)
    }
}
