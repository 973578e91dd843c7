use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// How many numbers make up one draw
pub const NUMBERS_PER_DRAW: usize = 6;
/// Smallest number that may be drawn
pub const MIN_NUMBER: u32 = 1;
/// Largest number that may be drawn (inclusive)
pub const MAX_NUMBER: u32 = 59;

/// Rejections for a submitted number set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DrawNumbersError {
    #[error("a draw needs exactly {count} numbers, got {0}", count = NUMBERS_PER_DRAW)]
    WrongCount(usize),
    #[error("draw numbers must be between {min} and {max}, got {0}", min = MIN_NUMBER, max = MAX_NUMBER)]
    OutOfRange(u32),
    #[error("draw numbers must be unique, {0} appears more than once")]
    Duplicate(u32),
    #[error("not a number: {0:?}")]
    Parse(String),
}

/// Six distinct numbers in `[MIN_NUMBER, MAX_NUMBER]`
///
/// Always held in ascending order, so equality is set equality and the
/// `Display` form is the canonical serialization that gets sealed:
/// ascending, single-space separated (`"3 17 22 40 51 59"`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DrawNumbers([u8; NUMBERS_PER_DRAW]);

impl DrawNumbers {
    /// Validate a submitted set of numbers, in any order
    pub fn new<I>(numbers: I) -> Result<Self, DrawNumbersError>
    where
        I: IntoIterator<Item = u32>,
    {
        let mut seen = BTreeSet::new();
        let mut count = 0;
        for n in numbers {
            count += 1;
            if !(MIN_NUMBER..=MAX_NUMBER).contains(&n) {
                return Err(DrawNumbersError::OutOfRange(n));
            }
            if !seen.insert(n) {
                return Err(DrawNumbersError::Duplicate(n));
            }
        }
        if count != NUMBERS_PER_DRAW {
            return Err(DrawNumbersError::WrongCount(count));
        }

        let mut out = [0u8; NUMBERS_PER_DRAW];
        // BTreeSet iterates in ascending order; every value fits in a u8
        for (slot, n) in out.iter_mut().zip(seen) {
            *slot = n as u8;
        }
        Ok(Self(out))
    }

    /// Draw six distinct numbers from the operating system's CSPRNG
    ///
    /// Uses rejection sampling on single bytes so every number in range is
    /// equally likely.
    pub fn random() -> Result<Self, getrandom::Error> {
        // largest multiple of the range that fits in a byte
        let span = MAX_NUMBER - MIN_NUMBER + 1;
        let limit = (256 / span) * span;

        let mut picked = BTreeSet::new();
        let mut buff = [0u8; 16];
        while picked.len() < NUMBERS_PER_DRAW {
            getrandom::getrandom(&mut buff)?;
            for byte in buff {
                let byte = u32::from(byte);
                if byte >= limit {
                    continue;
                }
                picked.insert(MIN_NUMBER + byte % span);
                if picked.len() == NUMBERS_PER_DRAW {
                    break;
                }
            }
        }

        let mut out = [0u8; NUMBERS_PER_DRAW];
        for (slot, n) in out.iter_mut().zip(picked) {
            *slot = n as u8;
        }
        Ok(Self(out))
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Canonical plaintext that gets sealed
    pub(crate) fn to_canonical_bytes(self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for DrawNumbers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for n in self.0 {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{}", n)?;
            first = false;
        }
        Ok(())
    }
}

impl fmt::Debug for DrawNumbers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DrawNumbers({})", self)
    }
}

impl FromStr for DrawNumbers {
    type Err = DrawNumbersError;

    /// Parse whitespace separated numbers, in any order
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let numbers = s
            .split_whitespace()
            .map(|part| {
                part.parse::<u32>()
                    .map_err(|_| DrawNumbersError::Parse(part.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(numbers)
    }
}

impl TryFrom<&[u32]> for DrawNumbers {
    type Error = DrawNumbersError;
    fn try_from(numbers: &[u32]) -> Result<Self, Self::Error> {
        Self::new(numbers.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_canonical_form() {
        let numbers = DrawNumbers::new([59, 3, 40, 17, 51, 22]).unwrap();
        assert_eq!(numbers.to_string(), "3 17 22 40 51 59");
        assert_eq!(numbers.as_slice(), &[3, 17, 22, 40, 51, 59]);
    }

    #[test]
    fn test_order_independent_equality() {
        let a = DrawNumbers::new([1, 2, 3, 4, 5, 6]).unwrap();
        let b = DrawNumbers::new([6, 5, 4, 3, 2, 1]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(DrawNumbers::new([1, 2, 3, 4, 5, 59]).is_ok());
        assert_eq!(
            DrawNumbers::new([0, 2, 3, 4, 5, 6]),
            Err(DrawNumbersError::OutOfRange(0))
        );
        assert_eq!(
            DrawNumbers::new([1, 2, 3, 4, 5, 60]),
            Err(DrawNumbersError::OutOfRange(60))
        );
    }

    #[test]
    fn test_rejects_duplicates() {
        assert_eq!(
            DrawNumbers::new([1, 2, 3, 4, 4, 6]),
            Err(DrawNumbersError::Duplicate(4))
        );
    }

    #[test]
    fn test_rejects_wrong_count() {
        assert_eq!(
            DrawNumbers::new([1, 2, 3, 4, 5]),
            Err(DrawNumbersError::WrongCount(5))
        );
        assert_eq!(
            DrawNumbers::new([1, 2, 3, 4, 5, 6, 7]),
            Err(DrawNumbersError::WrongCount(7))
        );
    }

    #[test]
    fn test_parse() {
        let numbers: DrawNumbers = " 22 3  17 59 40 51 ".parse().unwrap();
        assert_eq!(numbers.to_string(), "3 17 22 40 51 59");
        assert_eq!(
            "1 2 x 4 5 6".parse::<DrawNumbers>(),
            Err(DrawNumbersError::Parse("x".to_string()))
        );
    }

    #[test]
    fn test_random_draws_are_valid() {
        for _ in 0..200 {
            let numbers = DrawNumbers::random().unwrap();
            let reparsed: DrawNumbers = numbers.to_string().parse().unwrap();
            assert_eq!(numbers, reparsed);
            assert!(numbers
                .as_slice()
                .iter()
                .all(|n| (MIN_NUMBER..=MAX_NUMBER).contains(&u32::from(*n))));
        }
    }
}
