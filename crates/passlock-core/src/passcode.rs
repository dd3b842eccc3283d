//! Passcode signs and sequences
//!
//! A passcode is a short ordered run of decimal digits. The digits are
//! zeroized when the sequence is dropped and never appear in `Debug` output.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A single entered digit
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sign(u8);

impl Sign {
    /// Create a sign from a digit value (0-9)
    pub fn new(digit: u8) -> Option<Self> {
        (digit <= 9).then_some(Self(digit))
    }

    /// Parse a sign from a character
    pub fn from_char(c: char) -> Option<Self> {
        c.to_digit(10).map(|d| Self(d as u8))
    }

    /// Digit value
    pub fn digit(self) -> u8 {
        self.0
    }

    /// Digit as a character
    pub fn as_char(self) -> char {
        char::from(b'0' + self.0)
    }
}

impl fmt::Debug for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sign(*)")
    }
}

/// Ordered sequence of signs
#[derive(Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Passcode {
    digits: Vec<u8>,
}

impl Passcode {
    /// Empty passcode
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty passcode with room for `len` signs
    pub fn with_capacity(len: usize) -> Self {
        Self {
            digits: Vec::with_capacity(len),
        }
    }

    /// Parse a passcode made only of ASCII digits
    pub fn parse(s: &str) -> Option<Self> {
        s.chars()
            .map(Sign::from_char)
            .collect::<Option<Vec<_>>>()
            .map(|signs| signs.into_iter().collect())
    }

    pub fn push(&mut self, sign: Sign) {
        self.digits.push(sign.digit());
    }

    pub fn pop(&mut self) -> Option<Sign> {
        self.digits.pop().map(Sign)
    }

    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// Clear the sequence, wiping the previous digits
    pub fn clear(&mut self) {
        self.digits.zeroize();
    }

    /// Move the contents out, leaving this sequence empty
    pub fn take(&mut self) -> Passcode {
        Passcode {
            digits: std::mem::take(&mut self.digits),
        }
    }

    pub fn signs(&self) -> impl Iterator<Item = Sign> + '_ {
        self.digits.iter().copied().map(Sign)
    }

    /// Bytes fed to the password hasher (ASCII digits)
    pub(crate) fn to_ascii(&self) -> zeroize::Zeroizing<Vec<u8>> {
        zeroize::Zeroizing::new(self.digits.iter().map(|d| b'0' + d).collect())
    }
}

impl FromIterator<Sign> for Passcode {
    fn from_iter<I: IntoIterator<Item = Sign>>(iter: I) -> Self {
        Self {
            digits: iter.into_iter().map(Sign::digit).collect(),
        }
    }
}

impl fmt::Debug for Passcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Passcode({})", "*".repeat(self.digits.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_bounds() {
        assert!(Sign::new(9).is_some());
        assert!(Sign::new(10).is_none());
        assert_eq!(Sign::from_char('7').map(Sign::digit), Some(7));
        assert!(Sign::from_char('a').is_none());
        assert_eq!(Sign::new(3).unwrap().as_char(), '3');
    }

    #[test]
    fn test_parse() {
        let code = Passcode::parse("1234").unwrap();
        assert_eq!(code.len(), 4);
        assert!(Passcode::parse("12a4").is_none());
        assert!(Passcode::parse("").unwrap().is_empty());
    }

    #[test]
    fn test_debug_hides_digits() {
        let code = Passcode::parse("9876").unwrap();
        let rendered = format!("{:?}", code);
        assert_eq!(rendered, "Passcode(****)");
        assert!(!rendered.contains('9'));
    }

    #[test]
    fn test_take_leaves_empty() {
        let mut code = Passcode::parse("12").unwrap();
        let taken = code.take();
        assert!(code.is_empty());
        assert_eq!(taken, Passcode::parse("12").unwrap());
    }
}
