use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

/// Money in currency minor units (paise, cents). Never a float.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    /// Whole major units, e.g. `Amount::from_major(30)` is 3000 paise
    pub const fn from_major(major: u64) -> Self {
        Self(major * 100)
    }

    pub const fn minor(self) -> u64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Apply a rate in basis points, rounding half up.
    pub fn apply_bps(self, rate_bps: u32) -> Amount {
        let scaled = self.0 as u128 * rate_bps as u128;
        let rounded = (scaled + 5_000) / 10_000;
        Amount(u64::try_from(rounded).unwrap_or(u64::MAX))
    }

    /// Compact keypad-style rendering: `500`, `500.5`, `500.05`
    pub fn to_compact_string(self) -> String {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        if frac == 0 {
            whole.to_string()
        } else if frac % 10 == 0 {
            format!("{}.{}", whole, frac / 10)
        } else {
            format!("{}.{:02}", whole, frac)
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_compact() {
        let amount = Amount::from_minor(123_405);
        assert_eq!(amount.to_string(), "1234.05");
        assert_eq!(amount.to_compact_string(), "1234.05");
        assert_eq!(Amount::from_minor(50_050).to_compact_string(), "500.5");
        assert_eq!(Amount::from_major(500).to_compact_string(), "500");
    }

    #[test]
    fn test_apply_bps_rounds_half_up() {
        // 18% of 0.25 = 0.045 -> 0.05
        assert_eq!(Amount::from_minor(25).apply_bps(1_800), Amount::from_minor(5));
        assert_eq!(Amount::from_major(500).apply_bps(1_800), Amount::from_major(90));
        assert_eq!(Amount::from_major(500).apply_bps(0), Amount::ZERO);
    }
}
