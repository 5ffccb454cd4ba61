//! Fee tier multipliers shared by every fee estimator.
//!
//! Multipliers are exact fractions so that tiers computed over wei or
//! satoshi amounts never pass through floating point.

use serde::{Deserialize, Serialize};

use crate::error::ParamsError;

/// A non-negative fraction `numerator / denominator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u64; 2]", into = "[u64; 2]")]
pub struct Ratio {
    pub numerator: u64,
    pub denominator: u64,
}

impl Ratio {
    pub const ONE: Ratio = Ratio::new(1, 1);

    pub const fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// `value * numerator / denominator`, truncating. `None` on overflow or a
    /// zero denominator.
    pub fn apply(&self, value: u128) -> Option<u128> {
        if self.denominator == 0 {
            return None;
        }
        value
            .checked_mul(u128::from(self.numerator))
            .map(|v| v / u128::from(self.denominator))
    }

    /// Compares two fractions without dividing.
    fn at_least(&self, other: &Ratio) -> bool {
        u128::from(self.numerator) * u128::from(other.denominator)
            >= u128::from(other.numerator) * u128::from(self.denominator)
    }
}

impl From<[u64; 2]> for Ratio {
    fn from([numerator, denominator]: [u64; 2]) -> Self {
        Self::new(numerator, denominator)
    }
}

impl From<Ratio> for [u64; 2] {
    fn from(r: Ratio) -> Self {
        [r.numerator, r.denominator]
    }
}

/// Multipliers applied to the slow tier to obtain the market and fast tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeMultipliers {
    pub market: Ratio,
    pub fast: Ratio,
}

impl Default for FeeMultipliers {
    fn default() -> Self {
        Self {
            market: Ratio::new(12, 10),
            fast: Ratio::new(15, 10),
        }
    }
}

impl FeeMultipliers {
    /// Requires non-zero denominators and `1 <= market <= fast`.
    pub fn validate(&self) -> Result<(), ParamsError> {
        let invalid = |reason: &str| ParamsError::Invalid {
            chain: "fee multipliers".into(),
            reason: reason.into(),
        };
        if self.market.denominator == 0 || self.fast.denominator == 0 {
            return Err(invalid("zero denominator"));
        }
        if !self.market.at_least(&Ratio::ONE) {
            return Err(invalid("market multiplier below 1"));
        }
        if !self.fast.at_least(&self.market) {
            return Err(invalid("fast multiplier below market"));
        }
        Ok(())
    }

    /// `[value, value * market, value * fast]`.
    pub fn tiers(&self, value: u128) -> Option<[u128; 3]> {
        Some([value, self.market.apply(value)?, self.fast.apply(value)?])
    }
}
