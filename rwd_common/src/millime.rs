use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const TND_CURRENCY_CODE: &str = "TND";
pub const TND_CURRENCY_CODE_LOWER: &str = "tnd";

//--------------------------------------      Millime       ----------------------------------------------------------
/// A monetary amount in millimes, i.e. thousandths of a Tunisian dinar.
///
/// All prices and totals in the engine are stored as integer millimes so that arithmetic is exact.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Millime(i64);

op!(binary Millime, Add, add);
op!(binary Millime, Sub, sub);
op!(inplace Millime, SubAssign, sub_assign);
op!(unary Millime, Neg, neg);

impl Mul<i64> for Millime {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Millime {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in millimes: {0}")]
pub struct MillimeConversionError(String);

impl From<i64> for Millime {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Millime {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Millime {}

impl TryFrom<u64> for Millime {
    type Error = MillimeConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MillimeConversionError(format!("Value {} is too large to convert to Millime", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Millime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dinars = self.0 as f64 / 1_000.0;
        write!(f, "{dinars:0.3} {TND_CURRENCY_CODE}")
    }
}

impl Millime {
    /// Builds an amount from whole dinars.
    pub fn from_dinars(dinars: i64) -> Self {
        Self(dinars * 1_000)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic_and_display() {
        let a = Millime::from(12_500);
        let b = Millime::from_dinars(2);
        assert_eq!((a + b).value(), 14_500);
        assert_eq!((a - b).value(), 10_500);
        assert_eq!((-b).value(), -2_000);
        assert_eq!(a * 3, Millime::from(37_500));
        assert_eq!(format!("{a}"), "12.500 TND");
    }

    #[test]
    fn sum_and_conversion() {
        let total: Millime = vec![Millime::from(100), Millime::from(250), Millime::from(650)].into_iter().sum();
        assert_eq!(total, Millime::from(1_000));
        assert!(Millime::try_from(u64::MAX).is_err());
        assert_eq!(Millime::try_from(500u64).unwrap().value(), 500);
    }
}
