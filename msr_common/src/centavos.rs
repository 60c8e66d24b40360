use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::op;

pub const BRL_CURRENCY_CODE: &str = "BRL";

//--------------------------------------     Centavos       ----------------------------------------------------------
/// A monetary amount in Brazilian centavos (hundredths of a Real). All settlement arithmetic happens in integer
/// centavos so that the same inputs always produce the same net value.
#[derive(Debug, Clone, Copy, Default, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Centavos(i64);

op!(binary Centavos, Add, add);
op!(binary Centavos, Sub, sub);
op!(inplace Centavos, SubAssign, sub_assign);
op!(unary Centavos, Neg, neg);

impl Mul<i64> for Centavos {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Centavos {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in centavos: {0}")]
pub struct CentavosConversionError(String);

impl From<i64> for Centavos {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Centavos {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Centavos {}

impl TryFrom<u64> for Centavos {
    type Error = CentavosConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(CentavosConversionError(format!("Value {value} is too large to convert to Centavos")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Centavos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.abs();
        write!(f, "{sign}R$ {}.{:02}", cents / 100, cents % 100)
    }
}

impl Centavos {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_reais(reais: i64) -> Self {
        Self(reais * 100)
    }

    /// Marketplace payloads carry amounts as floating-point Reais. Rounds half away from zero to the nearest
    /// centavo.
    pub fn from_reais_f64(reais: f64) -> Self {
        Self((reais * 100.0).round() as i64)
    }

    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// The given fraction of this amount, expressed in basis points (1 bp = 0.01%), rounded half away from zero.
    pub fn basis_points(self, bps: i64) -> Self {
        let scaled = i128::from(self.0) * i128::from(bps);
        let half = if scaled >= 0 { 5_000 } else { -5_000 };
        Self(((scaled + half) / 10_000) as i64)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

#[cfg(test)]
mod test {
    use super::Centavos;

    #[test]
    fn display_format() {
        assert_eq!(Centavos::from(10_000).to_string(), "R$ 100.00");
        assert_eq!(Centavos::from(7).to_string(), "R$ 0.07");
        assert_eq!(Centavos::from(123_456).to_string(), "R$ 1234.56");
        assert_eq!(Centavos::from(-500).to_string(), "-R$ 5.00");
    }

    #[test]
    fn from_float_reais_rounds_to_nearest_centavo() {
        assert_eq!(Centavos::from_reais_f64(100.0), Centavos::from(10_000));
        assert_eq!(Centavos::from_reais_f64(1234.56), Centavos::from(123_456));
        assert_eq!(Centavos::from_reais_f64(0.1), Centavos::from(10));
        assert_eq!(Centavos::from_reais_f64(10.005), Centavos::from(1_001));
        assert_eq!(Centavos::from_reais_f64(-2.5), Centavos::from(-250));
    }

    #[test]
    fn basis_points_rounds_half_away_from_zero() {
        // 7.15% of R$ 100.00 is exactly R$ 7.15
        assert_eq!(Centavos::from(10_000).basis_points(715), Centavos::from(715));
        // 7.15% of R$ 0.70 = 5.005 centavos, nearest centavo is 5
        assert_eq!(Centavos::from(70).basis_points(715), Centavos::from(5));
        // 7.15% of R$ 0.21 = 1.5015 centavos, rounds away from zero
        assert_eq!(Centavos::from(21).basis_points(715), Centavos::from(2));
        assert_eq!(Centavos::from(100).basis_points(715), Centavos::from(7));
        assert_eq!(Centavos::from(0).basis_points(715), Centavos::from(0));
    }

    #[test]
    fn arithmetic() {
        let a = Centavos::from(1_000);
        let b = Centavos::from(250);
        assert_eq!(a + b, Centavos::from(1_250));
        assert_eq!(a - b, Centavos::from(750));
        assert_eq!(-b, Centavos::from(-250));
        assert_eq!(b * 4, Centavos::from(1_000));
        let total: Centavos = [a, b, b].into_iter().sum();
        assert_eq!(total, Centavos::from(1_500));
    }
}
