//! A tiny field for tests that want numbers small enough to check by
//! hand.

use std::fmt::{self, Display};
use std::ops::{AddAssign, MulAssign, Neg, SubAssign};

use super::{impl_field_ops, impl_ring_ops, Field, Number, Ring};
use crate::{Error, Result};

/// An element of GF(7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Gf7(u8);

impl AddAssign for Gf7 {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = (self.0 + rhs.0) % 7;
    }
}

impl SubAssign for Gf7 {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 = (7 + self.0 - rhs.0) % 7;
    }
}

impl MulAssign for Gf7 {
    fn mul_assign(&mut self, rhs: Self) {
        self.0 = (self.0 * rhs.0) % 7;
    }
}

impl Neg for Gf7 {
    type Output = Self;
    fn neg(self) -> Self {
        Self((7 - self.0) % 7)
    }
}

impl_ring_ops!(Gf7);
impl_field_ops!(Gf7);

impl Display for Gf7 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Ring for Gf7 {
    const NAME: &'static str = "GF(7)";
    const BIT_SIZE: usize = 3;
    const BYTE_SIZE: usize = 1;

    fn zero() -> Self {
        Self(0)
    }

    fn one() -> Self {
        Self(1)
    }

    fn from_int(value: i64) -> Self {
        Self(value.rem_euclid(7) as u8)
    }

    fn read_le(src: &[u8]) -> Self {
        Self(src[0] % 7)
    }

    fn write_le(&self, dst: &mut [u8]) {
        dst[0] = self.0;
    }
}

impl Field for Gf7 {
    fn invert(self) -> Result<Self> {
        let inv = match self.0 {
            1 | 6 => self.0,
            2 => 4,
            3 => 5,
            4 => 2,
            5 => 3,
            _ => return Err(Error::InvalidInput("0 not invertible modulo prime")),
        };
        Ok(Self(inv))
    }

    fn order() -> Number {
        Number::from_int(7)
    }
}
