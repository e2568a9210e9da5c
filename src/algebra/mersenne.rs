//! The Mersenne prime fields `F_{2^61 - 1}` and `F_{2^127 - 1}`.
//!
//! Elements are stored fully reduced in a single machine word, and reduction
//! after multiplication folds the high bits back in, using that
//! `2^k = 1 (mod 2^k - 1)`.

use std::fmt::{self, Display};
use std::ops::{AddAssign, MulAssign, Neg, SubAssign};

use super::{impl_field_ops, impl_ring_ops, Field, Number, Ring};
use crate::{Error, Result};

/// An element of the finite field of order `2^61 - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mersenne61(u64);

/// An element of the finite field of order `2^127 - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mersenne127(u128);

const P61: u64 = (1 << 61) - 1;
const P127: u128 = (1 << 127) - 1;

/// Folds a product of two reduced elements back below `2^61 - 1`.
fn reduce61(x: u128) -> u64 {
    let p = P61 as u128;
    let r = (x & p) + (x >> 61);
    let r = (r & p) + (r >> 61);
    let mut r = r as u64;
    if r >= P61 {
        r -= P61;
    }
    r
}

impl AddAssign for Mersenne61 {
    fn add_assign(&mut self, rhs: Self) {
        let mut sum = self.0 + rhs.0;
        if sum >= P61 {
            sum -= P61;
        }
        self.0 = sum;
    }
}

impl SubAssign for Mersenne61 {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 = if self.0 >= rhs.0 {
            self.0 - rhs.0
        } else {
            P61 - rhs.0 + self.0
        };
    }
}

impl MulAssign for Mersenne61 {
    fn mul_assign(&mut self, rhs: Self) {
        self.0 = reduce61(self.0 as u128 * rhs.0 as u128);
    }
}

impl Neg for Mersenne61 {
    type Output = Self;
    fn neg(self) -> Self {
        if self.0 == 0 {
            self
        } else {
            Self(P61 - self.0)
        }
    }
}

impl_ring_ops!(Mersenne61);
impl_field_ops!(Mersenne61);

impl Display for Mersenne61 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Ring for Mersenne61 {
    const NAME: &'static str = "Mersenne61";
    const BIT_SIZE: usize = 61;
    const BYTE_SIZE: usize = 8;

    fn zero() -> Self {
        Self(0)
    }

    fn one() -> Self {
        Self(1)
    }

    fn from_int(value: i64) -> Self {
        let r = value.rem_euclid(P61 as i64) as u64;
        Self(r)
    }

    fn read_le(src: &[u8]) -> Self {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&src[..8]);
        let v = u64::from_le_bytes(buf);
        Self(reduce61(v as u128))
    }

    fn write_le(&self, dst: &mut [u8]) {
        dst[..8].copy_from_slice(&self.0.to_le_bytes());
    }
}

impl Field for Mersenne61 {
    fn invert(self) -> Result<Self> {
        if self.0 == 0 {
            return Err(Error::InvalidInput("0 not invertible modulo prime"));
        }
        // Fermat: x^{p - 2}.
        let mut res = Self::one();
        let e = P61 - 2;
        for i in (0..61).rev() {
            res *= res;
            if (e >> i) & 1 == 1 {
                res *= self;
            }
        }
        Ok(res)
    }

    fn order() -> Number {
        (Number::from_int(1) << 61) - Number::from_int(1)
    }
}

/// 128x128 -> 256 bit multiplication, as (high, low) halves.
fn widening_mul128(a: u128, b: u128) -> (u128, u128) {
    const MASK: u128 = (1 << 64) - 1;
    let (a0, a1) = (a & MASK, a >> 64);
    let (b0, b1) = (b & MASK, b >> 64);

    let ll = a0 * b0;
    let lh = a0 * b1;
    let hl = a1 * b0;
    let hh = a1 * b1;

    let mid = (ll >> 64) + (lh & MASK) + (hl & MASK);
    let lo = (mid << 64) | (ll & MASK);
    let hi = hh + (lh >> 64) + (hl >> 64) + (mid >> 64);
    (hi, lo)
}

/// Folds a 256-bit product back below `2^127 - 1`.
fn reduce127(hi: u128, lo: u128) -> u128 {
    // hi * 2^128 + lo = (2 * hi) * 2^127 + lo = 2 * hi + lo (mod p).
    let r = (lo & P127) + (lo >> 127) + 2 * hi;
    let r = (r & P127) + (r >> 127);
    if r >= P127 {
        r - P127
    } else {
        r
    }
}

impl AddAssign for Mersenne127 {
    fn add_assign(&mut self, rhs: Self) {
        let mut sum = self.0 + rhs.0;
        if sum >= P127 {
            sum -= P127;
        }
        self.0 = sum;
    }
}

impl SubAssign for Mersenne127 {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 = if self.0 >= rhs.0 {
            self.0 - rhs.0
        } else {
            P127 - rhs.0 + self.0
        };
    }
}

impl MulAssign for Mersenne127 {
    fn mul_assign(&mut self, rhs: Self) {
        let (hi, lo) = widening_mul128(self.0, rhs.0);
        self.0 = reduce127(hi, lo);
    }
}

impl Neg for Mersenne127 {
    type Output = Self;
    fn neg(self) -> Self {
        if self.0 == 0 {
            self
        } else {
            Self(P127 - self.0)
        }
    }
}

impl_ring_ops!(Mersenne127);
impl_field_ops!(Mersenne127);

impl Display for Mersenne127 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Ring for Mersenne127 {
    const NAME: &'static str = "Mersenne127";
    const BIT_SIZE: usize = 127;
    const BYTE_SIZE: usize = 16;

    fn zero() -> Self {
        Self(0)
    }

    fn one() -> Self {
        Self(1)
    }

    fn from_int(value: i64) -> Self {
        if value < 0 {
            Self(P127 - value.unsigned_abs() as u128)
        } else {
            Self(value as u128)
        }
    }

    fn read_le(src: &[u8]) -> Self {
        let mut buf = [0u8; 16];
        buf.copy_from_slice(&src[..16]);
        let v = u128::from_le_bytes(buf);
        Self(reduce127(0, v))
    }

    fn write_le(&self, dst: &mut [u8]) {
        dst[..16].copy_from_slice(&self.0.to_le_bytes());
    }
}

impl Field for Mersenne127 {
    fn invert(self) -> Result<Self> {
        if self.0 == 0 {
            return Err(Error::InvalidInput("0 not invertible modulo prime"));
        }
        let mut res = Self::one();
        let e = P127 - 2;
        for i in (0..127).rev() {
            res *= res;
            if (e >> i) & 1 == 1 {
                res *= self;
            }
        }
        Ok(res)
    }

    fn order() -> Number {
        (Number::from_int(1) << 127) - Number::from_int(1)
    }
}
