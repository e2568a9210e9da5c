//! The secp256k1 scalar field: integers modulo the order of the curve
//! subgroup.

use super::monty_field;
use crate::algebra::mont::{self, Limbs, MontyParams};

pub(super) struct ScalarParams;

impl MontyParams for ScalarParams {
    const PRIME: Limbs = [
        0xBFD25E8CD0364141,
        0xBAAEDCE6AF48A03B,
        0xFFFFFFFFFFFFFFFE,
        0xFFFFFFFFFFFFFFFF,
    ];
    const NP0: u64 = 0x4B0DFF665588B13F;
    const R: Limbs = [0x402DA1732FC9BEBF, 0x4551231950B75FC4, 0x1, 0];
    const R2: Limbs = [
        0x896CF21467D7D140,
        0x741496C20E7CF878,
        0xE697F5E45BCD07C6,
        0x9D671CD581C69BC5,
    ];
    const PRIME_MINUS_2: Limbs = [
        0xBFD25E8CD036413F,
        0xBAAEDCE6AF48A03B,
        0xFFFFFFFFFFFFFFFE,
        0xFFFFFFFFFFFFFFFF,
    ];
}

monty_field!(
    Secp256k1Scalar,
    ScalarParams,
    "secp256k1_scalar",
    "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141"
);

/// The scalar with its Montgomery representation undone, for bit-level
/// inspection during scalar multiplication.
pub(super) fn from_monty(x: &Secp256k1Scalar) -> Limbs {
    mont::from_monty::<ScalarParams>(&x.0)
}

fn add1(v: &mut Limbs) {
    let mut carry = 1u64;
    for limb in v.iter_mut() {
        let (s, o) = limb.overflowing_add(carry);
        *limb = s;
        carry = o as u64;
        if carry == 0 {
            break;
        }
    }
}

fn sub1(v: &mut Limbs) {
    let mut borrow = 1u64;
    for limb in v.iter_mut() {
        let (s, o) = limb.overflowing_sub(borrow);
        *limb = s;
        borrow = o as u64;
        if borrow == 0 {
            break;
        }
    }
}

fn shift_right1(v: &mut Limbs) {
    for i in 0..4 {
        let high = if i < 3 { v[i + 1] & 1 } else { 0 };
        v[i] = (v[i] >> 1) | (high << 63);
    }
}

/// The non-adjacent form of a scalar: signed digits in {-1, 0, 1}, least
/// significant first, with no two adjacent digits both nonzero.
///
/// Uses the textbook conversion: odd values contribute +1 when 1 mod 4 and
/// -1 when 3 mod 4, followed by a halving step.
pub(super) fn to_naf(x: &Secp256k1Scalar) -> Vec<i8> {
    let mut val = from_monty(x);
    let mut digits = Vec::with_capacity(257);

    while !mont::is_zero(&val) {
        if mont::test_bit(&val, 0) {
            if mont::test_bit(&val, 1) {
                digits.push(-1);
                add1(&mut val);
            } else {
                digits.push(1);
                sub1(&mut val);
            }
        } else {
            digits.push(0);
        }
        shift_right1(&mut val);
    }

    digits
}
