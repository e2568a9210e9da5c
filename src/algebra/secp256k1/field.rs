//! The secp256k1 base field `F_p` with `p = 2^256 - 2^32 - 977`.

use super::monty_field;
use crate::algebra::mont::{self, Limbs, MontyParams};

pub(super) struct FieldParams;

impl MontyParams for FieldParams {
    const PRIME: Limbs = [
        0xFFFFFFFEFFFFFC2F,
        0xFFFFFFFFFFFFFFFF,
        0xFFFFFFFFFFFFFFFF,
        0xFFFFFFFFFFFFFFFF,
    ];
    const NP0: u64 = 0xD838091DD2253531;
    const R: Limbs = [0x1000003D1, 0, 0, 0];
    const R2: Limbs = [0x7A2000E90A1, 0x1, 0, 0];
    const PRIME_MINUS_2: Limbs = [
        0xFFFFFFFEFFFFFC2D,
        0xFFFFFFFFFFFFFFFF,
        0xFFFFFFFFFFFFFFFF,
        0xFFFFFFFFFFFFFFFF,
    ];
}

monty_field!(
    Secp256k1Field,
    FieldParams,
    "secp256k1_field",
    "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEFFFFFC2F"
);

// (p + 1) / 4. Since p = 3 mod 4, x^{(p+1)/4} is a square root of any
// square x.
const SQRT_EXP: Limbs = [
    0xFFFFFFFFBFFFFF0C,
    0xFFFFFFFFFFFFFFFF,
    0xFFFFFFFFFFFFFFFF,
    0x3FFFFFFFFFFFFFFF,
];

/// A square root of `x`, assuming `x` is a square mod p.
pub(super) fn sqrt(x: &Secp256k1Field) -> Secp256k1Field {
    Secp256k1Field(mont::mod_exp::<FieldParams>(&x.0, &SQRT_EXP))
}

/// Whether `lhs` is at most `rhs`, comparing the internal representation.
///
/// This is the ordering used to pick between y and -y in compressed point
/// encodings, so all that matters is that it is a total order that both
/// sides of a serialization round-trip agree on.
pub(super) fn is_smaller(lhs: &Secp256k1Field, rhs: &Secp256k1Field) -> bool {
    mont::cmp(&lhs.0, &rhs.0) != std::cmp::Ordering::Greater
}
