//! The secp256k1 base field, scalar field and curve group.

mod curve;
mod field;
mod scalar;

pub use curve::EcPoint;
pub use field::Secp256k1Field;
pub use scalar::Secp256k1Scalar;

/// Defines a 256-bit Montgomery-form field type over a
/// [`MontyParams`](super::mont::MontyParams) instance.
///
/// Elements print as reduced lowercase hex and parse from hex by default,
/// matching their canonical constant notation.
macro_rules! monty_field {
    ($name:ident, $params:ty, $name_str:literal, $order_hex:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(pub(super) crate::algebra::mont::Limbs);

        impl Default for $name {
            fn default() -> Self {
                Self([0; 4])
            }
        }

        impl std::ops::AddAssign for $name {
            fn add_assign(&mut self, rhs: Self) {
                crate::algebra::mont::add::<$params>(&mut self.0, &rhs.0);
            }
        }

        impl std::ops::SubAssign for $name {
            fn sub_assign(&mut self, rhs: Self) {
                crate::algebra::mont::sub::<$params>(&mut self.0, &rhs.0);
            }
        }

        impl std::ops::MulAssign for $name {
            fn mul_assign(&mut self, rhs: Self) {
                crate::algebra::mont::mul::<$params>(&mut self.0, &rhs.0);
            }
        }

        impl std::ops::Neg for $name {
            type Output = Self;
            fn neg(mut self) -> Self {
                crate::algebra::mont::neg::<$params>(&mut self.0);
                self
            }
        }

        crate::algebra::impl_ring_ops!($name);
        crate::algebra::impl_field_ops!($name);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let reduced = crate::algebra::mont::from_monty::<$params>(&self.0);
                write!(f, "{}", crate::algebra::mont::to_hex(&reduced))
            }
        }

        impl crate::algebra::Ring for $name {
            const NAME: &'static str = $name_str;
            const BIT_SIZE: usize = 256;
            const BYTE_SIZE: usize = 32;

            fn zero() -> Self {
                Self([0; 4])
            }

            fn one() -> Self {
                Self(<$params as crate::algebra::mont::MontyParams>::R)
            }

            fn from_int(value: i64) -> Self {
                let mut limbs = [value.unsigned_abs(), 0, 0, 0];
                if value < 0 {
                    crate::algebra::mont::neg::<$params>(&mut limbs);
                }
                crate::algebra::mont::to_monty::<$params>(&mut limbs);
                Self(limbs)
            }

            fn read_le(src: &[u8]) -> Self {
                let mut limbs = crate::algebra::mont::read_le(src);
                crate::algebra::mont::to_monty::<$params>(&mut limbs);
                Self(limbs)
            }

            fn write_le(&self, dst: &mut [u8]) {
                let reduced = crate::algebra::mont::from_monty::<$params>(&self.0);
                crate::algebra::mont::write_le(&reduced, dst);
            }

            fn from_string(s: &str) -> crate::Result<Self> {
                Self::from_string_base(s, crate::algebra::NumberBase::Hex)
            }
        }

        impl crate::algebra::Field for $name {
            fn invert(self) -> crate::Result<Self> {
                if crate::algebra::mont::is_zero(&self.0) {
                    return Err(crate::Error::InvalidInput("0 not invertible modulo prime"));
                }
                Ok(Self(crate::algebra::mont::mod_exp::<$params>(
                    &self.0,
                    &<$params as crate::algebra::mont::MontyParams>::PRIME_MINUS_2,
                )))
            }

            fn order() -> crate::algebra::Number {
                crate::algebra::Number::from_hex($order_hex)
                    .expect("field order constant is valid hex")
            }
        }
    };
}

pub(self) use monty_field;

#[cfg(test)]
mod tests;
