//! ECDSA over secp256k1.

use crate::algebra::{EcPoint, Field, Ring, Secp256k1Scalar};
use crate::util::Prg;
use crate::{Error, Result};

type Scalar = Secp256k1Scalar;

/// An ECDSA signature: the pair (r, s).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    /// The x coordinate of the nonce point, reduced mod the group order.
    pub r: Scalar,
    /// The proof scalar `k^{-1} (h + sk * r)`.
    pub s: Scalar,
}

impl Signature {
    /// Size of a serialized signature.
    pub const BYTE_SIZE: usize = 2 * Scalar::BYTE_SIZE;

    /// Reads a signature as r then s.
    pub fn read(buf: &[u8]) -> Self {
        Self {
            r: Scalar::read_le(&buf[..Scalar::BYTE_SIZE]),
            s: Scalar::read_le(&buf[Scalar::BYTE_SIZE..]),
        }
    }

    /// Writes the signature as r then s.
    pub fn write(&self, buf: &mut [u8]) {
        self.r.write_le(&mut buf[..Scalar::BYTE_SIZE]);
        self.s.write_le(&mut buf[Scalar::BYTE_SIZE..]);
    }
}

/// The ECDSA signature scheme. Secret keys are scalars, public keys are
/// curve points.
pub struct Ecdsa;

impl Ecdsa {
    /// The public key of a secret key.
    pub fn derive(secret_key: &Scalar) -> EcPoint {
        *secret_key * EcPoint::generator()
    }

    /// Signs a message digest.
    ///
    /// The digest is hashed message bytes from any hash function; shorter
    /// digests are zero-extended, longer ones truncated to the scalar
    /// size.
    pub fn sign(secret_key: &Scalar, digest: &[u8], prg: &mut Prg) -> Result<Signature> {
        let k = Scalar::random(prg);
        let big_r = k * EcPoint::generator();
        let r = Self::conversion(&big_r)?;
        let h = Self::digest_to_element(digest);
        let s = k.invert()? * (h + *secret_key * r);
        Ok(Signature { r, s })
    }

    /// Checks a signature against a public key and message digest.
    pub fn verify(public_key: &EcPoint, signature: &Signature, digest: &[u8]) -> bool {
        let h = Self::digest_to_element(digest);
        let Signature { r, s } = *signature;
        let si = match s.invert() {
            Ok(si) => si,
            Err(_) => return false,
        };
        let big_r = (h * si) * EcPoint::generator() + (r * si) * *public_key;
        match Self::conversion(&big_r) {
            Ok(rx) => !big_r.is_infinity() && rx == r,
            Err(_) => false,
        }
    }

    /// The conversion function: the x coordinate of a point, re-read as a
    /// scalar (i.e. reduced mod the group order).
    fn conversion(point: &EcPoint) -> Result<Scalar> {
        let (x, _) = point
            .to_affine()
            .map_err(|_| Error::InvalidInput("nonce point is the point at infinity"))?;
        let mut buf = [0u8; 32];
        x.write_le(&mut buf);
        Ok(Scalar::read_le(&buf))
    }

    /// A digest as a scalar, little-endian, zero-padded to scalar size.
    fn digest_to_element(digest: &[u8]) -> Scalar {
        let mut buf = [0u8; Scalar::BYTE_SIZE];
        let n = digest.len().min(Scalar::BYTE_SIZE);
        buf[..n].copy_from_slice(&digest[..n]);
        Scalar::read_le(&buf)
    }
}
