//! Feldman verifiable secret sharing.
//!
//! Shamir sharing over the secp256k1 scalar field, plus a commitment
//! vector of curve points that lets anyone check a share without learning
//! the secret.

use crate::algebra::{lagrange_basis, EcPoint, Ring, Secp256k1Scalar, Vector};
use crate::sharing::{canonical_alphas, shamir_share, ShamirScheme, SecurityLevel};
use crate::util::Prg;
use crate::{Error, Result};

type Scalar = Secp256k1Scalar;

/// The output of a Feldman sharing: plain Shamir shares and the public
/// commitment vector.
#[derive(Debug, Clone)]
pub struct FeldmanSharing {
    /// One share per party; party `i` holds `shares[i]`.
    pub shares: Vector<Scalar>,
    /// Commitments to the first `t + 1` shares: `commitments[i] = s_i * G`.
    pub commitments: Vector<EcPoint>,
}

/// Feldman sharing with privacy threshold `t`.
#[derive(Debug, Clone, Copy)]
pub struct FeldmanScheme {
    threshold: usize,
}

impl FeldmanScheme {
    /// A scheme with privacy threshold `t`.
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    /// Shares `secret` among `n` parties and commits to the sharing.
    pub fn share(&self, secret: Scalar, n: usize, prg: &mut Prg) -> Result<FeldmanSharing> {
        let shares = shamir_share(secret, self.threshold, n, prg)?;

        let gen = EcPoint::generator();
        let commitments = shares
            .iter()
            .take(self.threshold + 1)
            .map(|&s| s * gen)
            .collect();

        Ok(FeldmanSharing {
            shares,
            commitments,
        })
    }

    /// Checks party `party_index`'s share against the commitment vector.
    ///
    /// The first `t + 1` commitments fix the sharing polynomial in the
    /// exponent; the share is consistent iff `share * G` equals the
    /// Lagrange combination of the commitments at the party's evaluation
    /// point.
    pub fn verify(
        &self,
        share: Scalar,
        commitments: &Vector<EcPoint>,
        party_index: usize,
    ) -> Result<bool> {
        // party i holds the evaluation at x = i + 1.
        self.verify_at(share, commitments, Scalar::from_int(party_index as i64 + 1))
    }

    /// Checks a claimed secret against the commitment vector, i.e. the
    /// evaluation at zero.
    pub fn verify_secret(&self, secret: Scalar, commitments: &Vector<EcPoint>) -> Result<bool> {
        self.verify_at(secret, commitments, Scalar::zero())
    }

    fn verify_at(
        &self,
        value: Scalar,
        commitments: &Vector<EcPoint>,
        x: Scalar,
    ) -> Result<bool> {
        if commitments.len() < self.threshold + 1 {
            return Err(Error::InvalidInput(
                "insufficient commitments for verification",
            ));
        }

        let nodes = canonical_alphas::<Scalar>(self.threshold + 1);
        let basis = lagrange_basis(nodes.as_slice(), x)?;

        let mut combined = EcPoint::infinity();
        for (i, &ell) in basis.iter().enumerate() {
            combined += ell * commitments[i];
        }

        Ok(combined == value * EcPoint::generator())
    }

    /// Recovers the secret from `t + 1` or more shares.
    pub fn recover(&self, shares: &Vector<Scalar>) -> Result<Scalar> {
        ShamirScheme::new(self.threshold, SecurityLevel::Passive).reconstruct(shares)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn honest_shares_verify() {
        let mut prg = Prg::from_seed(b"feldman");
        let scheme = FeldmanScheme::new(2);
        let secret = Scalar::from_int(1234);
        let sharing = scheme.share(secret, 5, &mut prg).unwrap();

        assert_eq!(sharing.commitments.len(), 3);
        for (i, &share) in sharing.shares.iter().enumerate() {
            assert!(scheme.verify(share, &sharing.commitments, i).unwrap());
        }
        assert!(scheme.verify_secret(secret, &sharing.commitments).unwrap());
    }

    #[test]
    fn tampered_share_fails() {
        let mut prg = Prg::from_seed(b"feldman-tamper");
        let scheme = FeldmanScheme::new(2);
        let sharing = scheme.share(Scalar::from_int(77), 5, &mut prg).unwrap();

        let bad = sharing.shares[3] + Scalar::one();
        assert!(!scheme.verify(bad, &sharing.commitments, 3).unwrap());

        // and a share does not verify at the wrong index.
        assert!(!scheme
            .verify(sharing.shares[3], &sharing.commitments, 2)
            .unwrap());
    }

    #[test]
    fn wrong_secret_fails() {
        let mut prg = Prg::from_seed(b"feldman-secret");
        let scheme = FeldmanScheme::new(1);
        let sharing = scheme.share(Scalar::from_int(5), 4, &mut prg).unwrap();
        assert!(!scheme
            .verify_secret(Scalar::from_int(6), &sharing.commitments)
            .unwrap());
    }

    #[test]
    fn too_few_commitments() {
        let mut prg = Prg::from_seed(b"feldman-short");
        let scheme = FeldmanScheme::new(2);
        let sharing = scheme.share(Scalar::from_int(5), 5, &mut prg).unwrap();
        let truncated = sharing.commitments.subvector(0..2);
        assert!(scheme.verify(sharing.shares[0], &truncated, 0).is_err());
    }

    #[test]
    fn recover_matches_shamir() {
        let mut prg = Prg::from_seed(b"feldman-recover");
        let scheme = FeldmanScheme::new(2);
        let secret = Scalar::from_int(424242);
        let sharing = scheme.share(secret, 5, &mut prg).unwrap();
        assert_eq!(scheme.recover(&sharing.shares).unwrap(), secret);
    }
}
