//! Pedersen verifiable secret sharing.
//!
//! The secret `a` travels together with a masking value `r`; both are
//! Shamir-shared in one go as a pair, and the public commitments
//! `a_j * G + r_j * H` are hiding (thanks to `r`) as well as binding. The
//! scheme is homomorphic: linear combinations of shares come with the
//! matching linear combinations of the commitments.

use crate::algebra::{lagrange_basis, Array, EcPoint, Matrix, Ring, Secp256k1Scalar, Vector};
use crate::sharing::shamir_share;
use crate::util::Prg;
use crate::{Error, Result};

type Scalar = Secp256k1Scalar;

/// A (value, randomness) pair, shared as one ring element.
pub type PedersenPair = Array<Scalar, 2>;

/// One party's view of a Pedersen sharing.
#[derive(Debug, Clone)]
pub struct PedersenShare {
    /// The party's share of the (value, randomness) pair.
    pub share: PedersenPair,
    /// The public commitments; index 0 commits to the secret itself and
    /// index `j > 0` to the `j`-th share.
    pub commitments: Vector<EcPoint>,
}

impl PedersenShare {
    /// The value part of the share.
    pub fn value(&self) -> Scalar {
        self.share[0]
    }

    /// The randomness part of the share.
    pub fn randomness(&self) -> Scalar {
        self.share[1]
    }
}

/// A full Pedersen sharing, as produced by the dealer.
#[derive(Debug, Clone)]
pub struct PedersenSharing {
    /// All parties' shares; party `i` holds `shares[i]`.
    pub shares: Vector<PedersenPair>,
    /// The first `t + 1` commitments: the secret at index 0, shares
    /// `1..=t` after it.
    pub commitments: Vector<EcPoint>,
}

impl PedersenSharing {
    /// The view handed to party `party_id`.
    pub fn share_for(&self, party_id: usize) -> PedersenShare {
        PedersenShare {
            share: self.shares[party_id],
            commitments: self.commitments.clone(),
        }
    }
}

/// Shares `secret` with caller-chosen commitment randomness.
pub fn pedersen_share_with_randomness(
    secret: Scalar,
    t: usize,
    n: usize,
    prg: &mut Prg,
    h: &EcPoint,
    randomness: Scalar,
) -> Result<PedersenSharing> {
    let pair = PedersenPair::from([secret, randomness]);
    let shares = shamir_share(pair, t, n, prg)?;

    let gen = EcPoint::generator();
    let mut commitments = Vec::with_capacity(t + 1);
    commitments.push(secret * gen + randomness * *h);
    for i in 0..t {
        commitments.push(shares[i][0] * gen + shares[i][1] * *h);
    }

    Ok(PedersenSharing {
        shares,
        commitments: Vector::from(commitments),
    })
}

/// Shares `secret` with fresh random commitment randomness.
pub fn pedersen_share(
    secret: Scalar,
    t: usize,
    n: usize,
    prg: &mut Prg,
    h: &EcPoint,
) -> Result<PedersenSharing> {
    let randomness = Scalar::random(prg);
    pedersen_share_with_randomness(secret, t, n, prg, h, randomness)
}

/// The commitment for evaluation point `share_index`.
///
/// Indices covered by the vector are answered directly; higher ones are
/// Lagrange-extrapolated from the committed points (the commitment vector
/// fixes a degree-`t` polynomial in the exponent, evaluated over the
/// nodes `0, 1, ..., t`).
pub fn pedersen_commitment_for_index(
    commitments: &Vector<EcPoint>,
    share_index: usize,
) -> Result<EcPoint> {
    if share_index < commitments.len() {
        return Ok(commitments[share_index]);
    }

    let nodes = Vector::<Scalar>::range(0, commitments.len());
    let basis = lagrange_basis(nodes.as_slice(), Scalar::from_int(share_index as i64))?;

    let mut combined = EcPoint::infinity();
    for (i, &ell) in basis.iter().enumerate() {
        combined += ell * commitments[i];
    }
    Ok(combined)
}

/// Checks a share against its commitment, for the party holding the
/// evaluation at `share_index`.
pub fn pedersen_verify(share: &PedersenShare, share_index: usize, h: &EcPoint) -> Result<bool> {
    let expected = pedersen_commitment_for_index(&share.commitments, share_index)?;
    Ok(expected == share.value() * EcPoint::generator() + share.randomness() * *h)
}

/// Applies a linear map to a sequence of shares: the result's `i`-th
/// share is `sum_k matrix[(i, k)] * shares[k]`, values and commitments
/// alike.
pub fn pedersen_apply(
    shares: &[PedersenShare],
    matrix: &Matrix<Scalar>,
) -> Result<Vec<PedersenShare>> {
    if shares.is_empty() {
        return Ok(Vec::new());
    }
    if matrix.cols() != shares.len() {
        return Err(Error::InvalidInput("matmul: lhs cols != number of shares"));
    }

    let m = shares[0].commitments.len();
    let mut out = Vec::with_capacity(matrix.rows());

    for i in 0..matrix.rows() {
        let mut share = PedersenPair::zero();
        let mut commitments = vec![EcPoint::infinity(); m];

        for (k, input) in shares.iter().enumerate() {
            let weight = matrix[(i, k)];
            share += input.share * PedersenPair::fill(weight);
            for j in 0..m {
                commitments[j] += weight * input.commitments[j];
            }
        }

        out.push(PedersenShare {
            share,
            commitments: Vector::from(commitments),
        });
    }

    Ok(out)
}
