//! Shamir secret sharing with selectable error handling.

use crate::algebra::{solve_linear_system, Field, Matrix, Polynomial, Ring, Vector};
use crate::util::Prg;
use crate::{Error, Result};

/// How much adversarial behavior reconstruction is expected to survive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityLevel {
    /// Interpolate the first `t + 1` shares and trust them.
    Passive,
    /// Use `2t + 1` shares; fail if they are inconsistent.
    Detect,
    /// Use `3t + 1` shares; correct up to `t` wrong ones.
    Correct,
}

/// The canonical evaluation points `1, 2, ..., n`.
///
/// Party `i` (0-indexed) holds the evaluation at `x = i + 1`; the secret
/// sits at `x = 0`.
pub fn canonical_alphas<T: Ring>(n: usize) -> Vector<T> {
    Vector::range(1, n + 1)
}

/// A random degree-`t` polynomial with the given constant term.
pub fn shamir_share_polynomial<T: Ring>(
    secret: T,
    t: usize,
    prg: &mut Prg,
) -> Result<Polynomial<T>> {
    if t == 0 {
        return Err(Error::InvalidInput("threshold cannot be 0"));
    }
    let mut coefficients = Vector::partial_random(t + 1, |i| i > 0, prg);
    coefficients[0] = secret;
    Ok(Polynomial::new(coefficients))
}

/// Shares `secret` among `n` parties with privacy threshold `t`.
pub fn shamir_share<T: Ring>(secret: T, t: usize, n: usize, prg: &mut Prg) -> Result<Vector<T>> {
    let polynomial = shamir_share_polynomial(secret, t, prg)?;
    let alphas = canonical_alphas::<T>(n);
    Ok(alphas.iter().map(|&x| polynomial.evaluate(x)).collect())
}

/// Interpolation of `(xs[offset + j], ys[offset + j])` for `j < k` at `x`.
fn interpolate_at<T: Field>(ys: &Vector<T>, xs: &Vector<T>, k: usize, x: T, offset: usize) -> Result<T> {
    let mut z = T::zero();
    for j in 0..k {
        let mut ell = T::one();
        let xj = xs[offset + j];
        for m in 0..k {
            if m == j {
                continue;
            }
            let xm = xs[offset + m];
            ell *= (x - xm) * (xj - xm).invert()?;
        }
        z += ys[offset + j] * ell;
    }
    Ok(z)
}

fn reconstruct_passive_at<T: Field>(
    shares: &Vector<T>,
    alphas: &Vector<T>,
    pos: T,
    t: usize,
) -> Result<T> {
    if t + 1 > shares.len() {
        return Err(Error::InvalidInput("not enough shares to reconstruct"));
    }
    if t + 1 > alphas.len() {
        return Err(Error::InvalidInput("not enough alphas to reconstruct"));
    }
    interpolate_at(shares, alphas, t + 1, pos, 0)
}

fn reconstruct_detect_at<T: Field>(
    shares: &Vector<T>,
    alphas: &Vector<T>,
    pos: T,
    t: usize,
) -> Result<T> {
    if 2 * t + 1 > shares.len() {
        return Err(Error::InvalidInput(
            "not enough shares to reconstruct with error detection",
        ));
    }
    if 2 * t + 1 > alphas.len() {
        return Err(Error::InvalidInput(
            "not enough alphas to reconstruct with error detection",
        ));
    }

    // the first t + 1 shares fix the polynomial; every share up to 2t + 1
    // must agree with it.
    for k in t + 1..2 * t + 1 {
        let s = interpolate_at(shares, alphas, t + 1, alphas[k], 0)?;
        if s != shares[k] {
            return Err(Error::IntegrityFailure(
                "error detected during reconstruction",
            ));
        }
    }
    interpolate_at(shares, alphas, t + 1, pos, 0)
}

/// Berlekamp-Welch decoding of `3t + 1` shares with up to `t` errors.
///
/// Returns the pair `(corrected polynomial, error locator)`. Starting from
/// the largest error count `e = t`, finds polynomials `Q` (degree at most
/// `n - 1 - e`) and monic `E` (degree `e`) with `Q(x_i) = E(x_i) * y_i`
/// for all shares; the first `e` for which the system has a unique
/// solution wins, and the decoded polynomial is `Q / E` when that division
/// is exact.
pub(crate) fn reconstruct_robust_polynomials<T: Field>(
    shares: &Vector<T>,
    alphas: &Vector<T>,
    t: usize,
) -> Result<(Polynomial<T>, Polynomial<T>)> {
    let n = 3 * t + 1;
    if n > shares.len() {
        return Err(Error::InvalidInput(
            "not enough shares to reconstruct with error correction",
        ));
    }
    if n > alphas.len() {
        return Err(Error::InvalidInput(
            "not enough alphas to reconstruct with error correction",
        ));
    }

    let mut x = Vector::zeros(n);
    let mut e = 0;
    for k in 0..=t {
        e = t - k;

        let mut a = Matrix::square(n);
        let mut b = Vector::zeros(n);
        for i in 0..n {
            b[i] = -shares[i];
            a[(i, 0)] = shares[i];
            for j in 1..=e {
                a[(i, j)] = a[(i, j - 1)] * alphas[i];
                b[i] *= alphas[i];
            }

            a[(i, e)] = -T::one();
            for j in e + 1..n {
                a[(i, j)] = a[(i, j - 1)] * alphas[i];
            }
        }

        if let Some(solution) = solve_linear_system(&a, &b)? {
            x = solution;
            break;
        }
    }

    let mut ce = x.subvector(0..e + 1);
    ce[e] = T::one();
    let locator = Polynomial::new(ce);
    let q = Polynomial::new(x.subvector(e..n));

    let (corrected, remainder) = q.div_rem(&locator)?;
    if remainder.is_zero() {
        Ok((corrected, locator))
    } else {
        Err(Error::IntegrityFailure("could not correct shares"))
    }
}

/// Shamir sharing with a fixed threshold and security level.
#[derive(Debug, Clone, Copy)]
pub struct ShamirScheme<T> {
    threshold: usize,
    level: SecurityLevel,
    _marker: std::marker::PhantomData<T>,
}

impl<T: Field> ShamirScheme<T> {
    /// A scheme with privacy threshold `t`.
    pub fn new(threshold: usize, level: SecurityLevel) -> Self {
        Self {
            threshold,
            level,
            _marker: std::marker::PhantomData,
        }
    }

    /// The privacy threshold.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Number of shares the configured reconstruction needs.
    pub fn shares_required(&self) -> usize {
        match self.level {
            SecurityLevel::Passive => self.threshold + 1,
            SecurityLevel::Detect => 2 * self.threshold + 1,
            SecurityLevel::Correct => 3 * self.threshold + 1,
        }
    }

    /// Shares `secret` among `n` parties.
    pub fn share(&self, secret: T, n: usize, prg: &mut Prg) -> Result<Vector<T>> {
        shamir_share(secret, self.threshold, n, prg)
    }

    /// Recovers the secret, with the error handling of the configured
    /// security level.
    pub fn reconstruct(&self, shares: &Vector<T>) -> Result<T> {
        self.reconstruct_at(shares, T::zero())
    }

    /// Recovers the evaluation at `pos`; `reconstruct` is the special
    /// case `pos = 0`.
    pub fn reconstruct_at(&self, shares: &Vector<T>, pos: T) -> Result<T> {
        let alphas = canonical_alphas::<T>(shares.len());
        match self.level {
            SecurityLevel::Passive => {
                reconstruct_passive_at(shares, &alphas, pos, self.threshold)
            }
            SecurityLevel::Detect => reconstruct_detect_at(shares, &alphas, pos, self.threshold),
            SecurityLevel::Correct => {
                let (p, _) = reconstruct_robust_polynomials(shares, &alphas, self.threshold)?;
                Ok(p.evaluate(pos))
            }
        }
    }
}
