//! Univariate polynomials over a ring.

use std::fmt::{self, Display};
use std::ops::{Index, IndexMut};

use super::{Field, Ring, Vector};
use crate::{Error, Result};

/// A polynomial with its constant term at index 0.
///
/// The coefficient vector is canonical: trailing zeros are stripped on
/// construction, and the zero polynomial is represented by the single
/// coefficient 0 (degree 0).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polynomial<T> {
    coefficients: Vector<T>,
}

impl<T: Ring> Default for Polynomial<T> {
    fn default() -> Self {
        Self::constant(T::zero())
    }
}

impl<T: Ring> Polynomial<T> {
    /// The constant polynomial `c`.
    pub fn constant(c: T) -> Self {
        Self {
            coefficients: Vector::from(vec![c]),
        }
    }

    /// A polynomial from coefficients, lowest degree first.
    ///
    /// Trailing zero coefficients are dropped; an empty or all-zero input
    /// yields the zero polynomial.
    pub fn new(coefficients: Vector<T>) -> Self {
        let zero = T::zero();
        let mut cutoff = coefficients.len();
        while cutoff > 0 && coefficients[cutoff - 1] == zero {
            cutoff -= 1;
        }
        if cutoff == 0 {
            Self::constant(zero)
        } else {
            Self {
                coefficients: coefficients.subvector(0..cutoff),
            }
        }
    }

    /// Evaluation at `x` by Horner's rule.
    pub fn evaluate(&self, x: T) -> T {
        let mut it = self.coefficients.iter().rev();
        let mut y = *it.next().expect("coefficients are never empty");
        for &c in it {
            y = c + y * x;
        }
        y
    }

    /// The degree. The zero polynomial has degree 0.
    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// The coefficient of `x^0`.
    pub fn constant_term(&self) -> T {
        self[0]
    }

    /// The coefficient of `x^degree`.
    pub fn leading_term(&self) -> T {
        self[self.degree()]
    }

    /// Whether this is the zero polynomial.
    pub fn is_zero(&self) -> bool {
        self.degree() == 0 && self.constant_term() == T::zero()
    }

    /// The coefficients, lowest degree first.
    pub fn coefficients(&self) -> &Vector<T> {
        &self.coefficients
    }

    fn padded(&self, n: usize) -> Vector<T> {
        let mut c = Vector::zeros(n);
        for i in 0..=self.degree().min(n - 1) {
            c[i] = self[i];
        }
        c
    }

    /// The sum of two polynomials.
    pub fn add(&self, q: &Self) -> Self {
        let n = self.degree().max(q.degree()) + 1;
        Self::new(&self.padded(n) + &q.padded(n))
    }

    /// The difference of two polynomials.
    pub fn sub(&self, q: &Self) -> Self {
        let n = self.degree().max(q.degree()) + 1;
        Self::new(&self.padded(n) - &q.padded(n))
    }

    /// The product of two polynomials, by the schoolbook method.
    pub fn mul(&self, q: &Self) -> Self {
        let mut c = Vector::zeros(self.degree() + q.degree() + 1);
        for i in 0..=self.degree() {
            for j in 0..=q.degree() {
                let t = self[i] * q[j];
                c[i + j] += t;
            }
        }
        Self::new(c)
    }
}

impl<T: Field> Polynomial<T> {
    /// Polynomial long division: `self = q * d + r` with
    /// `deg r < deg d` (or `r = 0`).
    ///
    /// Fails with [`Error::InvalidInput`] when dividing by the zero
    /// polynomial.
    pub fn div_rem(&self, d: &Self) -> Result<(Self, Self)> {
        if d.is_zero() {
            return Err(Error::InvalidInput("division by zero polynomial"));
        }

        let mut q = Self::default();
        let mut r = self.clone();

        while !r.is_zero() && r.degree() >= d.degree() {
            let t = divide_leading_terms(&r, d)?;
            q = q.add(&t);
            r = r.sub(&t.mul(d));
        }
        Ok((q, r))
    }
}

/// The monomial `(lead(p) / lead(q)) * x^{deg p - deg q}`; assumes
/// `deg p >= deg q`.
fn divide_leading_terms<T: Field>(p: &Polynomial<T>, q: &Polynomial<T>) -> Result<Polynomial<T>> {
    let deg_out = p.degree() - q.degree();
    let mut c = Vector::zeros(deg_out + 1);
    c[deg_out] = p.leading_term() * q.leading_term().invert()?;
    Ok(Polynomial::new(c))
}

impl<T> Index<usize> for Polynomial<T> {
    type Output = T;
    fn index(&self, idx: usize) -> &T {
        &self.coefficients[idx]
    }
}

impl<T> IndexMut<usize> for Polynomial<T> {
    fn index_mut(&mut self, idx: usize) -> &mut T {
        &mut self.coefficients[idx]
    }
}

impl<T: Ring> Display for Polynomial<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f(x) = {}", self[0])?;
        for i in 1..=self.degree() {
            write!(f, " + {} x^{}", self[i], i)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::Mersenne61;

    type F = Mersenne61;
    type P = Polynomial<Mersenne61>;

    fn poly(coeffs: &[i64]) -> P {
        P::new(coeffs.iter().map(|&c| F::from_int(c)).collect())
    }

    #[test]
    fn canonicalization() {
        let p = poly(&[1, 2, 0, 0]);
        assert_eq!(p.degree(), 1);

        let z = poly(&[0, 0]);
        assert!(z.is_zero());
        assert_eq!(z.degree(), 0);

        assert!(P::new(Vector::new()).is_zero());
    }

    #[test]
    fn evaluation() {
        // f(x) = 1 + 2x + 3x^2.
        let p = poly(&[1, 2, 3]);
        assert_eq!(p.evaluate(F::zero()), F::from_int(1));
        assert_eq!(p.evaluate(F::from_int(2)), F::from_int(17));
    }

    #[test]
    fn add_sub() {
        let p = poly(&[1, 2, 3]);
        let q = poly(&[1, 1]);
        assert_eq!(p.add(&q), poly(&[2, 3, 3]));
        assert_eq!(p.sub(&q), poly(&[0, 1, 3]));

        // cancellation drops the degree.
        assert_eq!(p.sub(&p), P::default());
        assert_eq!(poly(&[1, 1, 1]).sub(&poly(&[0, 0, 1])), poly(&[1, 1]));
    }

    #[test]
    fn multiplication() {
        // (1 + x)(1 - x) = 1 - x^2.
        let p = poly(&[1, 1]);
        let q = poly(&[1, -1]);
        assert_eq!(p.mul(&q), poly(&[1, 0, -1]));
        assert_eq!(p.mul(&P::default()), P::default());
    }

    #[test]
    fn division() {
        // (x^2 + 3x + 2) / (x + 1) = (x + 2, 0).
        let p = poly(&[2, 3, 1]);
        let d = poly(&[1, 1]);
        let (q, r) = p.div_rem(&d).unwrap();
        assert_eq!(q, poly(&[2, 1]));
        assert!(r.is_zero());

        // x^2 / (x + 1) = (x - 1, 1).
        let p = poly(&[0, 0, 1]);
        let (q, r) = p.div_rem(&d).unwrap();
        assert_eq!(q, poly(&[-1, 1]));
        assert_eq!(r, poly(&[1]));

        // division reassembles.
        assert_eq!(q.mul(&d).add(&r), p);

        assert!(p.div_rem(&P::default()).is_err());
    }
}
