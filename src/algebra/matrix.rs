//! Row-major matrices and the linear algebra on top of them.

use std::fmt::{self, Display};
use std::ops::{Index, IndexMut};

use super::{lagrange_basis, Field, Ring, Vector};
use crate::util::Prg;
use crate::{Error, Result};

/// An `n x m` matrix over a ring, stored row-major.
///
/// All cells default to the ring's zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    values: Vec<T>,
}

impl<T: Ring> Matrix<T> {
    /// An `n x m` matrix of zeros.
    ///
    /// Panics if either dimension is zero.
    pub fn new(n: usize, m: usize) -> Self {
        assert!(n > 0 && m > 0, "n or m cannot be 0");
        Self {
            rows: n,
            cols: m,
            values: vec![T::zero(); n * m],
        }
    }

    /// An `n x n` matrix of zeros.
    pub fn square(n: usize) -> Self {
        Self::new(n, n)
    }

    /// The `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut id = Self::square(n);
        for i in 0..n {
            id[(i, i)] = T::one();
        }
        id
    }

    /// A matrix of uniformly random entries.
    pub fn random(n: usize, m: usize, prg: &mut Prg) -> Self {
        Self {
            rows: n,
            cols: m,
            values: Vector::random(n * m, prg).into_inner(),
        }
    }

    /// An `n x m` matrix from a flat row-major vector.
    pub fn from_vector(n: usize, m: usize, vec: Vector<T>) -> Result<Self> {
        if vec.len() != n * m {
            return Err(Error::InvalidInput("invalid dimensions"));
        }
        Ok(Self {
            rows: n,
            cols: m,
            values: vec.into_inner(),
        })
    }

    /// The Vandermonde matrix `V(i, j) = xs[i]^j`.
    pub fn vandermonde_with_nodes(n: usize, m: usize, xs: &Vector<T>) -> Result<Self> {
        if xs.len() != n {
            return Err(Error::InvalidInput("|xs| != number of rows"));
        }
        let mut v = Self::new(n, m);
        for i in 0..n {
            v[(i, 0)] = T::one();
            for j in 1..m {
                v[(i, j)] = v[(i, j - 1)] * xs[i];
            }
        }
        Ok(v)
    }

    /// The Vandermonde matrix over the canonical nodes `1, 2, ..., n`.
    pub fn vandermonde(n: usize, m: usize) -> Self {
        Self::vandermonde_with_nodes(n, m, &Vector::range(1, n + 1))
            .expect("canonical nodes match the row count")
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Whether the matrix has as many rows as columns.
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    fn ensure_compatible(&self, other: &Self) {
        assert!(
            self.rows == other.rows && self.cols == other.cols,
            "incompatible matrices"
        );
    }

    /// Entrywise sum.
    pub fn add(&self, other: &Self) -> Self {
        self.ensure_compatible(other);
        self.zip_with(other, |a, b| a + b)
    }

    /// Entrywise difference.
    pub fn sub(&self, other: &Self) -> Self {
        self.ensure_compatible(other);
        self.zip_with(other, |a, b| a - b)
    }

    /// Entrywise (Hadamard) product.
    pub fn mul_entrywise(&self, other: &Self) -> Self {
        self.ensure_compatible(other);
        self.zip_with(other, |a, b| a * b)
    }

    fn zip_with(&self, other: &Self, f: impl Fn(T, T) -> T) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            values: self
                .values
                .iter()
                .zip(other.values.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }

    /// Every entry multiplied by `scalar`.
    pub fn scalar_multiply(&self, scalar: T) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            values: self.values.iter().map(|&v| v * scalar).collect(),
        }
    }

    /// Matrix product `self * other`.
    pub fn multiply(&self, other: &Self) -> Result<Self> {
        if self.cols != other.rows {
            return Err(Error::InvalidInput("matmul: lhs cols != rhs rows"));
        }
        let (n, p, m) = (self.rows, self.cols, other.cols);
        let mut result = Self::new(n, m);
        for i in 0..n {
            for k in 0..p {
                let a = self[(i, k)];
                for j in 0..m {
                    let t = a * other[(k, j)];
                    result[(i, j)] += t;
                }
            }
        }
        Ok(result)
    }

    /// Matrix-vector product `self * v`.
    pub fn multiply_vector(&self, v: &Vector<T>) -> Result<Vector<T>> {
        if self.cols != v.len() {
            return Err(Error::InvalidInput("matmul: lhs cols != vector size"));
        }
        let mut out = Vec::with_capacity(self.rows);
        for i in 0..self.rows {
            out.push(super::inner_product(self.row(i), v.as_slice()));
        }
        Ok(Vector::from(out))
    }

    /// The transpose.
    pub fn transpose(&self) -> Self {
        let mut t = Self::new(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                t[(j, i)] = self[(i, j)];
            }
        }
        t
    }

    /// Reinterprets the entries with new dimensions of the same total size.
    pub fn resize(&mut self, new_rows: usize, new_cols: usize) -> Result<()> {
        if new_rows * new_cols != self.rows * self.cols {
            return Err(Error::InvalidInput("cannot resize matrix"));
        }
        self.rows = new_rows;
        self.cols = new_cols;
        Ok(())
    }

    /// Whether this is the identity matrix.
    pub fn is_identity(&self) -> bool {
        if !self.is_square() {
            return false;
        }
        let mut is_ident = true;
        for i in 0..self.rows {
            for j in 0..self.cols {
                let expected = if i == j { T::one() } else { T::zero() };
                is_ident &= self[(i, j)] == expected;
            }
        }
        is_ident
    }

    /// One row as a slice.
    pub fn row(&self, i: usize) -> &[T] {
        &self.values[i * self.cols..(i + 1) * self.cols]
    }
}

impl<T: Field> Matrix<T> {
    /// A hyper-invertible matrix: every square submatrix is invertible
    /// (over a large enough field).
    ///
    /// Row `i` holds the Lagrange basis of the nodes `1, ..., m` evaluated
    /// at `-i`.
    pub fn hyper_invertible(n: usize, m: usize) -> Self {
        let nodes = Vector::range(1, m + 1);
        let mut him = Self::new(n, m);
        for i in 0..n {
            let basis = lagrange_basis(nodes.as_slice(), T::from_int(-(i as i64)))
                .expect("canonical nodes are pairwise distinct");
            for j in 0..m {
                him[(i, j)] = basis[j];
            }
        }
        him
    }

    /// Reduces the matrix to reduced row echelon form, in place.
    pub fn row_reduce_in_place(&mut self) {
        let n = self.rows;
        let m = self.cols;
        let mut r = 0;
        let mut c = 0;
        let zero = T::zero();

        while r < n && c < m {
            // find a pivot in the current column.
            let mut pivot = r;
            while pivot < n && self[(pivot, c)] == zero {
                pivot += 1;
            }

            if pivot == n {
                // this column was all 0, so go to the next one.
                c += 1;
            } else {
                self.swap_rows(pivot, r);

                // make the leading coefficient of this row 1.
                let pv = self[(r, c)].invert().expect("pivot is nonzero");
                self.multiply_row(r, pv);

                // subtract a multiple of row r from every other row.
                for k in 0..n {
                    if k == r {
                        continue;
                    }
                    let t = self[(k, c)];
                    if t != zero {
                        self.add_rows(k, r, -t);
                    }
                }
                r += 1;
                c += 1;
            }
        }
    }

    /// The inverse, computed by row reduction of `[A | I]`.
    ///
    /// Fails with [`Error::Unsupported`] on non-square input. A singular
    /// matrix is not detected; the output is whatever the reduction
    /// leaves in the right half.
    pub fn invert(&self) -> Result<Self> {
        if !self.is_square() {
            return Err(Error::Unsupported("cannot invert non-square matrix"));
        }
        let n = self.cols;
        let mut aug = augment(self, &Self::identity(n));
        aug.row_reduce_in_place();

        let mut inv = Self::square(n);
        for i in 0..n {
            for j in 0..n {
                inv[(i, j)] = aug[(i, j + n)];
            }
        }
        Ok(inv)
    }

    fn swap_rows(&mut self, k: usize, h: usize) {
        if k != h {
            for j in 0..self.cols {
                self.values.swap(k * self.cols + j, h * self.cols + j);
            }
        }
    }

    fn multiply_row(&mut self, row: usize, m: T) {
        for j in 0..self.cols {
            self[(row, j)] *= m;
        }
    }

    /// `row dst += m * row op`.
    fn add_rows(&mut self, dst: usize, op: usize, m: T) {
        for j in 0..self.cols {
            let t = self[(op, j)] * m;
            self[(dst, j)] += t;
        }
    }
}

/// `[A | B]`.
fn augment<T: Ring>(a: &Matrix<T>, b: &Matrix<T>) -> Matrix<T> {
    let n = a.rows();
    let m = a.cols();
    let k = b.cols();
    let mut aug = Matrix::new(n, m + k);
    for i in 0..n {
        for j in 0..m {
            aug[(i, j)] = a[(i, j)];
        }
        for j in 0..k {
            aug[(i, m + j)] = b[(i, j)];
        }
    }
    aug
}

fn find_first_non_zero_row<T: Ring>(a: &Matrix<T>) -> usize {
    let zero = T::zero();
    let mut nzr = a.rows();
    while nzr > 0 {
        nzr -= 1;
        if a.row(nzr).iter().any(|&v| v != zero) {
            break;
        }
    }
    nzr
}

fn pivot_in_column<T: Ring>(a: &Matrix<T>, col: usize) -> Option<usize> {
    let zero = T::zero();
    for i in (0..a.rows()).rev() {
        if a[(i, col)] != zero {
            for k in 0..col.saturating_sub(1) {
                if a[(i, k)] != zero {
                    return None;
                }
            }
            return Some(i);
        }
    }
    None
}

fn extract_solution<T: Ring>(a: &Matrix<T>) -> Vector<T> {
    let n = a.rows();
    let m = a.cols();

    let mut x = Vector::zeros(m - 1);
    let mut i = find_first_non_zero_row(a);
    // rows below i correspond to variables that get fixed to 0.
    let mut c = (m as isize - 2) - (n as isize - i as isize - 1);
    while c >= 0 {
        let cu = c as usize;
        match pivot_in_column(a, cu) {
            None => {
                // a free variable just gets set to 1.
                x[cu] = T::one();
            }
            Some(p) => {
                let mut sum = T::zero();
                for j in p + 1..n {
                    sum += a[(i, j)] * x[j];
                }
                x[cu] = a[(i, m - 1)] - sum;
                i = i.wrapping_sub(1);
            }
        }
        c -= 1;
    }
    x
}

/// Whether a row-reduced augmented system has a (unique) solution.
fn has_solution<T: Ring>(a: &Matrix<T>, unique_only: bool) -> bool {
    let n = a.rows();
    let m = a.cols();
    let zero = T::zero();
    for i in 0..n {
        let all_zero = (0..m - 1).all(|j| a[(i, j)] == zero);
        if unique_only {
            if all_zero {
                return false;
            }
        } else if all_zero && a[(i, m - 1)] != zero {
            return false;
        }
    }
    true
}

/// Solves `A * x = b` by row reduction of the augmented system.
///
/// Returns `Ok(Some(x))` for a unique solution and `Ok(None)` when the
/// system is inconsistent or under-determined. Fails with
/// [`Error::InvalidInput`] when the dimensions do not line up.
pub fn solve_linear_system<T: Field>(a: &Matrix<T>, b: &Vector<T>) -> Result<Option<Vector<T>>> {
    if a.rows() != b.len() {
        return Err(Error::InvalidInput("malformed system of equations"));
    }
    // more unknowns than equations can never pin down a unique solution.
    if a.cols() > a.rows() {
        return Ok(None);
    }

    let mut aug = augment(a, &b.to_column_matrix());
    aug.row_reduce_in_place();
    if !has_solution(&aug, true) {
        return Ok(None);
    }
    Ok(Some(extract_solution(&aug)))
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;
    fn index(&self, (i, j): (usize, usize)) -> &T {
        &self.values[i * self.cols + j]
    }
}

impl<T> IndexMut<(usize, usize)> for Matrix<T> {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut T {
        &mut self.values[i * self.cols + j]
    }
}

impl<T: Display> Display for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows {
            write!(f, "[")?;
            for j in 0..self.cols {
                if j > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", self.values[i * self.cols + j])?;
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::Mersenne61;

    type F = Mersenne61;
    type M = Matrix<Mersenne61>;

    fn f(x: i64) -> F {
        F::from_int(x)
    }

    fn m2x2(a: i64, b: i64, c: i64, d: i64) -> M {
        M::from_vector(2, 2, [f(a), f(b), f(c), f(d)].into_iter().collect()).unwrap()
    }

    #[test]
    fn construction() {
        let a = M::new(2, 3);
        assert_eq!((a.rows(), a.cols()), (2, 3));
        assert!(a.row(0).iter().all(|&v| v == F::zero()));
        assert!(M::from_vector(2, 2, Vector::range(0, 3)).is_err());
        assert!(M::identity(3).is_identity());
        assert!(!M::new(2, 3).is_identity());
    }

    #[test]
    fn arithmetic() {
        let a = m2x2(1, 2, 3, 4);
        let b = m2x2(5, 6, 7, 8);
        assert_eq!(a.add(&b), m2x2(6, 8, 10, 12));
        assert_eq!(b.sub(&a), m2x2(4, 4, 4, 4));
        assert_eq!(a.mul_entrywise(&b), m2x2(5, 12, 21, 32));
        assert_eq!(a.scalar_multiply(f(2)), m2x2(2, 4, 6, 8));
        assert_eq!(a.multiply(&b).unwrap(), m2x2(19, 22, 43, 50));
        assert_eq!(a.transpose(), m2x2(1, 3, 2, 4));
    }

    #[test]
    fn multiply_vector() {
        let a = m2x2(1, 2, 3, 4);
        let v: Vector<F> = [f(5), f(6)].into_iter().collect();
        let out = a.multiply_vector(&v).unwrap();
        assert_eq!(out, [f(17), f(39)].into_iter().collect());
        assert!(a.multiply_vector(&Vector::range(0, 3)).is_err());
    }

    #[test]
    fn vandermonde() {
        let v = M::vandermonde(3, 3);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(v[(i, j)], f(((i + 1).pow(j as u32)) as i64));
            }
        }
    }

    #[test]
    fn inverse() {
        let a = m2x2(1, 2, 3, 4);
        let inv = a.invert().unwrap();
        assert!(a.multiply(&inv).unwrap().is_identity());

        let rect = M::new(2, 3);
        assert!(matches!(rect.invert(), Err(Error::Unsupported(_))));
    }

    #[test]
    fn hyper_invertible_submatrices() {
        let him = M::hyper_invertible(4, 4);
        // spot-check: the matrix itself and a few square submatrices invert
        // back to the identity.
        assert!(him.multiply(&him.invert().unwrap()).unwrap().is_identity());

        let mut sub = M::square(2);
        for (r, i) in [0usize, 2].iter().enumerate() {
            for (s, j) in [1usize, 3].iter().enumerate() {
                sub[(r, s)] = him[(*i, *j)];
            }
        }
        assert!(sub.multiply(&sub.invert().unwrap()).unwrap().is_identity());
    }

    #[test]
    fn solve() {
        // x + 2y = 5, 3x + 4y = 11 => x = 1, y = 2.
        let a = m2x2(1, 2, 3, 4);
        let b: Vector<F> = [f(5), f(11)].into_iter().collect();
        let x = solve_linear_system(&a, &b).unwrap().unwrap();
        assert_eq!(x, [f(1), f(2)].into_iter().collect());
        assert_eq!(a.multiply_vector(&x).unwrap(), b);

        // inconsistent: x + y = 1, x + y = 2.
        let a = m2x2(1, 1, 1, 1);
        let b: Vector<F> = [f(1), f(2)].into_iter().collect();
        assert!(solve_linear_system(&a, &b).unwrap().is_none());

        // malformed.
        let b: Vector<F> = [f(1)].into_iter().collect();
        assert!(solve_linear_system(&a, &b).is_err());

        // under-determined: more unknowns than equations.
        let wide = M::from_vector(1, 2, Vector::range(1, 3)).unwrap();
        let b: Vector<F> = [f(3)].into_iter().collect();
        assert!(solve_linear_system(&wide, &b).unwrap().is_none());
    }

    #[test]
    fn resize() {
        let mut a = M::new(2, 3);
        assert!(a.resize(3, 2).is_ok());
        assert_eq!((a.rows(), a.cols()), (3, 2));
        assert!(a.resize(4, 4).is_err());
    }
}
