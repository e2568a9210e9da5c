//! Lagrange interpolation bases.

use super::{Field, Vector};
use crate::Result;

/// The Lagrange basis of `nodes` evaluated at `x`:
/// `l_i(x) = prod_{j != i} (x - x_j) / (x_i - x_j)`.
///
/// The interpolation of points `(x_i, y_i)` at `x` is then the inner
/// product of the returned basis with the `y_i`. The nodes must be
/// pairwise distinct; a repeated node makes one of the divisions fail
/// with [`crate::Error::InvalidInput`].
pub fn lagrange_basis<T: Field>(nodes: &[T], x: T) -> Result<Vector<T>> {
    let n = nodes.len();
    let mut basis = Vec::with_capacity(n);
    for i in 0..n {
        let mut ell = T::one();
        let xi = nodes[i];
        for (j, &xj) in nodes.iter().enumerate() {
            if i != j {
                ell *= (x - xj) * (xi - xj).invert()?;
            }
        }
        basis.push(ell);
    }
    Ok(Vector::from(basis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::{inner_product, Mersenne61, Ring};

    type F = Mersenne61;

    #[test]
    fn interpolates_polynomial_values() {
        // y = x^2 + 1 on nodes 1..4; interpolate at 5 and at 0.
        let nodes: Vec<F> = (1..5).map(F::from_int).collect();
        let ys: Vec<F> = (1..5).map(|x| F::from_int(x * x + 1)).collect();

        let at5 = lagrange_basis(&nodes, F::from_int(5)).unwrap();
        assert_eq!(inner_product(at5.as_slice(), &ys), F::from_int(26));

        let at0 = lagrange_basis(&nodes, F::zero()).unwrap();
        assert_eq!(inner_product(at0.as_slice(), &ys), F::from_int(1));
    }

    #[test]
    fn basis_is_indicator_on_nodes() {
        let nodes: Vec<F> = (1..4).map(F::from_int).collect();
        let b = lagrange_basis(&nodes, F::from_int(2)).unwrap();
        assert_eq!(b[0], F::zero());
        assert_eq!(b[1], F::one());
        assert_eq!(b[2], F::zero());
    }

    #[test]
    fn repeated_nodes_fail() {
        let nodes = [F::from_int(1), F::from_int(1)];
        assert!(lagrange_basis(&nodes, F::zero()).is_err());
    }
}
