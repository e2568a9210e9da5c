//! Additive secret sharing.

use crate::algebra::{Ring, Vector};
use crate::util::Prg;
use crate::{Error, Result};

/// Splits `secret` into `n` shares summing to it: all but the first are
/// uniformly random, the first absorbs the difference.
pub fn additive_share<T: Ring>(secret: T, n: usize, prg: &mut Prg) -> Result<Vector<T>> {
    if n == 0 {
        return Err(Error::InvalidInput("cannot create shares for 0 people"));
    }
    let mut shares = Vector::partial_random(n, |i| i > 0, prg);
    shares[0] = secret - shares.sum();
    Ok(shares)
}

/// Recovers an additively shared secret: the sum of the shares.
pub fn additive_reconstruct<T: Ring>(shares: &Vector<T>) -> T {
    shares.sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::Mersenne61;

    type F = Mersenne61;

    #[test]
    fn share_and_reconstruct() {
        let mut prg = Prg::from_seed(b"additive");
        let secret = F::from_int(123456);
        let shares = additive_share(secret, 10, &mut prg).unwrap();
        assert_eq!(shares.len(), 10);
        assert_eq!(additive_reconstruct(&shares), secret);

        // the shares are not all the secret itself.
        assert!(shares.iter().any(|&s| s != secret));
    }

    #[test]
    fn single_share_is_the_secret() {
        let mut prg = Prg::from_seed(b"additive1");
        let secret = F::from_int(7);
        let shares = additive_share(secret, 1, &mut prg).unwrap();
        assert_eq!(shares[0], secret);
    }

    #[test]
    fn zero_parties_fails() {
        let mut prg = Prg::from_seed(b"additive0");
        assert!(additive_share(F::from_int(1), 0, &mut prg).is_err());
    }

    #[test]
    fn shares_are_homomorphic() {
        let mut prg = Prg::from_seed(b"additive-hom");
        let a = additive_share(F::from_int(10), 3, &mut prg).unwrap();
        let b = additive_share(F::from_int(32), 3, &mut prg).unwrap();
        assert_eq!(additive_reconstruct(&(&a + &b)), F::from_int(42));
    }
}
