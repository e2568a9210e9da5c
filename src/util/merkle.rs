//! Merkle trees over any hash function exposing the digest interface.

use std::marker::PhantomData;

use digest::{Digest, Output};

use super::Bitmap;

/// A proof that a leaf sits at a particular position under a Merkle root.
///
/// `path` holds the sibling digest for every level from the leaves up;
/// `direction` says, per level, whether that sibling is the left input of
/// the parent hash.
pub struct MerkleProof<D: Digest> {
    /// Sibling digests, leaf level first.
    pub path: Vec<Output<D>>,
    /// Bit `i` is set when `path[i]` goes on the left at level `i`.
    pub direction: Bitmap,
}

// hand-written because deriving would put the bounds on the hash type
// itself rather than on its output.
impl<D: Digest> Clone for MerkleProof<D> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            direction: self.direction.clone(),
        }
    }
}

impl<D: Digest> PartialEq for MerkleProof<D> {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.direction == other.direction
    }
}

impl<D: Digest> Eq for MerkleProof<D> {}

impl<D: Digest> std::fmt::Debug for MerkleProof<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MerkleProof")
            .field("path", &self.path)
            .field("direction", &self.direction)
            .finish()
    }
}

/// A Merkle tree with leaves hashed by `D`.
///
/// An odd node at any level is paired with a copy of itself, so the tree
/// works for any number of leaves.
pub struct MerkleTree<D, L> {
    _hash: PhantomData<D>,
    _leaf: PhantomData<L>,
}

impl<D: Digest, L: AsRef<[u8]>> MerkleTree<D, L> {
    /// The root of the tree over `data`.
    pub fn hash(data: &[L]) -> Output<D> {
        let mut digests = Self::hash_leafs(data);
        let mut sz = digests.len();

        while sz > 1 {
            let mut j = 0;
            for i in (0..sz).step_by(2) {
                digests[j] = Self::hash_pair(&digests[i], &digests[i + 1]);
                j += 1;
            }

            sz /= 2;
            if sz > 1 && sz % 2 == 1 {
                digests[j] = digests[j - 1].clone();
                sz += 1;
            }
        }

        digests[0].clone()
    }

    /// A proof for the leaf at `index`.
    pub fn prove(data: &[L], mut index: usize) -> MerkleProof<D> {
        let mut digests = Self::hash_leafs(data);
        let mut path = Vec::new();
        let mut direction = Vec::new();

        let mut sz = digests.len();
        while sz > 1 {
            let mut j = 0;
            for i in (0..sz).step_by(2) {
                let left = digests[i].clone();
                let right = digests[i + 1].clone();
                digests[j] = Self::hash_pair(&left, &right);

                if i == index {
                    path.push(right);
                    direction.push(false);
                    index = j;
                } else if i + 1 == index {
                    path.push(left);
                    direction.push(true);
                    index = j;
                }

                j += 1;
            }

            sz /= 2;
            if sz > 1 && sz % 2 == 1 {
                digests[j] = digests[j - 1].clone();
                sz += 1;
            }
        }

        MerkleProof {
            path,
            direction: Bitmap::from_bools(&direction),
        }
    }

    /// Checks `proof` against `root` for the given leaf value.
    pub fn verify(leaf: &L, root: &Output<D>, proof: &MerkleProof<D>) -> bool {
        let mut digest = D::digest(leaf.as_ref());
        for (i, sibling) in proof.path.iter().enumerate() {
            digest = if proof.direction.at(i) {
                Self::hash_pair(sibling, &digest)
            } else {
                Self::hash_pair(&digest, sibling)
            };
        }
        &digest == root
    }

    fn hash_leafs(data: &[L]) -> Vec<Output<D>> {
        let mut digests: Vec<Output<D>> = data.iter().map(|d| D::digest(d.as_ref())).collect();
        // duplicate the last hash in case there's an odd number of leafs.
        if digests.len() % 2 == 1 {
            digests.push(digests[digests.len() - 1].clone());
        }
        digests
    }

    fn hash_pair(left: &Output<D>, right: &Output<D>) -> Output<D> {
        let mut hash = D::new();
        hash.update(left);
        hash.update(right);
        hash.finalize()
    }
}
