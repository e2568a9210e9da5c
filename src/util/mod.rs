//! Supporting machinery: bitmaps, pseudorandomness, Merkle trees and
//! signatures.

mod bitmap;
mod ecdsa;
mod merkle;
mod prg;

pub use bitmap::Bitmap;
pub use ecdsa::{Ecdsa, Signature};
pub use merkle::{MerkleProof, MerkleTree};
pub use prg::Prg;
