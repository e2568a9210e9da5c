//! Secret sharing schemes: additive, Shamir, Feldman and Pedersen.

mod additive;
mod feldman;
mod pedersen;
mod shamir;

pub use additive::{additive_share, additive_reconstruct};
pub use feldman::{FeldmanScheme, FeldmanSharing};
pub use pedersen::{
    pedersen_commitment_for_index, pedersen_share, pedersen_share_with_randomness,
    pedersen_verify, pedersen_apply, PedersenPair, PedersenShare, PedersenSharing,
};
pub use shamir::{
    canonical_alphas, shamir_share, shamir_share_polynomial, ShamirScheme, SecurityLevel,
};
