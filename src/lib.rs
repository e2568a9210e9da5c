//! roundtable is a toolkit for writing and simulating secure multiparty
//! computation (MPC) protocols.
//!
//! The library does four things:
//!
//! - provide the algebra MPC protocols are written against: prime fields
//!   ([`algebra::Mersenne61`], [`algebra::Mersenne127`], the secp256k1 base
//!   and scalar fields), the ring of integers modulo a power of two
//!   ([`algebra::Z2k`]), an elliptic curve group ([`algebra::EcPoint`]) and
//!   generic vectors, matrices and polynomials over any of them;
//! - provide secret sharing on top of that algebra: additive, Shamir (with
//!   error detection and Berlekamp–Welch error correction), Feldman and
//!   Pedersen;
//! - provide an execution model: protocols are `async` objects chained
//!   through [`protocol::ProtocolResult`], scheduled by a deliberately
//!   single-threaded cooperative [`runtime::Runtime`] and talking through
//!   packet-oriented [`net::Channel`]s;
//! - measure protocols without a network: [`sim::simulate`] co-executes all
//!   parties in one thread, gives every party a virtual clock, models
//!   delivery times from per-channel TCP characteristics and hands back an
//!   event trace per party.
//!
//! A protocol is a type implementing [`protocol::Protocol`]:
//!
//! ```ignore
//! struct Greet;
//!
//! impl protocol::Protocol for Greet {
//!     fn run(self: Box<Self>, env: protocol::Env) -> protocol::ProtocolFuture {
//!         Box::pin(async move {
//!             let mut packet = wire::Packet::new();
//!             packet.write(&42u32);
//!             env.network.party(1).send(packet).await?;
//!             Ok(protocol::ProtocolResult::stop())
//!         })
//!     }
//! }
//! ```
//!
//! Simulating it needs a [`sim::Manager`] that says who runs what and under
//! which network conditions, and collects the traces.

#![forbid(unsafe_code)]

#[cfg(target_endian = "big")]
compile_error!(
    r#"
This crate doesn't support big-endian targets.
"#
);

/// Finite fields, elliptic curve and linear algebra.
pub mod algebra;
/// Crate-wide error type.
mod errors;
/// Channels and in-memory networks.
pub mod net;
/// Protocol abstraction and evaluation.
pub mod protocol;
/// Cooperative single-threaded coroutine runtime.
pub mod runtime;
/// Secret sharing schemes.
pub mod sharing;
/// Deterministic network simulator.
pub mod sim;
/// Bitmaps, pseudorandomness, Merkle trees, signatures.
pub mod util;
/// Byte-level serialization and packets.
pub mod wire;

pub use errors::{Error, Result};
