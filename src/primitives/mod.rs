//! Number-theory building blocks for the authentication protocols.
//!
//! - **rng**: operating-system backed randomness
//! - **field**: modular helpers (subtraction, inverse)
//! - **prime**: Miller-Rabin testing and prime sampling
//! - **group**: Schnorr-group parameters and generator discovery
//! - **transcript**: Fiat-Shamir challenge derivation

/// Modular arithmetic helpers.
pub mod field;
/// Schnorr-group parameters.
pub mod group;
/// Primality testing and prime sampling.
pub mod prime;
/// Cryptographically secure random number generation.
pub mod rng;
/// Transcript for Fiat-Shamir transform.
pub mod transcript;

pub use group::{derive_group_with_generators, GroupParameters};
pub use prime::{
    euler_totient_of_prime, is_probably_prime, random_prime_with_bit_length,
    DEFAULT_PRIMALITY_ROUNDS,
};
pub use rng::{random_exponent_below, SecureRng};
pub use transcript::Transcript;
