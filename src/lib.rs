//! Zero-knowledge password-less authentication over Schnorr groups.
//!
//! A user proves knowledge of a secret `x` behind public values
//! `y1 = g^x mod p` and `y2 = h^x mod p` with the Chaum-Pedersen protocol,
//! either interactively (commit, challenge, respond) or in a single message
//! via the Fiat-Shamir transform. A single-generator Schnorr proof is
//! provided alongside.
//!
//! [`AuthServer`] keeps users, pending challenges and sessions for many
//! concurrent clients. With the `grpc` feature the server is exposed over
//! tonic.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Error types.
pub mod error;
/// Number-theory primitives: primes, groups, randomness, transcripts.
pub mod primitives;
/// Chaum-Pedersen and Schnorr provers and verifiers.
pub mod protocol;
/// Multi-user authentication server.
pub mod server;

/// Generated gRPC types.
#[cfg(feature = "grpc")]
#[allow(missing_docs)]
pub mod proto {
    tonic::include_proto!("zkp_auth");
}

pub use error::{Error, ErrorKind};
pub use primitives::{
    derive_group_with_generators, euler_totient_of_prime, is_probably_prime,
    random_exponent_below, random_prime_with_bit_length, GroupParameters, SecureRng, Transcript,
};
pub use protocol::{
    fiat_shamir_challenge, ChaumPedersenProver, ChaumPedersenVerifier, Commitment, KeyPair,
    NonInteractiveProof, ProtocolState, SchnorrProof, SchnorrProver, SchnorrVerifier, Statement,
};
pub use server::{AuthServer, IdentifierAllocator, ServerConfig, Session};

/// Result type for zkp-auth operations.
pub type Result<T> = std::result::Result<T, Error>;
