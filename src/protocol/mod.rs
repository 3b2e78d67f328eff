/// Key pairs, statements, commitments and proofs.
pub mod gadgets;
/// Chaum-Pedersen prover.
pub mod prover;
/// Single-generator Schnorr proof.
pub mod schnorr;
/// Chaum-Pedersen verifier.
pub mod verifier;

pub use gadgets::{Commitment, KeyPair, NonInteractiveProof, Statement};
pub use prover::ChaumPedersenProver;
pub use schnorr::{SchnorrProof, SchnorrProver, SchnorrVerifier};
pub use verifier::{fiat_shamir_challenge, ChaumPedersenVerifier};

/// Position of a prover or verifier in the interactive exchange.
///
/// A prover moves `Uncommitted → Committed → Uncommitted`; a verifier moves
/// `Uncommitted → Challenged → Uncommitted`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProtocolState {
    /// No commitment is outstanding.
    Uncommitted,
    /// The prover holds a nonce awaiting a challenge.
    Committed,
    /// The verifier holds a commitment and the challenge it issued.
    Challenged,
}
