//! Fiat-Shamir transcript for non-interactive proofs.
//!
//! Provides domain-separated challenge derivation over SHA-256. Every absorbed
//! value is framed by its label and a length prefix, so distinct sequences of
//! integers can never hash to the same input.

use num_bigint::BigUint;
use sha2::{Digest, Sha256};

/// Protocol label for transcript initialization.
const PROTOCOL_LABEL: &[u8] = b"zkp-auth v1";

/// Transcript wrapper for Fiat-Shamir transformation.
#[derive(Clone)]
pub struct Transcript(Sha256);

impl Transcript {
    /// Creates a new transcript bound to a protocol name.
    pub fn new(protocol: &[u8]) -> Self {
        let mut transcript = Self(Sha256::new());
        transcript.append_message(b"label", PROTOCOL_LABEL);
        transcript.append_message(b"protocol", protocol);
        transcript
    }

    /// Transcript for the two-generator Chaum-Pedersen proof.
    pub fn chaum_pedersen() -> Self {
        Self::new(b"chaum-pedersen")
    }

    /// Transcript for the single-generator Schnorr proof.
    pub fn schnorr() -> Self {
        Self::new(b"schnorr")
    }

    /// Absorbs a labelled byte string.
    pub fn append_message(&mut self, label: &[u8], message: &[u8]) {
        self.0.update((label.len() as u64).to_be_bytes());
        self.0.update(label);
        self.0.update((message.len() as u64).to_be_bytes());
        self.0.update(message);
    }

    /// Absorbs a labelled integer in its big-endian encoding.
    pub fn append_integer(&mut self, label: &[u8], value: &BigUint) {
        self.append_message(label, &value.to_bytes_be());
    }

    /// Absorbs the commitment values.
    pub fn append_commitment(&mut self, commitments: &[BigUint]) {
        for r in commitments {
            self.append_integer(b"r", r);
        }
    }

    /// Absorbs the public values.
    pub fn append_statement(&mut self, public_values: &[BigUint]) {
        for y in public_values {
            self.append_integer(b"y", y);
        }
    }

    /// Finalizes the transcript into a challenge reduced modulo `modulus`.
    pub fn challenge_mod(self, modulus: &BigUint) -> BigUint {
        let digest = self.0.finalize();
        BigUint::from_bytes_be(&digest) % modulus
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[u64]) -> Vec<BigUint> {
        values.iter().copied().map(BigUint::from).collect()
    }

    #[test]
    fn challenge_is_deterministic() {
        let p = BigUint::from(1_000_003u64);

        let mut t1 = Transcript::chaum_pedersen();
        t1.append_commitment(&ints(&[5, 7]));
        t1.append_statement(&ints(&[11, 13]));

        let mut t2 = Transcript::chaum_pedersen();
        t2.append_commitment(&ints(&[5, 7]));
        t2.append_statement(&ints(&[11, 13]));

        assert_eq!(t1.challenge_mod(&p), t2.challenge_mod(&p));
    }

    #[test]
    fn framing_separates_concatenations() {
        let p = BigUint::from(u64::MAX);

        // 0x01 0x0203 vs 0x0102 0x03 share a naive concatenation
        let mut t1 = Transcript::chaum_pedersen();
        t1.append_commitment(&ints(&[0x01, 0x0203]));

        let mut t2 = Transcript::chaum_pedersen();
        t2.append_commitment(&ints(&[0x0102, 0x03]));

        assert_ne!(t1.challenge_mod(&p), t2.challenge_mod(&p));
    }

    #[test]
    fn protocols_are_domain_separated() {
        let p = BigUint::from(u64::MAX);

        let mut t1 = Transcript::chaum_pedersen();
        t1.append_commitment(&ints(&[42]));

        let mut t2 = Transcript::schnorr();
        t2.append_commitment(&ints(&[42]));

        assert_ne!(t1.challenge_mod(&p), t2.challenge_mod(&p));
    }

    #[test]
    fn challenge_is_reduced() {
        let p = BigUint::from(23u32);
        let mut t = Transcript::schnorr();
        t.append_statement(&ints(&[3]));
        assert!(t.challenge_mod(&p) < p);
    }
}
