//! Single-generator Schnorr proof of discrete-log knowledge.
//!
//! The response uses `s = (k + x·e) mod q`, the opposite sign of the
//! Chaum-Pedersen response, and the verifier equation is
//! `r ≡ g^s · y^(-e) (mod p)` to match. The two conventions are not
//! interchangeable.

use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};

use super::gadgets::NonceLedger;
use super::KeyPair;
use crate::primitives::field::mod_pow_neg;
use crate::{derive_group_with_generators, GroupParameters, Result, Transcript};

/// Derives the Schnorr challenge `H(r ∥ y) mod p`.
pub fn schnorr_challenge(params: &GroupParameters, r: &BigUint, y: &BigUint) -> BigUint {
    let mut transcript = Transcript::schnorr();
    transcript.append_commitment(std::slice::from_ref(r));
    transcript.append_statement(std::slice::from_ref(y));
    transcript.challenge_mod(params.p())
}

/// Schnorr proof `(y, r, e, s)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchnorrProof {
    /// Public key `y = g^x mod p`.
    pub y: BigUint,
    /// Commitment `r = g^k mod p`.
    pub r: BigUint,
    /// Challenge `e = H(r ∥ y) mod p`.
    pub e: BigUint,
    /// Response `s = (k + x·e) mod q`.
    pub s: BigUint,
}

/// Schnorr prover over the first generator of a group.
pub struct SchnorrProver {
    params: GroupParameters,
    key_pair: KeyPair,
    nonces: NonceLedger,
}

impl SchnorrProver {
    /// Creates a prover with a fresh key pair.
    pub fn new<R: RngCore + CryptoRng>(params: GroupParameters, rng: &mut R) -> Self {
        let key_pair = KeyPair::generate(&params, rng);
        Self {
            params,
            key_pair,
            nonces: NonceLedger::default(),
        }
    }

    /// Creates a prover over a freshly derived single-generator group.
    pub fn generate<R: RngCore + CryptoRng>(bits: u64, rng: &mut R) -> Result<Self> {
        let params = derive_group_with_generators(bits, 1)?;
        Ok(Self::new(params, rng))
    }

    /// Returns the group parameters.
    pub fn params(&self) -> &GroupParameters {
        &self.params
    }

    /// Returns the public key `y = g^x mod p`.
    pub fn public_key(&self) -> &BigUint {
        &self.key_pair.public_values()[0]
    }

    /// Replaces the key pair with a fresh one and returns the new public key.
    ///
    /// Nonces used under the previous key stay recorded.
    pub fn generate_key_pair<R: RngCore + CryptoRng>(&mut self, rng: &mut R) -> &BigUint {
        self.key_pair = KeyPair::generate(&self.params, rng);
        self.public_key()
    }

    /// Produces a proof under a fresh nonce.
    pub fn prove<R: RngCore + CryptoRng>(&mut self, rng: &mut R) -> Result<SchnorrProof> {
        let nonce = self.nonces.draw(&self.params, rng)?;
        let p = self.params.p();
        let q = self.params.q();

        let r = self.params.generator_g().modpow(nonce.k(), p);
        let y = self.public_key().clone();
        let e = schnorr_challenge(&self.params, &r, &y);
        let s = (nonce.k() + (self.key_pair.secret() * &e) % q) % q;

        Ok(SchnorrProof { y, r, e, s })
    }
}

/// Stateless Schnorr verifier holding only `(p, q, g)`.
pub struct SchnorrVerifier {
    params: GroupParameters,
}

impl SchnorrVerifier {
    /// Creates a verifier for the given group.
    pub fn new(params: GroupParameters) -> Self {
        Self { params }
    }

    /// Accepts iff `e` is the challenge bound to `(r, y)` and
    /// `r ≡ g^s · (y^e)^(-1) (mod p)`.
    pub fn verify(&self, proof: &SchnorrProof) -> bool {
        if schnorr_challenge(&self.params, &proof.r, &proof.y) != proof.e {
            tracing::debug!("schnorr challenge does not match commitment");
            return false;
        }

        let p = self.params.p();
        let Ok(y_neg_e) = mod_pow_neg(&proof.y, &proof.e, p) else {
            return false;
        };

        let r_prime = (self.params.generator_g().modpow(&proof.s, p) * y_neg_e) % p;
        r_prime == proof.r
    }
}
