use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};

use super::gadgets::{Nonce, NonceLedger};
use super::verifier::fiat_shamir_challenge;
use super::{Commitment, KeyPair, NonInteractiveProof, ProtocolState, Statement};
use crate::primitives::field::mod_sub;
use crate::{derive_group_with_generators, Error, GroupParameters, Result};

/// Prover for the Chaum-Pedersen zero-knowledge protocol.
///
/// Generates proofs that `y1 = g^x` and `y2 = h^x` share the same `x` without
/// revealing `x`.
///
/// # Security
///
/// - Every commitment uses a nonce that this prover has never used before
/// - The nonce of an interactive commitment is dropped once answered
/// - The secret exponent is never logged or serialized
pub struct ChaumPedersenProver {
    params: GroupParameters,
    key_pair: KeyPair,
    statement: Statement,
    nonces: NonceLedger,
    pending: Option<Nonce>,
}

impl ChaumPedersenProver {
    /// Creates a prover with a freshly generated key pair.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use zkp_auth::{ChaumPedersenProver, GroupParameters, SecureRng};
    ///
    /// let mut rng = SecureRng::new();
    /// let prover = ChaumPedersenProver::new(GroupParameters::default_group(), &mut rng).unwrap();
    /// assert_ne!(prover.statement().y1(), prover.statement().y2());
    /// ```
    pub fn new<R: RngCore + CryptoRng>(params: GroupParameters, rng: &mut R) -> Result<Self> {
        let key_pair = KeyPair::generate(&params, rng);
        Self::with_key_pair(params, key_pair)
    }

    /// Creates a prover over a freshly derived group of roughly `bits` bits.
    pub fn generate<R: RngCore + CryptoRng>(bits: u64, rng: &mut R) -> Result<Self> {
        let params = derive_group_with_generators(bits, 2)?;
        Self::new(params, rng)
    }

    /// Creates a prover from an existing key pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the group or key pair covers fewer than two generators.
    pub fn with_key_pair(params: GroupParameters, key_pair: KeyPair) -> Result<Self> {
        if params.generator_h().is_none() {
            return Err(Error::InvalidParams(
                "Chaum-Pedersen needs two generators".to_string(),
            ));
        }
        let statement = Statement::from_key_pair(&key_pair)?;

        Ok(Self {
            params,
            key_pair,
            statement,
            nonces: NonceLedger::default(),
            pending: None,
        })
    }

    /// Returns the group parameters.
    pub fn params(&self) -> &GroupParameters {
        &self.params
    }

    /// Returns the public statement `(y1, y2)`.
    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    /// Returns where the interactive exchange currently stands.
    pub fn state(&self) -> ProtocolState {
        if self.pending.is_some() {
            ProtocolState::Committed
        } else {
            ProtocolState::Uncommitted
        }
    }

    /// Number of nonces consumed over this prover's lifetime.
    pub fn nonces_used(&self) -> usize {
        self.nonces.len()
    }

    /// Interactive protocol: generates the commitment (first message).
    ///
    /// An unanswered earlier commitment is abandoned; its nonce stays burned.
    pub fn commit<R: RngCore + CryptoRng>(&mut self, rng: &mut R) -> Result<Commitment> {
        let nonce = self.nonces.draw(&self.params, rng)?;
        let commitment = self.commitment_for(&nonce);
        if self.pending.replace(nonce).is_some() {
            tracing::debug!("abandoning unanswered commitment");
        }
        Ok(commitment)
    }

    /// Interactive protocol: answers challenge `c` with `s = (k - x·c) mod q`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if there is no outstanding commitment.
    pub fn respond(&mut self, c: &BigUint) -> Result<BigUint> {
        let nonce = self.pending.take().ok_or_else(|| {
            Error::InvalidState("respond called before commit".to_string())
        })?;
        Ok(self.response_for(&nonce, c))
    }

    /// Generates a single-message proof with the Fiat-Shamir challenge
    /// `H(r1 ∥ r2 ∥ y1 ∥ y2) mod p`.
    ///
    /// Leaves any outstanding interactive commitment untouched.
    pub fn prove_non_interactive<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
    ) -> Result<NonInteractiveProof> {
        let nonce = self.nonces.draw(&self.params, rng)?;
        let commitment = self.commitment_for(&nonce);
        let challenge = fiat_shamir_challenge(&self.params, &commitment, &self.statement);
        let response = self.response_for(&nonce, &challenge);

        Ok(NonInteractiveProof::new(commitment, challenge, response))
    }

    fn commitment_for(&self, nonce: &Nonce) -> Commitment {
        let mut values = self.params.exponentiate_all(nonce.k()).into_iter();
        match (values.next(), values.next()) {
            (Some(r1), Some(r2)) => Commitment::new(r1, r2),
            _ => unreachable!("constructor checked for two generators"),
        }
    }

    fn response_for(&self, nonce: &Nonce, c: &BigUint) -> BigUint {
        let q = self.params.q();
        let xc = (self.key_pair.secret() * c) % q;
        mod_sub(nonce.k(), &xc, q)
    }
}
