//! Protocol gadgets shared by the Schnorr and Chaum-Pedersen proofs.
//!
//! This module contains the key pair, public statement, commitment,
//! non-interactive proof and the nonce ledger that enforces single use of
//! every commitment nonce.

use std::collections::HashSet;
use std::fmt;

use num_bigint::BigUint;
use num_traits::Zero;
use rand::{CryptoRng, RngCore};

use crate::{Error, GroupParameters, Result};

/// Private exponent `x` and public values `y_i = g_i^x mod p`.
///
/// The secret never leaves this type except through the crate-internal
/// response computation.
#[derive(Clone)]
pub struct KeyPair {
    x: BigUint,
    public_values: Vec<BigUint>,
}

impl KeyPair {
    /// Generates a key pair with `x` drawn from `[1, p - 2]`.
    ///
    /// Exponents divisible by `q` are redrawn: they map every generator to 1
    /// and would make the public values independent of the secret.
    pub fn generate<R: RngCore + CryptoRng>(params: &GroupParameters, rng: &mut R) -> Self {
        loop {
            let x = params.random_exponent(rng);
            if !(&x % params.q()).is_zero() {
                let public_values = params.exponentiate_all(&x);
                return Self { x, public_values };
            }
        }
    }

    /// Builds a key pair from an existing secret.
    ///
    /// # Errors
    ///
    /// Returns an error if `x` is outside `[1, p - 2]` or divisible by `q`.
    pub fn from_secret(params: &GroupParameters, x: BigUint) -> Result<Self> {
        if x.is_zero() || x > params.p() - 2u32 {
            return Err(Error::InvalidParams(
                "secret exponent must lie in [1, p - 2]".to_string(),
            ));
        }
        if (&x % params.q()).is_zero() {
            return Err(Error::InvalidParams(
                "secret exponent must not be a multiple of q".to_string(),
            ));
        }

        let public_values = params.exponentiate_all(&x);
        Ok(Self { x, public_values })
    }

    /// Returns `y_i` for every generator of the group.
    pub fn public_values(&self) -> &[BigUint] {
        &self.public_values
    }

    pub(crate) fn secret(&self) -> &BigUint {
        &self.x
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("x", &"<redacted>")
            .field("public_values", &self.public_values)
            .finish()
    }
}

/// Public statement `(y1, y2)` for the Chaum-Pedersen proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Statement {
    y1: BigUint,
    y2: BigUint,
}

impl Statement {
    /// Creates a statement from the two public values.
    pub fn new(y1: BigUint, y2: BigUint) -> Self {
        Self { y1, y2 }
    }

    /// Takes the first two public values of a key pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the key pair was built over fewer than two generators.
    pub fn from_key_pair(key_pair: &KeyPair) -> Result<Self> {
        match key_pair.public_values() {
            [y1, y2, ..] => Ok(Self::new(y1.clone(), y2.clone())),
            _ => Err(Error::InvalidParams(
                "Chaum-Pedersen needs public values for two generators".to_string(),
            )),
        }
    }

    /// Returns `y1 = g^x mod p`.
    pub fn y1(&self) -> &BigUint {
        &self.y1
    }

    /// Returns `y2 = h^x mod p`.
    pub fn y2(&self) -> &BigUint {
        &self.y2
    }

    /// Checks that both values are non-trivial members of the order-`q` subgroup.
    pub fn validate(&self, params: &GroupParameters) -> Result<()> {
        for (name, y) in [("y1", &self.y1), ("y2", &self.y2)] {
            if y.is_zero() || y >= params.p() {
                return Err(Error::InvalidParams(format!("{name} is outside [1, p)")));
            }
            if *y == BigUint::from(1u32) {
                return Err(Error::InvalidParams(format!("{name} is the identity")));
            }
            if y.modpow(params.q(), params.p()) != BigUint::from(1u32) {
                return Err(Error::InvalidParams(format!(
                    "{name} is not in the order-q subgroup"
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn to_vec(&self) -> Vec<BigUint> {
        vec![self.y1.clone(), self.y2.clone()]
    }
}

/// Commitment `(r1, r2) = (g^k, h^k) mod p`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commitment {
    r1: BigUint,
    r2: BigUint,
}

impl Commitment {
    /// Creates a commitment from its two values.
    pub fn new(r1: BigUint, r2: BigUint) -> Self {
        Self { r1, r2 }
    }

    /// Returns `r1`.
    pub fn r1(&self) -> &BigUint {
        &self.r1
    }

    /// Returns `r2`.
    pub fn r2(&self) -> &BigUint {
        &self.r2
    }

    pub(crate) fn to_vec(&self) -> Vec<BigUint> {
        vec![self.r1.clone(), self.r2.clone()]
    }
}

/// Single-message Chaum-Pedersen transcript `(r1, r2, c, s)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NonInteractiveProof {
    commitment: Commitment,
    challenge: BigUint,
    response: BigUint,
}

impl NonInteractiveProof {
    /// Assembles a proof from its parts.
    pub fn new(commitment: Commitment, challenge: BigUint, response: BigUint) -> Self {
        Self {
            commitment,
            challenge,
            response,
        }
    }

    /// Returns the commitment `(r1, r2)`.
    pub fn commitment(&self) -> &Commitment {
        &self.commitment
    }

    /// Returns the challenge `c`.
    pub fn challenge(&self) -> &BigUint {
        &self.challenge
    }

    /// Returns the response `s`.
    pub fn response(&self) -> &BigUint {
        &self.response
    }
}

/// Secret nonce used in the commitment phase.
#[derive(Clone)]
pub(crate) struct Nonce(pub(crate) BigUint);

impl Nonce {
    pub(crate) fn k(&self) -> &BigUint {
        &self.0
    }
}

/// Every nonce a prover has ever committed to.
///
/// Commitments and responses depend only on `k mod q`, so the ledger records
/// residues: `k` and `k + q` are the same nonce. Two responses under the same
/// residue and key reveal the key. Residue 0 is never used since it makes
/// every commitment 1.
#[derive(Debug, Default)]
pub(crate) struct NonceLedger {
    used: HashSet<BigUint>,
}

impl NonceLedger {
    /// Draws a nonce from `[1, p - 2]` whose residue mod `q` is fresh and
    /// non-zero, and records that residue.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] once all `q - 1` residues are used.
    pub(crate) fn draw<R: RngCore + CryptoRng>(
        &mut self,
        params: &GroupParameters,
        rng: &mut R,
    ) -> Result<Nonce> {
        let q = params.q();
        if BigUint::from(self.used.len()) >= q - 1u32 {
            return Err(Error::InvalidState(
                "every nonce for this group has been used".to_string(),
            ));
        }

        loop {
            let k = params.random_exponent(rng);
            let residue = &k % q;
            if !residue.is_zero() && self.used.insert(residue) {
                return Ok(Nonce(k));
            }
            tracing::trace!("nonce collision, redrawing");
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.used.len()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, k: &BigUint, q: &BigUint) -> bool {
        self.used.contains(&(k % q))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SecureRng;

    #[test]
    fn key_pair_matches_generators() {
        let params = GroupParameters::default_group();
        let mut rng = SecureRng::new();
        let key_pair = KeyPair::generate(&params, &mut rng);

        let expected = params.exponentiate_all(key_pair.secret());
        assert_eq!(key_pair.public_values(), expected.as_slice());
        assert_eq!(key_pair.public_values().len(), 2);
    }

    #[test]
    fn key_pair_from_secret_small_numbers() {
        let params = GroupParameters::debug_group();
        let key_pair = KeyPair::from_secret(&params, BigUint::from(6u32)).unwrap();

        assert_eq!(key_pair.public_values()[0], BigUint::from(2u32));
        assert_eq!(key_pair.public_values()[1], BigUint::from(3u32));
    }

    #[test]
    fn key_pair_rejects_degenerate_secrets() {
        let params = GroupParameters::debug_group();
        assert!(KeyPair::from_secret(&params, BigUint::zero()).is_err());
        assert!(KeyPair::from_secret(&params, BigUint::from(11u32)).is_err());
        assert!(KeyPair::from_secret(&params, BigUint::from(22u32)).is_err());
    }

    #[test]
    fn debug_output_hides_secret() {
        let params = GroupParameters::debug_group();
        let key_pair = KeyPair::from_secret(&params, BigUint::from(6u32)).unwrap();
        let rendered = format!("{key_pair:?}");
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn statement_validation() {
        let params = GroupParameters::debug_group();
        assert!(Statement::new(BigUint::from(2u32), BigUint::from(3u32))
            .validate(&params)
            .is_ok());
        assert!(Statement::new(BigUint::from(1u32), BigUint::from(3u32))
            .validate(&params)
            .is_err());
        // 5 has order 22 modulo 23
        assert!(Statement::new(BigUint::from(2u32), BigUint::from(5u32))
            .validate(&params)
            .is_err());
        assert!(Statement::new(BigUint::from(2u32), BigUint::from(23u32))
            .validate(&params)
            .is_err());
    }

    #[test]
    fn ledger_never_repeats_and_exhausts() {
        let params = GroupParameters::debug_group();
        let q = params.q().clone();
        let mut rng = SecureRng::new();
        let mut ledger = NonceLedger::default();
        let mut residues = HashSet::new();

        // q = 11 leaves exactly 10 non-zero residues
        for _ in 0..10 {
            let nonce = ledger.draw(&params, &mut rng).unwrap();
            let residue = nonce.k() % &q;
            assert!(!residue.is_zero());
            assert!(residues.insert(residue));
            assert!(ledger.contains(nonce.k(), &q));
        }

        assert_eq!(ledger.len(), 10);
        assert!(matches!(
            ledger.draw(&params, &mut rng),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn nonces_congruent_mod_q_count_as_reused() {
        let params = GroupParameters::debug_group();
        let q = params.q().clone();
        let mut rng = SecureRng::new();
        let mut ledger = NonceLedger::default();

        let nonce = ledger.draw(&params, &mut rng).unwrap();
        let shifted = (nonce.k() % &q) + &q;
        assert!(ledger.contains(&shifted, &q));
    }
}
