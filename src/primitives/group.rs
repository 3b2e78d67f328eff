//! Schnorr-group parameters.
//!
//! A group is a prime modulus `p`, a prime `q` dividing `p - 1`, and one or
//! more generators of the order-`q` subgroup of `(Z/pZ)*`.

use std::collections::HashSet;

use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};

use super::prime::{is_probably_prime, random_prime_with_bit_length, DEFAULT_PRIMALITY_ROUNDS};
use super::rng::random_exponent_below;
use super::SecureRng;
use crate::{Error, Result};

/// Smallest modulus size accepted by [`derive_group_with_generators`].
pub const MIN_GROUP_BITS: u64 = 4;

const DEFAULT_P: u64 = 33_599_304_334_943;
const DEFAULT_Q: u64 = 1_820_705_773;
const DEFAULT_G: u64 = 25_395_732_195_142;
const DEFAULT_H: u64 = 12_433_296_605_365;

/// Immutable group parameters `(p, q, [g_1..g_n])`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupParameters {
    p: BigUint,
    q: BigUint,
    generators: Vec<BigUint>,
}

impl GroupParameters {
    /// Creates group parameters after checking every invariant.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `p` or `q` fails primality testing
    /// - `q` does not divide `p - 1`
    /// - no generator is given
    /// - a generator is outside `(1, p)` or does not have order `q`
    pub fn new(p: BigUint, q: BigUint, generators: Vec<BigUint>) -> Result<Self> {
        let params = Self { p, q, generators };
        params.validate()?;
        Ok(params)
    }

    /// The fixed process-wide parameters used when provers opt out of
    /// generating their own group.
    ///
    /// Sharing them is a convenience for demos and interoperability; it shares
    /// group strength across provers, never secrets.
    pub fn default_group() -> Self {
        Self {
            p: BigUint::from(DEFAULT_P),
            q: BigUint::from(DEFAULT_Q),
            generators: vec![BigUint::from(DEFAULT_G), BigUint::from(DEFAULT_H)],
        }
    }

    /// Tiny parameters (`p = 23`, `q = 11`) for hand-checkable examples.
    pub fn debug_group() -> Self {
        Self {
            p: BigUint::from(23u32),
            q: BigUint::from(11u32),
            generators: vec![BigUint::from(4u32), BigUint::from(9u32)],
        }
    }

    /// Checks the group invariants.
    pub fn validate(&self) -> Result<()> {
        if !is_probably_prime(&self.p, DEFAULT_PRIMALITY_ROUNDS) {
            return Err(Error::InvalidParams(format!("p = {} is not prime", self.p)));
        }
        if !is_probably_prime(&self.q, DEFAULT_PRIMALITY_ROUNDS) {
            return Err(Error::InvalidParams(format!("q = {} is not prime", self.q)));
        }
        if !((&self.p - 1u32) % &self.q).is_zero() {
            return Err(Error::InvalidParams("q must divide p - 1".to_string()));
        }
        if self.generators.is_empty() {
            return Err(Error::InvalidParams(
                "at least one generator is required".to_string(),
            ));
        }

        for (i, g) in self.generators.iter().enumerate() {
            if g <= &BigUint::one() || g >= &self.p {
                return Err(Error::InvalidParams(format!(
                    "generator {i} is outside (1, p)"
                )));
            }
            if !g.modpow(&self.q, &self.p).is_one() {
                return Err(Error::InvalidParams(format!(
                    "generator {i} does not have order q"
                )));
            }
        }

        Ok(())
    }

    /// Returns the prime modulus `p`.
    pub fn p(&self) -> &BigUint {
        &self.p
    }

    /// Returns the subgroup order `q`.
    pub fn q(&self) -> &BigUint {
        &self.q
    }

    /// Returns all generators in order.
    pub fn generators(&self) -> &[BigUint] {
        &self.generators
    }

    /// Returns the first generator `g`.
    pub fn generator_g(&self) -> &BigUint {
        &self.generators[0]
    }

    /// Returns the second generator `h`, if the group has one.
    pub fn generator_h(&self) -> Option<&BigUint> {
        self.generators.get(1)
    }

    /// Computes `g_i^x mod p` for every generator.
    pub fn exponentiate_all(&self, x: &BigUint) -> Vec<BigUint> {
        self.generators
            .iter()
            .map(|g| g.modpow(x, &self.p))
            .collect()
    }

    /// Draws a uniform exponent from `[1, p - 2]`.
    pub fn random_exponent<R: RngCore + CryptoRng>(&self, rng: &mut R) -> BigUint {
        random_exponent_below(rng, &self.p)
    }
}

impl Default for GroupParameters {
    fn default() -> Self {
        Self::default_group()
    }
}

/// Derives a fresh Schnorr group whose modulus is roughly `bits` bits, with
/// `count` distinct generators of the order-`q` subgroup.
///
/// `q` is a random `(bits - 1)`-bit prime; `p = k·q + 1` for random
/// `k ∈ [1, 2^(bits/2)]` until `p` is prime; generators are `h^((p-1)/q) mod p`
/// for random `h ∈ [2, p - 1]`, discarding `1` and repeats.
pub fn derive_group_with_generators(bits: u64, count: usize) -> Result<GroupParameters> {
    if bits < MIN_GROUP_BITS {
        return Err(Error::InvalidParams(format!(
            "group size must be at least {MIN_GROUP_BITS} bits, got {bits}"
        )));
    }
    if count == 0 {
        return Err(Error::InvalidParams(
            "at least one generator is required".to_string(),
        ));
    }

    let mut rng = SecureRng::new();
    let one = BigUint::one();
    let k_bound = (BigUint::one() << (bits / 2)) + 1u32;

    // a small q may admit no prime k·q + 1 in range, so q is redrawn after a
    // bounded number of attempts
    let (p, q) = 'search: loop {
        let q = random_prime_with_bit_length(bits - 1)?;
        if BigUint::from(count) >= q {
            return Err(Error::InvalidParams(format!(
                "the order-{q} subgroup has fewer than {count} distinct generators"
            )));
        }

        for _ in 0..bits.saturating_mul(8) {
            let k = rng.gen_biguint_range(&one, &k_bound);
            let candidate = k * &q + 1u32;
            if is_probably_prime(&candidate, DEFAULT_PRIMALITY_ROUNDS) {
                break 'search (candidate, q);
            }
        }
    };

    let cofactor = (&p - 1u32) / &q;
    let two = BigUint::from(2u32);
    let mut seen = HashSet::with_capacity(count);
    let mut generators = Vec::with_capacity(count);

    while generators.len() < count {
        let h = rng.gen_biguint_range(&two, &p);
        let g = h.modpow(&cofactor, &p);
        if g.is_one() || !seen.insert(g.clone()) {
            continue;
        }
        generators.push(g);
    }

    tracing::debug!(%p, %q, generators = count, "derived Schnorr group");

    Ok(GroupParameters { p, q, generators })
}
