//! Randomness for keys, nonces, challenges and identifiers.
//!
//! Everything secret is drawn from the operating system. Exponents and
//! challenges share one sampling rule: uniform over `[1, p - 2]`.

use num_bigint::{BigUint, RandBigInt};
use num_traits::One;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

/// Operating-system backed generator used throughout the crate.
///
/// Any `RngCore + CryptoRng` works with the protocol APIs; this is the one
/// the server, binaries and tests reach for.
#[derive(Clone, Copy, Debug, Default)]
pub struct SecureRng(OsRng);

impl SecureRng {
    /// Creates a generator reading from the operating system.
    pub fn new() -> Self {
        Self(OsRng)
    }
}

impl RngCore for SecureRng {
    fn next_u32(&mut self) -> u32 {
        self.0.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.0.try_fill_bytes(dest)
    }
}

impl CryptoRng for SecureRng {}

/// Draws a uniform value from `[1, modulus - 2]`.
///
/// Used for secret keys, nonces and interactive challenges. `modulus` must be
/// at least 3.
pub fn random_exponent_below<R: RngCore + CryptoRng>(rng: &mut R, modulus: &BigUint) -> BigUint {
    rng.gen_biguint_range(&BigUint::one(), &(modulus - 1u32))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn exponents_stay_inside_unit_range() {
        let mut rng = SecureRng::new();
        let p = BigUint::from(23u32);

        let mut seen = HashSet::new();
        for _ in 0..2_000 {
            let x = random_exponent_below(&mut rng, &p);
            assert!(x >= BigUint::one());
            assert!(x <= BigUint::from(21u32));
            seen.insert(x);
        }
        // Neither 0 nor p - 1 ever appears, everything else does.
        assert_eq!(seen.len(), 21);
    }

    #[test]
    fn smallest_modulus_yields_one() {
        let mut rng = SecureRng::new();
        let p = BigUint::from(3u32);
        assert_eq!(random_exponent_below(&mut rng, &p), BigUint::one());
    }

    #[test]
    fn consecutive_words_differ() {
        let mut rng = SecureRng::new();
        assert_ne!(rng.next_u64(), rng.next_u64());
    }
}
