//! Probabilistic primality testing and prime sampling.
//!
//! Primality is decided with Miller-Rabin. A composite passes `rounds`
//! independent witnesses with probability at most `4^-rounds`; this residual
//! risk is accepted in exchange for speed and is not upgraded to a
//! deterministic certificate.

use num_bigint::{BigUint, RandBigInt};
use num_traits::One;

use super::SecureRng;
use crate::{Error, Result};

/// Number of Miller-Rabin rounds used when callers have no preference.
pub const DEFAULT_PRIMALITY_ROUNDS: usize = 10;

/// Miller-Rabin primality test with `rounds` random witnesses.
///
/// Returns `false` for `n ≤ 1` and every even `n > 2`, `true` for 2 and 3.
pub fn is_probably_prime(n: &BigUint, rounds: usize) -> bool {
    let one = BigUint::one();
    let two = BigUint::from(2u32);

    if *n <= one {
        return false;
    }
    if *n <= BigUint::from(3u32) {
        return true;
    }
    if !n.bit(0) {
        return false;
    }

    let n_minus_one = n - &one;
    let s = n_minus_one
        .trailing_zeros()
        .unwrap_or_else(|| unreachable!("n - 1 is non-zero"));
    let d = &n_minus_one >> s;

    let mut rng = SecureRng::new();
    'witness: for _ in 0..rounds {
        // a ∈ [2, n - 1]
        let a = rng.gen_biguint_range(&two, n);
        let mut x = a.modpow(&d, n);
        if x.is_one() || x == n_minus_one {
            continue;
        }

        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'witness;
            }
        }

        return false;
    }

    true
}

/// Samples a uniformly random odd integer of exactly `bits` bits until one
/// passes [`is_probably_prime`].
///
/// Loops until success, which happens with overwhelming probability.
pub fn random_prime_with_bit_length(bits: u64) -> Result<BigUint> {
    if bits < 2 {
        return Err(Error::InvalidParams(format!(
            "a prime needs at least 2 bits, got {bits}"
        )));
    }

    let mut rng = SecureRng::new();
    loop {
        let mut candidate = rng.gen_biguint(bits);
        candidate.set_bit(bits - 1, true);
        candidate.set_bit(0, true);

        if is_probably_prime(&candidate, DEFAULT_PRIMALITY_ROUNDS) {
            return Ok(candidate);
        }
    }
}

/// Euler's totient of a prime `p`, which is `p - 1`.
///
/// Fails if `p` does not pass primality testing.
pub fn euler_totient_of_prime(p: &BigUint) -> Result<BigUint> {
    if !is_probably_prime(p, DEFAULT_PRIMALITY_ROUNDS) {
        return Err(Error::InvalidParams(format!("{p} is not prime")));
    }
    Ok(p - 1u32)
}
