use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Signed, Zero};

use crate::{Error, Result};

/// Computes `(a - b) mod modulus` without leaving the unsigned domain.
pub fn mod_sub(a: &BigUint, b: &BigUint, modulus: &BigUint) -> BigUint {
    let a = a % modulus;
    let b = b % modulus;
    if a >= b {
        a - b
    } else {
        modulus - (b - a)
    }
}

/// Computes the inverse of `a` modulo `modulus` with the extended Euclidean algorithm.
///
/// Fails if `a` and `modulus` are not coprime (including `a ≡ 0`).
pub fn mod_inverse(a: &BigUint, modulus: &BigUint) -> Result<BigUint> {
    if modulus.is_zero() {
        return Err(Error::InvalidParams("modulus cannot be zero".to_string()));
    }

    let m = BigInt::from_biguint(Sign::Plus, modulus.clone());
    let mut old_r = BigInt::from_biguint(Sign::Plus, a % modulus);
    let mut r = m.clone();
    let mut old_t = BigInt::one();
    let mut t = BigInt::zero();

    // invariant: old_t * a ≡ old_r (mod m)
    while !r.is_zero() {
        let quotient = &old_r / &r;
        let next_r = &old_r - &quotient * &r;
        old_r = std::mem::replace(&mut r, next_r);
        let next_t = &old_t - &quotient * &t;
        old_t = std::mem::replace(&mut t, next_t);
    }

    if !old_r.is_one() {
        return Err(Error::InvalidParams(format!(
            "{a} has no inverse modulo {modulus}"
        )));
    }

    let mut inverse = old_t % &m;
    if inverse.is_negative() {
        inverse += &m;
    }

    Ok(inverse
        .to_biguint()
        .unwrap_or_else(|| unreachable!("normalized inverse is non-negative")))
}

/// Computes `base^(-exp) mod modulus` as the inverse of `base^exp`.
pub fn mod_pow_neg(base: &BigUint, exp: &BigUint, modulus: &BigUint) -> Result<BigUint> {
    mod_inverse(&base.modpow(exp, modulus), modulus)
}
