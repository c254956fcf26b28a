//! SRP arithmetic for the password exchange.
//!
//! ```text
//! k  = H(P || G)
//! x  = H(salt || username || password)
//! v  = G^x
//! A  = G^a
//! B  = G^b + k*v
//! u  = H(A || B)
//! S  = (B - k*G^x)^(a + u*x)    initiator
//! S  = (A * v^u)^b              responder
//! M1 = H(A || B || S)
//! M2 = H(A || M1 || S)
//! K  = H(S)
//! ```
//!
//! All arithmetic is mod P and all group elements are hashed at the fixed
//! width of P.

use num_bigint::BigUint;
use sha2::{Digest, Sha256};

use crate::crypto::Group;

fn sha256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

pub(crate) fn multiplier(group: &Group) -> BigUint {
    let p = group.encode(group.p());
    let g = group.g_bytes();
    BigUint::from_bytes_be(&sha256(&[&p[..], &g[..]]))
}

pub(crate) fn private_x(salt: &[u8], username: &str, password: &str) -> BigUint {
    BigUint::from_bytes_be(&sha256(&[salt, username.as_bytes(), password.as_bytes()]))
}

pub(crate) fn verifier(group: &Group, x: &BigUint) -> BigUint {
    group.g().modpow(x, group.p())
}

pub(crate) fn responder_public(group: &Group, b: &BigUint, k: &BigUint, v: &BigUint) -> BigUint {
    (group.g().modpow(b, group.p()) + k * v) % group.p()
}

pub(crate) fn scrambler(a_bytes: &[u8], b_bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(&sha256(&[a_bytes, b_bytes]))
}

pub(crate) fn initiator_secret(
    group: &Group,
    big_b: &BigUint,
    k: &BigUint,
    x: &BigUint,
    a: &BigUint,
    u: &BigUint,
) -> BigUint {
    let p = group.p();
    let kgx = (k * group.g().modpow(x, p)) % p;
    let base = ((big_b % p) + p - kgx) % p;
    let exponent = a + u * x;
    base.modpow(&exponent, p)
}

pub(crate) fn responder_secret(
    group: &Group,
    big_a: &BigUint,
    v: &BigUint,
    u: &BigUint,
    b: &BigUint,
) -> BigUint {
    let p = group.p();
    let base = (big_a * v.modpow(u, p)) % p;
    base.modpow(b, p)
}

pub(crate) fn proof1(a_bytes: &[u8], b_bytes: &[u8], s_bytes: &[u8]) -> [u8; 32] {
    sha256(&[a_bytes, b_bytes, s_bytes])
}

pub(crate) fn proof2(a_bytes: &[u8], m1: &[u8], s_bytes: &[u8]) -> [u8; 32] {
    sha256(&[a_bytes, m1, s_bytes])
}

pub(crate) fn session_key(s_bytes: &[u8]) -> [u8; 32] {
    sha256(&[s_bytes])
}

/// A peer value that is 0 mod P forces a known secret.
pub(crate) fn is_degenerate(group: &Group, value: &BigUint) -> bool {
    (value % group.p()).bits() == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{default_provider, srp_group};

    #[test]
    fn both_sides_derive_same_secret() {
        let provider = default_provider();
        let group = srp_group();
        let k = multiplier(group);

        let salt = [3u8; 16];
        let x = private_x(&salt, "lnst_user", "hunter2");
        let v = verifier(group, &x);

        let a = provider.random_exponent(group).unwrap();
        let b = provider.random_exponent(group).unwrap();
        let big_a = group.g().modpow(&a, group.p());
        let big_b = responder_public(group, &b, &k, &v);

        let (a_bytes, b_bytes) = (group.encode(&big_a), group.encode(&big_b));
        let u = scrambler(&a_bytes, &b_bytes);

        let s_init = initiator_secret(group, &big_b, &k, &x, &a, &u);
        let s_resp = responder_secret(group, &big_a, &v, &u, &b);
        assert_eq!(s_init, s_resp);

        let s_bytes = group.encode(&s_init);
        let m1 = proof1(&a_bytes, &b_bytes, &s_bytes);
        assert_ne!(proof2(&a_bytes, &m1, &s_bytes), m1);
    }

    #[test]
    fn wrong_password_diverges() {
        let provider = default_provider();
        let group = srp_group();
        let k = multiplier(group);

        let salt = [3u8; 16];
        let v = verifier(group, &private_x(&salt, "lnst_user", "right"));
        let x_wrong = private_x(&salt, "lnst_user", "wrong");

        let a = provider.random_exponent(group).unwrap();
        let b = provider.random_exponent(group).unwrap();
        let big_a = group.g().modpow(&a, group.p());
        let big_b = responder_public(group, &b, &k, &v);
        let u = scrambler(&group.encode(&big_a), &group.encode(&big_b));

        let s_init = initiator_secret(group, &big_b, &k, &x_wrong, &a, &u);
        let s_resp = responder_secret(group, &big_a, &v, &u, &b);
        assert_ne!(s_init, s_resp);
    }

    #[test]
    fn multiplier_hashes_generator_as_one_byte() {
        let group = srp_group();
        let mut data = group.encode(group.p());
        data.push(2);
        let expected = BigUint::from_bytes_be(&Sha256::digest(&data));
        assert_eq!(multiplier(group), expected);
    }

    #[test]
    fn degenerate_values() {
        let group = srp_group();
        assert!(is_degenerate(group, &BigUint::from(0u32)));
        assert!(is_degenerate(group, group.p()));
        assert!(is_degenerate(group, &(group.p() * 2u32)));
        assert!(!is_degenerate(group, &BigUint::from(1u32)));
    }
}
