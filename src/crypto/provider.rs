//! Injected cryptographic capability.
//!
//! Instead of discovering crypto support lazily, every [`Channel`](crate::Channel)
//! is handed a [`CryptoProvider`] through its [`Config`](crate::Config). The
//! provider is validated once when the config is built, so a missing or broken
//! capability surfaces as [`Error::Config`](crate::Error::Config) before any
//! network I/O happens.
//!
//! The provider holds static references to its components:
//!
//! - **Secure Random** ([`SecureRandom`]): nonces, IVs, salts and ephemeral exponents
//! - **DH group** ([`Group`]): used by the anonymous, pubkey and ssh exchanges
//! - **SRP group** ([`Group`]): used by the password exchange

use std::fmt::Debug;
use std::panic::{RefUnwindSafe, UnwindSafe};

use num_bigint::BigUint;
use rand::rngs::OsRng;
use rand::RngCore;

use super::group::{dh_group, srp_group, Group};
use crate::Error;

/// Marker trait for types that are safe to use as provider components.
pub trait CryptoSafe: Send + Sync + Debug + UnwindSafe + RefUnwindSafe {}

impl<T: Send + Sync + Debug + UnwindSafe + RefUnwindSafe> CryptoSafe for T {}

/// Cryptographically secure random number generator.
pub trait SecureRandom: CryptoSafe {
    /// Fill `buf` with random bytes.
    fn fill(&self, buf: &mut [u8]) -> Result<(), String>;
}

/// The set of crypto capabilities a channel uses.
#[derive(Debug, Clone)]
pub struct CryptoProvider {
    pub secure_random: &'static dyn SecureRandom,
    pub dh_group: &'static Group,
    pub srp_group: &'static Group,
}

impl CryptoProvider {
    /// Check that every component is usable.
    pub fn validate(&self) -> Result<(), Error> {
        self.dh_group
            .validate()
            .map_err(|e| Error::Config(format!("DH group: {}", e)))?;
        self.srp_group
            .validate()
            .map_err(|e| Error::Config(format!("SRP group: {}", e)))?;

        let mut probe = [0u8; 16];
        self.secure_random
            .fill(&mut probe)
            .map_err(|e| Error::Config(format!("Secure random unavailable: {}", e)))?;

        Ok(())
    }

    pub(crate) fn random_bytes<const N: usize>(&self) -> Result<[u8; N], Error> {
        let mut out = [0u8; N];
        self.secure_random
            .fill(&mut out)
            .map_err(Error::CryptoError)?;
        Ok(out)
    }

    pub(crate) fn random_vec(&self, len: usize) -> Result<Vec<u8>, Error> {
        let mut out = vec![0u8; len];
        self.secure_random
            .fill(&mut out)
            .map_err(Error::CryptoError)?;
        Ok(out)
    }

    /// Ephemeral exponent in `[0, q)`.
    ///
    /// One extra byte over the width of `q` keeps the modulo bias negligible.
    pub(crate) fn random_exponent(&self, group: &Group) -> Result<BigUint, Error> {
        let bytes = self.random_vec(group.q_size() + 1)?;
        Ok(BigUint::from_bytes_be(&bytes) % group.q())
    }
}

/// Random source backed by the operating system.
#[derive(Debug)]
struct OsSecureRandom;

impl SecureRandom for OsSecureRandom {
    fn fill(&self, buf: &mut [u8]) -> Result<(), String> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| format!("OS random failed: {}", e))
    }
}

static SECURE_RANDOM: OsSecureRandom = OsSecureRandom;

/// The default provider: OS randomness and the built-in groups.
pub fn default_provider() -> CryptoProvider {
    CryptoProvider {
        secure_random: &SECURE_RANDOM,
        dh_group: dh_group(),
        srp_group: srp_group(),
    }
}
