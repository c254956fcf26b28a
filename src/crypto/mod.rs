//! Cryptographic primitives and helpers used by the channel.

mod group;
mod key_exchange;
pub mod prf;
pub mod provider;
mod signing;

pub use group::{dh_group, encode_fixed, srp_group, Group};
pub use prf::{p_sha256, prf};
pub use provider::{default_provider, CryptoProvider, CryptoSafe, SecureRandom};
pub use signing::{compare_keys, KeyKind, PrivateKey, PublicKey};

pub(crate) use key_exchange::{check_public_value, DhKeyExchange};
pub(crate) use prf::{hmac, KeyBlock};
