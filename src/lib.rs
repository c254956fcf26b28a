//! secchan
//!
//! A secure channel over a blocking byte stream. Two peers run one handshake
//! to agree on keys and authenticate each other, then exchange [`Value`]s
//! protected with AES-256-CBC and HMAC-SHA256.
//!
//! The handshake supports five modes:
//!
//! - `none`: plaintext, nothing is authenticated
//! - `anonymous-dh`: ephemeral Diffie-Hellman, no peer authentication
//! - `pubkey`: Diffie-Hellman values signed with static keys
//! - `ssh`: host key selection followed by a pubkey exchange
//! - `password`: SRP with a shared password
//!
//! ```no_run
//! use std::os::unix::net::UnixListener;
//! use secchan::{Channel, HandshakeParams, Role};
//!
//! let listener = UnixListener::bind("/run/agent.sock")?;
//! let (stream, _) = listener.accept()?;
//!
//! let mut channel = Channel::new(stream, Role::Responder);
//! channel.handshake(&HandshakeParams::anonymous_dh())?;
//!
//! while let Ok(msg) = channel.recv_msg() {
//!     if !channel.send_msg(&msg) {
//!         break;
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Crypto capability is injected through [`Config`] and validated when the
//! config is built. Key material lives in zeroize-on-drop containers and is
//! wiped when the channel goes away.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

#[macro_use]
extern crate log;

mod channel;
pub use channel::{Channel, Role, Transport};

mod config;
pub use config::{Config, ConfigBuilder};

pub mod crypto;
pub use crypto::{compare_keys, CryptoProvider, KeyKind, PrivateKey, PublicKey, SecureRandom};

mod error;
pub use error::Error;

mod framer;
mod handshake;

mod identity;
pub use identity::{load_authorized_keys, load_host_keys, load_known_hosts};
pub use identity::{parse_authorized_keys, parse_known_hosts, TrustStore, SYSTEM_HOST_KEYS};

mod message;

mod params;
pub use params::{AuthMode, HandshakeParams, PasswordParams, DEFAULT_USERNAME};

mod record;

mod value;
pub use value::Value;
