//! Shared helpers for channel integration tests.
//!
//! This file has no `#[test]` functions; Cargo compiles it as a no-op binary.
//! Import it from other test files via `mod channel_common;`.

#![allow(unused)]

use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::thread;

use secchan::{Channel, Config, Error, HandshakeParams, PrivateKey, PublicKey, Role};

/// Load a private key fixture from `tests/keys`.
pub fn private_key(name: &str) -> PrivateKey {
    PrivateKey::load(format!("{}/tests/keys/{}.pem", env!("CARGO_MANIFEST_DIR"), name))
        .expect("load private key")
}

/// Load a public key fixture from `tests/keys`.
pub fn public_key(name: &str) -> PublicKey {
    PublicKey::load(format!(
        "{}/tests/keys/{}.pub.pem",
        env!("CARGO_MANIFEST_DIR"),
        name
    ))
    .expect("load public key")
}

/// One end after its handshake returned.
pub struct Side {
    pub channel: Channel<UnixStream>,
    pub result: Result<(), Error>,
}

fn run(stream: UnixStream, role: Role, params: HandshakeParams, config: Arc<Config>) -> Side {
    let mut channel = Channel::with_config(stream, role, config);
    let result = channel.handshake(&params);

    // Unblock the peer if we gave up.
    if result.is_err() {
        let _ = channel.shutdown(Shutdown::Both);
    }

    Side { channel, result }
}

/// Handshake two channels over a socket pair, the responder on its own thread.
pub fn handshake(initiator: HandshakeParams, responder: HandshakeParams) -> (Side, Side) {
    handshake_with_config(initiator, responder, Arc::new(Config::default()))
}

pub fn handshake_with_config(
    initiator: HandshakeParams,
    responder: HandshakeParams,
    config: Arc<Config>,
) -> (Side, Side) {
    let _ = env_logger::try_init();

    let (a, b) = UnixStream::pair().expect("socket pair");

    let responder_config = Arc::clone(&config);
    let handle = thread::spawn(move || run(b, Role::Responder, responder, responder_config));

    let init = run(a, Role::Initiator, initiator, config);
    let resp = handle.join().expect("responder thread");

    (init, resp)
}

/// Handshake that must succeed on both ends.
pub fn established(
    initiator: HandshakeParams,
    responder: HandshakeParams,
) -> (Channel<UnixStream>, Channel<UnixStream>) {
    let (init, resp) = handshake(initiator, responder);
    init.result.expect("initiator handshake");
    resp.result.expect("responder handshake");
    (init.channel, resp.channel)
}
