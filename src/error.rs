use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The peer is misbehaving or misconfigured. The channel is unusable.
    #[error("Handshake failed: {0}")]
    HandshakeFailed(String),

    /// The underlying stream closed mid-read.
    #[error("Disconnected")]
    Disconnected,

    /// Missing crypto capability, unusable key material or an empty trust store.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Bad frame: {0}")]
    BadFrame(String),

    #[error("Failed to decode: {0}")]
    Decode(String),

    #[error("Crypto error: {0}")]
    CryptoError(String),

    #[error("Too many consecutive corrupted records ({0})")]
    TooManyCorruptedRecords(usize),

    #[error("Channel is not established")]
    NotEstablished,

    #[error("Handshake has already been run on this channel")]
    HandshakeAlreadyRun,

    /// A previous handshake failed, the channel can not be used again.
    #[error("Channel is unusable after a failed handshake")]
    Unusable,
}

impl Error {
    pub(crate) fn handshake(reason: impl Into<String>) -> Self {
        Error::HandshakeFailed(reason.into())
    }

    /// Whether this error means the peer went away rather than misbehaved.
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Error::Disconnected)
    }
}
