//! Wire types carried inside records.
//!
//! Every record plaintext starts with a [`ContentType`] byte. Handshake records
//! carry one [`Handshake`] message, application data records carry one
//! encoded [`Value`](crate::Value), and change cipher spec records carry the
//! single byte `1`.

mod handshake;
mod hello;
mod pubkey;
mod srp;
mod ssh;

pub use handshake::{Handshake, MessageType};
pub use hello::{DhPublic, Finished, InitiatorHello, Random, ResponderHello};
pub use pubkey::{PubkeyInitiatorHello, PubkeyResponderHello};
pub use srp::{SrpBegin, SrpInitiatorPublic, SrpProof1, SrpProof2, SrpResponderPublic, SrpSalt};
pub use ssh::{SshInitiatorHello, SshKeySelect, SshResponderHello};

use nom::bytes::complete::take;
use nom::error::{Error as NomError, ErrorKind};
use nom::number::complete::{be_u32, be_u8};
use nom::IResult;

/// Body of a change cipher spec record.
pub const CHANGE_CIPHER_SPEC: &[u8] = &[1];

/// Record content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    ChangeCipherSpec,
    Handshake,
    ApplicationData,
    Unknown(u8),
}

impl Default for ContentType {
    fn default() -> Self {
        Self::Unknown(0)
    }
}

impl ContentType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            20 => ContentType::ChangeCipherSpec,
            22 => ContentType::Handshake,
            23 => ContentType::ApplicationData,
            _ => ContentType::Unknown(value),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            ContentType::ChangeCipherSpec => 20,
            ContentType::Handshake => 22,
            ContentType::ApplicationData => 23,
            ContentType::Unknown(value) => *value,
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], ContentType> {
        let (input, byte) = be_u8(input)?;
        Ok((input, Self::from_u8(byte)))
    }
}

/// `u32` length prefixed bytes.
pub(crate) fn parse_opaque(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
    let (input, len) = be_u32(input)?;
    let (input, data) = take(len)(input)?;
    Ok((input, data.to_vec()))
}

pub(crate) fn serialize_opaque(data: &[u8], output: &mut Vec<u8>) {
    output.extend_from_slice(&(data.len() as u32).to_be_bytes());
    output.extend_from_slice(data);
}

/// `u32` length prefixed UTF-8.
pub(crate) fn parse_string(input: &[u8]) -> IResult<&[u8], String> {
    let (rest, data) = parse_opaque(input)?;
    let s = String::from_utf8(data)
        .map_err(|_| nom::Err::Failure(NomError::new(input, ErrorKind::Verify)))?;
    Ok((rest, s))
}
