use nom::multi::count;
use nom::number::complete::{be_u16, be_u32};
use nom::IResult;

use super::{parse_opaque, serialize_opaque};

/// Initiator's public key, SubjectPublicKeyInfo DER.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshInitiatorHello {
    pub public_key: Vec<u8>,
}

impl SshInitiatorHello {
    pub fn parse(input: &[u8]) -> IResult<&[u8], SshInitiatorHello> {
        let (input, public_key) = parse_opaque(input)?;
        Ok((input, SshInitiatorHello { public_key }))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        serialize_opaque(&self.public_key, output);
    }
}

/// All of the responder's host public keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshResponderHello {
    pub host_keys: Vec<Vec<u8>>,
}

impl SshResponderHello {
    pub fn parse(input: &[u8]) -> IResult<&[u8], SshResponderHello> {
        let (input, n) = be_u16(input)?;
        let (input, host_keys) = count(parse_opaque, n as usize)(input)?;
        Ok((input, SshResponderHello { host_keys }))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&(self.host_keys.len() as u16).to_be_bytes());
        for key in &self.host_keys {
            serialize_opaque(key, output);
        }
    }
}

/// The host key the initiator trusts, with the initiator's signature over
/// the ASCII decimal index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshKeySelect {
    pub index: u32,
    pub signature: Vec<u8>,
}

impl SshKeySelect {
    pub fn parse(input: &[u8]) -> IResult<&[u8], SshKeySelect> {
        let (input, index) = be_u32(input)?;
        let (input, signature) = parse_opaque(input)?;
        Ok((input, SshKeySelect { index, signature }))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&self.index.to_be_bytes());
        serialize_opaque(&self.signature, output);
    }

    /// The bytes the signature covers.
    pub fn signed_data(index: u32) -> Vec<u8> {
        index.to_string().into_bytes()
    }
}
