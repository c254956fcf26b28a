use nom::bytes::complete::take;
use nom::IResult;

use super::{parse_opaque, serialize_opaque};
use crate::crypto::prf::VERIFY_DATA_LEN;

/// Per-session nonce, one from each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Random {
    pub bytes: [u8; Random::LEN],
}

impl Random {
    pub const LEN: usize = 28;

    pub fn new(bytes: [u8; Random::LEN]) -> Self {
        Random { bytes }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], Random> {
        let (input, data) = take(Random::LEN)(input)?;
        let mut bytes = [0u8; Random::LEN];
        bytes.copy_from_slice(data);
        Ok((input, Random { bytes }))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&self.bytes);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiatorHello {
    pub random: Random,
}

impl InitiatorHello {
    pub fn parse(input: &[u8]) -> IResult<&[u8], InitiatorHello> {
        let (input, random) = Random::parse(input)?;
        Ok((input, InitiatorHello { random }))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        self.random.serialize(output);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponderHello {
    pub random: Random,
}

impl ResponderHello {
    pub fn parse(input: &[u8]) -> IResult<&[u8], ResponderHello> {
        let (input, random) = Random::parse(input)?;
        Ok((input, ResponderHello { random }))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        self.random.serialize(output);
    }
}

/// Ephemeral DH public value, encoded to the width of the group prime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhPublic {
    pub value: Vec<u8>,
}

impl DhPublic {
    pub fn parse(input: &[u8]) -> IResult<&[u8], DhPublic> {
        let (input, value) = parse_opaque(input)?;
        Ok((input, DhPublic { value }))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        serialize_opaque(&self.value, output);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finished {
    pub verify_data: [u8; VERIFY_DATA_LEN],
}

impl Finished {
    pub fn parse(input: &[u8]) -> IResult<&[u8], Finished> {
        let (input, data) = take(VERIFY_DATA_LEN)(input)?;
        let mut verify_data = [0u8; VERIFY_DATA_LEN];
        verify_data.copy_from_slice(data);
        Ok((input, Finished { verify_data }))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&self.verify_data);
    }
}
