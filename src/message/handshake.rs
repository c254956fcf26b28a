use nom::number::complete::be_u8;
use nom::IResult;

use super::*;
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    InitiatorHello,
    ResponderHello,
    DhPublic,
    Finished,
    SshInitiatorHello,
    SshResponderHello,
    SshKeySelect,
    PubkeyInitiatorHello,
    PubkeyResponderHello,
    SrpBegin,
    SrpSalt,
    SrpInitiatorPublic,
    SrpResponderPublic,
    SrpProof1,
    SrpProof2,
    Unknown(u8),
}

impl Default for MessageType {
    fn default() -> Self {
        Self::Unknown(0)
    }
}

impl MessageType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => MessageType::InitiatorHello,
            2 => MessageType::ResponderHello,
            3 => MessageType::DhPublic,
            20 => MessageType::Finished,
            30 => MessageType::SshInitiatorHello,
            31 => MessageType::SshResponderHello,
            32 => MessageType::SshKeySelect,
            40 => MessageType::PubkeyInitiatorHello,
            41 => MessageType::PubkeyResponderHello,
            50 => MessageType::SrpBegin,
            51 => MessageType::SrpSalt,
            52 => MessageType::SrpInitiatorPublic,
            53 => MessageType::SrpResponderPublic,
            54 => MessageType::SrpProof1,
            55 => MessageType::SrpProof2,
            _ => MessageType::Unknown(value),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            MessageType::InitiatorHello => 1,
            MessageType::ResponderHello => 2,
            MessageType::DhPublic => 3,
            MessageType::Finished => 20,
            MessageType::SshInitiatorHello => 30,
            MessageType::SshResponderHello => 31,
            MessageType::SshKeySelect => 32,
            MessageType::PubkeyInitiatorHello => 40,
            MessageType::PubkeyResponderHello => 41,
            MessageType::SrpBegin => 50,
            MessageType::SrpSalt => 51,
            MessageType::SrpInitiatorPublic => 52,
            MessageType::SrpResponderPublic => 53,
            MessageType::SrpProof1 => 54,
            MessageType::SrpProof2 => 55,
            MessageType::Unknown(value) => *value,
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], MessageType> {
        let (input, byte) = be_u8(input)?;
        Ok((input, Self::from_u8(byte)))
    }
}

/// One handshake message: a type byte followed by the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handshake {
    InitiatorHello(InitiatorHello),
    ResponderHello(ResponderHello),
    DhPublic(DhPublic),
    Finished(Finished),
    SshInitiatorHello(SshInitiatorHello),
    SshResponderHello(SshResponderHello),
    SshKeySelect(SshKeySelect),
    PubkeyInitiatorHello(PubkeyInitiatorHello),
    PubkeyResponderHello(PubkeyResponderHello),
    SrpBegin(SrpBegin),
    SrpSalt(SrpSalt),
    SrpInitiatorPublic(SrpInitiatorPublic),
    SrpResponderPublic(SrpResponderPublic),
    SrpProof1(SrpProof1),
    SrpProof2(SrpProof2),
    Unknown(u8),
}

impl Handshake {
    pub fn message_type(&self) -> MessageType {
        match self {
            Handshake::InitiatorHello(_) => MessageType::InitiatorHello,
            Handshake::ResponderHello(_) => MessageType::ResponderHello,
            Handshake::DhPublic(_) => MessageType::DhPublic,
            Handshake::Finished(_) => MessageType::Finished,
            Handshake::SshInitiatorHello(_) => MessageType::SshInitiatorHello,
            Handshake::SshResponderHello(_) => MessageType::SshResponderHello,
            Handshake::SshKeySelect(_) => MessageType::SshKeySelect,
            Handshake::PubkeyInitiatorHello(_) => MessageType::PubkeyInitiatorHello,
            Handshake::PubkeyResponderHello(_) => MessageType::PubkeyResponderHello,
            Handshake::SrpBegin(_) => MessageType::SrpBegin,
            Handshake::SrpSalt(_) => MessageType::SrpSalt,
            Handshake::SrpInitiatorPublic(_) => MessageType::SrpInitiatorPublic,
            Handshake::SrpResponderPublic(_) => MessageType::SrpResponderPublic,
            Handshake::SrpProof1(_) => MessageType::SrpProof1,
            Handshake::SrpProof2(_) => MessageType::SrpProof2,
            Handshake::Unknown(v) => MessageType::Unknown(*v),
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], Handshake> {
        let (input, m) = MessageType::parse(input)?;

        match m {
            MessageType::InitiatorHello => {
                let (input, msg) = InitiatorHello::parse(input)?;
                Ok((input, Handshake::InitiatorHello(msg)))
            }
            MessageType::ResponderHello => {
                let (input, msg) = ResponderHello::parse(input)?;
                Ok((input, Handshake::ResponderHello(msg)))
            }
            MessageType::DhPublic => {
                let (input, msg) = DhPublic::parse(input)?;
                Ok((input, Handshake::DhPublic(msg)))
            }
            MessageType::Finished => {
                let (input, msg) = Finished::parse(input)?;
                Ok((input, Handshake::Finished(msg)))
            }
            MessageType::SshInitiatorHello => {
                let (input, msg) = SshInitiatorHello::parse(input)?;
                Ok((input, Handshake::SshInitiatorHello(msg)))
            }
            MessageType::SshResponderHello => {
                let (input, msg) = SshResponderHello::parse(input)?;
                Ok((input, Handshake::SshResponderHello(msg)))
            }
            MessageType::SshKeySelect => {
                let (input, msg) = SshKeySelect::parse(input)?;
                Ok((input, Handshake::SshKeySelect(msg)))
            }
            MessageType::PubkeyInitiatorHello => {
                let (input, msg) = PubkeyInitiatorHello::parse(input)?;
                Ok((input, Handshake::PubkeyInitiatorHello(msg)))
            }
            MessageType::PubkeyResponderHello => {
                let (input, msg) = PubkeyResponderHello::parse(input)?;
                Ok((input, Handshake::PubkeyResponderHello(msg)))
            }
            MessageType::SrpBegin => {
                let (input, msg) = SrpBegin::parse(input)?;
                Ok((input, Handshake::SrpBegin(msg)))
            }
            MessageType::SrpSalt => {
                let (input, msg) = SrpSalt::parse(input)?;
                Ok((input, Handshake::SrpSalt(msg)))
            }
            MessageType::SrpInitiatorPublic => {
                let (input, msg) = SrpInitiatorPublic::parse(input)?;
                Ok((input, Handshake::SrpInitiatorPublic(msg)))
            }
            MessageType::SrpResponderPublic => {
                let (input, msg) = SrpResponderPublic::parse(input)?;
                Ok((input, Handshake::SrpResponderPublic(msg)))
            }
            MessageType::SrpProof1 => {
                let (input, msg) = SrpProof1::parse(input)?;
                Ok((input, Handshake::SrpProof1(msg)))
            }
            MessageType::SrpProof2 => {
                let (input, msg) = SrpProof2::parse(input)?;
                Ok((input, Handshake::SrpProof2(msg)))
            }
            MessageType::Unknown(v) => Ok((input, Handshake::Unknown(v))),
        }
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.push(self.message_type().as_u8());

        match self {
            Handshake::InitiatorHello(msg) => msg.serialize(output),
            Handshake::ResponderHello(msg) => msg.serialize(output),
            Handshake::DhPublic(msg) => msg.serialize(output),
            Handshake::Finished(msg) => msg.serialize(output),
            Handshake::SshInitiatorHello(msg) => msg.serialize(output),
            Handshake::SshResponderHello(msg) => msg.serialize(output),
            Handshake::SshKeySelect(msg) => msg.serialize(output),
            Handshake::PubkeyInitiatorHello(msg) => msg.serialize(output),
            Handshake::PubkeyResponderHello(msg) => msg.serialize(output),
            Handshake::SrpBegin(msg) => msg.serialize(output),
            Handshake::SrpSalt(msg) => msg.serialize(output),
            Handshake::SrpInitiatorPublic(msg) => msg.serialize(output),
            Handshake::SrpResponderPublic(msg) => msg.serialize(output),
            Handshake::SrpProof1(msg) => msg.serialize(output),
            Handshake::SrpProof2(msg) => msg.serialize(output),
            Handshake::Unknown(_) => {}
        }
    }

    /// Decode a whole handshake record body.
    pub fn decode(input: &[u8]) -> Result<Handshake, Error> {
        let (rest, msg) = Handshake::parse(input)
            .map_err(|e| Error::Decode(format!("Malformed handshake message: {:?}", e)))?;

        if !rest.is_empty() {
            return Err(Error::Decode(format!(
                "{} trailing bytes after {:?}",
                rest.len(),
                msg.message_type()
            )));
        }

        Ok(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_type_values() {
        for v in 0..=255u8 {
            let m = MessageType::from_u8(v);
            assert_eq!(m.as_u8(), v);
        }
    }

    #[test]
    fn dispatch_roundtrip() {
        let messages = [
            Handshake::InitiatorHello(InitiatorHello {
                random: Random::new([1; 28]),
            }),
            Handshake::DhPublic(DhPublic {
                value: vec![5; 256],
            }),
            Handshake::SshKeySelect(SshKeySelect {
                index: 3,
                signature: vec![1, 2, 3],
            }),
            Handshake::PubkeyResponderHello(PubkeyResponderHello {
                public_key: vec![1],
                dh_public: vec![2],
                signature: vec![3],
            }),
            Handshake::SrpProof2(SrpProof2 { m2: vec![8; 32] }),
        ];

        for msg in messages {
            let mut out = Vec::new();
            msg.serialize(&mut out);
            assert_eq!(out[0], msg.message_type().as_u8());
            assert_eq!(Handshake::decode(&out).unwrap(), msg);
        }
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut out = Vec::new();
        Handshake::SrpSalt(SrpSalt { salt: vec![1] }).serialize(&mut out);
        out.push(0);
        assert!(matches!(Handshake::decode(&out), Err(Error::Decode(_))));
    }

    #[test]
    fn unknown_type_parses() {
        assert_eq!(Handshake::decode(&[99]).unwrap(), Handshake::Unknown(99));
    }
}
