use nom::IResult;

use super::{parse_opaque, parse_string, serialize_opaque};

/// `{identity, own public key, ephemeral DH public, signature over the DH public}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubkeyInitiatorHello {
    pub identity: String,
    pub public_key: Vec<u8>,
    pub dh_public: Vec<u8>,
    pub signature: Vec<u8>,
}

impl PubkeyInitiatorHello {
    pub fn parse(input: &[u8]) -> IResult<&[u8], PubkeyInitiatorHello> {
        let (input, identity) = parse_string(input)?;
        let (input, public_key) = parse_opaque(input)?;
        let (input, dh_public) = parse_opaque(input)?;
        let (input, signature) = parse_opaque(input)?;
        Ok((
            input,
            PubkeyInitiatorHello {
                identity,
                public_key,
                dh_public,
                signature,
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        serialize_opaque(self.identity.as_bytes(), output);
        serialize_opaque(&self.public_key, output);
        serialize_opaque(&self.dh_public, output);
        serialize_opaque(&self.signature, output);
    }
}

/// `{own public key, ephemeral DH public, signature over the DH public}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubkeyResponderHello {
    pub public_key: Vec<u8>,
    pub dh_public: Vec<u8>,
    pub signature: Vec<u8>,
}

impl PubkeyResponderHello {
    pub fn parse(input: &[u8]) -> IResult<&[u8], PubkeyResponderHello> {
        let (input, public_key) = parse_opaque(input)?;
        let (input, dh_public) = parse_opaque(input)?;
        let (input, signature) = parse_opaque(input)?;
        Ok((
            input,
            PubkeyResponderHello {
                public_key,
                dh_public,
                signature,
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        serialize_opaque(&self.public_key, output);
        serialize_opaque(&self.dh_public, output);
        serialize_opaque(&self.signature, output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initiator_hello_layout() {
        let hello = PubkeyInitiatorHello {
            identity: "ctl".to_string(),
            public_key: vec![1],
            dh_public: vec![2, 2],
            signature: vec![],
        };

        let mut serialized = Vec::new();
        hello.serialize(&mut serialized);
        assert_eq!(
            serialized,
            [
                0, 0, 0, 3, b'c', b't', b'l', // identity
                0, 0, 0, 1, 1, // public key
                0, 0, 0, 2, 2, 2, // dh public
                0, 0, 0, 0, // signature
            ]
        );

        let (rest, parsed) = PubkeyInitiatorHello::parse(&serialized).unwrap();
        assert!(rest.is_empty());
        assert_eq!(parsed, hello);
    }
}
