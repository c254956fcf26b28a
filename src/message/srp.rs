use nom::IResult;

use super::{parse_opaque, parse_string, serialize_opaque};

/// Opens the password exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrpBegin {
    pub username: String,
}

impl SrpBegin {
    pub fn parse(input: &[u8]) -> IResult<&[u8], SrpBegin> {
        let (input, username) = parse_string(input)?;
        Ok((input, SrpBegin { username }))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        serialize_opaque(self.username.as_bytes(), output);
    }
}

macro_rules! opaque_message {
    ($(#[$meta:meta])* $name:ident, $field:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            pub $field: Vec<u8>,
        }

        impl $name {
            pub fn parse(input: &[u8]) -> IResult<&[u8], $name> {
                let (input, $field) = parse_opaque(input)?;
                Ok((input, $name { $field }))
            }

            pub fn serialize(&self, output: &mut Vec<u8>) {
                serialize_opaque(&self.$field, output);
            }
        }
    };
}

opaque_message!(
    /// Responder's salt for the verifier.
    SrpSalt,
    salt
);
opaque_message!(
    /// `A = G^a mod P`, fixed width.
    SrpInitiatorPublic,
    a
);
opaque_message!(
    /// `B = (G^b + k*v) mod P`, fixed width.
    SrpResponderPublic,
    b
);
opaque_message!(
    /// `M1 = SHA256(A || B || S)`
    SrpProof1,
    m1
);
opaque_message!(
    /// `M2 = SHA256(A || M1 || S)`
    SrpProof2,
    m2
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_roundtrip() {
        let begin = SrpBegin {
            username: "lnst_user".to_string(),
        };
        let mut serialized = Vec::new();
        begin.serialize(&mut serialized);
        assert_eq!(&serialized[..4], &[0, 0, 0, 9]);

        let (rest, parsed) = SrpBegin::parse(&serialized).unwrap();
        assert!(rest.is_empty());
        assert_eq!(parsed, begin);
    }

    #[test]
    fn salt_roundtrip() {
        let salt = SrpSalt { salt: vec![7; 16] };
        let mut serialized = Vec::new();
        salt.serialize(&mut serialized);
        assert_eq!(serialized.len(), 20);

        let (_, parsed) = SrpSalt::parse(&serialized).unwrap();
        assert_eq!(parsed, salt);
    }
}
