//! Application values exchanged over an established channel.
//!
//! Wire encoding is a one byte tag followed by the body:
//!
//! | tag | type  | body                                          |
//! |-----|-------|-----------------------------------------------|
//! | 0   | Nil   | -                                             |
//! | 1   | Bool  | u8 (0 or 1)                                   |
//! | 2   | Int   | i64 big-endian                                |
//! | 3   | Str   | u32 length, UTF-8 bytes                       |
//! | 4   | Bytes | u32 length, bytes                             |
//! | 5   | List  | u32 count, values                             |
//! | 6   | Map   | u32 count, (u32 key length, key, value) pairs |

use std::collections::BTreeMap;

use nom::bytes::complete::take;
use nom::error::{Error as NomError, ErrorKind};
use nom::number::complete::{be_i64, be_u32, be_u8};
use nom::IResult;

use crate::Error;

const TAG_NIL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_INT: u8 = 2;
const TAG_STR: u8 = 3;
const TAG_BYTES: u8 = 4;
const TAG_LIST: u8 = 5;
const TAG_MAP: u8 = 6;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Decode exactly one value from `input`.
    ///
    /// Nesting deeper than `max_depth` and trailing bytes are errors.
    pub fn decode(input: &[u8], max_depth: usize) -> Result<Value, Error> {
        let (rest, value) = Value::parse(input, max_depth).map_err(|e| match e {
            nom::Err::Incomplete(_) => Error::Decode("Truncated value".to_string()),
            nom::Err::Error(e) | nom::Err::Failure(e) => {
                Error::Decode(format!("Malformed value: {:?}", e.code))
            }
        })?;

        if !rest.is_empty() {
            return Err(Error::Decode(format!(
                "{} trailing bytes after value",
                rest.len()
            )));
        }

        Ok(value)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.serialize(&mut out);
        out
    }

    pub fn parse(input: &[u8], max_depth: usize) -> IResult<&[u8], Value> {
        let (input, tag) = be_u8(input)?;

        match tag {
            TAG_NIL => Ok((input, Value::Nil)),
            TAG_BOOL => {
                let (input, b) = be_u8(input)?;
                match b {
                    0 => Ok((input, Value::Bool(false))),
                    1 => Ok((input, Value::Bool(true))),
                    _ => Err(failure(input, ErrorKind::Verify)),
                }
            }
            TAG_INT => {
                let (input, i) = be_i64(input)?;
                Ok((input, Value::Int(i)))
            }
            TAG_STR => {
                let (input, s) = parse_str(input)?;
                Ok((input, Value::Str(s)))
            }
            TAG_BYTES => {
                let (input, len) = be_u32(input)?;
                let (input, bytes) = take(len)(input)?;
                Ok((input, Value::Bytes(bytes.to_vec())))
            }
            TAG_LIST => {
                let depth = nested(input, max_depth)?;
                let (mut input, count) = be_u32(input)?;

                // Every value is at least one byte.
                let mut list = Vec::with_capacity((count as usize).min(input.len()));
                for _ in 0..count {
                    let (rest, item) = Value::parse(input, depth)?;
                    list.push(item);
                    input = rest;
                }
                Ok((input, Value::List(list)))
            }
            TAG_MAP => {
                let depth = nested(input, max_depth)?;
                let (mut input, count) = be_u32(input)?;

                let mut map = BTreeMap::new();
                for _ in 0..count {
                    let (rest, key) = parse_str(input)?;
                    let (rest, item) = Value::parse(rest, depth)?;
                    if map.insert(key, item).is_some() {
                        return Err(failure(input, ErrorKind::Verify));
                    }
                    input = rest;
                }
                Ok((input, Value::Map(map)))
            }
            _ => Err(failure(input, ErrorKind::Tag)),
        }
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        match self {
            Value::Nil => output.push(TAG_NIL),
            Value::Bool(b) => {
                output.push(TAG_BOOL);
                output.push(*b as u8);
            }
            Value::Int(i) => {
                output.push(TAG_INT);
                output.extend_from_slice(&i.to_be_bytes());
            }
            Value::Str(s) => {
                output.push(TAG_STR);
                serialize_bytes(s.as_bytes(), output);
            }
            Value::Bytes(b) => {
                output.push(TAG_BYTES);
                serialize_bytes(b, output);
            }
            Value::List(list) => {
                output.push(TAG_LIST);
                output.extend_from_slice(&(list.len() as u32).to_be_bytes());
                for item in list {
                    item.serialize(output);
                }
            }
            Value::Map(map) => {
                output.push(TAG_MAP);
                output.extend_from_slice(&(map.len() as u32).to_be_bytes());
                for (key, item) in map {
                    serialize_bytes(key.as_bytes(), output);
                    item.serialize(output);
                }
            }
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Look up `key` if this is a map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }
}

fn failure(input: &[u8], kind: ErrorKind) -> nom::Err<NomError<&[u8]>> {
    nom::Err::Failure(NomError::new(input, kind))
}

/// Depth budget for the children of a container.
fn nested(input: &[u8], max_depth: usize) -> Result<usize, nom::Err<NomError<&[u8]>>> {
    max_depth
        .checked_sub(1)
        .ok_or_else(|| failure(input, ErrorKind::TooLarge))
}

fn parse_str(input: &[u8]) -> IResult<&[u8], String> {
    let (rest, len) = be_u32(input)?;
    let (rest, bytes) = take(len)(rest)?;
    let s = std::str::from_utf8(bytes).map_err(|_| failure(input, ErrorKind::Verify))?;
    Ok((rest, s.to_string()))
}

fn serialize_bytes(bytes: &[u8], output: &mut Vec<u8>) {
    output.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    output.extend_from_slice(bytes);
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(l: Vec<Value>) -> Self {
        Value::List(l)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(m: BTreeMap<String, Value>) -> Self {
        Value::Map(m)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
