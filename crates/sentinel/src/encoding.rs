// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Matter Labs

//! Canonical, type-tagged binary encoding of call and snapshot tuples.
//!
//! ```text
//! tuple  := count:u32be  value*
//! value  := 0x01 address[20]
//!         | 0x02 word[32]                 (u128, big-endian, left padded)
//!         | 0x03 0x00|0x01
//!         | 0x04 bytes32[32]
//!         | 0x05 len:u32be bytes[len]
//!         | 0x06 len:u32be utf8[len]
//! ```
//!
//! Every value is tagged and every variable-length value is length prefixed, so two different tuples
//! never share an encoding.

use crate::identity::{Identity, IDENTITY_LENGTH};
use std::{fmt, str::FromStr};
use thiserror::Error;

const TAG_ADDRESS: u8 = 0x01;
const TAG_UINT: u8 = 0x02;
const TAG_BOOL: u8 = 0x03;
const TAG_BYTES32: u8 = 0x04;
const TAG_BYTES: u8 = 0x05;
const TAG_STRING: u8 = 0x06;

const WORD: usize = 32;

/// A typed value inside a canonical tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    /// 20-byte identity
    Address(Identity),
    /// unsigned integer, encoded as a 32-byte word
    Uint(u128),
    /// boolean
    Bool(bool),
    /// fixed 32 bytes, e.g. a hash
    Bytes32([u8; WORD]),
    /// arbitrary bytes
    Bytes(Vec<u8>),
    /// UTF-8 string
    String(String),
}

/// Decoding error
#[derive(Error, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum DecodeError {
    #[error("unexpected end of input at offset {0}")]
    Truncated(usize),
    #[error("unknown type tag {tag:#04x} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },
    #[error("non-canonical bool byte {0:#04x}")]
    InvalidBool(u8),
    #[error("uint word exceeds u128")]
    UintOverflow,
    #[error("invalid utf-8 in string")]
    InvalidUtf8,
    #[error("{0} trailing bytes")]
    TrailingBytes(usize),
}

/// Token parsing error for the `type:value` notation
#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum ParseTokenError {
    #[error("expected `type:value`, got `{0}`")]
    MissingType(String),
    #[error("unknown token type `{0}`")]
    UnknownType(String),
    #[error("invalid value for `{kind}`: {reason}")]
    InvalidValue { kind: String, reason: String },
}

impl Token {
    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Token::Address(id) => {
                out.push(TAG_ADDRESS);
                out.extend_from_slice(id.as_bytes());
            }
            Token::Uint(value) => {
                out.push(TAG_UINT);
                out.extend_from_slice(&[0u8; WORD - 16]);
                out.extend_from_slice(&value.to_be_bytes());
            }
            Token::Bool(value) => {
                out.push(TAG_BOOL);
                out.push(u8::from(*value));
            }
            Token::Bytes32(value) => {
                out.push(TAG_BYTES32);
                out.extend_from_slice(value);
            }
            Token::Bytes(value) => {
                out.push(TAG_BYTES);
                push_len_prefixed(out, value);
            }
            Token::String(value) => {
                out.push(TAG_STRING);
                push_len_prefixed(out, value.as_bytes());
            }
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Token::Address(_) => "address",
            Token::Uint(_) => "uint",
            Token::Bool(_) => "bool",
            Token::Bytes32(_) => "bytes32",
            Token::Bytes(_) => "bytes",
            Token::String(_) => "string",
        }
    }
}

fn push_len_prefixed(out: &mut Vec<u8>, data: &[u8]) {
    // values larger than 4 GiB are not supported
    let len = u32::try_from(data.len()).unwrap_or(u32::MAX);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(data);
}

/// Encode a tuple of tokens.
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + tokens.len() * (1 + WORD));
    let count = u32::try_from(tokens.len()).unwrap_or(u32::MAX);
    out.extend_from_slice(&count.to_be_bytes());
    for token in tokens {
        token.encode_into(&mut out);
    }
    out
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or(DecodeError::Truncated(self.pos))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn len_prefixed(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.u32()? as usize;
        self.take(len)
    }

    fn token(&mut self) -> Result<Token, DecodeError> {
        let offset = self.pos;
        let token = match self.u8()? {
            TAG_ADDRESS => Token::Address(Identity(self.array::<IDENTITY_LENGTH>()?)),
            TAG_UINT => {
                let word = self.array::<WORD>()?;
                if word[..WORD - 16].iter().any(|b| *b != 0) {
                    return Err(DecodeError::UintOverflow);
                }
                let mut low = [0u8; 16];
                low.copy_from_slice(&word[WORD - 16..]);
                Token::Uint(u128::from_be_bytes(low))
            }
            TAG_BOOL => match self.u8()? {
                0 => Token::Bool(false),
                1 => Token::Bool(true),
                other => return Err(DecodeError::InvalidBool(other)),
            },
            TAG_BYTES32 => Token::Bytes32(self.array::<WORD>()?),
            TAG_BYTES => Token::Bytes(self.len_prefixed()?.to_vec()),
            TAG_STRING => Token::String(
                std::str::from_utf8(self.len_prefixed()?)
                    .map_err(|_| DecodeError::InvalidUtf8)?
                    .to_string(),
            ),
            tag => return Err(DecodeError::UnknownTag { tag, offset }),
        };
        Ok(token)
    }
}

/// Decode a tuple produced by [`encode`]. Trailing bytes are an error.
pub fn decode(data: &[u8]) -> Result<Vec<Token>, DecodeError> {
    let mut reader = Reader { data, pos: 0 };
    let count = reader.u32()?;
    // every value takes at least two bytes
    let mut tokens = Vec::with_capacity((count as usize).min(data.len() / 2));
    for _ in 0..count {
        tokens.push(reader.token()?);
    }
    match data.len() - reader.pos {
        0 => Ok(tokens),
        n => Err(DecodeError::TrailingBytes(n)),
    }
}

/// A privileged call: the target it acts on, the method name and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// the contract / object the call is addressed to
    pub target: Identity,
    /// method name
    pub method: String,
    /// positional arguments
    pub args: Vec<Token>,
}

impl Call {
    /// A call without arguments
    pub fn new(target: Identity, method: impl Into<String>) -> Self {
        Self {
            target,
            method: method.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument
    pub fn arg(mut self, token: impl Into<Token>) -> Self {
        self.args.push(token.into());
        self
    }

    /// Canonical message bytes of `(target, method, args...)`
    pub fn encode(&self) -> Vec<u8> {
        let mut tokens = Vec::with_capacity(2 + self.args.len());
        tokens.push(Token::Address(self.target));
        tokens.push(Token::String(self.method.clone()));
        tokens.extend(self.args.iter().cloned());
        encode(&tokens)
    }
}

impl From<Identity> for Token {
    fn from(value: Identity) -> Self {
        Token::Address(value)
    }
}

impl From<u128> for Token {
    fn from(value: u128) -> Self {
        Token::Uint(value)
    }
}

impl From<u64> for Token {
    fn from(value: u64) -> Self {
        Token::Uint(value.into())
    }
}

impl From<bool> for Token {
    fn from(value: bool) -> Self {
        Token::Bool(value)
    }
}

impl From<[u8; WORD]> for Token {
    fn from(value: [u8; WORD]) -> Self {
        Token::Bytes32(value)
    }
}

impl From<Vec<u8>> for Token {
    fn from(value: Vec<u8>) -> Self {
        Token::Bytes(value)
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Token::String(value.to_string())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Token::String(value)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.type_name())?;
        match self {
            Token::Address(id) => write!(f, "{id}"),
            Token::Uint(v) => write!(f, "{v}"),
            Token::Bool(v) => write!(f, "{v}"),
            Token::Bytes32(v) => write!(f, "0x{}", hex::encode(v)),
            Token::Bytes(v) => write!(f, "0x{}", hex::encode(v)),
            Token::String(v) => f.write_str(v),
        }
    }
}

fn parse_hex(kind: &str, value: &str) -> Result<Vec<u8>, ParseTokenError> {
    hex::decode(value.strip_prefix("0x").unwrap_or(value)).map_err(|e| {
        ParseTokenError::InvalidValue {
            kind: kind.to_string(),
            reason: e.to_string(),
        }
    })
}

impl FromStr for Token {
    type Err = ParseTokenError;

    /// Parses `type:value`, e.g. `uint:100`, `address:0x..`, `string:withdraw`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, value) = s
            .split_once(':')
            .ok_or_else(|| ParseTokenError::MissingType(s.to_string()))?;
        let invalid = |reason: String| ParseTokenError::InvalidValue {
            kind: kind.to_string(),
            reason,
        };
        match kind {
            "address" => value
                .parse()
                .map(Token::Address)
                .map_err(|e: crate::identity::IdentityError| invalid(e.to_string())),
            "uint" => value
                .parse()
                .map(Token::Uint)
                .map_err(|e: std::num::ParseIntError| invalid(e.to_string())),
            "bool" => value
                .parse()
                .map(Token::Bool)
                .map_err(|e: std::str::ParseBoolError| invalid(e.to_string())),
            "bytes32" => {
                let bytes = parse_hex(kind, value)?;
                let len = bytes.len();
                bytes
                    .try_into()
                    .map(Token::Bytes32)
                    .map_err(|_| invalid(format!("expected 32 bytes, got {len}")))
            }
            "bytes" => parse_hex(kind, value).map(Token::Bytes),
            "string" => Ok(Token::String(value.to_string())),
            other => Err(ParseTokenError::UnknownType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Token> {
        vec![
            Token::Address(Identity([7; IDENTITY_LENGTH])),
            Token::Uint(u128::MAX),
            Token::Bool(true),
            Token::Bytes32([9; WORD]),
            Token::Bytes(vec![1, 2, 3]),
            Token::String("withdraw".into()),
            Token::String(String::new()),
        ]
    }

    #[test]
    fn round_trip() {
        let tokens = sample();
        assert_eq!(decode(&encode(&tokens)).unwrap(), tokens);
        assert_eq!(decode(&encode(&[])).unwrap(), vec![]);
    }

    #[test]
    fn arity_is_part_of_the_encoding() {
        // "ab" as one argument vs "a" and "b" as two
        let one = encode(&[Token::String("ab".into())]);
        let two = encode(&[Token::String("a".into()), Token::String("b".into())]);
        assert_ne!(one, two);

        let joined = encode(&[Token::Bytes(vec![1, 2, 3, 4])]);
        let split = encode(&[Token::Bytes(vec![1, 2]), Token::Bytes(vec![3, 4])]);
        assert_ne!(joined, split);
    }

    #[test]
    fn same_bytes_different_type() {
        assert_ne!(
            encode(&[Token::String("x".into())]),
            encode(&[Token::Bytes(b"x".to_vec())])
        );
        assert_ne!(
            encode(&[Token::Uint(1)]),
            encode(&[Token::Bytes32({
                let mut w = [0u8; WORD];
                w[31] = 1;
                w
            })])
        );
        assert_ne!(encode(&[Token::Bool(false)]), encode(&[Token::Uint(0)]));
    }

    /// Small values of every type, chosen so that their raw bytes overlap across types.
    fn edge_values() -> Vec<Token> {
        let mut one = [0u8; WORD];
        one[31] = 1;
        vec![
            Token::Address(Identity::default()),
            Token::Address(Identity([1; IDENTITY_LENGTH])),
            Token::Uint(0),
            Token::Uint(1),
            Token::Bool(false),
            Token::Bool(true),
            Token::Bytes32([0; WORD]),
            Token::Bytes32(one),
            Token::Bytes(vec![]),
            Token::Bytes(vec![0]),
            Token::Bytes(vec![0, 0]),
            Token::Bytes(b"a".to_vec()),
            Token::String(String::new()),
            Token::String("a".into()),
            Token::String("\0".into()),
        ]
    }

    #[test]
    fn distinct_tuples_never_collide() {
        let values = edge_values();

        // every tuple of up to three values
        let mut tuples: Vec<Vec<Token>> = vec![vec![]];
        let mut frontier: Vec<Vec<Token>> = vec![vec![]];
        for _ in 0..3 {
            frontier = frontier
                .iter()
                .flat_map(|prefix| {
                    values.iter().map(move |v| {
                        let mut t = prefix.clone();
                        t.push(v.clone());
                        t
                    })
                })
                .collect();
            tuples.extend(frontier.iter().cloned());
        }

        let mut seen = std::collections::HashMap::new();
        for tuple in &tuples {
            let bytes = encode(tuple);
            if let Some(previous) = seen.insert(bytes, tuple) {
                panic!("{previous:?} and {tuple:?} encode identically");
            }
            assert_eq!(&decode(&encode(tuple)).unwrap(), tuple);
        }
        assert_eq!(seen.len(), 1 + 15 + 15 * 15 + 15 * 15 * 15);
    }

    #[test]
    fn call_encoding_distinguishes_arguments() {
        let treasury = Identity([1; IDENTITY_LENGTH]);
        let a = Call::new(treasury, "withdraw").arg(100u64);
        let b = Call::new(treasury, "withdraw").arg(101u64);
        let c = Call::new(treasury, "withdrawAll");
        assert_ne!(a.encode(), b.encode());
        assert_ne!(a.encode(), c.encode());

        let decoded = decode(&a.encode()).unwrap();
        assert_eq!(
            decoded,
            vec![
                Token::Address(treasury),
                Token::String("withdraw".into()),
                Token::Uint(100)
            ]
        );
    }

    #[test]
    fn decode_errors() {
        let mut data = encode(&[Token::Bool(true)]);
        data.push(0);
        assert_eq!(decode(&data), Err(DecodeError::TrailingBytes(1)));

        assert_eq!(decode(&[0, 0, 0, 1]), Err(DecodeError::Truncated(4)));
        assert_eq!(
            decode(&[0, 0, 0, 1, 0x7f]),
            Err(DecodeError::UnknownTag {
                tag: 0x7f,
                offset: 4
            })
        );
        assert_eq!(
            decode(&[0, 0, 0, 1, TAG_BOOL, 2]),
            Err(DecodeError::InvalidBool(2))
        );

        let mut overflow = vec![0, 0, 0, 1, TAG_UINT];
        overflow.extend_from_slice(&[0xff; WORD]);
        assert_eq!(decode(&overflow), Err(DecodeError::UintOverflow));

        assert_eq!(
            decode(&[0, 0, 0, 1, TAG_STRING, 0, 0, 0, 1, 0xff]),
            Err(DecodeError::InvalidUtf8)
        );
        // huge declared length must not allocate or panic
        assert_eq!(
            decode(&[0, 0, 0, 1, TAG_BYTES, 0xff, 0xff, 0xff, 0xff]),
            Err(DecodeError::Truncated(9))
        );
    }

    #[test]
    fn parse_tokens() {
        assert_eq!("uint:100".parse::<Token>().unwrap(), Token::Uint(100));
        assert_eq!("bool:false".parse::<Token>().unwrap(), Token::Bool(false));
        assert_eq!(
            "string:a:b".parse::<Token>().unwrap(),
            Token::String("a:b".into())
        );
        assert_eq!(
            "bytes:0x0102".parse::<Token>().unwrap(),
            Token::Bytes(vec![1, 2])
        );
        assert!(matches!(
            "bytes32:0x0102".parse::<Token>(),
            Err(ParseTokenError::InvalidValue { .. })
        ));
        assert!(matches!(
            "int:1".parse::<Token>(),
            Err(ParseTokenError::UnknownType(_))
        ));
        assert!(matches!(
            "100".parse::<Token>(),
            Err(ParseTokenError::MissingType(_))
        ));

        for token in sample() {
            assert_eq!(token.to_string().parse::<Token>().unwrap(), token);
        }
    }
}
