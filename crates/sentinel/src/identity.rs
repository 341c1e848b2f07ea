// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Matter Labs

//! Closed identity type for signers, registries and protected resources.

use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Length of an [`Identity`] in bytes.
pub const IDENTITY_LENGTH: usize = 20;

/// A 20-byte public-key-derived identity, Ethereum address layout.
///
/// Used for administrators, validators, registries and protected resources alike.
#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, SerializeDisplay, DeserializeFromStr,
)]
pub struct Identity(pub [u8; IDENTITY_LENGTH]);

/// The role an identity plays towards a verifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    /// Member of the 5-seat admin roster
    Administrator,
    /// Off-chain attestation authority
    Validator,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Administrator => f.write_str("administrator"),
            Role::Validator => f.write_str("validator"),
        }
    }
}

/// Identity parsing error
#[derive(Error, Debug, PartialEq)]
pub enum IdentityError {
    /// Not valid hex
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    /// Wrong number of bytes
    #[error("identity must be {IDENTITY_LENGTH} bytes, got {0}")]
    Length(usize),
}

impl Identity {
    /// Raw bytes of the identity
    pub fn as_bytes(&self) -> &[u8; IDENTITY_LENGTH] {
        &self.0
    }
}

impl From<[u8; IDENTITY_LENGTH]> for Identity {
    fn from(bytes: [u8; IDENTITY_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Identity {
    type Error = IdentityError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; IDENTITY_LENGTH] = bytes
            .try_into()
            .map_err(|_| IdentityError::Length(bytes.len()))?;
        Ok(Self(bytes))
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        Self::try_from(bytes.as_slice())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({self})")
    }
}
