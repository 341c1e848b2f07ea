// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Matter Labs

//! Optimistic concurrency guard for read-then-act operations.
//!
//! A caller takes an [`Anchor`] of a resource when forming its intent and submits it with the action.
//! The action only runs if the resource still hashes to the same anchor.

use crate::{
    encoding::{encode, Token},
    error::Rejection,
    ethereum::{keccak256, Digest32},
};
use hex::FromHex;
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::{fmt, str::FromStr};
use tracing::{trace, warn};

/// Canonical view of a mutable resource, e.g. an offer's unit price and available quantity.
///
/// Every field the dependent action relies on must be part of the snapshot.
pub trait Snapshot {
    /// Tokens describing the current value
    fn snapshot(&self) -> Vec<Token>;
}

/// Content hash of a resource snapshot, serialized as a `0x` prefixed hex string.
#[derive(Copy, Clone, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct Anchor(pub Digest32);

impl Anchor {
    /// Anchor of a resource's current value
    pub fn of<R: Snapshot + ?Sized>(resource: &R) -> Self {
        Self::from_tokens(&resource.snapshot())
    }

    /// Anchor of an explicit snapshot
    pub fn from_tokens(tokens: &[Token]) -> Self {
        Self(keccak256(&encode(tokens)))
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Anchor {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Digest32::from_hex(s.strip_prefix("0x").unwrap_or(s)).map(Self)
    }
}

impl fmt::Debug for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Anchor({self})")
    }
}

/// Fails with [`Rejection::StaleAnchor`] if `resource` no longer matches `supplied`.
pub fn check_anchor<R: Snapshot + ?Sized>(resource: &R, supplied: &Anchor) -> Result<(), Rejection> {
    check_tokens(&resource.snapshot(), supplied)
}

/// Like [`check_anchor`] for a snapshot the caller has already read.
pub fn check_tokens(current: &[Token], supplied: &Anchor) -> Result<(), Rejection> {
    let current = Anchor::from_tokens(current);
    if current != *supplied {
        warn!(%current, %supplied, "rejected: stale anchor");
        return Err(Rejection::StaleAnchor);
    }
    trace!(%current, "anchor matches");
    Ok(())
}

/// Run `action` on `resource` only if it still matches `supplied`.
pub fn with_anchor<R, T>(
    resource: &mut R,
    supplied: &Anchor,
    action: impl FnOnce(&mut R) -> T,
) -> Result<T, Rejection>
where
    R: Snapshot + ?Sized,
{
    check_anchor(resource, supplied)?;
    Ok(action(resource))
}
