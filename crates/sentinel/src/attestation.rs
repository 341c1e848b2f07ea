// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Matter Labs

//! Single-validator attestations
//!
//! A validator signs `(resource, content, sequence, expiry)`. The gate keeps one sequence per resource
//! instance; it survives validator rotation, so replacing the validator never re-opens consumed slots.

use crate::{
    encoding::{encode, Call, Token},
    error::{Authorized, Rejection},
    ethereum::{keccak256, recover_signer, Digest32, LocalSigner, Signature},
    identity::{Identity, Role},
    quorum::{AdminRegistry, QuorumApproval},
};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    time::{SystemTime, UNIX_EPOCH},
};
use tracing::{debug, instrument, warn};

/// Method name of the quorum-gated validator replacement
pub const UPDATE_VALIDATOR: &str = "updateValidator";

/// Current unix time in seconds
pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Digest a validator signs for `content` about `resource`.
pub fn attestation_digest(resource: Identity, content: &[u8], sequence: u64, expiry: u64) -> Digest32 {
    keccak256(&encode(&[
        Token::Address(resource),
        Token::Bytes(content.to_vec()),
        Token::Uint(sequence.into()),
        Token::Uint(expiry.into()),
    ]))
}

/// A signed, time-bounded, single-use authorization issued by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    /// resource sequence this attestation consumes
    pub sequence: u64,
    /// unix seconds after which the attestation is no longer accepted
    pub expiry: u64,
    /// validator signature over [`attestation_digest`]
    pub signature: Signature,
}

/// Validator identity and per-resource attestation counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorGate {
    identity: Identity,
    validator: Identity,
    sequences: BTreeMap<Identity, u64>,
}

impl ValidatorGate {
    /// Create a gate; every resource starts at sequence 0.
    pub fn new(identity: Identity, validator: Identity) -> Self {
        Self {
            identity,
            validator,
            sequences: BTreeMap::new(),
        }
    }

    /// Rebuild a gate from committed state, the per-resource sequences included.
    pub fn restore(
        identity: Identity,
        validator: Identity,
        sequences: impl IntoIterator<Item = (Identity, u64)>,
    ) -> Self {
        Self {
            identity,
            validator,
            sequences: sequences.into_iter().collect(),
        }
    }

    /// The gate's own identity, target of validator updates
    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Currently registered validator
    pub fn validator(&self) -> Identity {
        self.validator
    }

    /// Sequence the next attestation for `resource` must carry
    pub fn expected_sequence(&self, resource: &Identity) -> u64 {
        self.sequences.get(resource).copied().unwrap_or(0)
    }

    /// Check an attestation over `content` for `resource` at time `now` and consume its sequence.
    #[instrument(level = "debug", skip_all, fields(resource = %resource, sequence = attestation.sequence))]
    pub fn authorize(
        &mut self,
        resource: Identity,
        content: &[u8],
        attestation: &Attestation,
        now: u64,
    ) -> Result<Authorized, Rejection> {
        let next = self
            .check(resource, content, attestation, now)
            .inspect_err(|e| warn!("rejected: {e}"))?;

        self.sequences.insert(resource, next);
        debug!(new_sequence = next, "authorized");
        Ok(Authorized { sequence: next })
    }

    /// Returns the sequence `resource` moves to once the attestation is consumed.

    fn check(
        &self,
        resource: Identity,
        content: &[u8],
        attestation: &Attestation,
        now: u64,
    ) -> Result<u64, Rejection> {
        if now > attestation.expiry {
            return Err(Rejection::Expired {
                expiry: attestation.expiry,
                now,
            });
        }

        let expected = self.expected_sequence(&resource);
        if attestation.sequence != expected {
            return Err(Rejection::SequenceMismatch {
                expected,
                actual: attestation.sequence,
            });
        }

        let digest =
            attestation_digest(resource, content, attestation.sequence, attestation.expiry);
        let signer = recover_signer(&attestation.signature.0, &digest).map_err(|e| {
            Rejection::SignatureInvalid {
                index: 0,
                reason: e.to_string(),
            }
        })?;
        if signer != self.validator {
            return Err(Rejection::SignerNotAuthorized {
                signer,
                role: Role::Validator,
            });
        }

        expected
            .checked_add(1)
            .ok_or(Rejection::SequenceExhausted(expected))
    }

    /// The call administrators sign to register `new_validator`.
    pub fn update_validator_call(&self, new_validator: Identity) -> Call {
        Call::new(self.identity, UPDATE_VALIDATOR).arg(new_validator)
    }

    /// Replace the validator, authorized by an administrator quorum. Resource sequences are kept.
    pub fn update_validator(
        &mut self,
        new_validator: Identity,
        approval: &QuorumApproval,
        registry: &mut AdminRegistry,
    ) -> Result<Authorized, Rejection> {
        let call = self.update_validator_call(new_validator);
        let authorized = registry.authorize(&call, approval)?;
        debug!(previous = %self.validator, %new_validator, "validator updated");
        self.validator = new_validator;
        Ok(authorized)
    }
}

/// Validator-side issuer.
///
/// Owns the next sequence per resource, so attestations for one resource are handed out strictly one
/// after another.
#[derive(Debug)]
pub struct AttestationIssuer {
    signer: LocalSigner,
    next: BTreeMap<Identity, u64>,
}

impl AttestationIssuer {
    /// Issuer for `signer`, all resources at sequence 0
    pub fn new(signer: LocalSigner) -> Self {
        Self {
            signer,
            next: BTreeMap::new(),
        }
    }

    /// Identity the gate must have registered
    pub fn identity(&self) -> Identity {
        self.signer.identity()
    }

    /// Resynchronize with the gate, e.g. after a rejected or dropped attestation.
    pub fn sync(&mut self, resource: Identity, sequence: u64) {
        self.next.insert(resource, sequence);
    }

    /// Sign `content` for `resource` valid until `expiry`, reserving the next sequence.
    ///
    /// Fails with [`Rejection::SequenceExhausted`] once the last sequence of `resource` was handed out,
    /// since no gate could accept an attestation past it.
    pub fn issue(
        &mut self,
        resource: Identity,
        content: &[u8],
        expiry: u64,
    ) -> Result<Attestation, Rejection> {
        let slot = self.next.entry(resource).or_insert(0);
        let sequence = *slot;
        *slot = sequence
            .checked_add(1)
            .ok_or(Rejection::SequenceExhausted(sequence))?;

        let digest = attestation_digest(resource, content, sequence, expiry);
        Ok(Attestation {
            sequence,
            expiry,
            signature: self.signer.sign(&digest),
        })
    }
}
