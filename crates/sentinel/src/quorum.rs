// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2025 Matter Labs

//! 4 of 5 administrator quorum
//!
//! Administrators sign `keccak256(call ‖ sequence)`, where `sequence` is the registry's counter at the
//! time the call is committed. Every successful authorization advances the counter, so a signature batch
//! is only ever good for the single next action.

use crate::{
    encoding::{Call, Token},
    error::{Authorized, Rejection, RosterError, SeatChangeError},
    ethereum::{keccak256, recover_signer, Digest32, LocalSigner, Signature},
    identity::Identity,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, instrument, trace, warn};

/// Number of administrator seats
pub const ADMIN_SEATS: usize = 5;

/// Distinct administrator signatures needed to authorize an action
pub const QUORUM: usize = 4;

/// Method name of the self-referential seat transfer
pub const TRANSFER_ADMINISTRATOR: &str = "transferAdministrator";

/// Digest administrators sign for `call` at `sequence`.
pub fn quorum_digest(call: &Call, sequence: u64) -> Digest32 {
    let mut message = call.encode();
    message.extend_from_slice(&sequence.to_be_bytes());
    keccak256(&message)
}

/// A batch of administrator signatures for one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumApproval {
    /// Registry sequence the signers targeted
    pub sequence: u64,
    /// Signatures over [`quorum_digest`]
    pub signatures: Vec<Signature>,
}

impl QuorumApproval {
    /// Collect signatures from local signers, e.g. in tooling or tests.
    pub fn sign<'a>(
        call: &Call,
        sequence: u64,
        signers: impl IntoIterator<Item = &'a LocalSigner>,
    ) -> Self {
        let digest = quorum_digest(call, sequence);
        Self {
            sequence,
            signatures: signers.into_iter().map(|s| s.sign(&digest)).collect(),
        }
    }
}

/// The administrator roster and its action counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminRegistry {
    identity: Identity,
    administrators: [Identity; ADMIN_SEATS],
    sequence: u64,
}

impl AdminRegistry {
    /// Create a registry with its founding administrators at sequence 0.
    pub fn new(
        identity: Identity,
        administrators: impl IntoIterator<Item = Identity>,
    ) -> Result<Self, RosterError> {
        Self::restore(identity, administrators, 0)
    }

    /// Rebuild a registry view from committed ledger state, e.g. to preview approvals off-chain.
    pub fn restore(
        identity: Identity,
        administrators: impl IntoIterator<Item = Identity>,
        sequence: u64,
    ) -> Result<Self, RosterError> {
        let administrators: Vec<Identity> = administrators.into_iter().collect();
        let actual = administrators.len();
        let administrators: [Identity; ADMIN_SEATS] =
            administrators
                .try_into()
                .map_err(|_| RosterError::SeatCount {
                    expected: ADMIN_SEATS,
                    actual,
                })?;

        let mut seen = BTreeSet::new();
        for admin in administrators.iter() {
            if !seen.insert(admin) {
                return Err(RosterError::Duplicate(*admin));
            }
        }

        Ok(Self {
            identity,
            administrators,
            sequence,
        })
    }

    /// The registry's own identity, target of seat transfers
    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Current roster
    pub fn administrators(&self) -> &[Identity; ADMIN_SEATS] {
        &self.administrators
    }

    /// The sequence the next authorized action must be signed for
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Whether `identity` currently holds a seat
    pub fn is_administrator(&self, identity: &Identity) -> bool {
        self.administrators.contains(identity)
    }

    /// Digest for `call` at the current sequence
    pub fn digest(&self, call: &Call) -> Digest32 {
        quorum_digest(call, self.sequence)
    }

    /// Count distinct current administrators that signed `call` at the current sequence.
    ///
    /// Does not change any state. Signers outside the roster are ignored.
    pub fn count_approvals(
        &self,
        call: &Call,
        approval: &QuorumApproval,
    ) -> Result<usize, Rejection> {
        if approval.sequence != self.sequence {
            return Err(Rejection::SequenceMismatch {
                expected: self.sequence,
                actual: approval.sequence,
            });
        }

        let digest = self.digest(call);
        let mut approvers = BTreeSet::new();

        for (index, signature) in approval.signatures.iter().enumerate() {
            let signer = recover_signer(&signature.0, &digest).map_err(|e| {
                Rejection::SignatureInvalid {
                    index,
                    reason: e.to_string(),
                }
            })?;

            if !self.is_administrator(&signer) {
                trace!(%signer, index, "ignoring signature from non-administrator");
                continue;
            }
            if !approvers.insert(signer) {
                trace!(%signer, index, "duplicate administrator signature");
            }
        }

        Ok(approvers.len())
    }

    /// Authorize `call` if a quorum of administrators signed it at the current sequence.
    ///
    /// On success the sequence is advanced by one, on rejection nothing changes.
    #[instrument(level = "debug", skip_all, fields(call_target = %call.target, method = %call.method, sequence = self.sequence))]
    pub fn authorize(
        &mut self,
        call: &Call,
        approval: &QuorumApproval,
    ) -> Result<Authorized, Rejection> {
        let approvals = self.count_approvals(call, approval).inspect_err(|e| {
            warn!("rejected: {e}");
        })?;

        if approvals < QUORUM {
            let rejection = Rejection::QuorumNotMet {
                approvals,
                required: QUORUM,
            };
            warn!("rejected: {rejection}");
            return Err(rejection);
        }

        let Some(next) = self.sequence.checked_add(1) else {
            let rejection = Rejection::SequenceExhausted(self.sequence);
            warn!("rejected: {rejection}");
            return Err(rejection);
        };

        self.sequence = next;
        debug!(approvals, new_sequence = self.sequence, "authorized");
        Ok(Authorized {
            sequence: self.sequence,
        })
    }

    /// The call administrators sign to move `seat` to `new_admin`.
    pub fn transfer_call(&self, seat: usize, new_admin: Identity) -> Call {
        Call::new(self.identity, TRANSFER_ADMINISTRATOR)
            .arg(Token::Uint(seat as u128))
            .arg(new_admin)
    }

    /// Replace the administrator in `seat` with `new_admin`, authorized by the current roster.
    pub fn transfer_administrator(
        &mut self,
        seat: usize,
        new_admin: Identity,
        approval: &QuorumApproval,
    ) -> Result<Authorized, SeatChangeError> {
        if seat >= ADMIN_SEATS {
            return Err(RosterError::NoSuchSeat(seat).into());
        }
        if self.is_administrator(&new_admin) {
            return Err(RosterError::Duplicate(new_admin).into());
        }

        let call = self.transfer_call(seat, new_admin);
        let authorized = self.authorize(&call, approval)?;

        let previous = std::mem::replace(&mut self.administrators[seat], new_admin);
        debug!(seat, %previous, %new_admin, "administrator transferred");
        Ok(authorized)
    }
}
