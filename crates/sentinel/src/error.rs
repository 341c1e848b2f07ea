// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Matter Labs

//! Verifier outcomes and rejection taxonomy

use crate::identity::{Identity, Role};
use thiserror::Error;

/// Successful authorization
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Authorized {
    /// Counter value after the authorization was consumed
    pub sequence: u64,
}

/// A verifier refused to authorize an action. No state was changed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Malformed or non-recovering signature
    #[error("invalid signature at index {index}: {reason}")]
    SignatureInvalid {
        /// position in the submitted batch
        index: usize,
        /// why recovery failed
        reason: String,
    },
    /// The signature recovered to an identity without the required role
    #[error("{signer} is not the current {role}")]
    SignerNotAuthorized {
        /// recovered identity
        signer: Identity,
        /// role that was required
        role: Role,
    },
    /// Not enough distinct authorized signers
    #[error("quorum not met: {approvals} of {required} required approvals")]
    QuorumNotMet {
        /// distinct administrators that signed
        approvals: usize,
        /// quorum threshold
        required: usize,
    },
    /// The counter moved since the artifact was built
    #[error("sequence mismatch: expected {expected}, got {actual}")]
    SequenceMismatch {
        /// the verifier's current counter
        expected: u64,
        /// the counter the artifact was built for
        actual: u64,
    },
    /// The attestation is past its expiry
    #[error("attestation expired at {expiry}, now {now}")]
    Expired {
        /// attestation expiry, unix seconds
        expiry: u64,
        /// evaluation time, unix seconds
        now: u64,
    },
    /// The protected resource changed since the anchor was taken
    #[error("stale anchor: resource changed since snapshot")]
    StaleAnchor,
    /// The counter is at its maximum and cannot authorize another action
    #[error("sequence {0} cannot be advanced")]
    SequenceExhausted(u64),
}

impl Rejection {
    /// Whether the caller can resolve this by re-reading state and rebuilding the artifact.
    ///
    /// Transient rejections are expected under contention. The others need new signers or a roster change.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Rejection::SequenceMismatch { .. } | Rejection::Expired { .. } | Rejection::StaleAnchor
        )
    }
}

/// Invalid administrator roster or seat operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    /// Roster does not have exactly the required number of seats
    #[error("expected {expected} administrators, got {actual}")]
    SeatCount {
        /// required seats
        expected: usize,
        /// provided identities
        actual: usize,
    },
    /// The same identity would hold two seats
    #[error("{0} already holds a seat")]
    Duplicate(Identity),
    /// Seat index out of range
    #[error("no seat {0}")]
    NoSuchSeat(usize),
}

/// Failure of a quorum-gated roster change
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeatChangeError {
    /// The change itself is invalid, nothing was checked or consumed
    #[error(transparent)]
    Roster(#[from] RosterError),
    /// The approval was rejected
    #[error(transparent)]
    Rejected(#[from] Rejection),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(Rejection::SequenceMismatch {
            expected: 1,
            actual: 0
        }
        .is_transient());
        assert!(Rejection::Expired { expiry: 1, now: 2 }.is_transient());
        assert!(Rejection::StaleAnchor.is_transient());

        assert!(!Rejection::QuorumNotMet {
            approvals: 3,
            required: 4
        }
        .is_transient());
        assert!(!Rejection::SignatureInvalid {
            index: 0,
            reason: "x".into()
        }
        .is_transient());
        assert!(!Rejection::SequenceExhausted(u64::MAX).is_transient());
        assert!(!Rejection::SignerNotAuthorized {
            signer: Identity::default(),
            role: Role::Validator
        }
        .is_transient());
    }
}
