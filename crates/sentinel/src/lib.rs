// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2025 Matter Labs

//! Authorization and optimistic concurrency guards for privileged state changes.
//!
//! * [`quorum`]: 4 of 5 administrator signatures, bound to a monotonic sequence
//! * [`attestation`]: single validator attestations with expiry and per-resource sequence
//! * [`anchor`]: content-hash guard against acting on stale resource state

#![deny(missing_docs)]
#![deny(clippy::all)]

pub mod anchor;
pub mod attestation;
pub mod config;
pub mod encoding;
pub mod error;
pub mod ethereum;
pub mod identity;
pub mod log;
pub mod quorum;

pub use error::{Authorized, Rejection};
pub use identity::{Identity, Role};
