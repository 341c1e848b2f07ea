// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Matter Labs

#![allow(dead_code)]

use sentinel::{ethereum::LocalSigner, quorum::AdminRegistry, Identity};

pub const REGISTRY: Identity = Identity([0xa0; 20]);
pub const TREASURY: Identity = Identity([0x7e; 20]);
pub const GATE: Identity = Identity([0x6a; 20]);

/// Deterministic signer, `seed` must be non-zero
pub fn signer(seed: u8) -> LocalSigner {
    LocalSigner::from_bytes(&[seed; 32]).expect("valid secret key")
}

pub fn admins() -> Vec<LocalSigner> {
    (1..=5).map(signer).collect()
}

pub fn registry(admins: &[LocalSigner]) -> AdminRegistry {
    AdminRegistry::new(REGISTRY, admins.iter().map(LocalSigner::identity)).expect("valid roster")
}
