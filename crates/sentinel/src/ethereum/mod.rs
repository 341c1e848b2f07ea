// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2025 Matter Labs

//! Ethereum-compatible recoverable signatures over 32-byte digests.
//!
//! Signatures are `r ‖ s ‖ v` (65 bytes), the layout produced by `eth_sign` tooling and consumed by the
//! `ecrecover` precompile. The signer identity is the keccak-derived address of the recovered key.

use crate::identity::{Identity, IDENTITY_LENGTH};
use secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId},
    Message, PublicKey, SecretKey, SECP256K1,
};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use sha3::{Digest, Keccak256};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Length of a signature including the recovery id.
pub const SIGNATURE_LENGTH: usize = 65;

/// A 32-byte message digest.
pub type Digest32 = [u8; 32];

/// Raw signature bytes as submitted by a caller.
///
/// The length is not checked on construction; malformed input is rejected at recovery time.
/// Serialized as a `0x` prefixed hex string, the form `Display` prints.
#[derive(Clone, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct Signature(pub Vec<u8>);

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({self})")
    }
}

impl FromStr for Signature {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex::decode(s.strip_prefix("0x").unwrap_or(s)).map(Self)
    }
}

impl From<[u8; SIGNATURE_LENGTH]> for Signature {
    fn from(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self(bytes.to_vec())
    }
}

/// Signature recovery failure
#[derive(Error, Debug)]
pub enum RecoverError {
    /// Signature is not 65 bytes
    #[error("invalid signature length: {0} bytes")]
    Length(usize),
    /// `v` is neither 27/28 nor a raw recovery id
    #[error("invalid recovery id byte {0}")]
    RecoveryId(u8),
    /// secp256k1 rejected the signature
    #[error(transparent)]
    Secp256k1(#[from] secp256k1::Error),
}

/// Keccak256 of `data`.
pub fn keccak256(data: &[u8]) -> Digest32 {
    Keccak256::digest(data).into()
}

/// Equivalent to the ecrecover precompile: recover the identity that signed `digest`.
pub fn recover_signer(sig: &[u8], digest: &Digest32) -> Result<Identity, RecoverError> {
    if sig.len() != SIGNATURE_LENGTH {
        return Err(RecoverError::Length(sig.len()));
    }
    let v = sig[64];
    // as defined in the Ethereum Yellow Paper (Appendix F), raw ids are tolerated
    let rec_id = match v {
        27 | 28 => v - 27,
        0..=3 => v,
        _ => return Err(RecoverError::RecoveryId(v)),
    };
    let sig = RecoverableSignature::from_compact(
        &sig[0..64],
        RecoveryId::try_from(i32::from(rec_id))?,
    )?;
    let public = SECP256K1.recover_ecdsa(Message::from_digest(*digest), &sig)?;
    Ok(public_key_to_identity(&public))
}

/// Converts a public key into an identity by hashing the encoded public key with Keccak256.
pub fn public_key_to_identity(public: &PublicKey) -> Identity {
    let public_key_bytes = public.serialize_uncompressed();

    // Skip the first byte (0x04) which indicates uncompressed key
    let hash = keccak256(&public_key_bytes[1..]);

    let mut address = [0u8; IDENTITY_LENGTH];
    address.copy_from_slice(&hash[12..]);
    Identity(address)
}

/// Signs `digest` in Ethereum-compatible format, `v` is 27 or 28.
pub fn sign_digest(sec: &SecretKey, digest: &Digest32) -> Signature {
    let s = SECP256K1.sign_ecdsa_recoverable(Message::from_digest(*digest), sec);
    let (rec_id, data) = s.serialize_compact();

    let mut signature = [0u8; SIGNATURE_LENGTH];
    signature[..64].copy_from_slice(&data);
    signature[64] = 27 + i32::from(rec_id) as u8;

    Signature::from(signature)
}

/// A secret key held by an off-chain administrator or validator service.
#[derive(Clone)]
pub struct LocalSigner {
    secret: SecretKey,
    identity: Identity,
}

impl LocalSigner {
    /// Wrap a secret key
    pub fn new(secret: SecretKey) -> Self {
        let public = PublicKey::from_secret_key(&**SECP256K1, &secret);
        Self {
            secret,
            identity: public_key_to_identity(&public),
        }
    }

    /// Parse a 32-byte secret key
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, secp256k1::Error> {
        let secret = SecretKey::from_byte_array(
            bytes
                .try_into()
                .map_err(|_| secp256k1::Error::InvalidSecretKey)?,
        )?;
        Ok(Self::new(secret))
    }

    /// The identity verifiers will recover from this signer's signatures
    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Sign a digest
    pub fn sign(&self, digest: &Digest32) -> Signature {
        sign_digest(&self.secret, digest)
    }
}

impl fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSigner")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "c87509a1c067bbde78beb793e6fa76530b6382a4c0241e5e4a9ec0a0f44dc0d3";

    fn signer() -> LocalSigner {
        LocalSigner::from_bytes(&hex::decode(SECRET).unwrap()).unwrap()
    }

    #[test]
    fn recover() {
        let signer = signer();
        let expected: Identity = "627306090abaB3A6e1400e9345bC60c78a8BEf57".parse().unwrap();
        assert_eq!(signer.identity(), expected);

        let digest = *b"12345678901234567890123456789012";
        let signature = signer.sign(&digest);
        assert!(matches!(signature.0[64], 27 | 28));

        let recovered = recover_signer(&signature.0, &digest).unwrap();
        assert_eq!(recovered, expected);
    }

    #[test]
    fn raw_recovery_id_accepted() {
        let signer = signer();
        let digest = keccak256(b"raw v");
        let mut signature = signer.sign(&digest).0;
        signature[64] -= 27;
        assert_eq!(
            recover_signer(&signature, &digest).unwrap(),
            signer.identity()
        );
    }

    #[test]
    fn different_digest_recovers_someone_else() {
        let signer = signer();
        let signature = signer.sign(&keccak256(b"one"));
        let recovered = recover_signer(&signature.0, &keccak256(b"two")).unwrap();
        assert_ne!(recovered, signer.identity());
    }

    #[test]
    fn malformed_signatures() {
        let digest = keccak256(b"x");
        assert!(matches!(
            recover_signer(&[0u8; 64], &digest),
            Err(RecoverError::Length(64))
        ));
        let mut sig = [0u8; SIGNATURE_LENGTH];
        sig[64] = 29;
        assert!(matches!(
            recover_signer(&sig, &digest),
            Err(RecoverError::RecoveryId(29))
        ));
        sig[64] = 27;
        assert!(matches!(
            recover_signer(&sig, &digest),
            Err(RecoverError::Secp256k1(_))
        ));
    }

    #[test]
    fn signature_text_form() {
        let signature = signer().sign(&keccak256(b"text"));
        let text = signature.to_string();
        assert!(text.starts_with("0x"));
        assert_eq!(text.len(), 2 + 2 * SIGNATURE_LENGTH);

        assert_eq!(text.parse::<Signature>().unwrap(), signature);
        assert_eq!(text[2..].parse::<Signature>().unwrap(), signature);
        assert!("0xzz".parse::<Signature>().is_err());

        let json = serde_json::to_string(&signature).unwrap();
        assert_eq!(json, format!("\"{text}\""));
        assert_eq!(serde_json::from_str::<Signature>(&json).unwrap(), signature);
    }

    #[test]
    fn secret_key_length() {
        assert!(LocalSigner::from_bytes(&[1u8; 31]).is_err());
        assert!(LocalSigner::from_bytes(&[0u8; 32]).is_err());
    }
}
