// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Matter Labs

//! Off-chain helper for administrators and validator operators: derive identities, build digests,
//! sign, recover, issue attestations and compute anchors.

#![deny(missing_docs)]
#![deny(clippy::all)]

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use sentinel::{
    anchor::Anchor,
    attestation::{attestation_digest, now_unix, Attestation},
    config::load_config,
    encoding::{Call, Token},
    ethereum::{recover_signer, Digest32, LocalSigner},
    log::{setup_logging, LogLevelParser},
    quorum::{quorum_digest, QuorumApproval, QUORUM},
    Identity,
};
use std::{fs, path::PathBuf};
use tracing::{debug, level_filters::LevelFilter};

#[derive(Parser, Debug)]
#[command(author = "Matter Labs", version, about = "Quorum, attestation and anchor helper", long_about = None)]
struct Arguments {
    /// Log level for the log output, overrides the configured level.
    /// Valid values are: `off`, `error`, `warn`, `info`, `debug`, `trace`
    #[arg(long, value_parser = LogLevelParser)]
    log_level: Option<LevelFilter>,
    /// Configuration file with the registry roster and validator
    #[arg(long, env = "SENTINEL_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: SubCommands,
}

#[derive(Args, Debug)]
struct SecretArgs {
    /// hex encoded secp256k1 secret key
    #[arg(long, env = "SENTINEL_SECRET_KEY", hide_env_values = true)]
    secret_key: String,
}

impl SecretArgs {
    fn signer(&self) -> Result<LocalSigner> {
        let bytes = decode_hex(&self.secret_key).context("decoding secret key")?;
        LocalSigner::from_bytes(&bytes).context("invalid secret key")
    }
}

#[derive(Args, Debug)]
struct CallArgs {
    /// identity the call is addressed to
    #[arg(long)]
    target: Identity,
    /// method name
    #[arg(long)]
    method: String,
    /// arguments in `type:value` notation, e.g. `uint:100` or `address:0x..`
    #[arg(long = "arg")]
    args: Vec<Token>,
}

impl CallArgs {
    fn call(&self) -> Call {
        Call {
            target: self.target,
            method: self.method.clone(),
            args: self.args.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum SubCommands {
    /// Print the identity of a secret key
    Address(SecretArgs),
    /// Print the digest administrators sign for a call at a registry sequence
    CallDigest {
        #[command(flatten)]
        call: CallArgs,
        /// current registry sequence
        #[arg(long)]
        sequence: u64,
    },
    /// Sign a 32-byte digest
    Sign {
        #[command(flatten)]
        secret: SecretArgs,
        /// hex encoded digest
        #[arg(long)]
        digest: String,
    },
    /// Recover the signer of a digest
    Recover {
        /// hex encoded digest
        #[arg(long)]
        digest: String,
        /// hex encoded 65-byte signature
        #[arg(long)]
        signature: String,
    },
    /// Issue an attestation as the validator, printed as JSON
    Attest {
        #[command(flatten)]
        secret: SecretArgs,
        /// protected resource instance
        #[arg(long)]
        resource: Identity,
        /// hex encoded content the attestation covers
        #[arg(long)]
        content: String,
        /// the resource's expected sequence
        #[arg(long)]
        sequence: u64,
        /// seconds the attestation stays valid
        #[arg(long, default_value_t = 300)]
        ttl: u64,
    },
    /// Compute the anchor of a resource snapshot
    Anchor {
        /// snapshot fields in `type:value` notation, in canonical order
        #[arg(long = "field")]
        fields: Vec<Token>,
    },
    /// Count the distinct administrators in an approval file against the configured roster
    Approvals {
        #[command(flatten)]
        call: CallArgs,
        /// current registry sequence
        #[arg(long)]
        sequence: u64,
        /// JSON encoded approval
        #[arg(long)]
        approval: PathBuf,
    },
}

fn decode_hex(s: &str) -> Result<Vec<u8>> {
    Ok(hex::decode(s.strip_prefix("0x").unwrap_or(s))?)
}

fn decode_digest(s: &str) -> Result<Digest32> {
    let bytes = decode_hex(s).context("decoding digest")?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("digest must be 32 bytes, got {len}"))
}

fn main() -> Result<()> {
    let args = Arguments::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(level) = args.log_level {
        config.logging.level = level.to_string();
    }
    setup_logging(env!("CARGO_CRATE_NAME"), &config.logging)?;
    debug!(?config, "loaded configuration");

    match args.command {
        SubCommands::Address(secret) => {
            println!("{}", secret.signer()?.identity());
        }
        SubCommands::CallDigest { call, sequence } => {
            let digest = quorum_digest(&call.call(), sequence);
            println!("0x{}", hex::encode(digest));
        }
        SubCommands::Sign { secret, digest } => {
            let signature = secret.signer()?.sign(&decode_digest(&digest)?);
            println!("{signature}");
        }
        SubCommands::Recover { digest, signature } => {
            let signature = decode_hex(&signature).context("decoding signature")?;
            let signer = recover_signer(&signature, &decode_digest(&digest)?)?;
            println!("{signer}");
        }
        SubCommands::Attest {
            secret,
            resource,
            content,
            sequence,
            ttl,
        } => {
            let content = decode_hex(&content).context("decoding content")?;
            let expiry = now_unix().saturating_add(ttl);
            let digest = attestation_digest(resource, &content, sequence, expiry);
            let attestation = Attestation {
                sequence,
                expiry,
                signature: secret.signer()?.sign(&digest),
            };
            println!("{}", serde_json::to_string_pretty(&attestation)?);
        }
        SubCommands::Anchor { fields } => {
            println!("{}", Anchor::from_tokens(&fields));
        }
        SubCommands::Approvals {
            call,
            sequence,
            approval,
        } => {
            let registry = config
                .admin_registry(sequence)
                .context("configured administrator roster")?;
            let approval: QuorumApproval = serde_json::from_slice(
                &fs::read(&approval)
                    .with_context(|| format!("reading {}", approval.display()))?,
            )
            .context("parsing approval")?;

            let approvals = registry.count_approvals(&call.call(), &approval)?;
            println!("{approvals} of {QUORUM} required approvals");
            if approvals < QUORUM {
                bail!("quorum not met");
            }
        }
    }

    Ok(())
}
