//! Cryptographic operations for vanity OpenPGP key generation.
//!
//! This module provides:
//! - RSA key generation wrapped as OpenPGP key packets
//! - Self-certified identities bound to a fixed creation time
//! - Key ID derivation used as the matching fingerprint

mod fingerprint;
mod identity;
mod keypair;

pub use fingerprint::Fingerprint;
pub use identity::{Holder, Identity};
pub use keypair::KeyMaterial;

/// Failure of the key primitive or of the self-certification step.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("RSA key generation failed: {0}")]
    KeyPair(#[from] rsa::Error),
    #[error("RSA keys with {0} prime factors are not supported")]
    UnsupportedPrimes(usize),
    #[error("invalid RSA key: p has no inverse modulo q")]
    InvalidKey,
    #[error("building the key packet failed: {0}")]
    Packet(#[source] pgp::errors::Error),
    #[error("self-certification failed: {0}")]
    Signature(#[source] pgp::errors::Error),
}
