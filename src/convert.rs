//! Conversions between OpenPGP secret keys and plain RSA private keys.

use chrono::{DateTime, Utc};
use pgp::composed::SignedSecretKey;
use pgp::crypto::public_key::PublicKeyAlgorithm;
use pgp::types::{PublicKeyTrait, SecretKeyRepr, SecretKeyTrait, SecretParams};
use pgp::Deserializable;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey, LineEnding};
use rsa::pkcs8::DecodePrivateKey;
use rsa::RsaPrivateKey;
use tracing::{debug, info};

use crate::armor::{self, ArmorError};
use crate::crypto::{Fingerprint, GenerationError, Holder, Identity};
use crate::export::{self, ExportError};

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("no '{}' block found in input", armor::PRIVATE_KEY_BLOCK)]
    NoPrivateKey,
    #[error(transparent)]
    Armor(#[from] ArmorError),
    #[error("failed to parse OpenPGP key: {0}")]
    Parse(#[source] pgp::errors::Error),
    #[error("private key is not an RSA key ({0:?})")]
    NotRsa(PublicKeyAlgorithm),
    #[error("the private key is encrypted; provide a passphrase")]
    PassphraseRequired,
    #[error("failed to unlock private key: {0}")]
    Unlock(#[source] pgp::errors::Error),
    #[error("failed to encode RSA private key: {0}")]
    Encode(#[source] rsa::pkcs1::Error),
    #[error("input is neither a PKCS#1 nor a PKCS#8 RSA private key: {0}")]
    Decode(#[source] rsa::pkcs1::Error),
    #[error(transparent)]
    Identity(#[from] GenerationError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Extracts the RSA private key of the first OpenPGP private key block in
/// `armored` as a PKCS#1 PEM document.
pub fn pgp_to_rsa_pem(armored: &str, passphrase: Option<&str>) -> Result<String, ConvertError> {
    let block = armor::find_block(armored, armor::PRIVATE_KEY_BLOCK).ok_or(ConvertError::NoPrivateKey)??;
    let key = SignedSecretKey::from_bytes(&block.data[..]).map_err(ConvertError::Parse)?;
    let primary = &key.primary_key;

    let user = key
        .details
        .users
        .first()
        .map(|user| user.id.id().to_string())
        .unwrap_or_default();
    info!(key_id = %Fingerprint::of(primary), user = %user, "read private key");

    if primary.algorithm() != PublicKeyAlgorithm::RSA {
        return Err(ConvertError::NotRsa(primary.algorithm()));
    }

    let encrypted = matches!(primary.secret_params(), SecretParams::Encrypted(_));
    if encrypted && passphrase.is_none() {
        return Err(ConvertError::PassphraseRequired);
    }
    if encrypted {
        debug!("decrypting secret key material");
    }

    let passphrase = passphrase.unwrap_or_default().to_string();
    let rsa_key = primary
        .unlock(
            || passphrase,
            |repr| match repr {
                SecretKeyRepr::RSA(key) => Ok(RsaPrivateKey::clone(key)),
                _ => Err(pgp::errors::Error::from("secret key is not an RSA key".to_string())),
            },
        )
        .map_err(ConvertError::Unlock)?;

    let pem = rsa_key.to_pkcs1_pem(LineEnding::LF).map_err(ConvertError::Encode)?;
    Ok(pem.to_string())
}

/// Wraps a PEM RSA private key (PKCS#1, or PKCS#8 as a fallback) into a
/// self-certified identity and renders its `.asc` bundle.
pub fn rsa_to_pgp(
    pem: &str,
    holder: &Holder,
    created_at: DateTime<Utc>,
) -> Result<String, ConvertError> {
    let rsa_key = match RsaPrivateKey::from_pkcs1_pem(pem) {
        Ok(key) => key,
        Err(pkcs1_err) => {
            debug!("not a PKCS#1 key, trying PKCS#8");
            RsaPrivateKey::from_pkcs8_pem(pem).map_err(|_| ConvertError::Decode(pkcs1_err))?
        }
    };

    let identity = Identity::from_rsa(&rsa_key, holder, created_at)?;
    info!(key_id = %identity.fingerprint(), user = identity.user_id(), "built identity");

    Ok(export::asc_bundle(&identity)?)
}
