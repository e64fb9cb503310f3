//! RSA key material as an OpenPGP primary key packet.

use chrono::{DateTime, Utc};
use num_bigint_dig::traits::ModInverse;
use pgp::crypto::public_key::PublicKeyAlgorithm;
use pgp::packet;
use pgp::types::{KeyVersion, PlainSecretParams, PublicParams, SecretKeyTrait, SecretParams, Version};
use rand::{CryptoRng, RngCore};
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::RsaPrivateKey;

use super::{Fingerprint, GenerationError};

/// A freshly generated (or imported) RSA keypair bound to a creation time.
///
/// The creation time is part of the hashed key packet, so the same RSA
/// numbers yield a different fingerprint for every timestamp.
#[derive(Debug, Clone)]
pub struct KeyMaterial {
    /// The unencrypted v4 secret key packet
    key: packet::SecretKey,
    /// Key ID of the primary key
    fingerprint: Fingerprint,
}

impl KeyMaterial {
    /// Generates a new random RSA keypair of `bits` strength.
    ///
    /// Sizes the RSA primitive refuses surface as [`GenerationError::KeyPair`].
    pub fn generate<R: CryptoRng + RngCore>(
        rng: &mut R,
        bits: usize,
        created_at: DateTime<Utc>,
    ) -> Result<Self, GenerationError> {
        let rsa_key = RsaPrivateKey::new(rng, bits)?;
        Self::from_rsa(&rsa_key, created_at)
    }

    /// Wraps an existing RSA private key.
    pub fn from_rsa(
        rsa_key: &RsaPrivateKey,
        created_at: DateTime<Utc>,
    ) -> Result<Self, GenerationError> {
        let (p, q) = match rsa_key.primes() {
            [p, q] => (p, q),
            primes => return Err(GenerationError::UnsupportedPrimes(primes.len())),
        };

        // OpenPGP stores u = p^-1 mod q
        let u = p
            .clone()
            .mod_inverse(q)
            .and_then(|u| u.to_biguint())
            .ok_or(GenerationError::InvalidKey)?;

        let public = packet::PublicKey::new(
            Version::New,
            KeyVersion::V4,
            PublicKeyAlgorithm::RSA,
            created_at,
            None,
            PublicParams::RSA {
                n: rsa_key.n().into(),
                e: rsa_key.e().into(),
            },
        )
        .map_err(GenerationError::Packet)?;

        let key = packet::SecretKey::new(
            public,
            SecretParams::Plain(PlainSecretParams::RSA {
                d: rsa_key.d().into(),
                p: p.into(),
                q: q.into(),
                u: u.into(),
            }),
        );
        let fingerprint = Fingerprint::of(&key);

        Ok(Self { key, fingerprint })
    }

    /// Returns the key ID of the primary key.
    #[inline]
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Returns the secret key packet.
    pub fn secret_key(&self) -> &packet::SecretKey {
        &self.key
    }

    /// Returns the public half as a key packet.
    pub fn public_key(&self) -> packet::PublicKey {
        self.key.public_key()
    }

    /// Consumes the material, returning the secret key packet.
    pub fn into_secret_key(self) -> packet::SecretKey {
        self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pgp::types::PublicKeyTrait;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn test_key_generation() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let material = KeyMaterial::generate(&mut rng, 1024, timestamp()).unwrap();
        assert_eq!(material.fingerprint(), Fingerprint::of(&material.public_key()));
        assert_eq!(material.public_key().created_at(), &timestamp());
    }

    #[test]
    fn test_deterministic_fingerprint() {
        let a = KeyMaterial::generate(&mut ChaCha8Rng::seed_from_u64(7), 1024, timestamp()).unwrap();
        let b = KeyMaterial::generate(&mut ChaCha8Rng::seed_from_u64(7), 1024, timestamp()).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_timestamp_changes_fingerprint() {
        let rsa_key = RsaPrivateKey::new(&mut ChaCha8Rng::seed_from_u64(3), 1024).unwrap();
        let a = KeyMaterial::from_rsa(&rsa_key, timestamp()).unwrap();
        let b = KeyMaterial::from_rsa(&rsa_key, timestamp() + chrono::Duration::seconds(1)).unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_unsupported_size() {
        let result = KeyMaterial::generate(&mut ChaCha8Rng::seed_from_u64(0), 0, timestamp());
        assert!(matches!(result, Err(GenerationError::KeyPair(_))));
    }
}
