//! OpenPGP identity generation.

use chrono::{DateTime, SubsecRound, Utc};
use pgp::composed::{SignedKeyDetails, SignedPublicKey, SignedSecretKey};
use pgp::crypto::hash::HashAlgorithm;
use pgp::crypto::sym::SymmetricKeyAlgorithm;
use pgp::packet::{self, KeyFlags, SignatureConfig, SignatureType, Subpacket, SubpacketData, UserId};
use pgp::types::{CompressionAlgorithm, PublicKeyTrait, SignedUser, Tag, Version};
use rand::{CryptoRng, RngCore};
use rsa::RsaPrivateKey;
use smallvec::smallvec;

use super::{Fingerprint, GenerationError, KeyMaterial};

/// The human side of an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holder {
    name: String,
    comment: String,
    email: String,
}

impl Holder {
    /// Creates a holder; an empty comment is left out of the user id.
    pub fn new(
        name: impl Into<String>,
        comment: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            comment: comment.into(),
            email: email.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Formats the user id as `Name <Email>` or `Name (Comment) <Email>`.
    pub fn user_id(&self) -> String {
        if self.comment.is_empty() {
            format!("{} <{}>", self.name, self.email)
        } else {
            format!("{} ({}) <{}>", self.name, self.comment, self.email)
        }
    }
}

/// A self-certified OpenPGP key with exactly one user id.
#[derive(Debug, Clone)]
pub struct Identity {
    key: SignedSecretKey,
    user_id: String,
    fingerprint: Fingerprint,
}

impl Identity {
    /// Generates a fresh identity using the thread-local CSPRNG.
    pub fn generate(
        holder: &Holder,
        created_at: DateTime<Utc>,
        bits: usize,
    ) -> Result<Self, GenerationError> {
        Self::generate_with_rng(&mut rand::thread_rng(), holder, created_at, bits)
    }

    /// Generates a fresh identity from the given randomness.
    ///
    /// Identical randomness and creation time yield an identical identity.
    pub fn generate_with_rng<R: CryptoRng + RngCore>(
        rng: &mut R,
        holder: &Holder,
        created_at: DateTime<Utc>,
        bits: usize,
    ) -> Result<Self, GenerationError> {
        let created_at = created_at.trunc_subsecs(0);
        let material = KeyMaterial::generate(rng, bits, created_at)?;
        Self::certify(material, holder, created_at)
    }

    /// Builds an identity around an existing RSA private key.
    pub fn from_rsa(
        rsa_key: &RsaPrivateKey,
        holder: &Holder,
        created_at: DateTime<Utc>,
    ) -> Result<Self, GenerationError> {
        let created_at = created_at.trunc_subsecs(0);
        let material = KeyMaterial::from_rsa(rsa_key, created_at)?;
        Self::certify(material, holder, created_at)
    }

    /// Binds the holder's user id to the key material.
    ///
    /// Two SHA-256 certifications are issued, both at `created_at`: the
    /// positive self-signature carrying key flags and preferences, and a
    /// generic identity certification.
    fn certify(
        material: KeyMaterial,
        holder: &Holder,
        created_at: DateTime<Utc>,
    ) -> Result<Self, GenerationError> {
        let fingerprint = material.fingerprint();
        let key = material.into_secret_key();
        let user_id = holder.user_id();
        let id = UserId::from_str(Version::New, &user_id);

        let mut flags = KeyFlags::default();
        flags.set_certify(true);
        flags.set_sign(true);

        let mut self_signature = signature_config(SignatureType::CertPositive, &key, created_at);
        self_signature.hashed_subpackets.extend([
            Subpacket::regular(SubpacketData::IsPrimary(true)),
            Subpacket::regular(SubpacketData::KeyFlags(flags.into())),
            Subpacket::regular(SubpacketData::PreferredSymmetricAlgorithms(smallvec![
                SymmetricKeyAlgorithm::AES256
            ])),
            Subpacket::regular(SubpacketData::PreferredHashAlgorithms(smallvec![
                HashAlgorithm::SHA2_256
            ])),
            Subpacket::regular(SubpacketData::PreferredCompressionAlgorithms(smallvec![
                CompressionAlgorithm::Uncompressed
            ])),
        ]);
        let self_signature = self_signature
            .sign_certification(&key, String::new, Tag::UserId, &id)
            .map_err(GenerationError::Signature)?;

        let certification = signature_config(SignatureType::CertGeneric, &key, created_at)
            .sign_certification(&key, String::new, Tag::UserId, &id)
            .map_err(GenerationError::Signature)?;

        let details = SignedKeyDetails::new(
            vec![],
            vec![],
            vec![SignedUser::new(id, vec![self_signature, certification])],
            vec![],
        );

        Ok(Self {
            key: SignedSecretKey::new(key, details, vec![], vec![]),
            user_id,
            fingerprint,
        })
    }

    /// Returns the key ID of the primary key.
    #[inline]
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Returns the bound user id string.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Returns the creation time shared by the key and its certifications.
    pub fn created_at(&self) -> DateTime<Utc> {
        *self.key.primary_key.created_at()
    }

    /// Returns the transferable secret key.
    pub fn secret_key(&self) -> &SignedSecretKey {
        &self.key
    }

    /// Returns the transferable public key.
    pub fn public_key(&self) -> SignedPublicKey {
        SignedPublicKey::from(self.key.clone())
    }
}

/// V4 SHA-256 certification issued by `key` at `created_at`.
fn signature_config(
    typ: SignatureType,
    key: &packet::SecretKey,
    created_at: DateTime<Utc>,
) -> SignatureConfig {
    let mut config = SignatureConfig::v4(typ, key.algorithm(), HashAlgorithm::SHA2_256);
    config.hashed_subpackets = vec![
        Subpacket::regular(SubpacketData::SignatureCreationTime(created_at)),
        Subpacket::regular(SubpacketData::IssuerFingerprint(key.fingerprint())),
    ];
    config.unhashed_subpackets = vec![Subpacket::regular(SubpacketData::Issuer(key.key_id()))];
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pgp::ser::Serialize;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn holder() -> Holder {
        Holder::new("Alice Example", "", "alice@example.org")
    }

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2014, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_user_id_without_comment() {
        assert_eq!(holder().user_id(), "Alice Example <alice@example.org>");
    }

    #[test]
    fn test_user_id_with_comment() {
        let holder = Holder::new("Alice Example", "work", "alice@example.org");
        assert_eq!(holder.user_id(), "Alice Example (work) <alice@example.org>");
    }

    #[test]
    fn test_generated_identity_is_self_certified() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let identity = Identity::generate_with_rng(&mut rng, &holder(), timestamp(), 1024).unwrap();

        identity.secret_key().verify().unwrap();
        identity.public_key().verify().unwrap();
        assert_eq!(identity.created_at(), timestamp());
        assert_eq!(identity.fingerprint(), Fingerprint::of(&identity.public_key()));

        let users = &identity.secret_key().details.users;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id.id().to_string(), "Alice Example <alice@example.org>");

        let signatures = &users[0].signatures;
        assert_eq!(signatures.len(), 2);
        assert_eq!(signatures[0].typ(), SignatureType::CertPositive);
        assert_eq!(signatures[1].typ(), SignatureType::CertGeneric);
        for sig in signatures {
            assert_eq!(sig.hash_alg(), HashAlgorithm::SHA2_256);
            assert_eq!(sig.created(), Some(&timestamp()));
        }
        assert!(signatures[0].is_primary());
        assert!(signatures[0].key_flags().certify());
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = Identity::generate_with_rng(&mut ChaCha8Rng::seed_from_u64(5), &holder(), timestamp(), 1024)
            .unwrap();
        let b = Identity::generate_with_rng(&mut ChaCha8Rng::seed_from_u64(5), &holder(), timestamp(), 1024)
            .unwrap();

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.public_key().to_bytes().unwrap(), b.public_key().to_bytes().unwrap());
    }

    #[test]
    fn test_subsecond_creation_time_is_truncated() {
        let precise = timestamp() + chrono::Duration::milliseconds(750);
        let identity =
            Identity::generate_with_rng(&mut ChaCha8Rng::seed_from_u64(2), &holder(), precise, 1024).unwrap();
        assert_eq!(identity.created_at(), timestamp());
    }
}
