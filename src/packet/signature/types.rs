use std::sync::Arc;

use bstr::BString;
use byteorder::{BigEndian, ByteOrder};
use bytes::Bytes;
use chrono::Utc;
use log::debug;
use num_enum::{FromPrimitive, IntoPrimitive};
use smallvec::SmallVec;

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::provider::CryptoProvider;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{from_provider, Error, Result};
use crate::types::{KeyDetails, KeyId, MpiBytes};

use super::de::SignatureFields;
use super::subpacket::{KeyFlags, RawSubpacket, SubpacketType, Subpackets};

/// The only signature packet version we produce or accept.
pub const SIG_VERSION: u8 = 4;

/// Signature Packet
///
/// Binds the issuing key to a primary key, user identity, subkey or
/// arbitrary data. Created either by [`generation`](Signature::generate)
/// or by [`loading`](Signature::load) previously parsed packet fields.
///
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.2>
#[derive(Clone, derive_more::Debug)]
pub struct Signature {
    pub(crate) typ: SignatureType,
    pub(crate) pub_alg: PublicKeyAlgorithm,
    pub(crate) hash_alg: HashAlgorithm,

    /// Creation time, seconds since the epoch.
    pub(crate) created: u32,
    /// Expiration time; equal to `created` when the signature never
    /// expires.
    pub(crate) expires: u32,
    /// Key id of the signing key.
    pub(crate) issuer: KeyId,

    #[debug("{}", hex::encode(hashed_area))]
    pub(crate) hashed_area: Bytes,
    #[debug("{}", hex::encode(unhashed_area))]
    pub(crate) unhashed_area: Bytes,

    #[debug("{}", hex::encode(digest_start))]
    pub(crate) digest_start: [u8; 2],
    pub(crate) signature: Vec<MpiBytes>,

    pub(crate) revocation: Option<(RevocationCode, BString)>,
    pub(crate) status: SignatureStatus,

    /// The key whose material produced (or can check) this signature.
    pub(crate) signer: Option<Arc<dyn KeyDetails>>,
    /// The key or identity this signature is attached to.
    pub(crate) holder: Arc<dyn KeyDetails>,
}

/// Validity state, written only by generation and verification; `revoked`
/// is a pass-through set by the holding key's revocation signature.
#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
pub struct SignatureStatus {
    pub valid: bool,
    pub verified: bool,
    pub revoked: bool,
}

impl Signature {
    /// Reconstructs a signature from already parsed packet fields, without
    /// touching the crypto provider.
    ///
    /// `pre_verified` must only be set for packets whose integrity is
    /// guaranteed by the caller (e.g. a previously validated store); it
    /// marks the signature valid and verified without any cryptographic
    /// check.
    pub fn load(
        fields: SignatureFields,
        holder: Arc<dyn KeyDetails>,
        pre_verified: bool,
    ) -> Signature {
        let mut sig = Signature {
            typ: fields.typ,
            pub_alg: fields.pub_alg,
            hash_alg: fields.hash_alg,
            created: fields.created,
            expires: fields.expires,
            issuer: fields.issuer,
            hashed_area: fields.hashed_area,
            unhashed_area: fields.unhashed_area,
            digest_start: fields.digest_start,
            signature: fields.signature,
            revocation: fields.revocation,
            status: SignatureStatus::default(),
            signer: None,
            holder,
        };

        if sig.is_self() {
            sig.signer = Some(sig.holder.clone());
        }
        if pre_verified {
            sig.status.valid = true;
            sig.status.verified = true;
        }

        sig
    }

    /// Attaches the resolved issuer key of a non-self signature, enabling
    /// verification.
    pub fn set_signer(&mut self, signer: Arc<dyn KeyDetails>) {
        self.signer = Some(signer);
    }

    /// The exact byte sequence submitted to the hash/sign primitive for
    /// this signature, including the trailing version/magic/length footer.
    ///
    /// The trailer length counts the 4 fixed header octets plus the 2
    /// length octets of the hashed-area prefix, so the metadata is bound
    /// cryptographically without being transmitted as its own field.
    pub fn digest_payload(&self) -> Vec<u8> {
        let n = self.hashed_area.len();

        let mut md = vec![
            SIG_VERSION,
            u8::from(self.typ),
            u8::from(self.pub_alg),
            u8::from(self.hash_alg),
            0u8,
            0u8,
        ];
        BigEndian::write_u16(&mut md[4..6], n as u16);
        md.extend_from_slice(&self.hashed_area);

        let mut trailer = [SIG_VERSION, 0xFF, 0, 0, 0, 0];
        BigEndian::write_u32(&mut trailer[2..], (n + 6) as u32);
        md.extend_from_slice(&trailer);

        md
    }

    /// Verifies this signature over `data`.
    ///
    /// Recomputes the digest over `data` and the signature's own metadata
    /// and delegates to the provider. On completion `verified` is set and
    /// `valid` reflects the provider's answer; on error the status is left
    /// untouched.
    pub async fn verify_data<P: CryptoProvider + ?Sized>(
        &mut self,
        data: &[u8],
        provider: &P,
    ) -> Result<bool> {
        let signer = self.signer.clone().ok_or(Error::MissingKey)?;
        debug!("verifying data against signature by {}", self.issuer);

        let mut md = Vec::with_capacity(data.len() + self.hashed_area.len() + 12);
        md.extend_from_slice(data);
        md.extend_from_slice(&self.digest_payload());

        let valid = provider
            .verify(
                signer.algorithm(),
                self.hash_alg,
                &self.signature,
                signer.public_material(),
                &md,
            )
            .await
            .map_err(from_provider)?;

        self.status.verified = true;
        self.status.valid = valid;

        Ok(valid)
    }

    /// Verifies this signature against the holding key's own canonical
    /// digest (the self-signature case).
    pub async fn verify<P: CryptoProvider + ?Sized>(&mut self, provider: &P) -> Result<bool> {
        let digest = self.holder.digest();
        self.verify_data(&digest, provider).await
    }

    /// Splits the provider's raw signature material into the wire MPIs.
    pub(crate) fn set_signature_bytes(&mut self, raw: Bytes) -> Result<()> {
        if self.pub_alg.uses_split_signature() {
            ensure!(
                !raw.is_empty() && raw.len() % 2 == 0,
                "dsa signature must split into two equal halves, got {} bytes",
                raw.len()
            );
            let half = raw.len() / 2;
            self.signature = vec![
                MpiBytes::from_raw(raw.slice(..half)),
                MpiBytes::from_raw(raw.slice(half..)),
            ];
        } else {
            self.signature = vec![MpiBytes::from_raw(raw)];
        }

        Ok(())
    }

    /// Returns what kind of signature this is.
    pub fn typ(&self) -> SignatureType {
        self.typ
    }

    pub fn pub_alg(&self) -> PublicKeyAlgorithm {
        self.pub_alg
    }

    /// The used `HashAlgorithm`.
    pub fn hash_alg(&self) -> HashAlgorithm {
        self.hash_alg
    }

    pub fn created(&self) -> u32 {
        self.created
    }

    pub fn expires(&self) -> u32 {
        self.expires
    }

    pub fn issuer(&self) -> KeyId {
        self.issuer
    }

    pub fn hashed_area(&self) -> &[u8] {
        &self.hashed_area
    }

    pub fn unhashed_area(&self) -> &[u8] {
        &self.unhashed_area
    }

    /// Only meaningful after a successful sign or verify.
    pub fn digest_start(&self) -> [u8; 2] {
        self.digest_start
    }

    pub fn signature_mpis(&self) -> &[MpiBytes] {
        &self.signature
    }

    pub fn status(&self) -> SignatureStatus {
        self.status
    }

    pub fn is_valid(&self) -> bool {
        self.status.valid
    }

    pub fn is_verified(&self) -> bool {
        self.status.verified
    }

    pub fn is_revoked(&self) -> bool {
        self.status.revoked
    }

    /// Reflects a revocation decided by the holding key's revocation
    /// signature.
    pub fn set_revoked(&mut self, revoked: bool) {
        self.status.revoked = revoked;
    }

    /// True if the issuer is the key this signature is attached to.
    pub fn is_self(&self) -> bool {
        self.issuer == self.holder.key_id()
    }

    pub fn is_non_self(&self) -> bool {
        self.issuer != self.holder.key_id()
    }

    /// True for all user id certification classes (0x10..=0x13).
    pub fn is_user_id_sig(&self) -> bool {
        (u8::from(self.typ) & !3) == u8::from(SignatureType::CertUserId)
    }

    /// True for certifications: user id classes plus direct key signatures.
    pub fn is_cert_sig(&self) -> bool {
        self.is_user_id_sig() || self.typ == SignatureType::DirectKey
    }

    pub fn is_user_id_rev(&self) -> bool {
        self.typ == SignatureType::CertRevocation
    }

    pub fn is_key_sig(&self) -> bool {
        self.typ == SignatureType::CertKey
    }

    pub fn is_subkey_sig(&self) -> bool {
        self.typ == SignatureType::SubkeyBinding
    }

    /// True for key revocations; subkey revocations are folded in here as
    /// well.
    pub fn is_key_rev(&self) -> bool {
        matches!(
            self.typ,
            SignatureType::KeyRevocation | SignatureType::SubkeyRevocation
        )
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp() as u32)
    }

    /// `expires == created` is the sentinel for "never expires".
    pub fn is_expired_at(&self, now: u32) -> bool {
        if self.expires == self.created {
            false
        } else {
            self.expires != 0 && now > self.expires
        }
    }

    /// True if the signature grants either of the encryption key flags.
    pub fn has_encryption_flag(&self) -> bool {
        let flags = self.key_flags();
        flags.encrypt_comms() || flags.encrypt_storage()
    }

    /// Well-formed subpackets of the hashed area; malformed tails are
    /// skipped so display paths degrade instead of failing.
    fn hashed_subpackets(&self) -> impl Iterator<Item = RawSubpacket<'_>> {
        Subpackets::new(&self.hashed_area).filter_map(|sub| match sub {
            Ok(sub) => Some(sub),
            Err(err) => {
                debug!("skipping malformed hashed subpacket: {:?}", err);
                None
            }
        })
    }

    pub fn key_flags(&self) -> KeyFlags {
        self.hashed_subpackets()
            .find(|s| s.typ == SubpacketType::KeyFlags)
            .map(|s| KeyFlags::from(s.payload))
            .unwrap_or_default()
    }

    pub fn preferred_hash_algs(&self) -> SmallVec<[HashAlgorithm; 8]> {
        self.hashed_subpackets()
            .find(|s| s.typ == SubpacketType::PreferredHashAlgorithms)
            .map(|s| s.payload.iter().map(|&b| HashAlgorithm::from(b)).collect())
            .unwrap_or_default()
    }

    pub fn preferred_sym_algs(&self) -> SmallVec<[SymmetricKeyAlgorithm; 8]> {
        self.hashed_subpackets()
            .find(|s| s.typ == SubpacketType::PreferredSymmetricAlgorithms)
            .map(|s| {
                s.payload
                    .iter()
                    .map(|&b| SymmetricKeyAlgorithm::from(b))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Revocation reason and comment, either as generated or as recovered
    /// from the hashed area of a loaded packet.
    pub fn revocation_reason(&self) -> Option<(RevocationCode, BString)> {
        if let Some(reason) = &self.revocation {
            return Some(reason.clone());
        }

        self.hashed_subpackets()
            .find(|s| s.typ == SubpacketType::RevocationReason)
            .and_then(|s| {
                let (&code, comment) = s.payload.split_first()?;
                Some((RevocationCode::from(code), BString::from(comment)))
            })
    }
}

/// Signature classes.
///
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.2.1>
#[derive(Debug, PartialEq, Eq, Copy, Clone, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum SignatureType {
    /// Signature of a binary document.
    Binary = 0x00,
    /// Signature of a canonical text document.
    Text = 0x01,
    /// Certification of a User ID and Public-Key packet.
    CertUserId = 0x10,
    /// Positive certification of a primary key and its User ID; the class
    /// used for key self-certifications.
    CertKey = 0x13,
    /// Subkey Binding Signature. Binds a subkey to the primary key.
    SubkeyBinding = 0x18,
    /// Signature directly on a key.
    DirectKey = 0x1F,
    /// Key revocation signature, calculated directly on the key being
    /// revoked.
    KeyRevocation = 0x20,
    /// Subkey revocation signature.
    SubkeyRevocation = 0x28,
    /// Certification revocation signature; revokes an earlier user id
    /// certification.
    CertRevocation = 0x30,

    #[num_enum(catch_all)]
    Other(u8),
}

/// Codes for revocation reasons.
///
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.2.3.23>
#[derive(Debug, PartialEq, Eq, Copy, Clone, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum RevocationCode {
    /// No reason specified (key revocations or cert revocations)
    NoReason = 0,
    /// Key is superseded (key revocations)
    KeySuperseded = 1,
    /// Key material has been compromised (key revocations)
    KeyCompromised = 2,
    /// Key is retired and no longer used (key revocations)
    KeyRetired = 3,
    /// User ID information is no longer valid (cert revocations)
    CertUserIdInvalid = 32,

    #[num_enum(catch_all)]
    Other(u8),
}
