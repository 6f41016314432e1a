use std::sync::Arc;

use bstr::BString;
use byteorder::{BigEndian, ByteOrder};
use bytes::Bytes;
use chrono::Utc;
use derive_builder::Builder;
use log::debug;

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::provider::CryptoProvider;
use crate::errors::{from_provider, Error, Result};
use crate::types::{KeyDetails, KeyId};

use super::subpacket::{write_subpacket, SubpacketType};
use super::types::{RevocationCode, Signature, SignatureStatus, SignatureType};

/// Pre-encoded key flags subpacket (certify + sign) hashed into key
/// self-certifications.
const KEY_CERT_FLAGS: [u8; 3] = [2, 27, 3];

/// Pre-encoded preference subpackets hashed into key self-certifications:
/// preferred symmetric, hash and compression algorithms, features, and key
/// server preferences. Kept as a raw byte block so emitted packets match
/// the existing store octet for octet.
const KEY_CERT_PREFERENCES: [u8; 25] = [
    6, 11, 9, 8, 7, 3, 2, // sym: AES256, AES192, AES128, CAST5, TripleDES
    6, 21, 8, 2, 9, 10, 11, // hash: SHA256, SHA1, SHA384, SHA512, SHA224
    4, 22, 2, 3, 1, // compression: ZLIB, BZip2, ZIP
    2, 30, 1, // features: modification detection
    2, 23, 128, // key server: no-modify
];

/// Key flags granted to bound subkeys.
const SUBKEY_FLAGS: u8 = 12;

/// Inputs for [`Signature::generate`].
#[derive(Clone, derive_more::Debug, Builder)]
#[builder(build_fn(error = "Error"))]
pub struct SignatureParams {
    /// The key producing the signature.
    pub signer: Arc<dyn KeyDetails>,
    /// The key the signature will be attached to; the signer itself when
    /// absent (self-signature).
    #[builder(default)]
    pub holder: Option<Arc<dyn KeyDetails>>,
    /// Digest of the certification target (key digest, optionally followed
    /// by an identity digest), or the document bytes for content
    /// signatures. Hashed ahead of the signature's own metadata.
    #[debug("{}", hex::encode(target_data))]
    pub target_data: Bytes,
    pub typ: SignatureType,
    /// Creation time, seconds since the epoch; now when absent.
    #[builder(default)]
    pub created: Option<u32>,
    /// Seconds until expiration; 0 means the signature never expires.
    #[builder(default)]
    pub expire_seconds: u32,
    #[builder(default)]
    pub hash_alg: HashAlgorithm,
    /// Reason code and comment, for the revocation classes.
    #[builder(default)]
    pub revocation: Option<(RevocationCode, BString)>,
}

impl SignatureParams {
    pub fn builder() -> SignatureParamsBuilder {
        SignatureParamsBuilder::default()
    }
}

impl Signature {
    /// Builds a brand new signature packet and commits it by invoking the
    /// crypto provider.
    ///
    /// The hashed subpacket area is fully determined by the signature
    /// class; the unhashed area always carries exactly the issuer key id.
    /// On provider failure the error propagates and nothing escapes; the
    /// engine never retries.
    pub async fn generate<P: CryptoProvider + ?Sized>(
        params: SignatureParams,
        provider: &P,
    ) -> Result<Signature> {
        let SignatureParams {
            signer,
            holder,
            target_data,
            typ,
            created,
            expire_seconds,
            hash_alg,
            revocation,
        } = params;

        let created = created.unwrap_or_else(|| Utc::now().timestamp() as u32);
        let issuer = signer.key_id();
        let holder = holder.unwrap_or_else(|| signer.clone());

        let hashed_area =
            write_hashed_area(typ, created, expire_seconds, issuer, revocation.as_ref())?;
        let unhashed_area = write_unhashed_area(issuer)?;

        let mut sig = Signature {
            typ,
            pub_alg: signer.algorithm(),
            hash_alg,
            created,
            expires: created.saturating_add(expire_seconds),
            issuer,
            hashed_area,
            unhashed_area,
            digest_start: [0u8; 2],
            signature: Vec::new(),
            revocation,
            status: SignatureStatus::default(),
            signer: Some(signer.clone()),
            holder,
        };

        debug!("signing {:?} as issuer {}", sig.typ, sig.issuer);

        let mut md = Vec::with_capacity(target_data.len() + sig.hashed_area.len() + 12);
        md.extend_from_slice(&target_data);
        md.extend_from_slice(&sig.digest_payload());

        let secret = signer.secret_material().ok_or(Error::MissingKey)?;
        let out = provider
            .sign(
                hash_alg,
                sig.pub_alg,
                signer.public_material(),
                secret,
                signer.ski(),
                &md,
            )
            .await
            .map_err(from_provider)?;

        sig.digest_start = out.digest_start;
        sig.set_signature_bytes(out.signature)?;
        sig.status.valid = true;
        sig.status.verified = true;

        Ok(sig)
    }
}

/// Builds the class-determined hashed subpacket area.
fn write_hashed_area(
    typ: SignatureType,
    created: u32,
    expire_seconds: u32,
    issuer: KeyId,
    revocation: Option<&(RevocationCode, BString)>,
) -> Result<Bytes> {
    let mut created_buf = [0u8; 4];
    BigEndian::write_u32(&mut created_buf, created);

    let mut area = Vec::new();
    match typ {
        SignatureType::CertKey => {
            write_subpacket(SubpacketType::SignatureCreationTime, &created_buf, &mut area)?;
            area.extend_from_slice(&KEY_CERT_FLAGS);

            let mut expire = [0u8; 4];
            BigEndian::write_u32(&mut expire, expire_seconds);
            write_subpacket(SubpacketType::SignatureExpirationTime, &expire, &mut area)?;

            area.extend_from_slice(&KEY_CERT_PREFERENCES);
        }
        SignatureType::SubkeyBinding => {
            write_subpacket(SubpacketType::SignatureCreationTime, &created_buf, &mut area)?;
            write_subpacket(SubpacketType::KeyFlags, &[SUBKEY_FLAGS], &mut area)?;

            let mut expire = [0u8; 4];
            BigEndian::write_u32(&mut expire, expire_seconds);
            write_subpacket(SubpacketType::SignatureExpirationTime, &expire, &mut area)?;
        }
        SignatureType::Binary | SignatureType::Text => {
            write_subpacket(SubpacketType::SignatureCreationTime, &created_buf, &mut area)?;
        }
        SignatureType::KeyRevocation
        | SignatureType::SubkeyRevocation
        | SignatureType::CertRevocation => {
            write_subpacket(SubpacketType::SignatureCreationTime, &created_buf, &mut area)?;

            let default = (RevocationCode::NoReason, BString::from(""));
            let (code, comment) = revocation.unwrap_or(&default);
            let mut payload = Vec::with_capacity(1 + comment.len());
            payload.push(u8::from(*code));
            payload.extend_from_slice(comment.as_slice());
            write_subpacket(SubpacketType::RevocationReason, &payload, &mut area)?;

            // the creation time is hashed a second time; existing packets
            // carry the duplicate, so keep emitting it
            write_subpacket(SubpacketType::SignatureCreationTime, &created_buf, &mut area)?;
        }
        SignatureType::CertUserId => {
            write_subpacket(SubpacketType::SignatureCreationTime, &created_buf, &mut area)?;
            write_subpacket(SubpacketType::Issuer, issuer.as_ref(), &mut area)?;
        }
        _ => {
            return Err(Error::UnsupportedSignatureClass { typ: typ.into() });
        }
    }

    Ok(area.into())
}

/// The unhashed area always carries exactly the issuer key id.
fn write_unhashed_area(issuer: KeyId) -> Result<Bytes> {
    let mut area = Vec::new();
    write_subpacket(SubpacketType::Issuer, issuer.as_ref(), &mut area)?;
    Ok(area.into())
}
