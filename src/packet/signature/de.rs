use bstr::BString;
use bytes::{Buf, Bytes};

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::de::Deserialize;
use crate::errors::Result;
use crate::parsing::BufParsing;
use crate::types::{KeyId, MpiBytes};

use super::subpacket::{SubpacketType, Subpackets};
use super::types::{RevocationCode, SignatureType, SIG_VERSION};

/// Parsed signature packet fields, ready to be attached to a holding key
/// via [`Signature::load`](super::Signature::load).
#[derive(Clone, derive_more::Debug)]
pub struct SignatureFields {
    pub typ: SignatureType,
    pub pub_alg: PublicKeyAlgorithm,
    pub hash_alg: HashAlgorithm,
    pub created: u32,
    pub expires: u32,
    pub issuer: KeyId,
    #[debug("{}", hex::encode(hashed_area))]
    pub hashed_area: Bytes,
    #[debug("{}", hex::encode(unhashed_area))]
    pub unhashed_area: Bytes,
    #[debug("{}", hex::encode(digest_start))]
    pub digest_start: [u8; 2],
    pub signature: Vec<MpiBytes>,
    pub revocation: Option<(RevocationCode, BString)>,
}

impl Deserialize for SignatureFields {
    /// Parses a signature packet body.
    fn from_slice(input: &[u8]) -> Result<Self> {
        let mut buf = input;

        let version = buf.read_u8()?;
        if version != SIG_VERSION {
            unsupported_err!("signature version {}", version);
        }

        let typ = SignatureType::from(buf.read_u8()?);
        let pub_alg = PublicKeyAlgorithm::from(buf.read_u8()?);
        let hash_alg = HashAlgorithm::from(buf.read_u8()?);

        let hashed_len = buf.read_be_u16()?;
        let hashed_area = buf.read_take(hashed_len.into())?;
        let unhashed_len = buf.read_be_u16()?;
        let unhashed_area = buf.read_take(unhashed_len.into())?;

        let digest_start = buf.read_array::<2>()?;

        let mut signature = Vec::new();
        while buf.has_remaining() {
            signature.push(MpiBytes::from_buf(&mut buf)?);
        }

        let mut created = None;
        let mut expire_seconds = 0u32;
        let mut issuer = None;
        let mut revocation = None;

        for sub in Subpackets::new(&hashed_area).chain(Subpackets::new(&unhashed_area)) {
            let sub = sub?;
            match sub.typ {
                SubpacketType::SignatureCreationTime if created.is_none() => {
                    let mut p = sub.payload;
                    created = Some(p.read_be_u32()?);
                }
                SubpacketType::SignatureExpirationTime => {
                    let mut p = sub.payload;
                    expire_seconds = p.read_be_u32()?;
                }
                SubpacketType::Issuer if issuer.is_none() => {
                    issuer = Some(KeyId::from_slice(sub.payload)?);
                }
                SubpacketType::RevocationReason if revocation.is_none() => {
                    if let Some((&code, comment)) = sub.payload.split_first() {
                        revocation = Some((RevocationCode::from(code), BString::from(comment)));
                    }
                }
                _ => {}
            }
        }

        let Some(created) = created else {
            bail!("signature packet without creation time");
        };
        let Some(issuer) = issuer else {
            bail!("signature packet without issuer");
        };

        Ok(SignatureFields {
            typ,
            pub_alg,
            hash_alg,
            created,
            expires: created.saturating_add(expire_seconds),
            issuer,
            hashed_area,
            unhashed_area,
            digest_start,
            signature,
            revocation,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::errors::Error;
    use crate::packet::signature::testutil::{MockProvider, TestKey};
    use crate::packet::signature::{Signature, SignatureParams, SignatureType};
    use crate::ser::Serialize;
    use crate::types::KeyDetails;

    use super::*;

    async fn generated(typ: SignatureType, key: Arc<TestKey>, provider: &MockProvider) -> Signature {
        let mut builder = SignatureParams::builder();
        builder
            .signer(key.clone())
            .typ(typ)
            .target_data(key.digest())
            .created(Some(1000));
        // expiration only reaches the wire for the classes that hash it
        if matches!(typ, SignatureType::CertKey | SignatureType::SubkeyBinding) {
            builder.expire_seconds(500);
        }
        if matches!(
            typ,
            SignatureType::KeyRevocation
                | SignatureType::SubkeyRevocation
                | SignatureType::CertRevocation
        ) {
            builder.revocation(Some((
                RevocationCode::KeyCompromised,
                BString::from("stolen laptop"),
            )));
        }
        Signature::generate(builder.build().unwrap(), provider)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_roundtrip_all_classes() {
        let provider = MockProvider::new();
        for typ in [
            SignatureType::Binary,
            SignatureType::Text,
            SignatureType::CertUserId,
            SignatureType::CertKey,
            SignatureType::SubkeyBinding,
            SignatureType::KeyRevocation,
            SignatureType::SubkeyRevocation,
            SignatureType::CertRevocation,
        ] {
            let key = Arc::new(TestKey::new(42, PublicKeyAlgorithm::RSA));
            let sig = generated(typ, key.clone(), &provider).await;

            let body = sig.to_bytes().unwrap();
            let fields = SignatureFields::from_slice(&body).unwrap();

            assert_eq!(fields.typ, typ);
            assert_eq!(fields.created, sig.created());
            assert_eq!(fields.expires, sig.expires());
            assert_eq!(fields.issuer, key.key_id());
            assert_eq!(fields.digest_start, sig.digest_start());
            assert_eq!(&fields.hashed_area[..], sig.hashed_area());
            assert_eq!(&fields.unhashed_area[..], sig.unhashed_area());

            // a reloaded signature still verifies against the same data
            let mut reloaded = Signature::load(fields, key.clone(), false);
            assert!(!reloaded.is_valid());
            let valid = reloaded
                .verify_data(&key.digest(), &provider)
                .await
                .unwrap();
            assert!(valid, "roundtrip of {:?} must verify", typ);
            assert!(reloaded.is_valid());

            // and the reloaded serialization is byte identical
            assert_eq!(reloaded.to_bytes().unwrap(), body);
        }
    }

    #[tokio::test]
    async fn test_dsa_roundtrip() {
        let provider = MockProvider::new();
        let key = Arc::new(TestKey::new(3, PublicKeyAlgorithm::DSA));
        let sig = generated(SignatureType::Binary, key.clone(), &provider).await;

        let body = sig.to_bytes().unwrap();
        let fields = SignatureFields::from_slice(&body).unwrap();
        assert_eq!(fields.signature.len(), 2);

        let mut reloaded = Signature::load(fields, key.clone(), false);
        assert!(reloaded
            .verify_data(&key.digest(), &provider)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_load_pre_verified_skips_provider() {
        let provider = MockProvider::new();
        let key = Arc::new(TestKey::new(4, PublicKeyAlgorithm::RSA));
        let body = {
            let sig = generated(SignatureType::CertKey, key.clone(), &provider).await;
            sig.to_bytes().unwrap()
        };
        let calls_after_generate = provider.call_count();

        let fields = SignatureFields::from_slice(&body).unwrap();
        let sig = Signature::load(fields, key.clone(), true);

        assert!(sig.is_valid());
        assert!(sig.is_verified());
        assert!(sig.is_self());
        assert_eq!(provider.call_count(), calls_after_generate);
    }

    #[tokio::test]
    async fn test_load_non_self_has_no_signer() {
        let provider = MockProvider::new();
        let signer = Arc::new(TestKey::new(5, PublicKeyAlgorithm::RSA));
        let holder = Arc::new(TestKey::new(6, PublicKeyAlgorithm::RSA));
        let body = {
            let params = SignatureParams::builder()
                .signer(signer.clone())
                .holder(Some(holder.clone() as Arc<dyn KeyDetails>))
                .typ(SignatureType::CertUserId)
                .target_data(holder.digest())
                .build()
                .unwrap();
            Signature::generate(params, &provider)
                .await
                .unwrap()
                .to_bytes()
                .unwrap()
        };

        let fields = SignatureFields::from_slice(&body).unwrap();
        let mut sig = Signature::load(fields, holder.clone(), false);
        assert!(sig.is_non_self());

        // verification requires resolving the issuer key first
        let err = sig.verify_data(b"x", &provider).await.unwrap_err();
        assert!(matches!(err, Error::MissingKey));

        sig.set_signer(signer);
        assert!(sig
            .verify_data(&holder.digest(), &provider)
            .await
            .unwrap());
    }

    #[test]
    fn test_truncated_body() {
        let err = SignatureFields::from_slice(&[4, 0x13, 1]).unwrap_err();
        assert!(matches!(err, Error::MalformedLength { .. }));

        // hashed length claims more than the buffer holds
        let err = SignatureFields::from_slice(&[4, 0x13, 1, 2, 0x10, 0x00]).unwrap_err();
        assert!(matches!(err, Error::MalformedLength { .. }));
    }

    #[test]
    fn test_unsupported_version() {
        let err = SignatureFields::from_slice(&[3, 0x13, 1, 2, 0, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, Error::Unsupported { .. }));
    }
}
