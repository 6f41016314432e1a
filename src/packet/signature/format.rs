use bstr::BString;
use chrono::{DateTime, Utc};

use super::types::{RevocationCode, Signature, SignatureType};

/// Purely derived render model of a signature, for listing and detail
/// views. Unknown codes degrade to "unknown" labels instead of failing the
/// whole rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureDetails {
    /// Upper-hex issuer key id.
    pub id: String,
    pub class_label: &'static str,
    pub revoked: bool,
    pub expired: bool,
    pub verified: bool,
    pub valid: bool,
    pub key_flags_labels: Vec<&'static str>,
    pub hash_algo_labels: Vec<String>,
    pub sym_algo_labels: Vec<String>,
    pub revocation_label: Option<String>,
    pub revocation_comment: Option<BString>,
    pub created_date: Option<DateTime<Utc>>,
    /// Absent for signatures that never expire.
    pub expiration_date: Option<DateTime<Utc>>,
}

impl Signature {
    /// Builds the display view of this signature.
    pub fn details(&self) -> SignatureDetails {
        let revocation = self.revocation_reason();

        SignatureDetails {
            id: self.issuer().to_hex(),
            class_label: class_label(self.typ()),
            revoked: self.is_revoked(),
            expired: self.is_expired(),
            verified: self.is_verified(),
            valid: self.is_valid(),
            key_flags_labels: key_flags_labels(self),
            hash_algo_labels: self
                .preferred_hash_algs()
                .iter()
                .map(|a| a.to_string())
                .collect(),
            sym_algo_labels: self
                .preferred_sym_algs()
                .iter()
                .map(|a| a.to_string())
                .collect(),
            revocation_label: revocation
                .as_ref()
                .map(|(code, _)| revocation_label(self, *code)),
            revocation_comment: revocation.map(|(_, comment)| comment),
            created_date: DateTime::from_timestamp(i64::from(self.created()), 0),
            expiration_date: if self.expires() == self.created() {
                None
            } else {
                DateTime::from_timestamp(i64::from(self.expires()), 0)
            },
        }
    }
}

fn class_label(typ: SignatureType) -> &'static str {
    match typ {
        SignatureType::Binary => "binary document signature",
        SignatureType::Text => "text document signature",
        SignatureType::CertUserId => "user id certification",
        SignatureType::CertKey => "key certification",
        SignatureType::SubkeyBinding => "subkey binding",
        SignatureType::DirectKey => "direct key signature",
        SignatureType::KeyRevocation => "key revocation",
        SignatureType::SubkeyRevocation => "subkey revocation",
        SignatureType::CertRevocation => "user id revocation",
        SignatureType::Other(_) => "unknown signature class",
    }
}

fn key_flags_labels(sig: &Signature) -> Vec<&'static str> {
    let flags = sig.key_flags();

    let mut labels = Vec::new();
    if flags.certify() {
        labels.push("certify");
    }
    if flags.sign() {
        labels.push("sign");
    }
    if flags.encrypt_comms() {
        labels.push("encrypt communications");
    }
    if flags.encrypt_storage() {
        labels.push("encrypt storage");
    }
    if flags.shared() {
        labels.push("split key");
    }
    if flags.authentication() {
        labels.push("authentication");
    }
    if flags.group() {
        labels.push("group key");
    }
    labels
}

/// Human readable revocation reason; reasons that are not meaningful for
/// the signature's class are called out as invalid rather than shown as
/// legitimate.
fn revocation_label(sig: &Signature, code: RevocationCode) -> String {
    let label = match code {
        RevocationCode::NoReason => "no reason specified",
        RevocationCode::KeySuperseded if sig.is_key_rev() => "key is superseded",
        RevocationCode::KeyCompromised if sig.is_key_rev() => "key material has been compromised",
        RevocationCode::KeyRetired if sig.is_key_rev() => "key is retired and no longer used",
        RevocationCode::KeySuperseded
        | RevocationCode::KeyCompromised
        | RevocationCode::KeyRetired => "invalid key revocation reason",
        RevocationCode::CertUserIdInvalid if sig.is_user_id_rev() => "user id is no longer valid",
        RevocationCode::CertUserIdInvalid => "invalid certification revocation reason",
        RevocationCode::Other(n) if (100..=110).contains(&n) => "private or experimental reason",
        RevocationCode::Other(_) => "unknown revocation reason",
    };

    label.to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;

    use crate::crypto::public_key::PublicKeyAlgorithm;
    use crate::packet::signature::testutil::{MockProvider, TestKey};
    use crate::packet::signature::SignatureParams;

    use super::*;

    async fn generate(
        typ: SignatureType,
        revocation: Option<(RevocationCode, BString)>,
    ) -> Signature {
        let key = Arc::new(TestKey::new(0x11, PublicKeyAlgorithm::RSA));
        let mut builder = SignatureParams::builder();
        builder
            .signer(key)
            .typ(typ)
            .target_data(Bytes::from_static(b"digest"))
            .created(Some(1000))
            .revocation(revocation);
        Signature::generate(builder.build().unwrap(), &MockProvider::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_uid_rev_details() {
        let sig = generate(
            SignatureType::CertRevocation,
            Some((RevocationCode::CertUserIdInvalid, BString::from("moved"))),
        )
        .await;
        let details = sig.details();

        assert_eq!(details.id, "1102030405060708");
        assert_eq!(details.class_label, "user id revocation");
        assert_eq!(
            details.revocation_label.as_deref(),
            Some("user id is no longer valid")
        );
        assert_eq!(details.revocation_comment, Some(BString::from("moved")));
        assert!(details.valid);
        assert!(details.verified);
    }

    #[tokio::test]
    async fn test_reason_class_mismatch() {
        // a user id reason on a key revocation is flagged as invalid
        let sig = generate(
            SignatureType::KeyRevocation,
            Some((RevocationCode::CertUserIdInvalid, BString::from(""))),
        )
        .await;
        assert_eq!(
            sig.details().revocation_label.as_deref(),
            Some("invalid certification revocation reason")
        );

        let sig = generate(
            SignatureType::CertRevocation,
            Some((RevocationCode::KeyCompromised, BString::from(""))),
        )
        .await;
        assert_eq!(
            sig.details().revocation_label.as_deref(),
            Some("invalid key revocation reason")
        );
    }

    #[tokio::test]
    async fn test_unknown_and_private_reasons() {
        let sig = generate(
            SignatureType::KeyRevocation,
            Some((RevocationCode::Other(105), BString::from(""))),
        )
        .await;
        assert_eq!(
            sig.details().revocation_label.as_deref(),
            Some("private or experimental reason")
        );

        let sig = generate(
            SignatureType::KeyRevocation,
            Some((RevocationCode::Other(0x55), BString::from(""))),
        )
        .await;
        assert_eq!(
            sig.details().revocation_label.as_deref(),
            Some("unknown revocation reason")
        );
    }

    #[tokio::test]
    async fn test_cert_key_labels() {
        let sig = generate(SignatureType::CertKey, None).await;
        let details = sig.details();

        assert_eq!(details.class_label, "key certification");
        assert_eq!(details.key_flags_labels, vec!["certify", "sign"]);
        assert_eq!(
            details.hash_algo_labels,
            vec!["SHA256", "SHA1", "SHA384", "SHA512", "SHA224"]
        );
        assert_eq!(
            details.sym_algo_labels,
            vec!["AES256", "AES192", "AES128", "CAST5", "TripleDES"]
        );
        assert!(details.revocation_label.is_none());
        // expire_seconds defaulted to 0: never expires
        assert!(details.expiration_date.is_none());
        assert_eq!(
            details.created_date,
            DateTime::from_timestamp(1000, 0)
        );
    }
}
