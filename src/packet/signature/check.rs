use chrono::Utc;
use log::{error, info};

use crate::errors::{Error, Result};
use crate::types::KeyDetails;

use super::types::Signature;

/// Outcome code of a key/signature consistency check.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum KeyCheckCode {
    Consistent,
    /// The key claims to exist before the signature certifying it, or was
    /// created in the future.
    TimeConflict,
}

/// Advisory findings about a certifying signature and the key it
/// certifies, independent of cryptographic validity.
///
/// The check never mutates the signature's status; it only informs the
/// trust decisions made by the caller.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct KeyCheck {
    pub code: KeyCheckCode,
    pub key_expired: bool,
    pub key_revoked: bool,
}

impl KeyCheck {
    /// Turns a time conflict into a hard error for callers that treat the
    /// advisory findings as fatal.
    pub fn ensure_consistent(&self) -> Result<()> {
        match self.code {
            KeyCheckCode::Consistent => Ok(()),
            KeyCheckCode::TimeConflict => Err(Error::TimeConflict),
        }
    }
}

/// Checks a candidate signature against its holding key's clock and
/// revocation state.
pub fn check_key_signature(key: &dyn KeyDetails, sig: &Signature) -> KeyCheck {
    check_key_signature_at(key, sig, Utc::now().timestamp() as u32)
}

pub fn check_key_signature_at(key: &dyn KeyDetails, sig: &Signature, now: u32) -> KeyCheck {
    let mut check = KeyCheck {
        code: KeyCheckCode::Consistent,
        key_expired: false,
        key_revoked: false,
    };

    if key.created_at() > sig.created() {
        let d = key.created_at() - sig.created();
        error!(
            "public key {} is {} second{} newer than the signature",
            key.key_id(),
            d,
            if d == 1 { "" } else { "s" }
        );
        check.code = KeyCheckCode::TimeConflict;
        return check;
    }

    if key.created_at() > now {
        let d = key.created_at() - now;
        error!(
            "key {} was created {} second{} in the future (time warp or clock problem)",
            key.key_id(),
            d,
            if d == 1 { "" } else { "s" }
        );
        check.code = KeyCheckCode::TimeConflict;
        return check;
    }

    if key.expires_at().is_some_and(|expires| expires < now) {
        info!("NOTE: signature key {} expired", key.key_id());
        check.key_expired = true;
    }

    if key.is_revoked() {
        info!("NOTE: signature key {} has been revoked", key.key_id());
        check.key_revoked = true;
    }

    check
}
