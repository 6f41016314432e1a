use bytes::Bytes;

use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::types::KeyId;

/// The key accessors the signature engine consumes.
///
/// Keys are owned by the keyring layer; the engine only ever reads through
/// this trait and never mutates a key. Implementations must be shareable
/// across the async provider boundary.
pub trait KeyDetails: std::fmt::Debug + Send + Sync {
    /// Returns the [`KeyId`] for this key.
    fn key_id(&self) -> KeyId;

    /// Returns the public key algorithm of this key.
    fn algorithm(&self) -> PublicKeyAlgorithm;

    /// Raw public key material, as handed to the crypto provider.
    fn public_material(&self) -> &[u8];

    /// Raw secret key material, if the secret part of the key is available.
    fn secret_material(&self) -> Option<&[u8]>;

    /// Smartcard key identifier, passed through to the provider on signing.
    fn ski(&self) -> Option<&[u8]> {
        None
    }

    /// Canonical hash of the key's public packet, used as certification
    /// input.
    fn digest(&self) -> Bytes;

    /// Creation time, seconds since the epoch.
    fn created_at(&self) -> u32;

    /// Expiration time, seconds since the epoch. `None` means the key never
    /// expires.
    fn expires_at(&self) -> Option<u32>;

    /// Whether the holding keyring has marked this key revoked.
    fn is_revoked(&self) -> bool;
}

impl<T: KeyDetails> KeyDetails for &T {
    fn key_id(&self) -> KeyId {
        (*self).key_id()
    }

    fn algorithm(&self) -> PublicKeyAlgorithm {
        (*self).algorithm()
    }

    fn public_material(&self) -> &[u8] {
        (*self).public_material()
    }

    fn secret_material(&self) -> Option<&[u8]> {
        (*self).secret_material()
    }

    fn ski(&self) -> Option<&[u8]> {
        (*self).ski()
    }

    fn digest(&self) -> Bytes {
        (*self).digest()
    }

    fn created_at(&self) -> u32 {
        (*self).created_at()
    }

    fn expires_at(&self) -> Option<u32> {
        (*self).expires_at()
    }

    fn is_revoked(&self) -> bool {
        (*self).is_revoked()
    }
}
