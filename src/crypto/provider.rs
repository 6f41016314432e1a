//! Adapter to the external asymmetric crypto collaborator.
//!
//! Sign and verify are potentially long-running (hardware tokens, remote
//! agents) and are modelled as single-completion async operations. The
//! engine issues a request and awaits exactly one completion; it never
//! retries — retry policy belongs to the orchestrator.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::{Error, ProviderError};
use crate::types::MpiBytes;

/// Result of a completed signing request.
#[derive(Clone, derive_more::Debug)]
pub struct SignOutput {
    /// First two bytes of the digest the provider signed, stored in the
    /// packet for quick-match display.
    #[debug("{}", hex::encode(digest_start))]
    pub digest_start: [u8; 2],
    /// Raw signature material; split into MPIs by the engine according to
    /// the public key algorithm.
    #[debug("{}", hex::encode(signature))]
    pub signature: Bytes,
}

/// The boundary to the external hash/sign/verify collaborators.
///
/// Implementations hash `data` with `hash_alg` themselves and sign the
/// digest; this matches providers that never expose the raw digest (e.g.
/// smartcards addressed via `ski`).
#[async_trait]
pub trait CryptoProvider: Send + Sync {
    async fn sign(
        &self,
        hash_alg: HashAlgorithm,
        pub_alg: PublicKeyAlgorithm,
        public: &[u8],
        secret: &[u8],
        ski: Option<&[u8]>,
        data: &[u8],
    ) -> Result<SignOutput, ProviderError>;

    async fn verify(
        &self,
        pub_alg: PublicKeyAlgorithm,
        hash_alg: HashAlgorithm,
        sig: &[MpiBytes],
        public: &[u8],
        data: &[u8],
    ) -> Result<bool, ProviderError>;
}

/// Bounded-wait wrapper around any provider.
///
/// A hung provider call would otherwise block its signature's resolution
/// indefinitely; the wrapper cancels the in-flight request when the
/// deadline elapses and surfaces [`Error::SignCancelled`].
#[derive(Debug)]
pub struct Bounded<P> {
    inner: P,
    deadline: Duration,
}

impl<P> Bounded<P> {
    pub fn new(inner: P, deadline: Duration) -> Self {
        Bounded { inner, deadline }
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

#[async_trait]
impl<P: CryptoProvider> CryptoProvider for Bounded<P> {
    async fn sign(
        &self,
        hash_alg: HashAlgorithm,
        pub_alg: PublicKeyAlgorithm,
        public: &[u8],
        secret: &[u8],
        ski: Option<&[u8]>,
        data: &[u8],
    ) -> Result<SignOutput, ProviderError> {
        let fut = self
            .inner
            .sign(hash_alg, pub_alg, public, secret, ski, data);
        match tokio::time::timeout(self.deadline, fut).await {
            Ok(res) => res,
            Err(_) => Err(Box::new(Error::SignCancelled) as ProviderError),
        }
    }

    async fn verify(
        &self,
        pub_alg: PublicKeyAlgorithm,
        hash_alg: HashAlgorithm,
        sig: &[MpiBytes],
        public: &[u8],
        data: &[u8],
    ) -> Result<bool, ProviderError> {
        let fut = self.inner.verify(pub_alg, hash_alg, sig, public, data);
        match tokio::time::timeout(self.deadline, fut).await {
            Ok(res) => res,
            Err(_) => Err(Box::new(Error::SignCancelled) as ProviderError),
        }
    }
}
