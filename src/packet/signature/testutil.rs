//! Deterministic key and provider stand-ins shared by the signature tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::provider::{CryptoProvider, SignOutput};
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::ProviderError;
use crate::types::{KeyDetails, KeyId, MpiBytes};

#[derive(Debug, Clone)]
pub(crate) struct TestKey {
    pub id: KeyId,
    pub algorithm: PublicKeyAlgorithm,
    pub public: Vec<u8>,
    pub secret: Option<Vec<u8>>,
    pub created: u32,
    pub expires: Option<u32>,
    pub revoked: bool,
}

impl TestKey {
    pub fn new(seed: u8, algorithm: PublicKeyAlgorithm) -> Self {
        TestKey {
            id: KeyId::from([seed, 2, 3, 4, 5, 6, 7, 8]),
            algorithm,
            public: vec![seed; 16],
            secret: Some(vec![seed ^ 0xFF; 16]),
            created: 100,
            expires: None,
            revoked: false,
        }
    }
}

impl KeyDetails for TestKey {
    fn key_id(&self) -> KeyId {
        self.id
    }

    fn algorithm(&self) -> PublicKeyAlgorithm {
        self.algorithm
    }

    fn public_material(&self) -> &[u8] {
        &self.public
    }

    fn secret_material(&self) -> Option<&[u8]> {
        self.secret.as_deref()
    }

    fn digest(&self) -> Bytes {
        HashAlgorithm::Sha1
            .digest(&self.public)
            .expect("sha1 digest")
            .into()
    }

    fn created_at(&self) -> u32 {
        self.created
    }

    fn expires_at(&self) -> Option<u32> {
        self.expires
    }

    fn is_revoked(&self) -> bool {
        self.revoked
    }
}

/// A provider whose "signature" is a deterministic function of the public
/// material and the signed digest, so verify really checks the bytes.
#[derive(Debug, Default)]
pub(crate) struct MockProvider {
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fake_signature(
        hash_alg: HashAlgorithm,
        public: &[u8],
        data: &[u8],
    ) -> Result<(Vec<u8>, Vec<u8>), ProviderError> {
        let md = hash_alg.digest(data).map_err(|e| Box::new(e) as ProviderError)?;
        let mut seed = public.to_vec();
        seed.extend_from_slice(&md);
        let sig = HashAlgorithm::Sha256
            .digest(&seed)
            .map_err(|e| Box::new(e) as ProviderError)?;
        Ok((md, sig))
    }
}

#[async_trait]
impl CryptoProvider for MockProvider {
    async fn sign(
        &self,
        hash_alg: HashAlgorithm,
        _pub_alg: PublicKeyAlgorithm,
        public: &[u8],
        _secret: &[u8],
        _ski: Option<&[u8]>,
        data: &[u8],
    ) -> Result<SignOutput, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (md, sig) = Self::fake_signature(hash_alg, public, data)?;

        Ok(SignOutput {
            digest_start: [md[0], md[1]],
            signature: sig.into(),
        })
    }

    async fn verify(
        &self,
        _pub_alg: PublicKeyAlgorithm,
        hash_alg: HashAlgorithm,
        sig: &[MpiBytes],
        public: &[u8],
        data: &[u8],
    ) -> Result<bool, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (_, expected) = Self::fake_signature(hash_alg, public, data)?;
        let joined: Vec<u8> = sig
            .iter()
            .flat_map(|mpi| mpi.as_ref().iter().copied())
            .collect();

        Ok(joined == expected)
    }
}

/// A provider that fails every request.
#[derive(Debug)]
pub(crate) struct FailingProvider;

#[async_trait]
impl CryptoProvider for FailingProvider {
    async fn sign(
        &self,
        _hash_alg: HashAlgorithm,
        _pub_alg: PublicKeyAlgorithm,
        _public: &[u8],
        _secret: &[u8],
        _ski: Option<&[u8]>,
        _data: &[u8],
    ) -> Result<SignOutput, ProviderError> {
        Err("token unplugged".into())
    }

    async fn verify(
        &self,
        _pub_alg: PublicKeyAlgorithm,
        _hash_alg: HashAlgorithm,
        _sig: &[MpiBytes],
        _public: &[u8],
        _data: &[u8],
    ) -> Result<bool, ProviderError> {
        Err("token unplugged".into())
    }
}
