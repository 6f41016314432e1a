//! # pgpsig
//!
//! OpenPGP v4 signature packet engine: builds, hashes, signs, verifies,
//! classifies and serializes signature packets binding a certifying key to a
//! primary key, user identity, subkey or arbitrary data.
//!
//! Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.2>
//!
//! Hashing is performed in-engine; asymmetric sign/verify operations are
//! delegated to a [`CryptoProvider`](crypto::provider::CryptoProvider)
//! implementation supplied by the embedding application.

#[macro_use]
pub mod errors;

pub mod crypto;
pub mod de;
pub mod packet;
pub mod parsing;
pub mod ser;
pub mod types;
