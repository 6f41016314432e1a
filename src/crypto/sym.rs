use num_enum::{FromPrimitive, IntoPrimitive};

/// Available symmetric key algorithms.
///
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-9.2>
#[derive(
    Debug, PartialEq, Eq, Clone, Copy, FromPrimitive, IntoPrimitive, derive_more::Display,
)]
#[repr(u8)]
pub enum SymmetricKeyAlgorithm {
    /// Plaintext or unencrypted data
    #[display("Plaintext")]
    Plaintext = 0,
    #[display("IDEA")]
    IDEA = 1,
    /// TripleDES (DES-EDE, 168 bit key derived from 192)
    #[display("TripleDES")]
    TripleDES = 2,
    /// CAST5 (128 bit key, as per [RFC2144])
    #[display("CAST5")]
    CAST5 = 3,
    /// Blowfish (128 bit key, 16 rounds)
    #[display("Blowfish")]
    Blowfish = 4,
    #[display("AES128")]
    AES128 = 7,
    #[display("AES192")]
    AES192 = 8,
    #[display("AES256")]
    AES256 = 9,
    /// Twofish with 256-bit key [TWOFISH]
    #[display("Twofish")]
    Twofish = 10,

    #[num_enum(catch_all)]
    #[display("Unknown({_0})")]
    Other(u8),
}
