use std::io;

use crate::errors::{Error, Result};

/// Available signature subpacket types.
///
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.2.3.1>
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum SubpacketType {
    SignatureCreationTime,
    SignatureExpirationTime,
    ExportableCertification,
    Revocable,
    KeyExpirationTime,
    PreferredSymmetricAlgorithms,
    Issuer,
    PreferredHashAlgorithms,
    PreferredCompressionAlgorithms,
    KeyServerPreferences,
    PreferredKeyServer,
    PrimaryUserId,
    KeyFlags,
    SignersUserID,
    RevocationReason,
    Features,
    EmbeddedSignature,
    Other(u8),
}

impl SubpacketType {
    pub fn as_u8(&self) -> u8 {
        match self {
            SubpacketType::SignatureCreationTime => 2,
            SubpacketType::SignatureExpirationTime => 3,
            SubpacketType::ExportableCertification => 4,
            SubpacketType::Revocable => 7,
            SubpacketType::KeyExpirationTime => 9,
            SubpacketType::PreferredSymmetricAlgorithms => 11,
            SubpacketType::Issuer => 16,
            SubpacketType::PreferredHashAlgorithms => 21,
            SubpacketType::PreferredCompressionAlgorithms => 22,
            SubpacketType::KeyServerPreferences => 23,
            SubpacketType::PreferredKeyServer => 24,
            SubpacketType::PrimaryUserId => 25,
            SubpacketType::KeyFlags => 27,
            SubpacketType::SignersUserID => 28,
            SubpacketType::RevocationReason => 29,
            SubpacketType::Features => 30,
            SubpacketType::EmbeddedSignature => 32,
            SubpacketType::Other(n) => *n,
        }
    }

    #[inline]
    pub fn from_u8(n: u8) -> Self {
        match n {
            2 => SubpacketType::SignatureCreationTime,
            3 => SubpacketType::SignatureExpirationTime,
            4 => SubpacketType::ExportableCertification,
            7 => SubpacketType::Revocable,
            9 => SubpacketType::KeyExpirationTime,
            11 => SubpacketType::PreferredSymmetricAlgorithms,
            16 => SubpacketType::Issuer,
            21 => SubpacketType::PreferredHashAlgorithms,
            22 => SubpacketType::PreferredCompressionAlgorithms,
            23 => SubpacketType::KeyServerPreferences,
            24 => SubpacketType::PreferredKeyServer,
            25 => SubpacketType::PrimaryUserId,
            27 => SubpacketType::KeyFlags,
            28 => SubpacketType::SignersUserID,
            29 => SubpacketType::RevocationReason,
            30 => SubpacketType::Features,
            32 => SubpacketType::EmbeddedSignature,
            _ => SubpacketType::Other(n),
        }
    }
}

/// Writes a `[length][type][payload]` subpacket.
///
/// The length octet covers the type octet plus the payload, not itself.
/// Only single-octet lengths are produced; payloads that would need the
/// multi-octet encodings of RFC 4880 §5.2.3.1 are rejected with
/// [`Error::SubpacketTooLarge`]. This is a known limitation of the packets
/// we emit, kept for compatibility with the existing store.
pub fn write_subpacket(
    typ: SubpacketType,
    payload: &[u8],
    writer: &mut impl io::Write,
) -> Result<()> {
    let len = payload.len() + 1;
    if len > 255 {
        return Err(Error::SubpacketTooLarge { len });
    }

    writer.write_all(&[len as u8, typ.as_u8()])?;
    writer.write_all(payload)?;

    Ok(())
}

/// Convenience wrapper returning the encoded subpacket.
pub fn encode_subpacket(typ: SubpacketType, payload: &[u8]) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(payload.len() + 2);
    write_subpacket(typ, payload, &mut buf)?;
    Ok(buf)
}

/// A decoded subpacket, borrowing its payload from the area it was read
/// from.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct RawSubpacket<'a> {
    pub typ: SubpacketType,
    pub is_critical: bool,
    pub payload: &'a [u8],
}

/// Decodes the subpacket starting at `offset`, returning it together with
/// the number of octets consumed.
pub fn decode_subpacket(buf: &[u8], offset: usize) -> Result<(RawSubpacket<'_>, usize)> {
    let rest = buf.get(offset..).ok_or(Error::MalformedLength {
        needed: offset,
        remaining: buf.len(),
    })?;
    let &[len, marker, ..] = rest else {
        return Err(Error::MalformedLength {
            needed: 2,
            remaining: rest.len(),
        });
    };
    if len == 0 {
        // a zero length cannot cover its own type octet
        return Err(Error::MalformedLength {
            needed: 1,
            remaining: 0,
        });
    }

    let body_len = len as usize - 1;
    let payload = rest
        .get(2..2 + body_len)
        .ok_or(Error::MalformedLength {
            needed: body_len,
            remaining: rest.len().saturating_sub(2),
        })?;

    let is_critical = marker >> 7 == 1;
    let typ = SubpacketType::from_u8(marker & 0b0111_1111);

    Ok((
        RawSubpacket {
            typ,
            is_critical,
            payload,
        },
        1 + len as usize,
    ))
}

/// Iterator over the subpackets of an encoded area.
///
/// Yields `Err` once on a truncated area and then stops.
pub struct Subpackets<'a> {
    buf: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> Subpackets<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Subpackets {
            buf,
            offset: 0,
            failed: false,
        }
    }
}

impl<'a> Iterator for Subpackets<'a> {
    type Item = Result<RawSubpacket<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.buf.len() {
            return None;
        }

        match decode_subpacket(self.buf, self.offset) {
            Ok((sub, used)) => {
                self.offset += used;
                Some(Ok(sub))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// Key flag octet with named accessors.
///
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.2.3.21>
#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
pub struct KeyFlags(pub u8);

impl KeyFlags {
    pub fn certify(&self) -> bool {
        self.0 & 0x01 != 0
    }

    pub fn sign(&self) -> bool {
        self.0 & 0x02 != 0
    }

    pub fn encrypt_comms(&self) -> bool {
        self.0 & 0x04 != 0
    }

    pub fn encrypt_storage(&self) -> bool {
        self.0 & 0x08 != 0
    }

    pub fn shared(&self) -> bool {
        self.0 & 0x10 != 0
    }

    pub fn authentication(&self) -> bool {
        self.0 & 0x20 != 0
    }

    pub fn group(&self) -> bool {
        self.0 & 0x80 != 0
    }
}

impl<'a> From<&'a [u8]> for KeyFlags {
    fn from(other: &'a [u8]) -> Self {
        if other.is_empty() {
            Default::default()
        } else {
            KeyFlags(other[0])
        }
    }
}
