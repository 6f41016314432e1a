use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use num_enum::{FromPrimitive, IntoPrimitive};

use crate::errors::Result;

/// Packet tags we emit.
///
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-4.3>
#[derive(Debug, PartialEq, Eq, Clone, Copy, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Tag {
    Signature = 2,
    PublicKey = 6,
    UserId = 13,
    PublicSubkey = 14,

    #[num_enum(catch_all)]
    Other(u8),
}

/// Writes a new-style packet header: tag octet followed by the body length.
pub fn write_packet_header(tag: Tag, len: usize, writer: &mut impl io::Write) -> Result<()> {
    writer.write_u8(0b1100_0000 | u8::from(tag))?;
    write_packet_length(len, writer)
}

/// New-style body length encoding, always the minimal form.
///
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-4.2.2>
pub fn write_packet_length(len: usize, writer: &mut impl io::Write) -> Result<()> {
    if len < 192 {
        writer.write_u8(len as u8)?;
    } else if len < 8384 {
        writer.write_u8(((len - 192) / 256 + 192) as u8)?;
        writer.write_u8(((len - 192) % 256) as u8)?;
    } else {
        writer.write_u8(0xFF)?;
        writer.write_u32::<BigEndian>(len as u32)?;
    }

    Ok(())
}

/// Number of octets [`write_packet_length`] will produce for `len`.
pub fn packet_length_len(len: usize) -> usize {
    if len < 192 {
        1
    } else if len < 8384 {
        2
    } else {
        5
    }
}
