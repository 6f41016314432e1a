use std::io;

use byteorder::{BigEndian, WriteBytesExt};

use crate::errors::Result;
use crate::packet::header::{packet_length_len, write_packet_header, Tag};
use crate::ser::Serialize;

use super::types::{Signature, SIG_VERSION};

impl Serialize for Signature {
    /// Writes the packet body: fixed header, both subpacket areas with
    /// their two-octet lengths, the digest prefix and the signature MPIs.
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[
            SIG_VERSION,
            u8::from(self.typ),
            u8::from(self.pub_alg),
            u8::from(self.hash_alg),
        ])?;

        writer.write_u16::<BigEndian>(self.hashed_area.len() as u16)?;
        writer.write_all(&self.hashed_area)?;

        writer.write_u16::<BigEndian>(self.unhashed_area.len() as u16)?;
        writer.write_all(&self.unhashed_area)?;

        writer.write_all(&self.digest_start)?;

        for mpi in &self.signature {
            mpi.to_writer(writer)?;
        }

        Ok(())
    }

    fn write_len(&self) -> usize {
        4 + 2
            + self.hashed_area.len()
            + 2
            + self.unhashed_area.len()
            + 2
            + self
                .signature
                .iter()
                .map(Serialize::write_len)
                .sum::<usize>()
    }
}

impl Signature {
    /// Serializes the canonical wire packet: generic packet header (tag +
    /// body length) followed by the body.
    pub fn write_packet<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        write_packet_header(Tag::Signature, self.write_len(), writer)?;
        self.to_writer(writer)
    }

    /// Total length of [`Signature::write_packet`]'s output.
    pub fn packet_len(&self) -> usize {
        let body = self.write_len();
        1 + packet_length_len(body) + body
    }
}
