use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use bytes::{Buf, Bytes};

use crate::errors::Result;
use crate::parsing::BufParsing;
use crate::ser::Serialize;

/// Number of bits we accept when reading MPIs.
/// The value is the same as gnupgs.
const MAX_EXTERN_MPI_BITS: u16 = 16384;

/// Represents an owned MPI value.
///
/// The length prefix written on serialization is always `len * 8` bits;
/// leading zero octets are kept as-is so that stored signature material
/// round-trips byte for byte.
///
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-3.2>
#[derive(Default, Clone, PartialEq, Eq, derive_more::Debug)]
pub struct MpiBytes(#[debug("{}", hex::encode(_0))] Bytes);

impl MpiBytes {
    /// Wraps the given bytes as an MPI.
    pub fn from_raw(bytes: Bytes) -> Self {
        MpiBytes(bytes)
    }

    /// Copies the data in `raw` into an MPI.
    /// Note that `raw` is not expected to be length-prefixed.
    pub fn from_slice(raw: &[u8]) -> Self {
        MpiBytes(Bytes::copy_from_slice(raw))
    }

    /// Parses the given buffer as a length-prefixed MPI.
    pub fn from_buf<B: Buf>(i: &mut B) -> Result<Self> {
        let len_bits = i.read_be_u16()?;

        if len_bits > MAX_EXTERN_MPI_BITS {
            bail!("mpi too large: {} bits", len_bits);
        }

        let len_bytes = (len_bits + 7) >> 3;
        let n = i.read_take(usize::from(len_bytes))?;

        Ok(MpiBytes(n))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for MpiBytes {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl Serialize for MpiBytes {
    fn to_writer<W: io::Write>(&self, w: &mut W) -> Result<()> {
        let bits = self.0.len() * 8;
        ensure!(
            bits <= usize::from(u16::MAX),
            "mpi too large: {} bits",
            bits
        );
        w.write_u16::<BigEndian>(bits as u16)?;
        w.write_all(&self.0)?;

        Ok(())
    }

    fn write_len(&self) -> usize {
        2 + self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::errors::Error;

    #[test]
    fn test_mpi_bit_length_is_byte_width() {
        // 0x01FF is written with a 16 bit prefix, not 9: byte width wins.
        let mpi = MpiBytes::from_slice(&[0x01, 0xFF]);
        assert_eq!(mpi.to_bytes().unwrap(), vec![0x00, 0x10, 0x01, 0xFF]);

        // leading zeros are preserved
        let mpi = MpiBytes::from_slice(&[0x00, 0x00, 0x42]);
        assert_eq!(mpi.to_bytes().unwrap(), vec![0x00, 0x18, 0x00, 0x00, 0x42]);
    }

    #[test]
    fn test_mpi_roundtrip() {
        let mpi = MpiBytes::from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        let buf = mpi.to_bytes().unwrap();
        assert_eq!(buf.len(), mpi.write_len());

        let back = MpiBytes::from_buf(&mut &buf[..]).unwrap();
        assert_eq!(mpi, back);
    }

    #[test]
    fn test_mpi_odd_bit_count() {
        // Foreign writers emit exact bit counts; 9 bits still reads 2 bytes.
        let back = MpiBytes::from_buf(&mut &[0x00, 0x09, 0x01, 0xFF][..]).unwrap();
        assert_eq!(back.as_ref(), &[0x01, 0xFF]);
    }

    #[test]
    fn test_mpi_truncated() {
        let err = MpiBytes::from_buf(&mut &[0x00, 0x20, 0x01][..]).unwrap_err();
        assert!(matches!(err, Error::MalformedLength { .. }));
    }
}
