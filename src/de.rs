use crate::errors::Result;

/// Parse a value out of a raw packet body.
pub trait Deserialize: Sized {
    fn from_slice(_: &[u8]) -> Result<Self>;
}
