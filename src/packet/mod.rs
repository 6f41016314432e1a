//! # Packet module
//!
//! Wire framing and the signature packet itself.

pub mod header;
pub mod signature;

pub use self::header::Tag;
pub use self::signature::*;
