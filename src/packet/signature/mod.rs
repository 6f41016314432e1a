mod check;
mod config;
mod de;
mod format;
mod ser;
mod subpacket;
#[cfg(test)]
pub(crate) mod testutil;
mod types;

pub use self::check::*;
pub use self::config::*;
pub use self::de::*;
pub use self::format::*;
pub use self::subpacket::*;
pub use self::types::*;
