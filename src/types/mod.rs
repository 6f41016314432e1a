mod key;
mod key_id;
mod mpi;

pub use self::key::*;
pub use self::key_id::*;
pub use self::mpi::*;
