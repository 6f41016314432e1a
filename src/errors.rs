use snafu::{Backtrace, Snafu};

pub type Result<T, E = Error> = ::std::result::Result<T, E>;

/// Errors surfaced by anything from a boxed crypto provider.
pub type ProviderError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types
#[derive(Debug, Snafu)]
pub enum Error {
    /// Clock or ordering inconsistency between a key and a signature
    /// certifying it.
    #[snafu(display("time conflict between key and signature"))]
    TimeConflict,
    /// The signature class is not one we can generate.
    #[snafu(display("unsupported signature class 0x{typ:02x}"))]
    UnsupportedSignatureClass { typ: u8 },
    /// A subpacket payload does not fit a single-octet length encoding.
    #[snafu(display("subpacket too large: {len} exceeds single octet length"))]
    SubpacketTooLarge { len: usize },
    /// Truncated buffer during decoding.
    #[snafu(display("malformed length: needed {needed}, remaining {remaining}"))]
    MalformedLength { needed: usize, remaining: usize },
    /// Any failure crossing the hash/sign/verify boundary.
    #[snafu(display("crypto provider failure: {source}"))]
    CryptoProvider {
        #[snafu(source(false))]
        source: ProviderError,
    },
    /// The in-flight provider request was cancelled by the caller.
    #[snafu(display("signing request was cancelled"))]
    SignCancelled,
    #[snafu(display("missing key"))]
    MissingKey,
    #[snafu(display("SHA1 hash collision detected"))]
    Sha1HashCollision,
    /// Signals parameters we don't support, but can safely ignore.
    #[snafu(display("Unsupported: {message}"))]
    Unsupported { message: String },
    #[snafu(display("{message}"))]
    Message { message: String },
    #[snafu(transparent)]
    IO {
        source: std::io::Error,
        backtrace: Backtrace,
    },
}

impl From<derive_builder::UninitializedFieldError> for Error {
    fn from(err: derive_builder::UninitializedFieldError) -> Error {
        Error::Message {
            message: err.to_string(),
        }
    }
}

/// Unwraps a provider error back into the engine's error type.
///
/// A provider that already speaks [`Error`] (e.g. the bounded-wait wrapper)
/// passes through untouched; anything else is wrapped as a
/// [`Error::CryptoProvider`] failure.
pub(crate) fn from_provider(err: ProviderError) -> Error {
    match err.downcast::<Error>() {
        Ok(err) => *err,
        Err(source) => Error::CryptoProvider { source },
    }
}

#[macro_export]
macro_rules! unsupported_err {
    ($e:expr) => {
        return Err($crate::errors::Error::Unsupported { message: $e.to_string()})
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::errors::Error::Unsupported { message: format!($fmt, $($arg)+) })
    };
}

#[macro_export]
macro_rules! bail {
    ($e:expr) => {
        return Err($crate::errors::Error::Message { message: $e.to_string() })
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::errors::Error::Message { message: format!($fmt, $($arg)+) })
    };
}

#[macro_export]
macro_rules! format_err {
    ($e:expr) => {
        $crate::errors::Error::Message { message: $e.to_string() }
    };
    ($fmt:expr, $($arg:tt)+) => {
        $crate::errors::Error::Message { message: format!($fmt, $($arg)+) }
    };
}

#[macro_export(local_inner_macros)]
macro_rules! ensure {
    ($cond:expr, $e:expr) => {
        if !($cond) {
            bail!($e);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)+) => {
        if !($cond) {
            bail!($fmt, $($arg)+);
        }
    };
}

#[macro_export]
macro_rules! ensure_eq {
    ($left:expr, $right:expr) => ({
        match (&$left, &$right) {
            (left_val, right_val) => {
                if !(*left_val == *right_val) {
                    bail!(r#"assertion failed: `(left == right)`
  left: `{:?}`,
 right: `{:?}`"#, left_val, right_val)
                }
            }
        }
    });
    ($left:expr, $right:expr,) => ({
        ensure_eq!($left, $right)
    });
    ($left:expr, $right:expr, $($arg:tt)+) => ({
        match (&($left), &($right)) {
            (left_val, right_val) => {
                if !(*left_val == *right_val) {
                    bail!(r#"assertion failed: `(left == right)`
  left: `{:?}`,
 right: `{:?}`: {}"#, left_val, right_val,
                           format_args!($($arg)+))
                }
            }
        }
    });
}
