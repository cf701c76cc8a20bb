use thiserror::Error;

/// The error type produced by every fallible operation in this crate.
///
/// Parse errors are broadly categorized by what was being read when the
/// failure happened; the embedded message narrows it down to the exact
/// violation. The decoder does not attempt recovery: the first failure
/// bubbles out of the top-level call.
#[derive(Debug, Error)]
pub enum Error {
    /// The 14-byte `MThd` chunk is missing, truncated or inconsistent.
    #[error("invalid header: {0}")]
    InvalidHeader(&'static str),

    /// A bounds check during chunk scanning or event parsing overshot the
    /// end of the buffer. `overshoot` is how many bytes past the end the
    /// read would have landed, `len` the length that triggered it.
    #[error("unexpected eof: cursor would end up {overshoot} bytes beyond the end of the buffer (length {len})")]
    UnexpectedEof { overshoot: usize, len: usize },

    /// The track data is not decodable, e.g. a running-status byte with no
    /// preceding status.
    #[error("corrupted track: {0}")]
    Corrupted(&'static str),

    /// An accessor was called on a message whose stored bytes are
    /// semantically invalid for it.
    #[error("value out of range: {0}")]
    OutOfRange(&'static str),

    /// An underlying filesystem read or write failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// The result type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;
