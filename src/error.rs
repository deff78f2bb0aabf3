//! Error kinds surfaced by every fallible operation in the crate (§6.3, §7 of
//! the design notes this crate implements).

use thiserror::Error;

/// All possible failures, returned by value from every operation.
///
/// There is no panicking/unwinding path through normal operation; a caller
/// that wants a diagnostic message should also consult
/// [`Document::error_msg`](crate::Document::error_msg) for parse and XPath
/// failures, which carries a human-readable description alongside the kind.
#[derive(Error, Clone, PartialEq, Eq, Debug)]
pub enum Error {
    /// A required argument was not supplied (null pointer / `None` in the
    /// source API).
    #[error("a required argument was not supplied")]
    NullArgs,

    /// An argument was supplied but its value is not acceptable for this
    /// operation (e.g. overlapping move source/destination).
    #[error("invalid argument: {0}")]
    Args(String),

    /// A numeric argument (index, count) fell outside its valid range.
    #[error("value out of range")]
    OutOfRange,

    /// A tag id, attribute name, or other entity could not be located, but
    /// the caller did not ask for exhaustive search semantics.
    #[error("not found")]
    NotFound,

    /// A search (XPath resolution, attribute/entity lookup) completed
    /// without finding a match.
    #[error("search failed to find a match")]
    Search,

    /// The document (or the specific mutation requested) is read-only.
    #[error("document is read-only")]
    ReadOnly,

    /// The input buffer contained no data at all.
    #[error("no data")]
    NoData,

    /// The input could not be parsed as XML.
    #[error("invalid XML data at line {line}: {message}")]
    InvalidData {
        /// 1-based line number at the point of failure.
        line: u32,
        /// Human readable description.
        message: String,
    },

    /// Start and end tags did not match under `WELL_FORMED`.
    #[error("unbalanced XML at line {line}: {message}")]
    UnbalancedXML {
        /// 1-based line number at the point of failure.
        line: u32,
        /// Human readable description.
        message: String,
    },

    /// A fixed-size buffer (e.g. a tag-name scratch buffer) overflowed.
    #[error("buffer overflow")]
    BufferOverflow,

    /// Memory could not be allocated to satisfy the request.
    #[error("memory allocation failed")]
    AllocMemory,

    /// A string (typically an XPath) was malformed.
    #[error("string format error: {0}")]
    StringFormat(String),

    /// A callback requested early termination of a traversal.
    #[error("terminated by callback")]
    Terminate,

    /// A syntax error in a sort specification or other mini-language.
    #[error("syntax error: {0}")]
    Syntax(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
