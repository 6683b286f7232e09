//! Format parsers for ptplay.
//!
//! Parses ProTracker-family MOD files into the IR.

mod cursor;
mod mod_format;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixture;

pub use cursor::ByteCursor;
pub use mod_format::{channels_for_tag, load_mod};

/// Error type for format parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// The 4-byte format tag is not one we know how to play
    #[error("unsupported format tag {tag:?}")]
    UnsupportedFormat { tag: String },
    /// A read ran past the end of the data
    #[error("malformed module: needed {needed} bytes at offset {offset}, {remaining} left")]
    MalformedModule {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    /// The song length byte is zero
    #[error("module has an empty pattern sequence")]
    EmptySong,
}
