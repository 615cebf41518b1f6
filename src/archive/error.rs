//! Rich diagnostic error types for the archive reader.

use miette::Diagnostic;
use thiserror::Error;

/// Errors from opening or walking a compressed catalogue container.
#[derive(Debug, Error, Diagnostic)]
pub enum ArchiveError {
    #[error("cannot open archive source \"{source_id}\": {message}")]
    #[diagnostic(
        code(gtei::archive::open),
        help(
            "The container could not be opened. Check that the path exists, or that \
             the URL is reachable and the network is available."
        )
    )]
    Open { source_id: String, message: String },

    #[error("I/O error while reading archive: {source}")]
    #[diagnostic(
        code(gtei::archive::io),
        help(
            "The underlying stream failed mid-read. For remote sources, retry the \
             download or mirror the container to a local file first."
        )
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("malformed archive at byte {offset}: {message}")]
    #[diagnostic(
        code(gtei::archive::malformed),
        help(
            "The container is not a valid tar stream (bad checksum, size field, \
             or truncated block). The download may be incomplete; delete the cached \
             copy and fetch it again."
        )
    )]
    Malformed { offset: u64, message: String },

    #[error("next() called without a pending entry")]
    #[diagnostic(
        code(gtei::archive::no_pending_entry),
        help(
            "Call has_next() and check that it returned true before calling next(). \
             The cursor may also be exhausted."
        )
    )]
    NoPendingEntry,

    #[error("archive cursor is closed")]
    #[diagnostic(
        code(gtei::archive::closed),
        help("The cursor released its stream in close(); open a new cursor to read again.")
    )]
    Closed,
}

impl From<std::io::Error> for ArchiveError {
    fn from(source: std::io::Error) -> Self {
        Self::Io { source }
    }
}

/// Convenience alias for archive operation results.
pub type ArchiveResult<T> = std::result::Result<T, ArchiveError>;
