//! Streaming reader for the nested compressed catalogue container.
//!
//! The container is a bzip2- (or gzip-) compressed tar stream. Entries can
//! only be visited in order: [`ArchiveCursor`] decodes one header at a time
//! and lends out a single [`Record`] per entry.

pub mod cursor;
pub mod error;
pub mod header;
pub mod source;

pub use cursor::{ArchiveCursor, Record};
pub use error::{ArchiveError, ArchiveResult};
pub use header::EntryHeader;
pub use source::{Compression, Source};
