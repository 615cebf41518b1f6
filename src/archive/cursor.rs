//! Forward-only cursor over a compressed tar container.
//!
//! The decompression stack can only move forward, so the cursor hands out at
//! most one [`Record`] at a time. A record mutably borrows the cursor: it
//! cannot outlive the next call to [`ArchiveCursor::has_next`], and dropping
//! it never releases the shared stream. Bytes a caller left unread are
//! discarded when the cursor advances.

use std::io::{self, Read};

use tracing::{debug, trace};

use crate::archive::error::{ArchiveError, ArchiveResult};
use crate::archive::header::{
    self, BLOCK_SIZE, EntryHeader, MAX_EXTENSION_SIZE, entry_name, gnu_long_name, malformed,
    pax_path,
};
use crate::archive::source::{self, Compression, Source};

/// Cap on the up-front buffer in [`Record::read_all`]; the header's size
/// field is not trusted for allocation.
const READ_ALL_PREALLOC: u64 = 64 * 1024;

/// Decompressed tar stream plus the bookkeeping for the current entry.
struct EntryStream {
    reader: Box<dyn Read + Send>,
    /// Bytes consumed from the decompressed stream.
    position: u64,
    /// Unread body bytes of the current entry.
    remaining: u64,
    /// Padding after the current entry body.
    padding: u64,
}

impl EntryStream {
    /// Read one full block; `None` on a clean end of stream.
    fn read_block(&mut self) -> ArchiveResult<Option<[u8; BLOCK_SIZE]>> {
        let mut block = [0u8; BLOCK_SIZE];
        let mut filled = 0;
        while filled < BLOCK_SIZE {
            match self.reader.read(&mut block[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        let start = self.position;
        self.position += filled as u64;

        match filled {
            0 => Ok(None),
            BLOCK_SIZE => Ok(Some(block)),
            n => Err(malformed(
                start,
                format!("truncated header block ({n} of {BLOCK_SIZE} bytes)"),
            )),
        }
    }

    fn skip(&mut self, n: u64) -> ArchiveResult<()> {
        if n == 0 {
            return Ok(());
        }
        let skipped = io::copy(&mut (&mut self.reader).take(n), &mut io::sink())?;
        self.position += skipped;
        if skipped < n {
            return Err(malformed(
                self.position,
                format!("stream ended inside an entry ({} bytes missing)", n - skipped),
            ));
        }
        Ok(())
    }

    /// Drop whatever the caller did not read of the current entry.
    fn discard_current(&mut self) -> ArchiveResult<()> {
        let n = self.remaining + self.padding;
        self.remaining = 0;
        self.padding = 0;
        self.skip(n)
    }

    /// Read the body of an extension record (long name, pax header).
    fn read_extension(&mut self, size: u64, offset: u64) -> ArchiveResult<Vec<u8>> {
        if size > MAX_EXTENSION_SIZE {
            return Err(malformed(
                offset,
                format!("extension record of {size} bytes exceeds {MAX_EXTENSION_SIZE}"),
            ));
        }
        let mut body = Vec::with_capacity(size as usize);
        (&mut self.reader).take(size).read_to_end(&mut body)?;
        self.position += body.len() as u64;
        if body.len() as u64 != size {
            return Err(malformed(offset, "stream ended inside an extension record".into()));
        }
        self.skip(header::padding(size))?;
        Ok(body)
    }
}

/// Sequential reader over the entries of a compressed container.
///
/// ```no_run
/// use gutentei::archive::{ArchiveCursor, Source};
///
/// let mut cursor = ArchiveCursor::open(&Source::parse("catalogue.tar.bz2")).unwrap();
/// while cursor.has_next().unwrap() {
///     let record = cursor.next().unwrap();
///     println!("{} ({} bytes)", record.name(), record.size());
/// }
/// cursor.close();
/// ```
pub struct ArchiveCursor {
    source: String,
    compression: Compression,
    stream: Option<EntryStream>,
    pending: Option<EntryHeader>,
    exhausted: bool,
}

impl ArchiveCursor {
    /// Open a cursor over a source. No entry is read yet.
    pub fn open(source: &Source) -> ArchiveResult<Self> {
        let raw = source.open()?;
        Self::with_name(raw, source.to_string())
    }

    /// Build a cursor over an arbitrary (possibly compressed) byte stream.
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> ArchiveResult<Self> {
        Self::with_name(Box::new(reader), "(reader)".into())
    }

    fn with_name(raw: Box<dyn Read + Send>, source: String) -> ArchiveResult<Self> {
        let (compression, reader) = source::decompress(raw)?;
        debug!(source = %source, %compression, "opened archive");
        Ok(Self {
            source,
            compression,
            stream: Some(EntryStream {
                reader,
                position: 0,
                remaining: 0,
                padding: 0,
            }),
            pending: None,
            exhausted: false,
        })
    }

    /// Outer compression detected when the cursor was opened.
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Whether another file entry is available.
    ///
    /// Reads (and caches) the next entry header if none is cached yet.
    /// Directory, link, and global pax entries are skipped.
    pub fn has_next(&mut self) -> ArchiveResult<bool> {
        let stream = self.stream.as_mut().ok_or(ArchiveError::Closed)?;
        if self.pending.is_some() {
            return Ok(true);
        }
        if self.exhausted {
            return Ok(false);
        }

        stream.discard_current()?;

        let mut renamed: Option<Vec<u8>> = None;
        loop {
            let offset = stream.position;
            let Some(block) = stream.read_block()? else {
                self.exhausted = true;
                return Ok(false);
            };
            let Some(raw) = header::decode(&block, offset)? else {
                trace!(offset, "end-of-archive marker");
                self.exhausted = true;
                return Ok(false);
            };

            if raw.kind.is_gnu_longname() {
                let body = stream.read_extension(raw.size, offset)?;
                renamed = Some(gnu_long_name(&body));
            } else if raw.kind.is_pax_local_extensions() {
                let body = stream.read_extension(raw.size, offset)?;
                if let Some(path) = pax_path(&body, offset)? {
                    renamed = Some(path);
                }
            } else if raw.kind.is_file() {
                let path = renamed.take().unwrap_or(raw.path);
                stream.remaining = raw.size;
                stream.padding = header::padding(raw.size);

                let entry = EntryHeader::new(entry_name(&path), raw.size);
                trace!(name = entry.name(), size = entry.size(), offset, "entry header");
                self.pending = Some(entry);
                return Ok(true);
            } else {
                trace!(kind = ?raw.kind, offset, "skipping non-file entry");
                renamed = None;
                stream.skip(raw.size + header::padding(raw.size))?;
            }
        }
    }

    /// Take the pending entry as a read-once record.
    ///
    /// Fails with [`ArchiveError::NoPendingEntry`] unless the last call to
    /// [`has_next`](Self::has_next) returned `true`.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> ArchiveResult<Record<'_>> {
        let stream = self.stream.as_mut().ok_or(ArchiveError::Closed)?;
        let header = self.pending.take().ok_or(ArchiveError::NoPendingEntry)?;
        Ok(Record { header, stream })
    }

    /// Release the underlying stream. Idempotent.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            debug!(source = %self.source, bytes = stream.position, "closing archive");
        }
        self.pending = None;
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }
}

impl std::fmt::Debug for ArchiveCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveCursor")
            .field("source", &self.source)
            .field("compression", &self.compression)
            .field("pending", &self.pending)
            .field("exhausted", &self.exhausted)
            .field("closed", &self.stream.is_none())
            .finish()
    }
}

/// Read-once view over the body of one archive entry.
///
/// Borrowed from the cursor; there is no close of its own.
pub struct Record<'c> {
    header: EntryHeader,
    stream: &'c mut EntryStream,
}

impl Record<'_> {
    /// Entry name, used as the record identifier.
    pub fn name(&self) -> &str {
        self.header.name()
    }

    /// Body size in bytes.
    pub fn size(&self) -> u64 {
        self.header.size()
    }

    /// Read the whole remaining body.
    pub fn read_all(mut self) -> ArchiveResult<Vec<u8>> {
        let capacity = self.stream.remaining.min(READ_ALL_PREALLOC) as usize;
        let mut data = Vec::with_capacity(capacity);
        self.read_to_end(&mut data)?;
        Ok(data)
    }
}

impl Read for Record<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.stream.remaining;
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        let max = usize::try_from(remaining).map_or(buf.len(), |r| r.min(buf.len()));
        let n = self.stream.reader.read(&mut buf[..max])?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "entry \"{}\" truncated: {remaining} bytes missing",
                    self.header.name()
                ),
            ));
        }
        self.stream.remaining -= n as u64;
        self.stream.position += n as u64;
        Ok(n)
    }
}

impl std::fmt::Debug for Record<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record")
            .field("header", &self.header)
            .field("remaining", &self.stream.remaining)
            .finish()
    }
}
