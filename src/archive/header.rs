//! Tar header block decoding.
//!
//! Field decoding (octal/binary sizes, ustar prefixes, entry types) is done by
//! `tar::Header`; this module adds checksum verification and the extension
//! records (GNU long names, pax `path`) that rename the entry that follows.

use tar::EntryType;

use crate::archive::error::{ArchiveError, ArchiveResult};

/// Size of one tar block in bytes.
pub const BLOCK_SIZE: usize = 512;

/// Byte range of the checksum field inside a header block.
const CHECKSUM_FIELD: std::ops::Range<usize> = 148..156;

/// Upper bound for GNU long-name and pax extension bodies.
pub(crate) const MAX_EXTENSION_SIZE: u64 = 1024 * 1024;

/// Largest entry size whose block-padded length still fits in a `u64`.
const MAX_ENTRY_SIZE: u64 = u64::MAX - (BLOCK_SIZE as u64 - 1);

/// Header of one regular file entry, as exposed to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHeader {
    name: String,
    size: u64,
}

impl EntryHeader {
    pub(crate) fn new(name: String, size: u64) -> Self {
        Self { name, size }
    }

    /// Entry path inside the container (e.g. `cache/epub/1342/pg1342.rdf`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size of the entry body in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// A decoded header block before extension records are applied.
#[derive(Debug)]
pub(crate) struct RawHeader {
    pub kind: EntryType,
    pub path: Vec<u8>,
    /// At most `MAX_ENTRY_SIZE`, so `size + padding(size)` cannot overflow.
    pub size: u64,
}

/// Decode one header block. Returns `None` for the all-zero end marker.
pub(crate) fn decode(block: &[u8; BLOCK_SIZE], offset: u64) -> ArchiveResult<Option<RawHeader>> {
    if block.iter().all(|b| *b == 0) {
        return Ok(None);
    }

    let header = tar::Header::from_byte_slice(block);

    let stored = header.cksum().map_err(|e| malformed(offset, format!("checksum field: {e}")))?;
    let computed = checksum(block);
    if stored != computed {
        return Err(malformed(
            offset,
            format!("header checksum mismatch (stored {stored}, computed {computed})"),
        ));
    }

    let size = header
        .entry_size()
        .map_err(|e| malformed(offset, format!("size field: {e}")))?;
    if size > MAX_ENTRY_SIZE {
        return Err(malformed(offset, format!("entry size {size} is out of range")));
    }

    Ok(Some(RawHeader {
        kind: header.entry_type(),
        path: header.path_bytes().into_owned(),
        size,
    }))
}

/// Unsigned header checksum with the checksum field counted as spaces.
fn checksum(block: &[u8; BLOCK_SIZE]) -> u32 {
    block
        .iter()
        .enumerate()
        .map(|(i, b)| {
            if CHECKSUM_FIELD.contains(&i) {
                u32::from(b' ')
            } else {
                u32::from(*b)
            }
        })
        .sum()
}

/// Number of padding bytes that follow a body of `size` bytes.
pub(crate) fn padding(size: u64) -> u64 {
    let block = BLOCK_SIZE as u64;
    (block - size % block) % block
}

/// Body of a GNU long-name record, without its NUL terminator.
pub(crate) fn gnu_long_name(body: &[u8]) -> Vec<u8> {
    let end = body.iter().position(|b| *b == 0).unwrap_or(body.len());
    body[..end].to_vec()
}

/// Extract the `path` key from a pax extended header body.
///
/// Records have the form `"<len> <key>=<value>\n"`, where `len` counts the
/// whole record including itself.
pub(crate) fn pax_path(body: &[u8], offset: u64) -> ArchiveResult<Option<Vec<u8>>> {
    let mut rest = body;
    let mut path = None;

    while !rest.is_empty() {
        let space = rest
            .iter()
            .position(|b| *b == b' ')
            .ok_or_else(|| malformed(offset, "pax record without length".into()))?;
        let len: usize = std::str::from_utf8(&rest[..space])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| malformed(offset, "pax record length is not a number".into()))?;
        if len <= space + 1 || len > rest.len() || rest[len - 1] != b'\n' {
            return Err(malformed(offset, format!("pax record length {len} out of range")));
        }

        let record = &rest[space + 1..len - 1];
        if let Some(eq) = record.iter().position(|b| *b == b'=') {
            if &record[..eq] == b"path" {
                path = Some(record[eq + 1..].to_vec());
            }
        }
        rest = &rest[len..];
    }

    Ok(path)
}

/// Lossy UTF-8 entry name.
pub(crate) fn entry_name(path: &[u8]) -> String {
    String::from_utf8_lossy(path).into_owned()
}

pub(crate) fn malformed(offset: u64, message: String) -> ArchiveError {
    ArchiveError::Malformed { offset, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_block(path: &str, size: u64) -> [u8; BLOCK_SIZE] {
        let mut header = tar::Header::new_gnu();
        header.set_path(path).unwrap();
        header.set_size(size);
        header.set_entry_type(EntryType::Regular);
        header.set_cksum();
        *header.as_bytes()
    }

    #[test]
    fn decodes_regular_header() {
        let block = header_block("cache/epub/1/pg1.rdf", 1234);
        let raw = decode(&block, 0).unwrap().unwrap();
        assert!(raw.kind.is_file());
        assert_eq!(raw.size, 1234);
        assert_eq!(raw.path, b"cache/epub/1/pg1.rdf");
    }

    #[test]
    fn zero_block_is_end_marker() {
        let block = [0u8; BLOCK_SIZE];
        assert!(decode(&block, 0).unwrap().is_none());
    }

    #[test]
    fn corrupt_checksum_is_malformed() {
        let mut block = header_block("a.rdf", 10);
        block[0] ^= 0x20;
        let err = decode(&block, 1024).unwrap_err();
        assert!(matches!(err, ArchiveError::Malformed { offset: 1024, .. }));
    }

    #[test]
    fn padding_rounds_to_block() {
        assert_eq!(padding(0), 0);
        assert_eq!(padding(1), 511);
        assert_eq!(padding(512), 0);
        assert_eq!(padding(513), 511);
        assert_eq!(padding(MAX_ENTRY_SIZE), 0);
    }

    #[test]
    fn oversized_entry_is_malformed() {
        let block = header_block("huge.rdf", u64::MAX);
        let err = decode(&block, 512).unwrap_err();
        assert!(matches!(err, ArchiveError::Malformed { offset: 512, .. }));

        let block = header_block("largest.rdf", MAX_ENTRY_SIZE);
        let raw = decode(&block, 0).unwrap().unwrap();
        assert_eq!(raw.size + padding(raw.size), MAX_ENTRY_SIZE);
    }

    #[test]
    fn gnu_long_name_strips_nul() {
        assert_eq!(gnu_long_name(b"long/name.rdf\0\0\0"), b"long/name.rdf");
        assert_eq!(gnu_long_name(b"no-terminator"), b"no-terminator");
    }

    #[test]
    fn pax_path_is_extracted() {
        let body = b"30 mtime=1700000000.123456789\n29 path=cache/epub/9/pg9.rdf\n";
        let path = pax_path(body, 0).unwrap();
        assert_eq!(path.as_deref(), Some(&b"cache/epub/9/pg9.rdf"[..]));
    }

    #[test]
    fn pax_without_path_yields_none() {
        let body = b"30 mtime=1700000000.123456789\n";
        assert_eq!(pax_path(body, 0).unwrap(), None);
    }

    #[test]
    fn pax_bad_length_is_malformed() {
        let err = pax_path(b"99 path=x\n", 7).unwrap_err();
        assert!(matches!(err, ArchiveError::Malformed { offset: 7, .. }));
    }
}
