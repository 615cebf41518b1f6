//! The Gutenberg RDF catalogue as a stream of parsed records.
//!
//! [`Catalogue`] pairs an [`ArchiveCursor`] with a [`RecordParser`] and
//! yields one parse result per archive entry. A failed parse is reported for
//! that entry only; an archive failure ends the iteration.
//!
//! ```no_run
//! use gutentei::catalogue::{Catalogue, Text};
//!
//! let catalogue = Catalogue::cached("catalogue.tar.bz2".as_ref(), gutentei::catalogue::DEFAULT_URL)?;
//! let texts = Text::all_of(catalogue)?;
//! println!("{} texts", texts.len());
//! # Ok::<(), gutentei::catalogue::CatalogError>(())
//! ```

pub mod cache;
pub mod error;
pub mod record;
pub mod terms;
pub mod text;

use std::path::Path;

use tracing::{debug, info};

use crate::archive::{ArchiveCursor, Source};

pub use error::{CatalogError, CatalogResult};
pub use record::{CatalogRecord, RdfXmlParser, RecordParser};
pub use text::{Text, load_texts, save_texts};

/// Published location of the catalogue container.
pub const DEFAULT_URL: &str = "https://www.gutenberg.org/cache/epub/feeds/rdf-files.tar.bz2";

/// Iterator of parsed catalogue records.
#[derive(Debug)]
pub struct Catalogue<P: RecordParser = RdfXmlParser> {
    cursor: ArchiveCursor,
    parser: P,
    done: bool,
}

impl Catalogue<RdfXmlParser> {
    /// Stream records straight from `source`.
    pub fn open(source: &Source) -> CatalogResult<Self> {
        Ok(Self::with_parser(ArchiveCursor::open(source)?, RdfXmlParser::default()))
    }

    /// Stream records from a local copy of `url`, downloading it first if
    /// `cache_file` does not exist yet.
    pub fn cached(cache_file: &Path, url: &str) -> CatalogResult<Self> {
        let path = cache::mirror(url, cache_file)?;
        info!(path = %path.display(), "opening catalogue");
        Self::open(&Source::Path(path))
    }
}

impl<P: RecordParser> Catalogue<P> {
    pub fn with_parser(cursor: ArchiveCursor, parser: P) -> Self {
        Self {
            cursor,
            parser,
            done: false,
        }
    }

    /// Release the underlying stream. Further iteration yields nothing.
    pub fn close(&mut self) {
        self.done = true;
        self.cursor.close();
    }

    pub fn cursor(&self) -> &ArchiveCursor {
        &self.cursor
    }
}

impl<P: RecordParser> Iterator for Catalogue<P> {
    type Item = CatalogResult<P::Output>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.cursor.has_next() {
            Ok(true) => {}
            Ok(false) => {
                debug!("catalogue exhausted");
                self.done = true;
                return None;
            }
            Err(e) => {
                self.done = true;
                return Some(Err(e.into()));
            }
        }

        let mut record = match self.cursor.next() {
            Ok(record) => record,
            Err(e) => {
                self.done = true;
                return Some(Err(e.into()));
            }
        };
        let name = record.name().to_string();
        Some(self.parser.parse(&name, &mut record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    /// Parser that returns entry names and rejects entries named `bad*`.
    struct Names;

    impl RecordParser for Names {
        type Output = (String, usize);

        fn parse(&self, name: &str, reader: &mut dyn Read) -> CatalogResult<(String, usize)> {
            let mut body = Vec::new();
            reader
                .read_to_end(&mut body)
                .map_err(|e| CatalogError::Archive(e.into()))?;
            if name.starts_with("bad") {
                return Err(CatalogError::Parse {
                    entry: name.to_string(),
                    message: "rejected".into(),
                });
            }
            Ok((name.to_string(), body.len()))
        }
    }

    fn tar_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, body) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(body.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *body).unwrap();
        }
        builder.into_inner().unwrap()
    }

    #[test]
    fn parse_errors_do_not_stop_iteration() {
        let bytes = tar_of(&[("a.rdf", b"one"), ("bad.rdf", b"two"), ("c.rdf", b"three")]);
        let cursor = ArchiveCursor::from_reader(Cursor::new(bytes)).unwrap();
        let results: Vec<_> = Catalogue::with_parser(cursor, Names).collect();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap(), &("a.rdf".to_string(), 3));
        assert!(matches!(results[1], Err(CatalogError::Parse { .. })));
        assert_eq!(results[2].as_ref().unwrap(), &("c.rdf".to_string(), 5));
    }

    #[test]
    fn close_ends_iteration() {
        let bytes = tar_of(&[("a.rdf", b"one"), ("b.rdf", b"two")]);
        let cursor = ArchiveCursor::from_reader(Cursor::new(bytes)).unwrap();
        let mut catalogue = Catalogue::with_parser(cursor, Names);
        assert!(catalogue.next().is_some());
        catalogue.close();
        assert!(catalogue.next().is_none());
        assert!(catalogue.cursor().is_closed());
    }

    #[test]
    fn archive_error_is_yielded_once() {
        let mut bytes = tar_of(&[("a.rdf", b"one")]);
        bytes[148] ^= 0x01;
        let cursor = ArchiveCursor::from_reader(Cursor::new(bytes)).unwrap();
        let mut catalogue = Catalogue::with_parser(cursor, Names);
        assert!(matches!(catalogue.next(), Some(Err(CatalogError::Archive(_)))));
        assert!(catalogue.next().is_none());
    }
}
