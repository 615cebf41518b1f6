//! Container sources and outer compression detection.
//!
//! A source is either a remote URL (fetched with `ureq`) or a local path.
//! The outer compression is sniffed from the first bytes of the stream, so
//! cached copies and remote originals are read the same way.

use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::time::Duration;

use bzip2::read::MultiBzDecoder;
use flate2::read::MultiGzDecoder;

use crate::archive::error::{ArchiveError, ArchiveResult};

/// Connect timeout for remote sources.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-read timeout for remote sources. The catalogue is large, so there is
/// no overall deadline.
const READ_TIMEOUT: Duration = Duration::from_secs(120);

/// Identifier of a compressed container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Remote `http://` or `https://` URL.
    Url(String),
    /// Local filesystem path (also produced from `file://` URLs).
    Path(PathBuf),
}

impl Source {
    /// Interpret a string as a URL or a local path.
    pub fn parse(id: &str) -> Self {
        if id.starts_with("http://") || id.starts_with("https://") {
            Self::Url(id.to_string())
        } else if let Some(path) = id.strip_prefix("file://") {
            Self::Path(PathBuf::from(path))
        } else {
            Self::Path(PathBuf::from(id))
        }
    }

    /// Open the raw (still compressed) byte stream.
    pub fn open(&self) -> ArchiveResult<Box<dyn Read + Send>> {
        match self {
            Self::Path(path) => {
                let file = std::fs::File::open(path).map_err(|e| ArchiveError::Open {
                    source_id: path.display().to_string(),
                    message: e.to_string(),
                })?;
                let reader: Box<dyn Read + Send> = Box::new(file);
                Ok(reader)
            }
            Self::Url(url) => {
                let agent = ureq::AgentBuilder::new()
                    .timeout_connect(CONNECT_TIMEOUT)
                    .timeout_read(READ_TIMEOUT)
                    .build();
                let response = agent.get(url).call().map_err(|e| ArchiveError::Open {
                    source_id: url.clone(),
                    message: match e {
                        ureq::Error::Status(code, _) => format!("HTTP status {code}"),
                        ureq::Error::Transport(transport) => transport.to_string(),
                    },
                })?;
                let reader: Box<dyn Read + Send> = response.into_reader();
                Ok(reader)
            }
        }
    }
}

impl From<&str> for Source {
    fn from(id: &str) -> Self {
        Self::parse(id)
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Outer compression of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Bzip2,
    Gzip,
    None,
}

impl Compression {
    /// Detect the compression from the leading magic bytes.
    pub fn sniff(prefix: &[u8]) -> Self {
        if prefix.starts_with(b"BZh") {
            Self::Bzip2
        } else if prefix.starts_with(&[0x1f, 0x8b]) {
            Self::Gzip
        } else {
            Self::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bzip2 => "bzip2",
            Self::Gzip => "gzip",
            Self::None => "none",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wrap a raw stream in the decoder matching its magic bytes.
pub(crate) fn decompress(
    reader: Box<dyn Read + Send>,
) -> ArchiveResult<(Compression, Box<dyn Read + Send>)> {
    let mut buffered = BufReader::new(reader);
    let compression = Compression::sniff(buffered.fill_buf()?);

    let decoded: Box<dyn Read + Send> = match compression {
        Compression::Bzip2 => Box::new(MultiBzDecoder::new(buffered)),
        Compression::Gzip => Box::new(MultiGzDecoder::new(buffered)),
        Compression::None => Box::new(buffered),
    };
    Ok((compression, decoded))
}
