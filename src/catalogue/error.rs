//! Rich diagnostic error types for the catalogue layer.

use miette::Diagnostic;
use thiserror::Error;

use crate::archive::ArchiveError;

/// Errors from reading catalogue records or persisting text metadata.
#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("cannot parse record \"{entry}\": {message}")]
    #[diagnostic(
        code(gtei::catalog::parse),
        help(
            "The entry is not well-formed RDF/XML. Other entries are unaffected; \
             the catalogue continues with the next record."
        )
    )]
    Parse { entry: String, message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Archive(#[from] ArchiveError),

    #[error("catalogue cache error at {path}: {message}")]
    #[diagnostic(
        code(gtei::catalog::cache),
        help("Check that the working directory is writable and has enough free space.")
    )]
    Cache { path: String, message: String },

    #[error("texts file {path}: {message}")]
    #[diagnostic(
        code(gtei::catalog::texts_file),
        help(
            "The saved text list could not be read or written. Delete it to rebuild \
             it from the catalogue."
        )
    )]
    TextsFile { path: String, message: String },

    #[error("cannot fetch {url}: {message}")]
    #[diagnostic(
        code(gtei::catalog::fetch),
        help("The download failed. Check network access, or place the file in the cache by hand.")
    )]
    Fetch { url: String, message: String },
}

/// Convenience alias for catalogue operation results.
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
