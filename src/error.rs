//! Rich diagnostic error types for gutentei.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text. [`GutenteiError`] wraps them all for
//! callers that drive the whole pipeline.

use miette::Diagnostic;
use thiserror::Error;

use crate::archive::ArchiveError;
use crate::catalogue::CatalogError;
use crate::config::ConfigError;
use crate::markup::MarkupError;
use crate::nlp::NlpError;
use crate::samples::SamplesError;

/// Top-level error type.
///
/// Each variant wraps a subsystem-specific error, preserving its diagnostic
/// code and help text through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum GutenteiError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Markup(#[from] MarkupError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Nlp(#[from] NlpError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Samples(#[from] SamplesError),
}

/// Convenience alias for results across the crate.
pub type GutenteiResult<T> = std::result::Result<T, GutenteiError>;
