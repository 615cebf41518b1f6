//! Rich diagnostic error types for markup generation.

use miette::Diagnostic;
use thiserror::Error;

/// Errors from aligning annotations or writing markup.
#[derive(Debug, Error, Diagnostic)]
pub enum MarkupError {
    #[error("invalid token span [{start}, {end}) at sentence {sentence}, token {token}: {reason}")]
    #[diagnostic(
        code(gtei::markup::invalid_span),
        help(
            "Token spans must not be inverted, must lie within the text, and must follow \
             each other without overlap. The annotator produced offsets that do not match the text \
             it was given; check that the exact same string was annotated."
        )
    )]
    InvalidSpan {
        sentence: usize,
        token: usize,
        start: usize,
        end: usize,
        reason: String,
    },

    #[error("markup write failed: {message}")]
    #[diagnostic(
        code(gtei::markup::write),
        help(
            "Serialization stopped mid-document. The partial output is incomplete and \
             should be discarded."
        )
    )]
    Write { message: String },

    #[error("unbalanced markup: {message}")]
    #[diagnostic(
        code(gtei::markup::unbalanced),
        help("Every opened element must be closed exactly once, innermost first.")
    )]
    Unbalanced { message: String },
}

impl From<quick_xml::Error> for MarkupError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Write {
            message: e.to_string(),
        }
    }
}

impl From<std::io::Error> for MarkupError {
    fn from(e: std::io::Error) -> Self {
        Self::Write {
            message: e.to_string(),
        }
    }
}

/// Convenience alias for markup operation results.
pub type MarkupResult<T> = std::result::Result<T, MarkupError>;
