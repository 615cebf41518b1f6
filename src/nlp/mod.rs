//! Linguistic annotation: sentence and token boundaries with tags.
//!
//! The [`Annotator`] trait is the boundary to whatever engine produces the
//! annotations. Offsets are zero-based character (Unicode scalar value)
//! indices into exactly the string passed to [`Annotator::annotate`],
//! end-exclusive. [`rules::RuleAnnotator`] is a dependency-free baseline.

pub mod rules;

use miette::Diagnostic;
use thiserror::Error;

pub use rules::RuleAnnotator;

/// Entity tag used for tokens outside any named entity.
pub const NO_ENTITY: &str = "O";

/// Errors from an annotation engine.
#[derive(Debug, Error, Diagnostic)]
pub enum NlpError {
    #[error("annotator \"{annotator}\" failed: {message}")]
    #[diagnostic(
        code(gtei::nlp::annotate),
        help("The annotation engine could not process this text. Check its logs or input size.")
    )]
    AnnotationFailed { annotator: String, message: String },
}

/// Convenience alias for annotation results.
pub type NlpResult<T> = std::result::Result<T, NlpError>;

/// One token with its half-open character span `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub start: usize,
    pub end: usize,
    pub lemma: String,
    pub pos: String,
    pub entity: String,
}

impl Token {
    pub fn new(start: usize, end: usize, lemma: &str, pos: &str, entity: &str) -> Self {
        Self {
            start,
            end,
            lemma: lemma.to_string(),
            pos: pos.to_string(),
            entity: entity.to_string(),
        }
    }
}

/// An ordered run of tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sentence {
    pub tokens: Vec<Token>,
}

impl Sentence {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }
}

/// Annotations for one text, in text order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    pub sentences: Vec<Sentence>,
}

impl Annotation {
    pub fn new(sentences: Vec<Sentence>) -> Self {
        Self { sentences }
    }

    pub fn token_count(&self) -> usize {
        self.sentences.iter().map(|s| s.tokens.len()).sum()
    }
}

/// An annotation engine.
///
/// Implementations are shared across worker threads and must tolerate
/// concurrent calls.
pub trait Annotator: Send + Sync {
    fn annotate(&self, text: &str) -> NlpResult<Annotation>;

    /// Short name for logs and error messages.
    fn name(&self) -> &str {
        "annotator"
    }
}
