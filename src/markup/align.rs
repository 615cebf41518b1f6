//! Offset-aligned serialization of annotated text.
//!
//! [`write_annotated`] walks the text and its sentences in one pass, emitting
//! the text between tokens as gap runs and each token's own text inside a word
//! element. Spans are checked up front by [`validate`], so a sink never sees
//! part of a document whose annotation is inconsistent with its text.

use serde::{Deserialize, Serialize};

use crate::markup::error::{MarkupError, MarkupResult};
use crate::markup::lines::write_runs;
use crate::markup::{Element, MarkupSink};
use crate::nlp::Annotation;

/// What to do with text after the final token.
///
/// `Drop` reproduces the historical output, which ends the block at the last
/// token and loses anything after it (closing notes, trailing whitespace).
/// This is likely a defect but is kept as the default until downstream
/// consumers confirm they want the tail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailingText {
    #[default]
    Drop,
    Emit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignOptions {
    pub trailing: TrailingText,
}

impl AlignOptions {
    pub fn with_trailing(trailing: TrailingText) -> Self {
        Self { trailing }
    }
}

/// Check that every token span is ordered (`start <= end`), inside the text,
/// and starts at or after the end of the token before it (across sentence
/// boundaries). Empty spans are allowed.
pub fn validate(text: &str, annotation: &Annotation) -> MarkupResult<()> {
    let char_len = text.chars().count();
    let mut previous_end = 0usize;

    for (s, sentence) in annotation.sentences.iter().enumerate() {
        for (t, token) in sentence.tokens.iter().enumerate() {
            let reason = if token.start > token.end {
                Some("span is inverted".to_string())
            } else if token.end > char_len {
                Some(format!("span ends past the text ({char_len} characters)"))
            } else if token.start < previous_end {
                Some(format!("span overlaps the previous token, which ends at {previous_end}"))
            } else {
                None
            };

            if let Some(reason) = reason {
                return Err(MarkupError::InvalidSpan {
                    sentence: s,
                    token: t,
                    start: token.start,
                    end: token.end,
                    reason,
                });
            }
            previous_end = token.end;
        }
    }
    Ok(())
}

/// Stream `text` with its annotation to `sink`.
///
/// Emits one block element; a sentence element is opened at its first token,
/// so token-less sentences produce nothing. An empty token becomes a word
/// element with no text. Gap text before a sentence's first
/// token lands at block level, gaps between its tokens inside the sentence.
pub fn write_annotated<S: MarkupSink + ?Sized>(
    sink: &mut S,
    text: &str,
    annotation: &Annotation,
    options: AlignOptions,
) -> MarkupResult<()> {
    validate(text, annotation)?;

    let mut offsets = CharOffsets::new(text);
    let mut emitted = 0usize;

    sink.open(Element::Block)?;
    for sentence in &annotation.sentences {
        let mut opened = false;
        for token in &sentence.tokens {
            let start = offsets.byte_at(token.start);
            write_runs(sink, &text[emitted..start])?;

            if !opened {
                sink.open(Element::Sentence)?;
                opened = true;
            }
            sink.open(Element::Word {
                lemma: &token.lemma,
                pos: &token.pos,
                entity: &token.entity,
            })?;
            let end = offsets.byte_at(token.end);
            write_runs(sink, &text[start..end])?;
            emitted = end;
            sink.close()?;
        }
        if opened {
            sink.close()?;
        }
    }

    if options.trailing == TrailingText::Emit {
        write_runs(sink, &text[emitted..])?;
    }
    sink.close()
}

/// Forward-only character to byte offset translation.
struct CharOffsets<'t> {
    text: &'t str,
    chars: usize,
    bytes: usize,
}

impl<'t> CharOffsets<'t> {
    fn new(text: &'t str) -> Self {
        Self {
            text,
            chars: 0,
            bytes: 0,
        }
    }

    /// Byte position of character `index`; `index` never decreases between
    /// calls and is at most the text's character length.
    fn byte_at(&mut self, index: usize) -> usize {
        if index > self.chars {
            let rest = &self.text[self.bytes..];
            self.bytes += rest
                .char_indices()
                .nth(index - self.chars)
                .map_or(rest.len(), |(i, _)| i);
            self.chars = index;
        }
        self.bytes
    }
}
