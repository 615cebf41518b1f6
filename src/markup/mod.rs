//! Streaming markup for annotated texts.
//!
//! The aligner ([`align`]) produces a nested event stream: one block holding
//! sentences, each holding words, with gap text and line breaks in between.
//! Events go to a [`MarkupSink`] as they are produced; nothing is built as an
//! in-memory tree. [`tei::TeiWriter`] serializes them as TEI XML.

pub mod align;
pub mod error;
pub mod lines;
pub mod tei;

pub use align::{AlignOptions, TrailingText, validate, write_annotated};
pub use error::{MarkupError, MarkupResult};
pub use lines::{Run, split_lines};
pub use tei::{TeiHeader, TeiWriter};

/// Structural element of an annotated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element<'a> {
    /// Outer block wrapping all sentences of one text.
    Block,
    /// One sentence.
    Sentence,
    /// One token, carrying the annotator's tags verbatim.
    Word {
        lemma: &'a str,
        pos: &'a str,
        entity: &'a str,
    },
}

impl Element<'_> {
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Block => ElementKind::Block,
            Self::Sentence => ElementKind::Sentence,
            Self::Word { .. } => ElementKind::Word,
        }
    }
}

/// Element without its attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Block,
    Sentence,
    Word,
}

/// Consumer of markup events.
///
/// `close` always closes the innermost open element.
pub trait MarkupSink {
    fn open(&mut self, element: Element<'_>) -> MarkupResult<()>;

    fn close(&mut self) -> MarkupResult<()>;

    /// A non-empty run of text without newlines.
    fn text(&mut self, run: &str) -> MarkupResult<()>;

    /// Stand-in for one newline character.
    fn line_break(&mut self) -> MarkupResult<()>;
}

/// Owned copy of one markup event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupEvent {
    Open(ElementKind),
    Attribute { name: &'static str, value: String },
    Close(ElementKind),
    Text(String),
    Break,
}

/// Sink that records events in memory, for inspection.
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Vec<MarkupEvent>,
    open: Vec<ElementKind>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[MarkupEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<MarkupEvent> {
        self.events
    }

    /// Depth of currently open elements.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Replace break markers with newlines and concatenate all text.
    pub fn plain_text(&self) -> String {
        self.events
            .iter()
            .filter_map(|e| match e {
                MarkupEvent::Text(t) => Some(t.as_str()),
                MarkupEvent::Break => Some("\n"),
                _ => None,
            })
            .collect()
    }
}

impl MarkupSink for EventRecorder {
    fn open(&mut self, element: Element<'_>) -> MarkupResult<()> {
        self.events.push(MarkupEvent::Open(element.kind()));
        if let Element::Word { lemma, pos, entity } = element {
            for (name, value) in [("lemma", lemma), ("pos", pos), ("entity", entity)] {
                self.events.push(MarkupEvent::Attribute {
                    name,
                    value: value.to_string(),
                });
            }
        }
        self.open.push(element.kind());
        Ok(())
    }

    fn close(&mut self) -> MarkupResult<()> {
        let kind = self.open.pop().ok_or_else(|| MarkupError::Unbalanced {
            message: "close without open element".into(),
        })?;
        self.events.push(MarkupEvent::Close(kind));
        Ok(())
    }

    fn text(&mut self, run: &str) -> MarkupResult<()> {
        self.events.push(MarkupEvent::Text(run.to_string()));
        Ok(())
    }

    fn line_break(&mut self) -> MarkupResult<()> {
        self.events.push(MarkupEvent::Break);
        Ok(())
    }
}
