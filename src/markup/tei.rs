//! TEI P5 serialization over `quick-xml`.
//!
//! Output is written without indentation: whitespace inside `<ab>` is part of
//! the text, and the aligner guarantees it survives byte for byte.

use std::io::Write;

use quick_xml::Writer;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::markup::error::{MarkupError, MarkupResult};
use crate::markup::{Element, MarkupSink};

pub const TEI_NS: &str = "http://www.tei-c.org/ns/1.0";
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const TEI_SCHEMA: &str = "http://www.tei-c.org/release/xml/tei/custom/schema/xsd/tei_all.xsd";

/// Bibliographic data for the `<teiHeader>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeiHeader<'a> {
    pub title: &'a str,
    pub author: Option<&'a str>,
    /// Language code for `<language ident>`.
    pub language: Option<&'a str>,
    /// Identifier placed in `<publicationStmt><idno>`.
    pub idno: Option<&'a str>,
    /// IRI of the source record, referenced from `<sourceDesc>`.
    pub source: Option<&'a str>,
}

/// Streaming TEI writer.
///
/// [`write_document`](Self::write_document) emits the document frame; the
/// [`MarkupSink`] impl maps block, sentence and word elements to `ab`, `s`
/// and `w` (with `lemma`, `type` and `function` attributes), breaks to `lb`.
pub struct TeiWriter<W: Write> {
    writer: Writer<W>,
    open: Vec<&'static str>,
}

impl<W: Write> TeiWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: Writer::new(inner),
            open: Vec::new(),
        }
    }

    /// Write a complete document, calling `body` to fill `<div>`.
    pub fn write_document<F>(&mut self, header: &TeiHeader<'_>, body: F) -> MarkupResult<()>
    where
        F: FnOnce(&mut Self) -> MarkupResult<()>,
    {
        let depth = self.open.len();
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        let schema_location = format!("{TEI_NS} {TEI_SCHEMA}");
        self.start(
            "TEI",
            &[
                ("xmlns", TEI_NS),
                ("xmlns:xsi", XSI_NS),
                ("xsi:schemaLocation", &schema_location),
            ],
        )?;
        self.write_header(header)?;

        self.start("text", &[])?;
        self.start("body", &[])?;
        self.start("div", &[])?;
        body(self)?;
        while self.open.len() > depth {
            self.end()?;
        }
        Ok(())
    }

    /// Flush and return the underlying writer; fails if elements remain open.
    pub fn into_inner(self) -> MarkupResult<W> {
        if let Some(name) = self.open.last() {
            return Err(MarkupError::Unbalanced {
                message: format!("<{name}> still open at end of document"),
            });
        }
        let mut inner = self.writer.into_inner();
        inner.flush()?;
        Ok(inner)
    }

    fn write_header(&mut self, header: &TeiHeader<'_>) -> MarkupResult<()> {
        self.start("teiHeader", &[])?;
        self.start("fileDesc", &[])?;

        self.start("titleStmt", &[])?;
        self.leaf("title", &[], header.title)?;
        if let Some(author) = header.author {
            self.leaf("author", &[], author)?;
        }
        self.end()?;

        self.start("publicationStmt", &[])?;
        match header.idno {
            Some(idno) => self.leaf("idno", &[], idno)?,
            None => self.leaf("p", &[], "Unpublished")?,
        }
        self.end()?;

        self.start("sourceDesc", &[])?;
        self.start("bibl", &[])?;
        match header.source {
            Some(source) => self.empty("ptr", &[("target", source)])?,
            None => self.text(header.title)?,
        }
        self.end()?;
        self.end()?;

        self.end()?;

        if let Some(language) = header.language {
            self.start("profileDesc", &[])?;
            self.start("langUsage", &[])?;
            self.empty("language", &[("ident", language)])?;
            self.end()?;
            self.end()?;
        }
        self.end()
    }

    fn start(&mut self, name: &'static str, attributes: &[(&str, &str)]) -> MarkupResult<()> {
        let mut start = BytesStart::new(name);
        for &attribute in attributes {
            start.push_attribute(attribute);
        }
        self.writer.write_event(Event::Start(start))?;
        self.open.push(name);
        Ok(())
    }

    fn end(&mut self) -> MarkupResult<()> {
        let name = self.open.pop().ok_or_else(|| MarkupError::Unbalanced {
            message: "close without open element".into(),
        })?;
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn empty(&mut self, name: &'static str, attributes: &[(&str, &str)]) -> MarkupResult<()> {
        let mut element = BytesStart::new(name);
        for &attribute in attributes {
            element.push_attribute(attribute);
        }
        self.writer.write_event(Event::Empty(element))?;
        Ok(())
    }

    fn leaf(&mut self, name: &'static str, attributes: &[(&str, &str)], text: &str) -> MarkupResult<()> {
        self.start(name, attributes)?;
        self.text(text)?;
        self.end()
    }
}

impl<W: Write> MarkupSink for TeiWriter<W> {
    fn open(&mut self, element: Element<'_>) -> MarkupResult<()> {
        match element {
            Element::Block => self.start("ab", &[]),
            Element::Sentence => self.start("s", &[]),
            Element::Word { lemma, pos, entity } => self.start(
                "w",
                &[("lemma", lemma), ("type", pos), ("function", entity)],
            ),
        }
    }

    fn close(&mut self) -> MarkupResult<()> {
        self.end()
    }

    fn text(&mut self, run: &str) -> MarkupResult<()> {
        self.writer
            .write_event(Event::Text(BytesText::from_escaped(partial_escape(run))))?;
        Ok(())
    }

    fn line_break(&mut self) -> MarkupResult<()> {
        self.empty("lb", &[])
    }
}
