//! Per-entry record parsing.

use std::io::Read;

use oxigraph::io::{RdfFormat, RdfParseError, RdfParser};
use oxigraph::model::{Graph, Triple};
use tracing::trace;

use crate::catalogue::error::{CatalogError, CatalogResult};

/// Base IRI the catalogue's relative `rdf:about` references resolve against.
pub const GUTENBERG_BASE: &str = "http://www.gutenberg.org/";

/// Turns the bytes of one archive entry into a parsed record.
///
/// Non-fatal diagnostics are the parser's business; only a hard failure is
/// returned, and it never affects the entries after it.
pub trait RecordParser {
    type Output;

    fn parse(&self, name: &str, reader: &mut dyn Read) -> CatalogResult<Self::Output>;
}

/// One parsed catalogue entry.
#[derive(Debug, Clone)]
pub struct CatalogRecord {
    pub name: String,
    pub graph: Graph,
}

/// RDF/XML parser producing an in-memory graph per entry.
#[derive(Debug, Clone)]
pub struct RdfXmlParser {
    base_iri: String,
}

impl RdfXmlParser {
    pub fn with_base_iri(base_iri: impl Into<String>) -> Self {
        Self {
            base_iri: base_iri.into(),
        }
    }
}

impl Default for RdfXmlParser {
    fn default() -> Self {
        Self::with_base_iri(GUTENBERG_BASE)
    }
}

impl RecordParser for RdfXmlParser {
    type Output = CatalogRecord;

    fn parse(&self, name: &str, reader: &mut dyn Read) -> CatalogResult<CatalogRecord> {
        let parser = RdfParser::from_format(RdfFormat::RdfXml)
            .with_base_iri(self.base_iri.as_str())
            .map_err(|e| CatalogError::Parse {
                entry: name.to_string(),
                message: format!("invalid base IRI {}: {e}", self.base_iri),
            })?;

        let mut graph = Graph::new();
        for quad in parser.for_reader(reader) {
            let quad = quad.map_err(|e| match e {
                RdfParseError::Io(source) => CatalogError::Archive(source.into()),
                RdfParseError::Syntax(e) => CatalogError::Parse {
                    entry: name.to_string(),
                    message: e.to_string(),
                },
            })?;
            graph.insert(&Triple::new(quad.subject, quad.predicate, quad.object));
        }
        trace!(entry = name, triples = graph.len(), "parsed record");

        Ok(CatalogRecord {
            name: name.to_string(),
            graph,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::terms::{dcterms, pgterms, rdf};
    use oxigraph::model::NamedNodeRef;

    const RECORD: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<rdf:RDF xml:base="http://www.gutenberg.org/"
  xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
  xmlns:dcterms="http://purl.org/dc/terms/"
  xmlns:pgterms="http://www.gutenberg.org/2009/pgterms/">
  <pgterms:ebook rdf:about="ebooks/9">
    <dcterms:title>Abraham Lincoln's First Inaugural Address</dcterms:title>
  </pgterms:ebook>
</rdf:RDF>"#;

    #[test]
    fn parses_rdf_xml_into_graph() {
        let record = RdfXmlParser::default()
            .parse("cache/epub/9/pg9.rdf", &mut RECORD.as_bytes())
            .unwrap();
        assert_eq!(record.name, "cache/epub/9/pg9.rdf");

        let book = NamedNodeRef::new("http://www.gutenberg.org/ebooks/9").unwrap();
        assert!(record.graph.contains(oxigraph::model::TripleRef::new(book, rdf::TYPE, pgterms::EBOOK)));
        assert!(
            record
                .graph
                .object_for_subject_predicate(book, dcterms::TITLE)
                .is_some()
        );
    }

    #[test]
    fn syntax_error_is_a_parse_error() {
        let broken = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><rdf:Description></rdf:RDF>"#;
        let err = RdfXmlParser::default()
            .parse("bad.rdf", &mut broken.as_bytes())
            .unwrap_err();
        match err {
            CatalogError::Parse { entry, .. } => assert_eq!(entry, "bad.rdf"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
