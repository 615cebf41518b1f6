//! Metadata of one e-book, extracted from its catalogue record.

use std::cmp::Ordering;
use std::path::Path;

use oxigraph::model::{Graph, NamedNodeRef, TermRef};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalogue::error::{CatalogError, CatalogResult};
use crate::catalogue::record::CatalogRecord;
use crate::catalogue::terms::{dcterms, pgterms, rdf};
use crate::markup::TeiHeader;

const START_MARKER: &str = "*** START OF";
const END_MARKER: &str = "*** END OF";

/// A public-domain text listed in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    /// Catalogue number, e.g. `"1342"`.
    pub id: String,
    /// IRI of the e-book resource.
    pub resource: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    pub language: String,
    #[serde(default)]
    pub downloads: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_url: Option<String>,
}

impl Text {
    /// Extract every e-book described in `graph`.
    ///
    /// Books without a title or a language are left out.
    pub fn from_graph(graph: &Graph) -> Vec<Text> {
        graph
            .subjects_for_predicate_object(rdf::TYPE, pgterms::EBOOK)
            .map(TermRef::from)
            .filter_map(|book| {
                let text = Self::from_ebook(graph, book);
                if text.is_none() {
                    debug!(%book, "skipping e-book without title or language");
                }
                text
            })
            .collect()
    }

    pub fn from_record(record: &CatalogRecord) -> Vec<Text> {
        let texts = Self::from_graph(&record.graph);
        if texts.is_empty() {
            debug!(entry = %record.name, "record describes no usable e-book");
        }
        texts
    }

    /// Collect the texts of all records, sorted in catalogue order.
    ///
    /// Records that fail to parse are logged and skipped; archive failures
    /// end the walk with an error.
    pub fn all_of<I>(records: I) -> CatalogResult<Vec<Text>>
    where
        I: IntoIterator<Item = CatalogResult<CatalogRecord>>,
    {
        let mut texts = Vec::new();
        let mut records_seen = 0usize;
        let mut unparseable = 0usize;

        for record in records {
            match record {
                Ok(record) => {
                    records_seen += 1;
                    texts.extend(Self::from_record(&record));
                }
                Err(CatalogError::Parse { entry, message }) => {
                    unparseable += 1;
                    warn!(%entry, %message, "skipping unparseable record");
                }
                Err(e) => return Err(e),
            }
        }

        texts.sort_by(Self::catalogue_cmp);
        info!(
            records = records_seen,
            unparseable,
            texts = texts.len(),
            "collected texts from catalogue"
        );
        Ok(texts)
    }

    /// Language ascending, then most downloaded first, then creator, title
    /// and resource.
    pub fn catalogue_cmp(&self, other: &Self) -> Ordering {
        self.language
            .cmp(&other.language)
            .then_with(|| other.downloads.cmp(&self.downloads))
            .then_with(|| self.creator.cmp(&other.creator))
            .then_with(|| self.title.cmp(&other.title))
            .then_with(|| self.resource.cmp(&other.resource))
    }

    /// Where to download the plain text from.
    pub fn plain_text_url(&self) -> String {
        self.text_url.clone().unwrap_or_else(|| {
            format!(
                "https://www.gutenberg.org/cache/epub/{id}/pg{id}.txt",
                id = self.id
            )
        })
    }

    pub fn tei_header(&self) -> TeiHeader<'_> {
        TeiHeader {
            title: &self.title,
            author: self.creator.as_deref(),
            language: Some(&self.language),
            idno: Some(&self.id),
            source: Some(&self.resource),
        }
    }

    /// The text proper of a downloaded plain-text file.
    ///
    /// Returns what lies between the `*** START OF` and `*** END OF` lines
    /// (or the whole input when a marker is missing), with `\r\n` turned into
    /// `\n` and surrounding blank lines removed.
    pub fn body(contents: &str) -> String {
        let normalized = contents.trim_start_matches('\u{feff}').replace("\r\n", "\n");
        let start = marker_line(&normalized, START_MARKER, 0).map_or(0, |(_, end)| end);
        let end = marker_line(&normalized, END_MARKER, start).map_or(normalized.len(), |(s, _)| s);
        normalized[start..end]
            .trim_start_matches('\n')
            .trim_end()
            .to_string()
    }

    fn from_ebook(graph: &Graph, book: TermRef<'_>) -> Option<Text> {
        let TermRef::NamedNode(node) = book else {
            return None;
        };
        let resource = node.as_str().to_string();
        let id = resource.rsplit('/').next().unwrap_or_default().to_string();

        let title = objects(graph, book, dcterms::TITLE)
            .into_iter()
            .find_map(literal)
            .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))?;

        let language = objects(graph, book, dcterms::LANGUAGE)
            .into_iter()
            .find_map(|lang| value_of(graph, lang))?
            .to_string();

        let mut creators: Vec<&str> = objects(graph, book, dcterms::CREATOR)
            .into_iter()
            .flat_map(|agent| objects(graph, agent, pgterms::NAME))
            .filter_map(literal)
            .collect();
        creators.sort_unstable();
        let creator = (!creators.is_empty()).then(|| creators.join("; "));

        let downloads = objects(graph, book, pgterms::DOWNLOADS)
            .into_iter()
            .find_map(literal)
            .and_then(|d| d.trim().parse().ok())
            .unwrap_or(0);

        Some(Text {
            id,
            resource,
            title,
            creator,
            language,
            downloads,
            text_url: plain_text_format(graph, book),
        })
    }
}

/// Save texts as a JSON array.
pub fn save_texts(path: &Path, texts: &[Text]) -> CatalogResult<()> {
    let json = serde_json::to_string_pretty(texts).map_err(|e| CatalogError::TextsFile {
        path: path.display().to_string(),
        message: format!("serialize: {e}"),
    })?;
    std::fs::write(path, json).map_err(|e| CatalogError::TextsFile {
        path: path.display().to_string(),
        message: format!("write: {e}"),
    })
}

pub fn load_texts(path: &Path) -> CatalogResult<Vec<Text>> {
    let data = std::fs::read_to_string(path).map_err(|e| CatalogError::TextsFile {
        path: path.display().to_string(),
        message: format!("read: {e}"),
    })?;
    serde_json::from_str(&data).map_err(|e| CatalogError::TextsFile {
        path: path.display().to_string(),
        message: format!("parse: {e}"),
    })
}

/// Byte range of the first line at or after `from` that starts with `marker`.
fn marker_line(text: &str, marker: &str, from: usize) -> Option<(usize, usize)> {
    let mut offset = from;
    for line in text[from..].split_inclusive('\n') {
        if line.trim_start().starts_with(marker) {
            return Some((offset, offset + line.len()));
        }
        offset += line.len();
    }
    None
}

fn objects<'g>(graph: &'g Graph, subject: TermRef<'g>, predicate: NamedNodeRef<'_>) -> Vec<TermRef<'g>> {
    match subject {
        TermRef::NamedNode(node) => graph.objects_for_subject_predicate(node, predicate).collect(),
        TermRef::BlankNode(node) => graph.objects_for_subject_predicate(node, predicate).collect(),
        _ => Vec::new(),
    }
}

fn literal(term: TermRef<'_>) -> Option<&str> {
    match term {
        TermRef::Literal(literal) => Some(literal.value()),
        _ => None,
    }
}

/// A literal, or the `rdf:value` of a node standing in for one.
fn value_of<'g>(graph: &'g Graph, term: TermRef<'g>) -> Option<&'g str> {
    literal(term).or_else(|| objects(graph, term, rdf::VALUE).into_iter().find_map(literal))
}

/// IRI of the plain-text file of `book`, preferring UTF-8.
fn plain_text_format(graph: &Graph, book: TermRef<'_>) -> Option<String> {
    let mut candidates: Vec<(bool, &str)> = objects(graph, book, dcterms::HAS_FORMAT)
        .into_iter()
        .filter_map(|file| {
            let TermRef::NamedNode(iri) = file else {
                return None;
            };
            let mime = objects(graph, file, dcterms::FORMAT)
                .into_iter()
                .filter_map(|format| value_of(graph, format))
                .find(|mime| mime.starts_with("text/plain"))?;
            Some((!mime.contains("utf-8"), iri.as_str()))
        })
        .collect();
    candidates.sort_unstable();
    candidates.first().map(|(_, iri)| iri.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::record::{RdfXmlParser, RecordParser};

    fn ebook_rdf(id: u32, title: &str, creator: Option<&str>, language: &str, downloads: u64) -> String {
        let creator = creator
            .map(|name| {
                format!(
                    r#"<dcterms:creator><pgterms:agent rdf:about="2009/agents/{id}"><pgterms:name>{name}</pgterms:name></pgterms:agent></dcterms:creator>"#
                )
            })
            .unwrap_or_default();
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<rdf:RDF xml:base="http://www.gutenberg.org/"
  xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
  xmlns:dcterms="http://purl.org/dc/terms/"
  xmlns:pgterms="http://www.gutenberg.org/2009/pgterms/">
  <pgterms:ebook rdf:about="ebooks/{id}">
    <dcterms:title>{title}</dcterms:title>
    {creator}
    <dcterms:language>
      <rdf:Description rdf:nodeID="lang{id}">
        <rdf:value rdf:datatype="http://purl.org/dc/terms/RFC4646">{language}</rdf:value>
      </rdf:Description>
    </dcterms:language>
    <pgterms:downloads rdf:datatype="http://www.w3.org/2001/XMLSchema#integer">{downloads}</pgterms:downloads>
    <dcterms:hasFormat>
      <pgterms:file rdf:about="https://www.gutenberg.org/ebooks/{id}.txt.utf-8">
        <dcterms:format>
          <rdf:Description rdf:nodeID="fmt{id}">
            <rdf:value rdf:datatype="http://purl.org/dc/terms/IMT">text/plain; charset=utf-8</rdf:value>
          </rdf:Description>
        </dcterms:format>
      </pgterms:file>
    </dcterms:hasFormat>
    <dcterms:hasFormat>
      <pgterms:file rdf:about="https://www.gutenberg.org/ebooks/{id}.html.images">
        <dcterms:format>
          <rdf:Description rdf:nodeID="html{id}">
            <rdf:value rdf:datatype="http://purl.org/dc/terms/IMT">text/html</rdf:value>
          </rdf:Description>
        </dcterms:format>
      </pgterms:file>
    </dcterms:hasFormat>
  </pgterms:ebook>
</rdf:RDF>"#
        )
    }

    fn texts_of(rdf: &str) -> Vec<Text> {
        let record = RdfXmlParser::default()
            .parse("pg.rdf", &mut rdf.as_bytes())
            .unwrap();
        Text::from_record(&record)
    }

    fn text(id: &str, language: &str, downloads: u64, creator: Option<&str>, title: &str) -> Text {
        Text {
            id: id.into(),
            resource: format!("http://www.gutenberg.org/ebooks/{id}"),
            title: title.into(),
            creator: creator.map(String::from),
            language: language.into(),
            downloads,
            text_url: None,
        }
    }

    #[test]
    fn extracts_metadata_from_record() {
        let texts = texts_of(&ebook_rdf(
            1342,
            "Pride and\n  Prejudice",
            Some("Austen, Jane"),
            "en",
            52000,
        ));
        assert_eq!(
            texts,
            vec![Text {
                id: "1342".into(),
                resource: "http://www.gutenberg.org/ebooks/1342".into(),
                title: "Pride and Prejudice".into(),
                creator: Some("Austen, Jane".into()),
                language: "en".into(),
                downloads: 52000,
                text_url: Some("https://www.gutenberg.org/ebooks/1342.txt.utf-8".into()),
            }]
        );
    }

    #[test]
    fn missing_creator_is_none() {
        let texts = texts_of(&ebook_rdf(7, "Anonymous Tales", None, "fr", 3));
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].creator, None);
        assert_eq!(texts[0].language, "fr");
    }

    #[test]
    fn record_without_ebook_yields_nothing() {
        let rdf = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
            xmlns:dcterms="http://purl.org/dc/terms/">
            <rdf:Description rdf:about="http://example.org/x"><dcterms:title>x</dcterms:title></rdf:Description>
        </rdf:RDF>"#;
        assert!(texts_of(rdf).is_empty());
    }

    #[test]
    fn catalogue_order() {
        let mut texts = vec![
            text("4", "fr", 900, None, "D"),
            text("3", "en", 10, Some("B"), "C"),
            text("2", "en", 10, Some("A"), "Z"),
            text("1", "en", 500, Some("Z"), "A"),
        ];
        texts.sort_by(Text::catalogue_cmp);
        let ids: Vec<&str> = texts.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn all_of_skips_unparseable_records() {
        let records = vec![
            Ok(RdfXmlParser::default()
                .parse("a.rdf", &mut ebook_rdf(1, "One", None, "en", 1).as_bytes())
                .unwrap()),
            Err(CatalogError::Parse {
                entry: "b.rdf".into(),
                message: "broken".into(),
            }),
            Ok(RdfXmlParser::default()
                .parse("c.rdf", &mut ebook_rdf(2, "Two", None, "en", 5).as_bytes())
                .unwrap()),
        ];
        let texts = Text::all_of(records).unwrap();
        let ids: Vec<&str> = texts.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[test]
    fn all_of_stops_on_archive_error() {
        let records = vec![Err(CatalogError::Archive(crate::archive::ArchiveError::Closed))];
        assert!(matches!(Text::all_of(records), Err(CatalogError::Archive(_))));
    }

    #[test]
    fn texts_file_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("texts.json");
        let texts = vec![text("1", "en", 3, Some("A"), "T"), text("2", "de", 0, None, "U")];
        save_texts(&path, &texts).unwrap();
        assert_eq!(load_texts(&path).unwrap(), texts);
    }

    #[test]
    fn corrupt_texts_file_is_reported() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("texts.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_texts(&path), Err(CatalogError::TextsFile { .. })));
    }

    #[test]
    fn body_between_markers() {
        let contents = "\u{feff}Title page\r\n*** START OF THE PROJECT GUTENBERG EBOOK X ***\r\n\r\nCHAPTER I\r\nIt was.\r\n\r\n*** END OF THE PROJECT GUTENBERG EBOOK X ***\r\nLicense\r\n";
        assert_eq!(Text::body(contents), "CHAPTER I\nIt was.");
    }

    #[test]
    fn body_without_markers_is_whole_text() {
        assert_eq!(Text::body("  Just text.\n\n"), "  Just text.");
    }

    #[test]
    fn fallback_plain_text_url() {
        let t = text("84", "en", 0, None, "Frankenstein");
        assert_eq!(t.plain_text_url(), "https://www.gutenberg.org/cache/epub/84/pg84.txt");
    }
}
