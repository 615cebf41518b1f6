//! End-to-end tests: catalogue container → texts.json → annotated TEI.

use std::io::Write;

use gutentei::catalogue::{CatalogError, Catalogue, DEFAULT_URL, Text, save_texts};
use gutentei::config::SamplesConfig;
use gutentei::markup::{AlignOptions, EventRecorder, MarkupEvent, TrailingText, write_annotated};
use gutentei::nlp::{Annotator, RuleAnnotator};
use gutentei::samples::Samples;

fn ebook_rdf(id: u32, title: &str, creator: &str, language: &str, downloads: u64) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<rdf:RDF xml:base="http://www.gutenberg.org/"
  xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
  xmlns:dcterms="http://purl.org/dc/terms/"
  xmlns:pgterms="http://www.gutenberg.org/2009/pgterms/">
  <pgterms:ebook rdf:about="ebooks/{id}">
    <dcterms:title>{title}</dcterms:title>
    <dcterms:creator>
      <pgterms:agent rdf:about="2009/agents/{id}">
        <pgterms:name>{creator}</pgterms:name>
      </pgterms:agent>
    </dcterms:creator>
    <dcterms:language>
      <rdf:Description>
        <rdf:value rdf:datatype="http://purl.org/dc/terms/RFC4646">{language}</rdf:value>
      </rdf:Description>
    </dcterms:language>
    <pgterms:downloads rdf:datatype="http://www.w3.org/2001/XMLSchema#integer">{downloads}</pgterms:downloads>
  </pgterms:ebook>
</rdf:RDF>"#
    )
}

/// A bzip2 catalogue with four books, one broken record and a directory.
fn catalogue_bytes() -> Vec<u8> {
    let records = [
        ("cache/epub/11/pg11.rdf", ebook_rdf(11, "Alice's Adventures in Wonderland", "Carroll, Lewis", "en", 900)),
        ("cache/epub/84/pg84.rdf", ebook_rdf(84, "Frankenstein", "Shelley, Mary", "en", 1200)),
        ("cache/epub/99/pg99.rdf", "<rdf:RDF><broken".to_string()),
        ("cache/epub/2229/pg2229.rdf", ebook_rdf(2229, "Faust", "Goethe", "de", 300)),
        ("cache/epub/1342/pg1342.rdf", ebook_rdf(1342, "Pride and Prejudice", "Austen, Jane", "en", 5000)),
    ];

    let mut builder = tar::Builder::new(Vec::new());
    let mut dir = tar::Header::new_gnu();
    dir.set_entry_type(tar::EntryType::Directory);
    dir.set_size(0);
    dir.set_mode(0o755);
    dir.set_cksum();
    builder.append_data(&mut dir, "cache/", std::io::empty()).unwrap();
    for (name, body) in &records {
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, body.as_bytes()).unwrap();
    }
    let tar = builder.into_inner().unwrap();

    let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
    encoder.write_all(&tar).unwrap();
    encoder.finish().unwrap()
}

fn workdir() -> (tempfile::TempDir, Samples) {
    let dir = tempfile::TempDir::new().unwrap();
    let samples = Samples::new(dir.path().join("samples")).unwrap();
    std::fs::write(samples.catalogue_file(), catalogue_bytes()).unwrap();
    (dir, samples)
}

#[test]
fn catalogue_yields_parse_error_and_keeps_going() {
    let (_dir, samples) = workdir();
    let catalogue = Catalogue::cached(samples.catalogue_file(), DEFAULT_URL).unwrap();
    let results: Vec<_> = catalogue.collect();

    assert_eq!(results.len(), 5);
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 4);
    assert!(matches!(
        &results[2],
        Err(CatalogError::Parse { entry, .. }) if entry == "cache/epub/99/pg99.rdf"
    ));
}

#[test]
fn texts_are_collected_sorted_and_saved() {
    let (_dir, samples) = workdir();
    let texts = samples.texts(DEFAULT_URL).unwrap();

    let ids: Vec<&str> = texts.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["2229", "1342", "84", "11"]);
    assert_eq!(texts[1].creator.as_deref(), Some("Austen, Jane"));
    assert!(samples.texts_file().is_file());
    assert!(samples.texts_up_to_date());
}

#[test]
fn current_texts_file_is_reused() {
    let (_dir, samples) = workdir();
    let mut texts = samples.texts(DEFAULT_URL).unwrap();
    texts.truncate(1);
    texts[0].title = "Edited".into();
    save_texts(samples.texts_file(), &texts).unwrap();

    let reloaded = samples.texts(DEFAULT_URL).unwrap();
    assert_eq!(reloaded, texts);
}

#[test]
fn selected_texts_become_tei() {
    let (_dir, samples) = workdir();
    let texts = samples.texts(DEFAULT_URL).unwrap();
    let selected = Samples::select(&texts, "en", 1, 2);
    let ids: Vec<&str> = selected.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["84", "11"]);

    std::fs::write(
        samples.txt_file(selected[0]),
        "Produced by volunteers.\r\n\r\n*** START OF THE PROJECT GUTENBERG EBOOK FRANKENSTEIN ***\r\n\r\nLetter 1\r\n\r\nYou will rejoice to hear.\r\n\r\n*** END OF THE PROJECT GUTENBERG EBOOK FRANKENSTEIN ***\r\n",
    )
    .unwrap();
    std::fs::write(samples.txt_file(selected[1]), "Alice was beginning to get very tired.").unwrap();

    let config = SamplesConfig {
        threads: Some(2),
        ..Default::default()
    };
    let report = samples.process(&RuleAnnotator, &selected, &config).unwrap();
    assert!(report.is_success(), "{:?}", report.failed);
    assert_eq!(report.written.len(), 2);

    let xml = std::fs::read_to_string(samples.tei_file(selected[0])).unwrap();
    assert!(xml.contains("<title>Frankenstein</title>"));
    assert!(xml.contains("<author>Shelley, Mary</author>"));
    assert!(xml.contains(r#"<language ident="en"/>"#));
    assert!(xml.contains("</s><lb/><lb/><s>"));
    assert!(!xml.contains("volunteers"));
    assert!(!xml.contains('\r'));
}

#[test]
fn aligned_text_round_trips_with_trailing_emitted() {
    let text = "CHAPTER I.\n\nIt was a dark and stormy night; the rain fell in torrents.\n\n  (The end)\n";
    let annotation = RuleAnnotator.annotate(text).unwrap();

    let mut emitted = EventRecorder::new();
    write_annotated(&mut emitted, text, &annotation, AlignOptions::with_trailing(TrailingText::Emit))
        .unwrap();
    assert_eq!(emitted.plain_text(), text);

    let mut dropped = EventRecorder::new();
    write_annotated(&mut dropped, text, &annotation, AlignOptions::default()).unwrap();
    assert_eq!(dropped.plain_text(), text.trim_end());
    assert!(!dropped.events().contains(&MarkupEvent::Text(String::new())));
}

#[test]
fn text_json_shape() {
    let text = Text {
        id: "1".into(),
        resource: "http://www.gutenberg.org/ebooks/1".into(),
        title: "The Declaration of Independence".into(),
        creator: None,
        language: "en".into(),
        downloads: 7,
        text_url: None,
    };
    let json = serde_json::to_value(&text).unwrap();
    assert_eq!(json["id"], "1");
    assert_eq!(json["downloads"], 7);
    assert!(json.get("creator").is_none());
}
